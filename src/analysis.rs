//! Static Analyzer (C7): FIRST and FOLLOW sets over a context-free grammar,
//! computed to a fixed point and cached for the analyzer's lifetime.
use std::collections::{BTreeSet, HashMap};

use crate::grammar::{Grammar, Symbol};

/// Computes and caches FIRST/FOLLOW for one [`Grammar`].
///
/// Both sets are computed eagerly in [`StaticAnalyzer::new`] rather than
/// lazily on first access: the grammar is immutable once built, so there is
/// nothing to invalidate the cache, and every caller needs both sets anyway.
pub struct StaticAnalyzer<'g> {
    grammar: &'g Grammar,
    first: HashMap<Symbol, BTreeSet<Symbol>>,
    follow: HashMap<Symbol, BTreeSet<Symbol>>,
}

impl<'g> StaticAnalyzer<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        let first = compute_first(grammar);
        let follow = compute_follow(grammar, &first);
        StaticAnalyzer { grammar, first, follow }
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    /// FIRST(symbol): empty set for an unknown symbol rather than a panic,
    /// since a caller may legitimately probe a symbol this grammar never
    /// declared.
    pub fn first(&self, symbol: &Symbol) -> BTreeSet<Symbol> {
        self.first.get(symbol).cloned().unwrap_or_default()
    }

    pub fn follow(&self, symbol: &Symbol) -> BTreeSet<Symbol> {
        self.follow.get(symbol).cloned().unwrap_or_default()
    }

    /// FIRST of a whole symbol sequence (a production's trailer, or a
    /// sentential form): the same rule `FIRST` applies per-production,
    /// generalized to an arbitrary slice.
    pub fn first_of_sequence(&self, symbols: &[Symbol]) -> BTreeSet<Symbol> {
        first_of_sequence(symbols, &self.first)
    }
}

/// Insert `value` into `map[key]`, returning whether it was newly added.
///
/// Every call site folds this into a `changed |= insert(...)` — OR-
/// accumulating across the whole pass is what makes the fixed point correct;
/// assigning instead of OR-ing would lose earlier insertions within the same
/// pass.
fn insert(map: &mut HashMap<Symbol, BTreeSet<Symbol>>, key: Symbol, value: Symbol) -> bool {
    map.entry(key).or_default().insert(value)
}

fn first_of_sequence(symbols: &[Symbol], first: &HashMap<Symbol, BTreeSet<Symbol>>) -> BTreeSet<Symbol> {
    let mut result = BTreeSet::new();

    for symbol in symbols {
        let symbol_first = first.get(symbol).cloned().unwrap_or_default();
        result.extend(symbol_first.iter().filter(|s| !s.is_epsilon()).cloned());
        if !symbol_first.contains(&Symbol::epsilon()) {
            return result;
        }
    }

    // Every symbol in the sequence was nullable (including the empty
    // sequence itself), so the sequence as a whole derives epsilon.
    result.insert(Symbol::epsilon());
    result
}

fn compute_first(grammar: &Grammar) -> HashMap<Symbol, BTreeSet<Symbol>> {
    let mut first: HashMap<Symbol, BTreeSet<Symbol>> = HashMap::new();

    for terminal in grammar.terminals() {
        first.entry(terminal.clone()).or_default().insert(terminal.clone());
    }
    first.entry(Symbol::epsilon()).or_default().insert(Symbol::epsilon());
    for non_terminal in grammar.non_terminals() {
        first.entry(non_terminal.clone()).or_default();
    }

    loop {
        let mut changed = false;

        for production in grammar.productions() {
            if production.is_epsilon() {
                changed |= insert(&mut first, production.left.clone(), Symbol::epsilon());
                continue;
            }

            let rhs_first = first_of_sequence(&production.right, &first);
            for symbol in rhs_first {
                changed |= insert(&mut first, production.left.clone(), symbol);
            }
        }

        log::trace!("first: pass done, changed={changed}");
        if !changed {
            break;
        }
    }

    log::debug!("first: fixed point over {} symbols", first.len());
    first
}

fn compute_follow(
    grammar: &Grammar,
    first: &HashMap<Symbol, BTreeSet<Symbol>>,
) -> HashMap<Symbol, BTreeSet<Symbol>> {
    let mut follow: HashMap<Symbol, BTreeSet<Symbol>> = HashMap::new();

    for non_terminal in grammar.non_terminals() {
        follow.entry(non_terminal.clone()).or_default();
    }
    follow.entry(grammar.start().clone()).or_default().insert(Symbol::end_of_input());

    loop {
        let mut changed = false;

        for production in grammar.productions() {
            if production.is_epsilon() {
                continue;
            }

            for (i, symbol) in production.right.iter().enumerate() {
                if symbol.is_terminal() {
                    continue;
                }

                let trailer = first_of_sequence(&production.right[i + 1..], first);
                for terminal in trailer.iter().filter(|s| !s.is_epsilon()) {
                    changed |= insert(&mut follow, symbol.clone(), terminal.clone());
                }

                if trailer.contains(&Symbol::epsilon()) {
                    let inherited = follow.get(&production.left).cloned().unwrap_or_default();
                    for terminal in inherited {
                        changed |= insert(&mut follow, symbol.clone(), terminal);
                    }
                }
            }
        }

        log::trace!("follow: pass done, changed={changed}");
        if !changed {
            break;
        }
    }

    log::debug!("follow: fixed point over {} symbols", follow.len());
    follow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Production;
    use std::collections::BTreeSet;

    fn nt(name: &str) -> Symbol {
        Symbol::non_terminal(name)
    }

    fn t(name: &str) -> Symbol {
        Symbol::terminal(name)
    }

    fn set(symbols: &[Symbol]) -> BTreeSet<Symbol> {
        symbols.iter().cloned().collect()
    }

    /// E -> T E'; E' -> + T E' | ε; T -> F T'; T' -> * F T' | ε; F -> ( E ) | id.
    fn expression_grammar() -> Grammar {
        let (e, e_, t, t_, f) = (nt("E"), nt("E'"), nt("T"), nt("T'"), nt("F"));
        let (plus, star, lparen, rparen, id) = (t("+"), t("*"), t("("), t(")"), t("id"));

        let productions = vec![
            Production::new(e.clone(), vec![t.clone(), e_.clone()]),
            Production::new(e_.clone(), vec![plus.clone(), t.clone(), e_.clone()]),
            Production::new(e_.clone(), vec![Symbol::epsilon()]),
            Production::new(t.clone(), vec![f.clone(), t_.clone()]),
            Production::new(t_.clone(), vec![star.clone(), f.clone(), t_.clone()]),
            Production::new(t_.clone(), vec![Symbol::epsilon()]),
            Production::new(f.clone(), vec![lparen.clone(), e.clone(), rparen.clone()]),
            Production::new(f.clone(), vec![id.clone()]),
        ];

        let terminals = set(&[plus, star, lparen, rparen, id]);
        let non_terminals = set(&[e.clone(), e_, t.clone(), t_, f]);

        Grammar::new(productions, terminals, non_terminals, e).unwrap()
    }

    #[test]
    fn expression_grammar_first_sets() {
        let grammar = expression_grammar();
        let analyzer = StaticAnalyzer::new(&grammar);

        let expect_ef = set(&[t("("), t("id")]);
        assert_eq!(analyzer.first(&nt("E")), expect_ef);
        assert_eq!(analyzer.first(&nt("T")), expect_ef);
        assert_eq!(analyzer.first(&nt("F")), expect_ef);
        assert_eq!(analyzer.first(&nt("E'")), set(&[t("+"), Symbol::epsilon()]));
        assert_eq!(analyzer.first(&nt("T'")), set(&[t("*"), Symbol::epsilon()]));
    }

    #[test]
    fn expression_grammar_follow_sets() {
        let grammar = expression_grammar();
        let analyzer = StaticAnalyzer::new(&grammar);

        let expect_e = set(&[t(")"), Symbol::end_of_input()]);
        assert_eq!(analyzer.follow(&nt("E")), expect_e);
        assert_eq!(analyzer.follow(&nt("E'")), expect_e);

        let expect_t = set(&[t("+"), t(")"), Symbol::end_of_input()]);
        assert_eq!(analyzer.follow(&nt("T")), expect_t);
        assert_eq!(analyzer.follow(&nt("T'")), expect_t);

        assert_eq!(
            analyzer.follow(&nt("F")),
            set(&[t("*"), t("+"), t(")"), Symbol::end_of_input()])
        );
    }

    #[test]
    fn grammar_with_an_epsilon_production_first_and_follow_sets() {
        // A -> B a; B -> b | ε.
        let (a, b) = (nt("A"), nt("B"));
        let (a_term, b_term) = (t("a"), t("b"));

        let productions = vec![
            Production::new(a.clone(), vec![b.clone(), a_term.clone()]),
            Production::new(b.clone(), vec![b_term.clone()]),
            Production::new(b.clone(), vec![Symbol::epsilon()]),
        ];

        let terminals = set(&[a_term.clone(), b_term.clone()]);
        let non_terminals = set(&[a.clone(), b.clone()]);
        let grammar = Grammar::new(productions, terminals, non_terminals, a.clone()).unwrap();
        let analyzer = StaticAnalyzer::new(&grammar);

        assert_eq!(analyzer.first(&b), set(&[b_term.clone(), Symbol::epsilon()]));
        assert_eq!(analyzer.first(&a), set(&[b_term.clone(), a_term.clone()]));
        assert_eq!(analyzer.follow(&b), set(&[a_term]));
    }
}
