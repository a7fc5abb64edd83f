//! Full-pipeline integration tests: regex text through to a scanned token
//! stream, and the grammar analyzer, end to end.
use lexfront::dfa::subset_construct;
use lexfront::grammar::{Grammar, Production, Symbol};
use lexfront::minimize::{minimize, minimize_by_token_id};
use lexfront::nfa;
use lexfront::regex;
use lexfront::scanner::{Error as ScanError, Scanner, Token};
use lexfront::tokenizer::{assemble, TokenId};
use lexfront::analysis::StaticAnalyzer;

/// Install the `env_logger` subscriber so a run with `RUST_LOG` set surfaces
/// the `log::trace!`/`debug!` lines emitted throughout the pipeline.
/// `try_init` rather than `init`: every test in this file calls this, and
/// only the first call may actually install the global logger.
fn init_logging() {
    let _ = env_logger::try_init();
}

fn token(id: &str, regex: &str) -> (TokenId, String) {
    (id.to_string(), regex.to_string())
}

// Scanning needs `minimize_by_token_id`, not the plain `minimize`: once more
// than one token is registered, plain `minimize` treats every accepting
// state as equivalent regardless of which token it tags, which silently
// reassigns token identities wherever two tokens' languages overlap.
fn build_scanner(tokens: impl IntoIterator<Item = (TokenId, String)>, alphabet: impl IntoIterator<Item = char>) -> Scanner {
    let tokenizer = assemble(tokens).unwrap();
    let dfa = subset_construct(&tokenizer, alphabet);
    let minimized = minimize_by_token_id(&dfa);
    let mut scanner = Scanner::new();
    scanner.load(minimized);
    scanner
}

#[test]
fn union_and_star_accept_the_expected_strings() {
    init_logging();
    let nfa = nfa::compile("a(b|c)*").unwrap();
    assert!(nfa.accepts(&['a']));
    assert!(nfa.accepts(&['a', 'b', 'c']));
    assert!(nfa.accepts(&['a', 'c', 'b', 'b', 'c']));
    assert!(!nfa.accepts(&[]));
    assert!(!nfa.accepts(&['b']));
}

#[test]
fn keyword_and_identifier_tokens_resolve_by_maximal_munch() {
    init_logging();
    let scanner = build_scanner(
        [token("IF", "if"), token("ID", "(a|b|c|d|e|f|g|h|i|j|k|l|m|n|o|p|q|r|s|t|u|v|w|x|y|z)*")],
        'a'..='z',
    );

    // ID accepts every string IF does and more, so maximal munch never stops
    // at "if" once further identifier characters follow: the whole run
    // lexes as a single ID token, not three keyword matches.
    let tokens = scanner.scan("ififif").unwrap();
    assert_eq!(tokens, vec![Token { token_id: "ID".into(), lexeme: "ififif".into() }]);

    let tokens = scanner.scan("ifx").unwrap();
    assert_eq!(tokens, vec![Token { token_id: "ID".into(), lexeme: "ifx".into() }]);

    let err = scanner.scan("if ").unwrap_err();
    assert_eq!(err, ScanError::Lexical { position: 2, character: ' ' });
}

#[test]
fn shunting_yard_produces_the_expected_postfix() {
    init_logging();
    assert_eq!(regex::to_postfix("a(b|c)*d").unwrap(), "abc|*.d.");
}

#[test]
fn minimization_collapses_to_the_expected_state_count() {
    init_logging();
    let tokenizer = assemble([token("A", "(a|b)*abb")]).unwrap();
    let dfa = subset_construct(&tokenizer, ['a', 'b']);
    let minimized = minimize(&dfa);
    assert_eq!(minimized.node_count(), 5);
}

fn nt(name: &str) -> Symbol {
    Symbol::non_terminal(name)
}

fn t(name: &str) -> Symbol {
    Symbol::terminal(name)
}

#[test]
fn arithmetic_expression_grammar_first_and_follow_sets() {
    init_logging();
    let (e, e_, ty, t_, f) = (nt("E"), nt("E'"), nt("T"), nt("T'"), nt("F"));
    let (plus, star, lparen, rparen, id) = (t("+"), t("*"), t("("), t(")"), t("id"));

    let productions = vec![
        Production::new(e.clone(), vec![ty.clone(), e_.clone()]),
        Production::new(e_.clone(), vec![plus.clone(), ty.clone(), e_.clone()]),
        Production::new(e_.clone(), vec![Symbol::epsilon()]),
        Production::new(ty.clone(), vec![f.clone(), t_.clone()]),
        Production::new(t_.clone(), vec![star.clone(), f.clone(), t_.clone()]),
        Production::new(t_.clone(), vec![Symbol::epsilon()]),
        Production::new(f.clone(), vec![lparen.clone(), e.clone(), rparen.clone()]),
        Production::new(f.clone(), vec![id.clone()]),
    ];

    let terminals = [plus.clone(), star.clone(), lparen.clone(), rparen.clone(), id.clone()]
        .into_iter()
        .collect();
    let non_terminals = [e.clone(), e_.clone(), ty.clone(), t_.clone(), f.clone()].into_iter().collect();

    let grammar = Grammar::new(productions, terminals, non_terminals, e.clone()).unwrap();
    let analyzer = StaticAnalyzer::new(&grammar);

    let ef = [lparen.clone(), id.clone()].into_iter().collect();
    assert_eq!(analyzer.first(&e), ef);
    assert_eq!(analyzer.first(&ty), ef);
    assert_eq!(analyzer.first(&f), ef);
    assert_eq!(analyzer.first(&e_), [plus.clone(), Symbol::epsilon()].into_iter().collect());
    assert_eq!(analyzer.first(&t_), [star.clone(), Symbol::epsilon()].into_iter().collect());

    let follow_e = [rparen.clone(), Symbol::end_of_input()].into_iter().collect();
    assert_eq!(analyzer.follow(&e), follow_e);
    assert_eq!(analyzer.follow(&e_), follow_e);

    let follow_t = [plus.clone(), rparen.clone(), Symbol::end_of_input()].into_iter().collect();
    assert_eq!(analyzer.follow(&ty), follow_t);
    assert_eq!(analyzer.follow(&t_), follow_t);

    assert_eq!(
        analyzer.follow(&f),
        [star, plus, rparen, Symbol::end_of_input()].into_iter().collect()
    );
}

#[test]
fn grammar_with_an_epsilon_production_first_and_follow_sets() {
    init_logging();
    let (a, b) = (nt("A"), nt("B"));
    let (a_term, b_term) = (t("a"), t("b"));

    let productions = vec![
        Production::new(a.clone(), vec![b.clone(), a_term.clone()]),
        Production::new(b.clone(), vec![b_term.clone()]),
        Production::new(b.clone(), vec![Symbol::epsilon()]),
    ];

    let terminals = [a_term.clone(), b_term.clone()].into_iter().collect();
    let non_terminals = [a.clone(), b.clone()].into_iter().collect();
    let grammar = Grammar::new(productions, terminals, non_terminals, a.clone()).unwrap();
    let analyzer = StaticAnalyzer::new(&grammar);

    assert_eq!(analyzer.first(&b), [b_term.clone(), Symbol::epsilon()].into_iter().collect());
    assert_eq!(analyzer.first(&a), [b_term.clone(), a_term.clone()].into_iter().collect());
    assert_eq!(analyzer.follow(&b), [a_term].into_iter().collect());
}
