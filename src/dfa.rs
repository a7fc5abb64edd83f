//! Subset Constructor (C4): turn a combined, token-tagged NFA into a DFA by
//! the classic epsilon-closure/move worklist algorithm.
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt::Display;
use std::io::{self, Write};

use crate::Alphabet;
use crate::deterministic::Deterministic;
use crate::tokenizer::{TokenId, TokenPriority, Tokenizer};

pub use crate::deterministic::Target;

/// A deterministic automaton with final states tagged by token id, built by
/// subset construction over a combined NFA.
pub struct Dfa<A: Alphabet> {
    automaton: Deterministic<A>,
    start: Target,
    finals: BTreeSet<Target>,
    token_ids: HashMap<Target, TokenId>,
    /// Registration priority of every token id seen during assembly, carried
    /// along so the minimizer can break ties when its token-id refinement
    /// merges two DFA states whose NFA-accept origin carried different tags.
    token_priority: HashMap<TokenId, TokenPriority>,
}

impl<A: Alphabet> Dfa<A> {
    pub fn start(&self) -> Target {
        self.start
    }

    pub fn node_count(&self) -> usize {
        self.automaton.node_count()
    }

    pub fn alphabet(&self) -> &[A] {
        self.automaton.alphabet()
    }

    pub fn get(&self, from: Target, character: &A) -> Option<Target> {
        self.automaton.get(from, character)
    }

    pub fn is_final(&self, state: Target) -> bool {
        self.finals.contains(&state)
    }

    pub fn token_id(&self, state: Target) -> Option<&TokenId> {
        self.token_ids.get(&state)
    }

    pub fn finals(&self) -> &BTreeSet<Target> {
        &self.finals
    }

    pub(crate) fn token_priority(&self) -> &HashMap<TokenId, TokenPriority> {
        &self.token_priority
    }

    /// Build directly from the pieces a minimizer reconstructs: used by
    /// [`crate::minimize`] to hand back a fresh `Dfa` after collapsing
    /// equivalence classes.
    pub(crate) fn from_parts(
        automaton: Deterministic<A>,
        start: Target,
        finals: BTreeSet<Target>,
        token_ids: HashMap<Target, TokenId>,
        token_priority: HashMap<TokenId, TokenPriority>,
    ) -> Self {
        Dfa { automaton, start, finals, token_ids, token_priority }
    }

    pub fn write_to(&self, output: &mut dyn Write) -> io::Result<()>
    where
        for<'a> &'a A: Display,
    {
        self.automaton.write_to(output)
    }
}

/// Subset-construct a DFA from `tokenizer`'s combined NFA over `alphabet`.
///
/// A DFA state is final iff any NFA state in its ε-closure set is final;
/// when several accepting NFA states land in the same DFA state, the one
/// with the numerically lowest priority (earliest registered) wins.
pub fn subset_construct<I>(tokenizer: &Tokenizer, alphabet: I) -> Dfa<char>
where
    I: IntoIterator<Item = char>,
{
    let nfa = tokenizer.nfa();
    let automaton = nfa.automaton();

    let accept_priority: HashMap<usize, usize> = tokenizer
        .accepts()
        .iter()
        .enumerate()
        .map(|(index, accept)| (accept.state, index))
        .collect();

    let mut dfa = Deterministic::<char>::new(alphabet);
    let mut seen: HashMap<BTreeSet<usize>, Target> = HashMap::new();
    let mut worklist: VecDeque<BTreeSet<usize>> = VecDeque::new();

    let start_set = automaton.epsilon_closure([nfa.start()]);
    let start_target = dfa.node();
    seen.insert(start_set.clone(), start_target);
    worklist.push_back(start_set);

    let chars: Vec<char> = dfa.alphabet().to_vec();

    while let Some(set) = worklist.pop_front() {
        let from = seen[&set];
        log::trace!("subset construction: pop state {} ({} nfa states)", from.index(), set.len());

        for character in &chars {
            let moved = automaton.mov(&set, character);
            if moved.is_empty() {
                continue;
            }
            let closure = automaton.epsilon_closure(moved);

            let to = match seen.get(&closure) {
                Some(&target) => target,
                None => {
                    let target = dfa.node();
                    log::trace!("subset construction: enqueue new state {}", target.index());
                    seen.insert(closure.clone(), target);
                    worklist.push_back(closure.clone());
                    target
                }
            };

            dfa.set(from, character, to);
        }
    }
    log::debug!("subset construction: {} dfa states", seen.len());

    let mut finals = BTreeSet::new();
    let mut token_ids = HashMap::new();

    for (set, &target) in &seen {
        if let Some(accept) = winning_accept(set, tokenizer, &accept_priority) {
            finals.insert(target);
            token_ids.insert(target, accept.token_id.clone());
        }
    }

    let token_priority = tokenizer
        .accepts()
        .iter()
        .map(|accept| (accept.token_id.clone(), accept.priority))
        .collect();

    Dfa::from_parts(dfa, start_target, finals, token_ids, token_priority)
}

fn winning_accept<'a>(
    set: &BTreeSet<usize>,
    tokenizer: &'a Tokenizer,
    accept_priority: &HashMap<usize, usize>,
) -> Option<&'a crate::tokenizer::Accept> {
    set.iter()
        .filter_map(|state| accept_priority.get(state).map(|&index| &tokenizer.accepts()[index]))
        .min_by_key(|accept| accept.priority)
}
