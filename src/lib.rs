//! Front-end toolkit for a classroom-style compiler course.
//!
//! The pipeline runs, leaves first:
//!
//! ```text
//! regex text --[regex::to_postfix]--> postfix
//!            --[nfa::NfaBuilder]----> Thompson NFA
//!            --[tokenizer::assemble]-> combined, token-tagged NFA
//!            --[dfa::subset_construct]-> DFA
//!            --[minimize::minimize_by_token_id]--> minimal DFA
//!            --[scanner::Scanner]----> token stream
//! ```
//!
//! [`minimize::minimize_by_token_id`] is the minimizer a [`scanner::Scanner`]
//! should be built from: it never merges two accepting states tagged with
//! different token ids. The plainer [`minimize::minimize`] implements the
//! textbook table-filling algorithm verbatim (finality is the only
//! distinguishing signal), which is what the size/convergence properties in
//! the test suite exercise, but feeding its result straight to a multi-token
//! scanner is unsound whenever one token's language is a superset of
//! another's — every reachable state ends up final, and the single merged
//! partition is labelled with whichever token happened to have the highest
//! priority anywhere in it, for every input.
//!
//! `grammar`/`analysis` are an independent sibling: FIRST/FOLLOW sets over a
//! context-free grammar, computed to a fixed point.
mod deterministic;
mod nondeterministic;

pub mod analysis;
pub mod dfa;
pub mod dot;
pub mod grammar;
pub mod minimize;
pub mod nfa;
pub mod regex;
pub mod scanner;
pub mod tokenizer;

pub use dfa::Target;

use std::fmt::Debug;
use std::hash::Hash;

/// A generic alphabet.
///
/// `Eq`, `Ord`, and `Hash` are assumed to be provided for the finite set to
/// simplify data structures by allowing use of different map and set types.
///
/// An interesting case may be using `Option<A> where A: Alphabet` which
/// provides the possibility to consider an 'anything else' case and an actually
/// infinte alphabet of which the automaton just uses a finite set.
pub trait Alphabet: Hash + Eq + Debug + Clone + Copy + Ord { }

impl<T> Alphabet for T where T: Hash + Eq + Debug + Clone + Copy + Ord { }
