//! Tokenizer Assembler (C3): merge many per-token regexes into one NFA under
//! a shared start state, tagging each per-token accepting state with a
//! [`TokenId`] and its priority.
use std::collections::BTreeMap;

use crate::nfa::{self, Nfa, NfaBuilder};
use crate::regex::Error;

/// A token's name, e.g. `"IF"` or `"ID"`.
pub type TokenId = String;

/// Position in the assembler's input ordering. Lower is higher priority —
/// ties in the DFA (a state tagged by more than one accepting NFA state)
/// are broken in favor of the lowest `TokenPriority`, i.e. whichever regex
/// was registered first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenPriority(pub usize);

/// An NFA state tagged as the accepting state for one token, carrying its
/// id and registration priority.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Accept {
    pub state: usize,
    pub token_id: TokenId,
    pub priority: TokenPriority,
}

/// The combined NFA the assembler produces: one automaton, one shared start
/// state, and every per-token accepting state tagged individually (there is
/// no single accepting state, unlike a freshly Thompson-constructed
/// fragment).
pub struct Tokenizer {
    nfa: Nfa<char>,
    accepts: Vec<Accept>,
}

impl Tokenizer {
    pub fn nfa(&self) -> &Nfa<char> {
        &self.nfa
    }

    pub fn accepts(&self) -> &[Accept] {
        &self.accepts
    }
}

/// Build the combined NFA from a token_id → regex mapping. Key order in
/// `tokens` is the priority order: the first entry is highest priority.
///
/// Every per-token fragment is compiled onto the same shared arena, so
/// merging them under a new start state is just wiring epsilon edges — no
/// state ids need to be remapped.
pub fn assemble<I>(tokens: I) -> Result<Tokenizer, Error>
where
    I: IntoIterator<Item = (TokenId, String)>,
{
    let mut builder: NfaBuilder<char> = NfaBuilder::new();
    let combined_start = builder.node();

    let mut accepts = Vec::new();
    let mut fragment_accepts = BTreeMap::new();

    for (priority, (token_id, regex_text)) in tokens.into_iter().enumerate() {
        let postfix = crate::regex::to_postfix(&regex_text)?;
        let fragment = nfa::compile_postfix(&mut builder, &postfix)?;
        builder.epsilon(combined_start, fragment.start);

        fragment_accepts.insert(fragment.end, ());
        accepts.push(Accept {
            state: fragment.end,
            token_id,
            priority: TokenPriority(priority),
        });
    }

    let automaton = builder.finish();
    let accepting = fragment_accepts.keys().copied().collect();
    let nfa = Nfa::new(automaton, combined_start, accepting);

    Ok(Tokenizer { nfa, accepts })
}
