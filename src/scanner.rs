//! Scanner (C6): maximal-munch tokenization driven by a built DFA.
use std::fmt;

use crate::dfa::Dfa;

/// A recognized lexeme paired with the token id of the DFA state that
/// accepted it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub token_id: String,
    pub lexeme: String,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.token_id, self.lexeme)
    }
}

/// Everything that can go wrong while scanning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// No accepting state was reachable from `position`; `character` is
    /// either outside the alphabet or simply does not continue any lexeme.
    Lexical { position: usize, character: char },
    /// [`Scanner::scan`] was called before [`Scanner::load`].
    NotReady,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Lexical { position, character } => {
                write!(f, "no token recognized at position {position}, character {character:?}")
            }
            Error::NotReady => write!(f, "scanner has no DFA loaded"),
        }
    }
}

impl std::error::Error for Error {}

/// Drives a built DFA over an input string with maximal munch and
/// longest-match priority.
///
/// A `Scanner` is built empty via [`Scanner::new`] and only becomes usable
/// once [`Scanner::load`] installs a DFA — calling [`Scanner::scan`] before
/// that returns [`Error::NotReady`] rather than panicking, since the whole
/// pipeline up through minimization may legitimately run in a separate step
/// from scanning.
pub struct Scanner {
    dfa: Option<Dfa<char>>,
}

impl Scanner {
    pub fn new() -> Self {
        Scanner { dfa: None }
    }

    pub fn load(&mut self, dfa: Dfa<char>) {
        self.dfa = Some(dfa);
    }

    pub fn is_ready(&self) -> bool {
        self.dfa.is_some()
    }

    /// Tokenize `input` in its entirety, stopping at the first
    /// [`Error::Lexical`] failure.
    ///
    /// At each position, walks the DFA as far as transitions are defined,
    /// remembering the last position at which the walker was in an
    /// accepting state. When the walk can go no further, the remembered
    /// accepting position (if any) decides the lexeme: this is maximal
    /// munch, and since the DFA's final-state tagging already resolved
    /// ties in favor of the earliest-registered token during subset
    /// construction and minimization, the scanner itself does no further
    /// tie-breaking.
    pub fn scan(&self, input: &str) -> Result<Vec<Token>, Error> {
        let dfa = self.dfa.as_ref().ok_or(Error::NotReady)?;
        let chars: Vec<char> = input.chars().collect();

        let mut tokens = Vec::new();
        let mut position = 0;

        while position < chars.len() {
            log::trace!("scan: restart at position {position}");
            let mut walker = dfa.start();
            let mut last_accepting: Option<(usize, String)> = None;
            let mut p = position;

            while p < chars.len() {
                let Some(next) = dfa.get(walker, &chars[p]) else { break };
                walker = next;
                if dfa.is_final(walker) {
                    let token_id = dfa.token_id(walker).expect("final state is always tagged").clone();
                    last_accepting = Some((p, token_id));
                }
                p += 1;
            }

            match last_accepting {
                None => {
                    return Err(Error::Lexical { position, character: chars[position] });
                }
                Some((end, token_id)) => {
                    let lexeme: String = chars[position..=end].iter().collect();
                    log::debug!("scan: emit {token_id} {lexeme:?} at [{position}, {end}]");
                    tokens.push(Token { token_id, lexeme });
                    position = end + 1;
                }
            }
        }

        Ok(tokens)
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}
