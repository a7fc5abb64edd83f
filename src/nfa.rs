//! Thompson's construction (C2): postfix regex notation to an epsilon-NFA.
//!
//! [`NfaBuilder`] wraps a [`crate::nondeterministic::Builder`] so several
//! independent regex fragments can be compiled onto one shared arena — the
//! tokenizer assembler relies on this to graft per-token fragments together
//! without renumbering any state.
//!
//! [`Nfa`] is the frozen result: an immutable automaton, its start state, and
//! its accepting states. [`Nfa::accepts`] is the direct NFA simulator (C8),
//! used by tests to cross-check the DFA pipeline rather than by the scanner
//! itself.
use std::collections::BTreeSet;
use std::fmt::Display;
use std::io::{self, Write};

use crate::Alphabet;
use crate::dot::{Edge as DotEdge, Family, GraphWriter, Node as DotNode};
use crate::nondeterministic::{Builder, NonDeterministic};
use crate::regex::{self, Error};

/// An in-progress NFA: nodes and edges accumulate here across possibly many
/// [`compile_postfix`] calls before being frozen by [`NfaBuilder::finish`].
pub struct NfaBuilder<A> {
    arena: Builder<A>,
}

/// The entry and exit state of one Thompson fragment.
///
/// A fragment's `end` is only meaningful to its immediate caller: as soon as
/// it is consumed by an enclosing operator the old end is superseded by a
/// new one, so no explicit "un-final" bookkeeping is needed during
/// construction — only the final, outermost fragment's `end` is ever handed
/// to a caller as an accepting state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fragment {
    pub start: usize,
    pub end: usize,
}

impl<A> NfaBuilder<A> {
    pub fn new() -> Self {
        NfaBuilder { arena: Builder::new() }
    }
}

impl<A> Default for NfaBuilder<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Alphabet> NfaBuilder<A> {
    /// Allocate a fresh state in the shared arena.
    pub fn node(&mut self) -> usize {
        self.arena.node()
    }

    /// Add an epsilon transition.
    pub fn epsilon(&mut self, from: usize, to: usize) {
        self.arena.insert(from, None, to);
    }

    /// Add a character-guarded transition.
    pub fn edge(&mut self, from: usize, character: &A, to: usize) {
        self.arena.insert(from, Some(character), to);
    }

    pub fn node_count(&self) -> usize {
        self.arena.node_count()
    }

    /// Freeze the arena built so far into an immutable automaton.
    pub fn finish(&self) -> NonDeterministic<A> {
        self.arena.finish()
    }
}

/// Walk one postfix-notation regex and compile it onto `builder`, following
/// the construction rules for each operator: `.` concatenation, `|` union,
/// `*` Kleene star, `+` one-or-more, `?` optional; every other character is
/// an operand producing a two-state, single-edge fragment.
///
/// Returns the fragment left on the stack. Per the postfix invariant, the
/// stack must contain exactly one fragment once the input is exhausted.
pub fn compile_postfix(builder: &mut NfaBuilder<char>, postfix: &str) -> Result<Fragment, Error> {
    let mut stack: Vec<Fragment> = Vec::new();

    for token in postfix.chars() {
        log::trace!("thompson construction: token '{token}', stack depth {}", stack.len());
        match token {
            '.' => {
                let right = pop(&mut stack, '.')?;
                let left = pop(&mut stack, '.')?;
                builder.epsilon(left.end, right.start);
                stack.push(Fragment { start: left.start, end: right.end });
            }
            '|' => {
                let right = pop(&mut stack, '|')?;
                let left = pop(&mut stack, '|')?;
                let s = builder.node();
                let e = builder.node();
                builder.epsilon(s, left.start);
                builder.epsilon(s, right.start);
                builder.epsilon(left.end, e);
                builder.epsilon(right.end, e);
                stack.push(Fragment { start: s, end: e });
            }
            '*' => {
                let top = pop(&mut stack, '*')?;
                let s = builder.node();
                let e = builder.node();
                builder.epsilon(top.end, top.start);
                builder.epsilon(top.end, e);
                builder.epsilon(s, top.start);
                builder.epsilon(s, e);
                stack.push(Fragment { start: s, end: e });
            }
            '+' => {
                let top = pop(&mut stack, '+')?;
                let s = builder.node();
                let e = builder.node();
                builder.epsilon(s, top.start);
                builder.epsilon(top.end, top.start);
                builder.epsilon(top.end, e);
                stack.push(Fragment { start: s, end: e });
            }
            '?' => {
                let top = pop(&mut stack, '?')?;
                let s = builder.node();
                let e = builder.node();
                builder.epsilon(s, top.start);
                builder.epsilon(top.end, e);
                builder.epsilon(s, e);
                stack.push(Fragment { start: s, end: e });
            }
            c => {
                let s = builder.node();
                let e = builder.node();
                builder.edge(s, &c, e);
                stack.push(Fragment { start: s, end: e });
            }
        }
    }

    match stack.len() {
        1 => {
            let fragment = stack.pop().unwrap();
            log::debug!("thompson construction: done, fragment {}..{}", fragment.start, fragment.end);
            Ok(fragment)
        }
        remaining => Err(Error::DanglingOperator { remaining }),
    }
}

fn pop(stack: &mut Vec<Fragment>, operator: char) -> Result<Fragment, Error> {
    stack.pop().ok_or(Error::EmptyOperand { operator })
}

/// Compile a single infix regex straight through to a frozen NFA: shunting
/// yard, then Thompson's construction, marking the lone surviving fragment's
/// end state as the sole accepting state.
pub fn compile(regex_text: &str) -> Result<Nfa<char>, Error> {
    let postfix = regex::to_postfix(regex_text)?;
    let mut builder = NfaBuilder::new();
    let fragment = compile_postfix(&mut builder, &postfix)?;
    let automaton = builder.finish();

    let mut accepting = BTreeSet::new();
    accepting.insert(fragment.end);

    Ok(Nfa::new(automaton, fragment.start, accepting))
}

/// A frozen epsilon-NFA: an automaton, its start state, and the set of
/// states tagged accepting. Token identity (for the combined, multi-regex
/// automaton the tokenizer assembler builds) is layered on top by
/// [`crate::tokenizer`] rather than stored here — a bare `Nfa` only answers
/// "does this automaton accept".
pub struct Nfa<A: Alphabet> {
    automaton: NonDeterministic<A>,
    start: usize,
    accepting: BTreeSet<usize>,
}

impl<A: Alphabet> Nfa<A> {
    pub fn new(automaton: NonDeterministic<A>, start: usize, accepting: BTreeSet<usize>) -> Self {
        Nfa { automaton, start, accepting }
    }

    pub fn automaton(&self) -> &NonDeterministic<A> {
        &self.automaton
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn accepting(&self) -> &BTreeSet<usize> {
        &self.accepting
    }

    /// Direct NFA acceptance check (C8): repeatedly closes over epsilon
    /// transitions and moves on each input character; accepts iff the final
    /// closure intersects the accepting set.
    pub fn accepts(&self, input: &[A]) -> bool {
        let mut states = self.automaton.epsilon_closure([self.start]);

        for character in input {
            if states.is_empty() {
                return false;
            }
            let moved = self.automaton.mov(&states, character);
            states = self.automaton.epsilon_closure(moved);
        }

        states.iter().any(|state| self.accepting.contains(state))
    }

    /// Write the automaton into the dot format, marking accepting states
    /// with a double border.
    pub fn write_to(&self, output: &mut dyn Write) -> io::Result<()>
    where
        for<'a> &'a A: Display,
    {
        let mut writer = GraphWriter::new(output, Family::Directed, None)?;

        for from in 0..self.automaton.node_count() {
            for (label, to) in self.automaton.edges(from) {
                let edge = DotEdge {
                    label: Some(match label {
                        Some(character) => format!("{}", character).into(),
                        None => "\u{3b5}".into(),
                    }),
                    ..DotEdge::none()
                };
                writer.segment([from, to].iter().cloned(), Some(edge))?;
            }
        }

        for &state in &self.accepting {
            let node = DotNode {
                peripheries: Some(2),
                ..DotNode::none()
            };
            writer.node(state.into(), Some(node))?;
        }

        writer.end_into_inner().1
    }
}
