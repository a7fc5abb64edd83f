//! Infix-to-postfix conversion (shunting yard) for the regex dialect this
//! front-end accepts.
//!
//! Recognized operators: `|` union, `*` Kleene star, `+` one-or-more, `?`
//! zero-or-one, `(`/`)` grouping, and `.` explicit concatenation — `.` is
//! never typed by a caller, it is injected by [`insert_concatenation_operator`]
//! wherever two adjacent regex characters denote an implicit juxtaposition.
//! Every other character is an operand.
use std::fmt;

const UNION: char = '|';
const STAR: char = '*';
const PLUS: char = '+';
const OPTIONAL: char = '?';
const CONCAT: char = '.';
const LPAREN: char = '(';
const RPAREN: char = ')';

/// The single error kind for everything that can go wrong compiling a regex,
/// from infix parsing through Thompson's construction of the NFA.
///
/// Malformed-regex failures span both phases (an empty operand or a dangling
/// operator only surfaces once the postfix string is walked by the NFA
/// builder), so one error type is shared across `regex` and `nfa` rather than
/// introducing a second, phase-specific kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// A `(` was never closed, or a `)` had no matching `(`.
    UnbalancedParenthesis,
    /// `.` was used as a regex operand; it is reserved for injected concatenation.
    ReservedOperandCharacter,
    /// A unary or binary operator found too few operands on the construction stack.
    EmptyOperand { operator: char },
    /// The postfix expression did not reduce to exactly one NFA fragment.
    DanglingOperator { remaining: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnbalancedParenthesis => write!(f, "unbalanced parenthesis in regex"),
            Error::ReservedOperandCharacter => {
                write!(f, "'.' is reserved for injected concatenation and cannot be an operand")
            }
            Error::EmptyOperand { operator } => {
                write!(f, "operator '{operator}' has no operand on the construction stack")
            }
            Error::DanglingOperator { remaining } => {
                write!(f, "postfix expression left {remaining} fragments on the stack, expected 1")
            }
        }
    }
}

impl std::error::Error for Error {}

fn is_operand(c: char) -> bool {
    !matches!(c, UNION | STAR | PLUS | OPTIONAL | CONCAT | LPAREN | RPAREN)
}

fn precedence(op: char) -> u8 {
    match op {
        STAR => 4,
        PLUS => 3,
        CONCAT => 2,
        UNION => 1,
        _ => 0,
    }
}

/// Scan left to right and inject an explicit `.` between positions `i` and
/// `i+1` whenever the left character is an operand, a unary postfix operator
/// (`*`, `+`, `?`), or `)`, and the right character is an operand or `(`.
///
/// These are the only adjacent pairings that denote an implicit juxtaposition
/// rather than an explicit operator relationship.
pub fn insert_concatenation_operator(regex: &str) -> Result<String, Error> {
    let chars: Vec<char> = regex.chars().collect();
    if chars.contains(&CONCAT) {
        return Err(Error::ReservedOperandCharacter);
    }

    let mut out = String::with_capacity(chars.len() * 2);
    for (i, &c) in chars.iter().enumerate() {
        out.push(c);
        if let Some(&next) = chars.get(i + 1) {
            let left_denotes_value = is_operand(c) || matches!(c, STAR | PLUS | OPTIONAL) || c == RPAREN;
            let right_starts_value = is_operand(next) || next == LPAREN;
            if left_denotes_value && right_starts_value {
                out.push(CONCAT);
            }
        }
    }
    Ok(out)
}

/// Convert an infix regex (with implicit concatenation) to postfix.
///
/// Applies [`insert_concatenation_operator`] first, then a standard shunting
/// yard pass: operands go straight to the output, `(` is pushed, `)` drains
/// the stack to the matching `(`, and on any other operator the stack is
/// popped while its top has precedence `>=` the incoming operator (all
/// operators are left-associative). The stack is drained to the output once
/// the input is exhausted.
pub fn to_postfix(regex: &str) -> Result<String, Error> {
    let with_concat = insert_concatenation_operator(regex)?;
    log::debug!("shunting yard: {regex:?} -> {with_concat:?} after concatenation insertion");
    let mut output = String::with_capacity(with_concat.len());
    let mut ops: Vec<char> = Vec::new();

    for c in with_concat.chars() {
        if is_operand(c) {
            output.push(c);
        } else if c == LPAREN {
            ops.push(c);
        } else if c == RPAREN {
            loop {
                match ops.pop() {
                    Some(LPAREN) => break,
                    Some(op) => {
                        log::trace!("shunting yard: drain '{op}' on ')'");
                        output.push(op);
                    }
                    None => return Err(Error::UnbalancedParenthesis),
                }
            }
        } else {
            while let Some(&top) = ops.last() {
                if top != LPAREN && precedence(top) >= precedence(c) {
                    log::trace!("shunting yard: pop '{top}' before pushing '{c}'");
                    output.push(ops.pop().unwrap());
                } else {
                    break;
                }
            }
            ops.push(c);
        }
    }

    while let Some(op) = ops.pop() {
        if op == LPAREN {
            return Err(Error::UnbalancedParenthesis);
        }
        output.push(op);
    }

    log::debug!("shunting yard: {regex:?} -> postfix {output:?}");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenation_wraps_groups_and_stars() {
        assert_eq!(insert_concatenation_operator("ab").unwrap(), "a.b");
        assert_eq!(insert_concatenation_operator("a(b|c)").unwrap(), "a.(b|c)");
        assert_eq!(insert_concatenation_operator("a*b").unwrap(), "a*.b");
        assert_eq!(insert_concatenation_operator("a(b|c)*d").unwrap(), "a.(b|c)*.d");
    }

    #[test]
    fn reserved_concat_char_as_operand_is_rejected() {
        assert_eq!(insert_concatenation_operator("a.b"), Err(Error::ReservedOperandCharacter));
    }

    #[test]
    fn postfix_matches_the_worked_example() {
        // `a(b|c)*d` -> `abc|*.d.`
        assert_eq!(to_postfix("a(b|c)*d").unwrap(), "abc|*.d.");
    }

    #[test]
    fn plus_binds_tighter_than_concatenation() {
        // `a+b` groups as `(a+)b`, i.e. postfix `a+b.`.
        assert_eq!(to_postfix("a+b").unwrap(), "a+b.");
    }

    #[test]
    fn union_has_lowest_precedence() {
        assert_eq!(to_postfix("ab|c").unwrap(), "a.b.c|");
    }

    #[test]
    fn unbalanced_parenthesis_is_an_error() {
        assert_eq!(to_postfix("(a"), Err(Error::UnbalancedParenthesis));
        assert_eq!(to_postfix("a)"), Err(Error::UnbalancedParenthesis));
    }

    #[test]
    fn nested_groups_drain_to_matching_paren() {
        assert_eq!(to_postfix("((a|b))c").unwrap(), "ab|c.");
    }
}
