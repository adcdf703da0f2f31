//! Formula parsing.
//!
//! Formulas are infix arithmetic over numbers and cell references:
//!
//! ```text
//! expression := term (('+' | '-') term)*
//! term       := factor (('*' | '/') factor)*
//! factor     := number | reference | '(' expression ')'
//! ```
//!
//! Parsing is a single pass over the tokens (operator precedence, no
//! recursion), so nesting depth is bounded only by the input length. A parsed
//! [`Formula`] keeps its postfix program, the distinct cell names it
//! references, and a canonical text form (whitespace removed, references
//! normalized, numbers in shortest form). Two formulas are equal iff their
//! canonical texts are equal.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use thiserror::Error;

use super::cell_name::CellName;
use super::token::{Token, tokenize};

/// Why formula text could not be parsed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaFormatError {
    #[error("formula is empty")]
    Empty,

    #[error("unexpected character {ch:?} at position {position}")]
    UnexpectedCharacter { ch: char, position: usize },

    #[error("malformed number {text:?} at position {position}")]
    InvalidNumber { text: String, position: usize },

    #[error("{text:?} at position {position} is not a cell reference")]
    InvalidToken { text: String, position: usize },

    #[error("invalid variable {0:?}")]
    InvalidVariable(String),

    #[error("unexpected {found:?} at position {position}")]
    UnexpectedToken { found: String, position: usize },

    #[error("parenthesis opened at position {position} is never closed")]
    UnclosedParenthesis { position: usize },

    #[error("unexpected end of formula")]
    UnexpectedEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Subtract => 1,
            BinaryOp::Multiply | BinaryOp::Divide => 2,
        }
    }
}

/// One step of a formula in postfix order.
#[derive(Debug, Clone)]
pub(crate) enum Op {
    Number(f64),
    Variable(CellName),
    Binary(BinaryOp),
}

/// A parsed formula. Cloning is cheap (the program is shared).
#[derive(Clone)]
pub struct Formula {
    inner: Arc<FormulaInner>,
}

struct FormulaInner {
    program: Vec<Op>,
    variables: Vec<CellName>,
    canonical: String,
}

impl Formula {
    /// Parse with the identity normalizer and no extra validity rule.
    pub fn parse(src: &str) -> Result<Formula, FormulaFormatError> {
        Self::parse_with(src, |s| s.to_string(), |_| true)
    }

    /// Parse `src`; every reference is normalized and must then be a cell
    /// name accepted by `is_valid`.
    pub fn parse_with<N, V>(src: &str, normalize: N, is_valid: V) -> Result<Formula, FormulaFormatError>
    where
        N: Fn(&str) -> String,
        V: Fn(&str) -> bool,
    {
        let tokens = tokenize(src, |raw| CellName::parse(raw, &normalize, &is_valid).ok())?;
        if tokens.is_empty() {
            return Err(FormulaFormatError::Empty);
        }

        let canonical: String = tokens.iter().map(|(_, t)| t.to_string()).collect();

        let mut variables: Vec<CellName> = Vec::new();
        for (_, token) in &tokens {
            if let Token::Variable(name) = token {
                if !variables.contains(name) {
                    variables.push(name.clone());
                }
            }
        }

        let program = to_postfix(tokens)?;

        Ok(Formula {
            inner: Arc::new(FormulaInner {
                program,
                variables,
                canonical,
            }),
        })
    }

    /// Distinct referenced cells, in order of first appearance.
    pub fn variables(&self) -> &[CellName] {
        &self.inner.variables
    }

    /// Canonical text (without the leading `=`).
    pub fn as_str(&self) -> &str {
        &self.inner.canonical
    }

    pub(crate) fn program(&self) -> &[Op] {
        &self.inner.program
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.canonical)
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Formula").field(&self.inner.canonical).finish()
    }
}

impl PartialEq for Formula {
    fn eq(&self, other: &Self) -> bool {
        self.inner.canonical == other.inner.canonical
    }
}

impl Eq for Formula {}

impl Hash for Formula {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.canonical.hash(state);
    }
}

enum Pending {
    Operator(BinaryOp),
    Paren(usize),
}

fn unexpected(position: usize, token: &Token) -> FormulaFormatError {
    FormulaFormatError::UnexpectedToken {
        found: token.to_string(),
        position,
    }
}

/// Convert infix tokens to a postfix program.
///
/// Operands and operators must alternate; `expect_operand` tracks which one
/// comes next. Operators of equal precedence associate to the left.
fn to_postfix(tokens: Vec<(usize, Token)>) -> Result<Vec<Op>, FormulaFormatError> {
    let mut output: Vec<Op> = Vec::with_capacity(tokens.len());
    let mut pending: Vec<Pending> = Vec::new();
    let mut expect_operand = true;

    for (position, token) in tokens {
        if expect_operand {
            match token {
                Token::Number(n) => output.push(Op::Number(n)),
                Token::Variable(name) => output.push(Op::Variable(name)),
                Token::LeftParen => {
                    pending.push(Pending::Paren(position));
                    continue;
                }
                other => return Err(unexpected(position, &other)),
            }
            expect_operand = false;
            continue;
        }

        let op = match token {
            Token::Plus => BinaryOp::Add,
            Token::Minus => BinaryOp::Subtract,
            Token::Star => BinaryOp::Multiply,
            Token::Slash => BinaryOp::Divide,
            Token::RightParen => {
                loop {
                    match pending.pop() {
                        Some(Pending::Operator(op)) => output.push(Op::Binary(op)),
                        Some(Pending::Paren(_)) => break,
                        None => return Err(unexpected(position, &Token::RightParen)),
                    }
                }
                continue;
            }
            other => return Err(unexpected(position, &other)),
        };
        while let Some(Pending::Operator(top)) = pending.last() {
            if top.precedence() < op.precedence() {
                break;
            }
            output.push(Op::Binary(*top));
            pending.pop();
        }
        pending.push(Pending::Operator(op));
        expect_operand = true;
    }

    if expect_operand {
        return Err(FormulaFormatError::UnexpectedEnd);
    }
    while let Some(item) = pending.pop() {
        match item {
            Pending::Operator(op) => output.push(Op::Binary(op)),
            Pending::Paren(position) => {
                return Err(FormulaFormatError::UnclosedParenthesis { position });
            }
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(formula: &Formula) -> Vec<&str> {
        formula.variables().iter().map(CellName::as_str).collect()
    }

    #[test]
    fn test_canonical_text_drops_whitespace() {
        let f = Formula::parse(" A1 +  2.50*( B1-3 ) ").unwrap();
        assert_eq!(f.to_string(), "A1+2.5*(B1-3)");
        assert_eq!(f, Formula::parse("A1+2.5*(B1-3)").unwrap());
    }

    #[test]
    fn test_variables_are_distinct_and_ordered() {
        let f = Formula::parse("B1 + A1 * B1 - C1").unwrap();
        assert_eq!(names(&f), vec!["B1", "A1", "C1"]);
    }

    #[test]
    fn test_parse_with_normalizes_references() {
        let f = Formula::parse_with("a1 * b2", |s| s.to_uppercase(), |_| true).unwrap();
        assert_eq!(names(&f), vec!["A1", "B2"]);
        assert_eq!(f.as_str(), "A1*B2");
        assert_eq!(f, Formula::parse("A1*B2").unwrap());
    }

    #[test]
    fn test_parse_with_rejects_invalid_references() {
        let err = Formula::parse_with("A1 + B12", |s| s.to_string(), |s| s.len() == 2).unwrap_err();
        assert_eq!(err, FormulaFormatError::InvalidVariable("B12".to_string()));
    }

    #[test]
    fn test_empty_formula() {
        assert_eq!(Formula::parse("").unwrap_err(), FormulaFormatError::Empty);
        assert_eq!(Formula::parse("   ").unwrap_err(), FormulaFormatError::Empty);
    }

    #[test]
    fn test_malformed_formulas() {
        assert_eq!(Formula::parse("1 +").unwrap_err(), FormulaFormatError::UnexpectedEnd);
        assert!(matches!(
            Formula::parse("(1 + 2").unwrap_err(),
            FormulaFormatError::UnclosedParenthesis { position: 0 }
        ));
        assert!(matches!(
            Formula::parse("1 + 2)").unwrap_err(),
            FormulaFormatError::UnexpectedToken { .. }
        ));
        assert!(matches!(
            Formula::parse("A1 B1").unwrap_err(),
            FormulaFormatError::UnexpectedToken { .. }
        ));
        assert!(matches!(
            Formula::parse("* 2").unwrap_err(),
            FormulaFormatError::UnexpectedToken { .. }
        ));
        assert!(matches!(
            Formula::parse("-2").unwrap_err(),
            FormulaFormatError::UnexpectedToken { .. }
        ));
        assert!(matches!(
            Formula::parse("()").unwrap_err(),
            FormulaFormatError::UnexpectedToken { .. }
        ));
    }

    #[test]
    fn test_number_canonical_form_round_trips() {
        let f = Formula::parse("1.50 + 2e3 + 0.000").unwrap();
        assert_eq!(f.as_str(), "1.5+2000+0");
        assert_eq!(Formula::parse(f.as_str()).unwrap(), f);
    }

    #[test]
    fn test_deep_nesting_parses_without_recursion() {
        let depth = 10_000;
        let src = format!("{}A1{}", "(".repeat(depth), ")".repeat(depth));
        let f = Formula::parse(&src).unwrap();
        assert_eq!(names(&f), vec!["A1"]);
        assert_eq!(f.as_str(), src);

        let unclosed = format!("{}1", "(".repeat(depth));
        assert_eq!(
            Formula::parse(&unclosed).unwrap_err(),
            FormulaFormatError::UnclosedParenthesis { position: depth - 1 }
        );
    }

    #[test]
    fn test_unclosed_parenthesis_reports_innermost_open() {
        assert_eq!(
            Formula::parse("(1 + (2 * 3)").unwrap_err(),
            FormulaFormatError::UnclosedParenthesis { position: 0 }
        );
        assert_eq!(
            Formula::parse("1 * (2 + (3").unwrap_err(),
            FormulaFormatError::UnclosedParenthesis { position: 9 }
        );
    }
}
