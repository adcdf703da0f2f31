//! Formula tokenizer.
//!
//! Splits formula text into numbers, cell references, the four arithmetic
//! operators and parentheses. Whitespace separates tokens and is otherwise
//! dropped. Cell references are resolved (normalized and validated) here so
//! the parser only ever sees names the document accepts.

use std::fmt;

use super::cell_name::CellName;
use super::formula::FormulaFormatError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Variable(CellName),
    Plus,
    Minus,
    Star,
    Slash,
    LeftParen,
    RightParen,
}

/// Canonical spelling, used to build the formula's normalized text.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Variable(name) => write!(f, "{}", name),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::LeftParen => f.write_str("("),
            Token::RightParen => f.write_str(")"),
        }
    }
}

/// Tokenize `src`, pairing each token with its byte offset.
pub(crate) fn tokenize<R>(src: &str, resolve: R) -> Result<Vec<(usize, Token)>, FormulaFormatError>
where
    R: Fn(&str) -> Option<CellName>,
{
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let start = i;

        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let simple = match b {
            b'+' => Some(Token::Plus),
            b'-' => Some(Token::Minus),
            b'*' => Some(Token::Star),
            b'/' => Some(Token::Slash),
            b'(' => Some(Token::LeftParen),
            b')' => Some(Token::RightParen),
            _ => None,
        };
        if let Some(token) = simple {
            tokens.push((start, token));
            i += 1;
            continue;
        }

        if b.is_ascii_digit() || b == b'.' {
            i = scan_number(bytes, i);
            let text = &src[start..i];
            let value = text
                .parse::<f64>()
                .map_err(|_| FormulaFormatError::InvalidNumber {
                    text: text.to_string(),
                    position: start,
                })?;
            tokens.push((start, Token::Number(value)));
            continue;
        }

        if b.is_ascii_alphabetic() {
            while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                i += 1;
            }
            let letters_end = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let text = &src[start..i];
            if i == letters_end {
                return Err(FormulaFormatError::InvalidToken {
                    text: text.to_string(),
                    position: start,
                });
            }
            let name = resolve(text)
                .ok_or_else(|| FormulaFormatError::InvalidVariable(text.to_string()))?;
            tokens.push((start, Token::Variable(name)));
            continue;
        }

        let ch = src[start..].chars().next().unwrap_or('\u{FFFD}');
        return Err(FormulaFormatError::UnexpectedCharacter {
            ch,
            position: start,
        });
    }

    Ok(tokens)
}

/// Digits, an optional fraction and an optional exponent. The exponent is
/// only consumed when at least one digit follows it.
fn scan_number(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            i = j;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Result<Vec<Token>, FormulaFormatError> {
        tokenize(src, CellName::from_str).map(|tokens| tokens.into_iter().map(|(_, t)| t).collect())
    }

    #[test]
    fn test_numbers_with_fraction_and_exponent() {
        assert_eq!(
            lex("1 2.5 .5 2e3 1.5E-2").unwrap(),
            vec![
                Token::Number(1.0),
                Token::Number(2.5),
                Token::Number(0.5),
                Token::Number(2000.0),
                Token::Number(0.015),
            ]
        );
    }

    #[test]
    fn test_exponent_requires_digits() {
        // "2e" is not a number followed by an exponent; "e" alone is not a reference.
        assert!(matches!(
            lex("2e"),
            Err(FormulaFormatError::InvalidToken { .. })
        ));
    }

    #[test]
    fn test_references_and_operators() {
        let a1 = CellName::from_str("A1").unwrap();
        assert_eq!(
            lex("(A1*2)").unwrap(),
            vec![
                Token::LeftParen,
                Token::Variable(a1),
                Token::Star,
                Token::Number(2.0),
                Token::RightParen,
            ]
        );
    }

    #[test]
    fn test_rejects_unknown_characters() {
        assert_eq!(
            lex("A1 $ 2"),
            Err(FormulaFormatError::UnexpectedCharacter {
                ch: '$',
                position: 3
            })
        );
        assert!(matches!(lex("A1 ^ 2"), Err(FormulaFormatError::UnexpectedCharacter { ch: '^', .. })));
    }

    #[test]
    fn test_lone_dot_is_malformed_number() {
        assert!(matches!(lex("."), Err(FormulaFormatError::InvalidNumber { .. })));
    }

    #[test]
    fn test_resolver_rejection_is_invalid_variable() {
        let result = tokenize("A1 + B1", |raw| {
            CellName::from_str(raw).filter(|name| name.as_str().starts_with('A'))
        });
        assert_eq!(result, Err(FormulaFormatError::InvalidVariable("B1".to_string())));
    }
}
