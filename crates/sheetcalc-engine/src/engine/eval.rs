//! Formula evaluation.
//!
//! Evaluation never panics and never returns a "hard" failure: a formula
//! either produces a number or a [`FormulaError`] describing why it could
//! not, which callers store as the cell's value.

use thiserror::Error;

use super::cell_name::CellName;
use super::formula::{BinaryOp, Formula, Op};

/// Why a formula could not produce a number.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("{name}: {source}")]
    Reference {
        name: CellName,
        #[source]
        source: LookupError,
    },
}

/// Why a referenced cell could not be read as a number.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    #[error("cell is empty")]
    Empty,

    #[error("cell does not contain a number or formula")]
    NotNumeric,

    #[error("cell has a formula error ({0})")]
    Errored(Box<FormulaError>),
}

impl Formula {
    /// Evaluate with `lookup` resolving every referenced cell.
    ///
    /// Operands are evaluated left to right and the first error wins.
    pub fn evaluate<F>(&self, mut lookup: F) -> Result<f64, FormulaError>
    where
        F: FnMut(&CellName) -> Result<f64, LookupError>,
    {
        let mut stack: Vec<f64> = Vec::new();
        for op in self.program() {
            let value = match op {
                Op::Number(n) => *n,
                Op::Variable(name) => lookup(name).map_err(|source| FormulaError::Reference {
                    name: name.clone(),
                    source,
                })?,
                Op::Binary(binary) => {
                    // The parser only emits programs that leave two operands here.
                    let r = stack.pop().unwrap_or_default();
                    let l = stack.pop().unwrap_or_default();
                    apply(*binary, l, r)?
                }
            };
            stack.push(value);
        }
        Ok(stack.pop().unwrap_or_default())
    }
}

fn apply(op: BinaryOp, l: f64, r: f64) -> Result<f64, FormulaError> {
    match op {
        BinaryOp::Add => Ok(l + r),
        BinaryOp::Subtract => Ok(l - r),
        BinaryOp::Multiply => Ok(l * r),
        BinaryOp::Divide if r == 0.0 => Err(FormulaError::DivisionByZero),
        BinaryOp::Divide => Ok(l / r),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_vars(_: &CellName) -> Result<f64, LookupError> {
        Err(LookupError::Empty)
    }

    #[test]
    fn test_precedence_and_associativity() {
        let f = Formula::parse("2 + 3 * 4 - 10 / 5 / 2").unwrap();
        assert_eq!(f.evaluate(no_vars), Ok(2.0 + 12.0 - 1.0));

        let f = Formula::parse("(2 + 3) * 4").unwrap();
        assert_eq!(f.evaluate(no_vars), Ok(20.0));

        let f = Formula::parse("10 - 4 - 3").unwrap();
        assert_eq!(f.evaluate(no_vars), Ok(3.0));
    }

    #[test]
    fn test_variables_resolve_through_lookup() {
        let values: HashMap<&str, f64> = [("A1", 5.2), ("B1", 2.3)].into_iter().collect();
        let f = Formula::parse("A1 + B1 * 2").unwrap();
        let result = f.evaluate(|name| values.get(name.as_str()).copied().ok_or(LookupError::Empty));
        assert_eq!(result, Ok(5.2 + 2.3 * 2.0));
    }

    #[test]
    fn test_division_by_zero_is_an_error_value() {
        let f = Formula::parse("3.1 / 0").unwrap();
        assert_eq!(f.evaluate(no_vars), Err(FormulaError::DivisionByZero));

        let f = Formula::parse("3.1 / (2 - 2)").unwrap();
        assert_eq!(f.evaluate(no_vars), Err(FormulaError::DivisionByZero));
    }

    #[test]
    fn test_failed_lookup_names_the_reference() {
        let f = Formula::parse("1 + C1").unwrap();
        let err = f.evaluate(|_| Err(LookupError::NotNumeric)).unwrap_err();
        assert_eq!(
            err,
            FormulaError::Reference {
                name: CellName::from_str("C1").unwrap(),
                source: LookupError::NotNumeric,
            }
        );
        assert_eq!(err.to_string(), "C1: cell does not contain a number or formula");
    }

    #[test]
    fn test_lookup_is_called_in_reading_order() {
        let f = Formula::parse("B1 * A1 + C1").unwrap();
        let mut seen = Vec::new();
        let _ = f.evaluate(|name| {
            seen.push(name.to_string());
            Ok(1.0)
        });
        assert_eq!(seen, vec!["B1", "A1", "C1"]);
    }

    #[test]
    fn test_long_and_deeply_nested_formulas_evaluate() {
        let chain = vec!["1"; 20_000].join("+");
        assert_eq!(Formula::parse(&chain).unwrap().evaluate(no_vars), Ok(20_000.0));

        let depth = 10_000;
        let nested = format!("{}2{}*3", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(Formula::parse(&nested).unwrap().evaluate(no_vars), Ok(6.0));
    }

    #[test]
    fn test_first_error_wins() {
        let f = Formula::parse("1 / 0 + C1").unwrap();
        let mut looked_up = false;
        let result = f.evaluate(|_| {
            looked_up = true;
            Ok(1.0)
        });
        assert_eq!(result, Err(FormulaError::DivisionByZero));
        assert!(!looked_up);
    }
}
