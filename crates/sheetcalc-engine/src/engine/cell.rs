//! Cell data structures.
//!
//! - [`CellContent`] - what the user typed, classified (number, text or formula)
//! - [`CellValue`] - what the cell evaluates to
//! - [`Cell`] - content plus the cached value and its staleness flag

use super::cell_name::CellName;
use super::eval::FormulaError;
use super::formula::Formula;

/// The content stored in a cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellContent {
    Number(f64),
    Text(String),
    Formula(Formula),
}

impl CellContent {
    /// Empty text is how a cell is cleared.
    pub fn is_empty(&self) -> bool {
        matches!(self, CellContent::Text(s) if s.is_empty())
    }

    /// Cells this content reads from. Only formulas have any.
    pub fn dependees(&self) -> Vec<CellName> {
        match self {
            CellContent::Formula(f) => f.variables().to_vec(),
            _ => Vec::new(),
        }
    }

    /// The raw text that reproduces this content when entered again.
    pub fn to_input_string(&self) -> String {
        match self {
            CellContent::Number(n) => n.to_string(),
            CellContent::Text(s) => s.clone(),
            CellContent::Formula(f) => format!("={}", f),
        }
    }
}

/// The evaluated value of a cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Error(FormulaError),
}

impl CellValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CellValue::Error(_))
    }
}

/// A stored cell.
///
/// Number and text cells carry their value from construction and are never
/// stale. Formula cells start stale and are recomputed on the next read after
/// every invalidation.
#[derive(Clone, Debug)]
pub struct Cell {
    contents: CellContent,
    cached_value: Option<CellValue>,
    needs_recalculation: bool,
}

impl Cell {
    pub fn new(contents: CellContent) -> Cell {
        let cached_value = match &contents {
            CellContent::Number(n) => Some(CellValue::Number(*n)),
            CellContent::Text(s) => Some(CellValue::Text(s.clone())),
            CellContent::Formula(_) => None,
        };
        let needs_recalculation = cached_value.is_none();
        Cell {
            contents,
            cached_value,
            needs_recalculation,
        }
    }

    pub fn contents(&self) -> &CellContent {
        &self.contents
    }

    pub fn formula(&self) -> Option<&Formula> {
        match &self.contents {
            CellContent::Formula(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        self.needs_recalculation
    }

    /// The cached value, if it is still current.
    pub fn fresh_value(&self) -> Option<&CellValue> {
        if self.needs_recalculation {
            None
        } else {
            self.cached_value.as_ref()
        }
    }

    /// Invalidate the cached value. No-op for number and text cells.
    pub fn mark_stale(&mut self) {
        if self.formula().is_some() {
            self.needs_recalculation = true;
        }
    }

    /// Store a freshly computed value for a formula cell.
    pub fn store_value(&mut self, value: CellValue) {
        if self.formula().is_some() {
            self.cached_value = Some(value);
            self.needs_recalculation = false;
        }
    }
}
