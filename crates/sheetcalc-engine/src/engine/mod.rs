//! Spreadsheet engine API.
//!
//! This module provides the computation pieces the document model is built on:
//!
//! - [`CellName`] - Validated, normalized cell names
//! - [`Cell`], [`CellContent`], [`CellValue`] - Cell records and their values
//! - [`Formula`] - Formula parsing, referenced cells and evaluation
//! - [`DependencyGraph`] - Which cells read which
//! - [`cells_to_recalculate`] - Recalculation order and circular reference detection
//! - [`format_value`] - Format values for display

mod cell;
mod cell_name;
mod eval;
mod format;
mod formula;
mod graph;
mod recalc;
mod token;

pub use cell::{Cell, CellContent, CellValue};
pub use cell_name::{CellName, InvalidCellName, is_cell_name};
pub use eval::{FormulaError, LookupError};
pub use format::{format_number, format_value};
pub use formula::{Formula, FormulaFormatError};
pub use graph::DependencyGraph;
pub use recalc::{CircularReference, cells_to_recalculate, cells_to_recalculate_all};
