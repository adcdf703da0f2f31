//! sheetcalc-core - spreadsheet document model + storage.

pub mod document;
pub mod error;
pub mod storage;

pub use document::{DEFAULT_VERSION, NamePolicy, SharedSpreadsheet, Spreadsheet};
pub use error::{Result, SheetError};

pub use sheetcalc_engine::engine::{CellContent, CellName, CellValue};
