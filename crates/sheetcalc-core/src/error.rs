//! Error types for sheetcalc core.

use std::path::{Path, PathBuf};

use sheetcalc_engine::engine::{CircularReference, FormulaFormatError};
use thiserror::Error;

/// Errors that can occur while editing, saving or loading a spreadsheet.
///
/// Evaluation problems (division by zero, references to text) are not
/// errors; they are stored as `CellValue::Error`.
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("invalid cell name: {0:?}")]
    InvalidName(String),

    #[error("cell content is missing")]
    MissingContent,

    #[error("malformed formula: {0}")]
    FormulaFormat(#[from] FormulaFormatError),

    #[error(transparent)]
    CircularReference(#[from] CircularReference),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed document at byte {position}: {message}")]
    Malformed { position: usize, message: String },

    #[error("version mismatch: expected {expected:?}, document has {found:?}")]
    VersionMismatch { expected: String, found: String },

    #[error("cannot access {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: Box<SheetError>,
    },
}

impl SheetError {
    /// Wrap a failure that happened while reading or writing `path`.
    pub(crate) fn persistence(path: &Path, source: SheetError) -> SheetError {
        match source {
            already @ SheetError::Persistence { .. } => already,
            other => SheetError::Persistence {
                path: path.to_path_buf(),
                source: Box::new(other),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, SheetError>;
