//! Spreadsheet document: storage, editing and persistence.

mod io;
mod ops;
mod shared;
mod state;
mod store;

pub use shared::SharedSpreadsheet;
pub use state::{DEFAULT_VERSION, NamePolicy, Spreadsheet};
pub use store::CellStore;
