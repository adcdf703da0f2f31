use super::{NamePolicy, Spreadsheet};
use crate::error::{Result, SheetError};
use crate::storage::{
    SavedDocument, parse_document, parse_document_content, read_saved_version, write_document,
    write_document_content,
};
use log::{debug, warn};
use sheetcalc_engine::engine::{CellContent, CellName};
use std::path::Path;

impl Spreadsheet {
    /// Load a saved document.
    ///
    /// The document's version tag must equal `version`, and every saved cell
    /// is replayed through [`Spreadsheet::edit_cell`] so names, formulas and
    /// cycles are checked exactly as for interactive edits. Any failure is
    /// reported as [`SheetError::Persistence`].
    pub fn load(path: &Path, policy: NamePolicy, version: &str) -> Result<Spreadsheet> {
        parse_document(path)
            .and_then(|saved| Self::from_saved(saved, policy, version))
            .map_err(|e| SheetError::persistence(path, e))
    }

    /// Like [`Spreadsheet::load`], reading the document from a string.
    pub fn load_from_str(content: &str, policy: NamePolicy, version: &str) -> Result<Spreadsheet> {
        let saved = parse_document_content(content)?;
        Self::from_saved(saved, policy, version)
    }

    fn from_saved(saved: SavedDocument, policy: NamePolicy, version: &str) -> Result<Spreadsheet> {
        if saved.version != version {
            warn!(
                "refusing document with version {:?} (expected {:?})",
                saved.version, version
            );
            return Err(SheetError::VersionMismatch {
                expected: version.to_string(),
                found: saved.version,
            });
        }

        let mut sheet = Spreadsheet::with_policy(policy, version);
        for (name, contents) in &saved.cells {
            sheet.edit_cell(name, contents)?;
        }
        sheet.recalculate_all()?;
        sheet.changed = false;
        debug!("loaded {} cell(s)", sheet.len());
        Ok(sheet)
    }

    /// Write the document to `path` and mark it unchanged.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        write_document(path, &self.version, &self.snapshot())
            .map_err(|e| SheetError::persistence(path, e))?;
        self.changed = false;
        debug!("saved {} cell(s) to {}", self.len(), path.display());
        Ok(())
    }

    /// The document as it would be saved.
    pub fn to_xml(&self) -> String {
        write_document_content(&self.version, &self.snapshot())
    }

    /// Version tag of a saved document.
    pub fn saved_version(path: &Path) -> Result<String> {
        read_saved_version(path).map_err(|e| SheetError::persistence(path, e))
    }

    fn snapshot(&self) -> Vec<(CellName, CellContent)> {
        self.nonempty_cell_names()
            .into_iter()
            .filter_map(|name| self.store.content(&name).map(|content| (name, content)))
            .collect()
    }
}
