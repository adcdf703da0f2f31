//! Thread-safe handle to a spreadsheet.

use super::Spreadsheet;
use crate::error::Result;
use sheetcalc_engine::engine::{CellContent, CellName, CellValue};
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A spreadsheet shared between threads.
///
/// Edits take the write lock, so they are atomic with respect to every other
/// operation. Reads take the read lock and may run concurrently; lazily
/// computed values are cached through the store's own per-entry locking.
#[derive(Debug, Clone)]
pub struct SharedSpreadsheet {
    inner: Arc<RwLock<Spreadsheet>>,
}

impl SharedSpreadsheet {
    pub fn new(sheet: Spreadsheet) -> Self {
        SharedSpreadsheet {
            inner: Arc::new(RwLock::new(sheet)),
        }
    }

    // Edits validate before mutating, so a poisoned lock still guards a
    // consistent document.
    fn read(&self) -> RwLockReadGuard<'_, Spreadsheet> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Spreadsheet> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn edit_cell(&self, name: &str, content: &str) -> Result<Vec<CellName>> {
        self.write().edit_cell(name, content)
    }

    pub fn get_value(&self, name: &str) -> Result<CellValue> {
        self.read().get_value(name)
    }

    pub fn get_content(&self, name: &str) -> Result<CellContent> {
        self.read().get_content(name)
    }

    pub fn nonempty_cell_names(&self) -> Vec<CellName> {
        self.read().nonempty_cell_names()
    }

    pub fn changed(&self) -> bool {
        self.read().changed()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.write().save(path)
    }

    /// Run `f` with shared access to the document.
    pub fn with<R>(&self, f: impl FnOnce(&Spreadsheet) -> R) -> R {
        f(&self.read())
    }

    /// Run `f` with exclusive access to the document.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Spreadsheet) -> R) -> R {
        f(&mut self.write())
    }
}

impl From<Spreadsheet> for SharedSpreadsheet {
    fn from(sheet: Spreadsheet) -> Self {
        Self::new(sheet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_concurrent_readers_see_consistent_values() {
        let shared = SharedSpreadsheet::new(Spreadsheet::new());
        shared.edit_cell("A1", "1").unwrap();
        for i in 2..=50 {
            shared
                .edit_cell(&format!("A{i}"), &format!("=A{} + 1", i - 1))
                .unwrap();
        }

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || shared.get_value("A50").unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), CellValue::Number(50.0));
        }
    }

    #[test]
    fn test_writers_and_readers_interleave() {
        let shared = SharedSpreadsheet::new(Spreadsheet::new());
        shared.edit_cell("A1", "0").unwrap();
        shared.edit_cell("B1", "=A1 * 2").unwrap();

        let writer = {
            let shared = shared.clone();
            thread::spawn(move || {
                for i in 1..=100 {
                    shared.edit_cell("A1", &i.to_string()).unwrap();
                }
            })
        };
        let reader = {
            let shared = shared.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    // B1 is always twice some committed value of A1.
                    let a = shared.with(|sheet| {
                        let a = sheet.get_value("A1").unwrap().as_number().unwrap();
                        let b = sheet.get_value("B1").unwrap().as_number().unwrap();
                        assert_eq!(b, a * 2.0);
                        a
                    });
                    assert!((0.0..=100.0).contains(&a));
                }
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();
        assert_eq!(shared.get_value("B1").unwrap(), CellValue::Number(200.0));
        assert!(shared.changed());
    }

    #[test]
    fn test_with_mut() {
        let shared: SharedSpreadsheet = Spreadsheet::new().into();
        let affected = shared.with_mut(|sheet| sheet.edit_cell("A1", "3")).unwrap();
        assert_eq!(affected.len(), 1);
        assert_eq!(shared.nonempty_cell_names().len(), 1);
    }
}
