//! Cell storage with lazily evaluated formula values.

use std::collections::HashSet;

use dashmap::DashMap;
use log::trace;
use sheetcalc_engine::engine::{Cell, CellContent, CellName, CellValue, LookupError};

/// Sparse map from cell name to cell.
///
/// Structural changes take `&mut self`. Reads take `&self` and may run
/// concurrently: a stale formula value is computed outside of any map guard
/// and written back afterwards, so nested lookups never contend with the
/// guard of the cell being evaluated. Stale dependees are settled deepest
/// first before a read, so long reference chains need no deep recursion.
#[derive(Debug, Default)]
pub struct CellStore {
    cells: DashMap<CellName, Cell>,
}

impl CellStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, name: &CellName) -> bool {
        self.cells.contains_key(name)
    }

    /// Install `content` under `name`. Empty text removes the cell.
    pub fn set(&mut self, name: CellName, content: CellContent) {
        if content.is_empty() {
            self.cells.remove(&name);
        } else {
            self.cells.insert(name, Cell::new(content));
        }
    }

    pub fn remove(&mut self, name: &CellName) -> Option<Cell> {
        self.cells.remove(name).map(|(_, cell)| cell)
    }

    pub fn content(&self, name: &CellName) -> Option<CellContent> {
        self.cells.get(name).map(|cell| cell.contents().clone())
    }

    /// Names of every stored cell, in no particular order.
    pub fn names(&self) -> Vec<CellName> {
        self.cells.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Names of every formula cell.
    pub fn formula_names(&self) -> Vec<CellName> {
        self.cells
            .iter()
            .filter(|entry| entry.formula().is_some())
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Flag `name` for recomputation. Returns false if no such cell is stored.
    pub fn mark_stale(&mut self, name: &CellName) -> bool {
        match self.cells.get_mut(name) {
            Some(mut cell) => {
                cell.mark_stale();
                true
            }
            None => false,
        }
    }

    pub fn is_stale(&self, name: &CellName) -> bool {
        self.cells.get(name).is_some_and(|cell| cell.is_stale())
    }

    /// Value of `name`, evaluating it and any stale formulas it reads.
    /// An absent cell reads as empty text.
    pub fn get_value(&self, name: &CellName) -> CellValue {
        self.settle(name);
        self.evaluate(name)
    }

    /// Evaluate every stale formula reachable from `name` through references,
    /// dependees before the cells that read them.
    fn settle(&self, name: &CellName) {
        let Some(variables) = self.stale_variables(name) else {
            return;
        };
        let mut seen: HashSet<CellName> = HashSet::new();
        seen.insert(name.clone());
        let mut path: Vec<(CellName, Vec<CellName>)> = vec![(name.clone(), variables)];

        while let Some((_, pending)) = path.last_mut() {
            match pending.pop() {
                Some(var) => {
                    if seen.insert(var.clone()) {
                        if let Some(variables) = self.stale_variables(&var) {
                            path.push((var, variables));
                        }
                    }
                }
                None => {
                    if let Some((cell, _)) = path.pop() {
                        self.evaluate(&cell);
                    }
                }
            }
        }
    }

    /// References of `name` if it is a formula without a cached value.
    fn stale_variables(&self, name: &CellName) -> Option<Vec<CellName>> {
        let cell = self.cells.get(name)?;
        if cell.fresh_value().is_some() {
            return None;
        }
        cell.formula().map(|formula| formula.variables().to_vec())
    }

    /// Value of `name`, evaluating a stale formula and caching the result.
    fn evaluate(&self, name: &CellName) -> CellValue {
        let formula = {
            let Some(cell) = self.cells.get(name) else {
                return CellValue::Text(String::new());
            };
            if let Some(value) = cell.fresh_value() {
                return value.clone();
            }
            match cell.formula() {
                Some(formula) => formula.clone(),
                None => return CellValue::Text(String::new()),
            }
        };

        trace!("evaluating {} = {}", name, formula);
        let value = match formula.evaluate(|var| self.variable_lookup(var)) {
            Ok(n) => CellValue::Number(n),
            Err(e) => CellValue::Error(e),
        };

        if let Some(mut cell) = self.cells.get_mut(name) {
            cell.store_value(value.clone());
        }
        value
    }

    /// Resolve a formula reference to a number, evaluating referenced
    /// formulas on demand.
    pub fn variable_lookup(&self, name: &CellName) -> Result<f64, LookupError> {
        let is_text = match self.cells.get(name) {
            Some(cell) => matches!(cell.contents(), CellContent::Text(_)),
            None => return Err(LookupError::Empty),
        };
        if is_text {
            return Err(LookupError::NotNumeric);
        }

        match self.get_value(name) {
            CellValue::Number(n) => Ok(n),
            CellValue::Error(e) => Err(LookupError::Errored(Box::new(e))),
            CellValue::Text(_) => Err(LookupError::NotNumeric),
        }
    }
}
