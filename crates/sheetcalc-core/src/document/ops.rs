use super::Spreadsheet;
use crate::error::{Result, SheetError};
use log::{debug, warn};
use sheetcalc_engine::engine::{
    CellContent, CellName, CellValue, Formula, cells_to_recalculate, cells_to_recalculate_all,
};

impl Spreadsheet {
    /// Normalize and validate a user-supplied cell name.
    pub fn resolve_name(&self, name: &str) -> Result<CellName> {
        self.policy
            .resolve(name)
            .ok_or_else(|| SheetError::InvalidName(name.to_string()))
    }

    /// Classify raw input:
    /// - parses as a finite number -> Number
    /// - starts with '=' -> Formula (the rest must parse)
    /// - otherwise -> Text, verbatim (empty text clears the cell)
    pub fn classify(&self, raw: &str) -> Result<CellContent> {
        if let Ok(n) = raw.trim().parse::<f64>() {
            if n.is_finite() {
                return Ok(CellContent::Number(n));
            }
        }

        if let Some(src) = raw.strip_prefix('=') {
            let formula = Formula::parse_with(
                src,
                |s| self.policy.normalize(s),
                |s| self.policy.is_valid(s),
            )?;
            return Ok(CellContent::Formula(formula));
        }

        Ok(CellContent::Text(raw.to_string()))
    }

    /// Set the content of `name` from raw input.
    ///
    /// Returns the edited cell followed by every cell that (transitively)
    /// depends on it, in an order where each cell comes after the cells it
    /// reads. On any error the document is left exactly as it was.
    pub fn edit_cell(&mut self, name: &str, content: &str) -> Result<Vec<CellName>> {
        let name = self.resolve_name(name)?;
        let content = self.classify(content)?;
        self.apply(name, content)
    }

    /// [`Spreadsheet::edit_cell`] for callers whose content may be absent.
    pub fn edit_cell_opt(&mut self, name: &str, content: Option<&str>) -> Result<Vec<CellName>> {
        let content = content.ok_or(SheetError::MissingContent)?;
        self.edit_cell(name, content)
    }

    // `name` and the formula's references have already been through the policy.
    fn apply(&mut self, name: CellName, content: CellContent) -> Result<Vec<CellName>> {
        self.graph.replace_dependees(&name, content.dependees());

        let order = match cells_to_recalculate(&self.graph, &name) {
            Ok(order) => order,
            Err(cycle) => {
                // Replay the stored content's references to restore the old edges.
                let previous = self
                    .store
                    .content(&name)
                    .map(|c| c.dependees())
                    .unwrap_or_default();
                self.graph.replace_dependees(&name, previous);
                warn!("rejected edit of {}: {}", name, cycle);
                return Err(cycle.into());
            }
        };

        self.store.set(name.clone(), content);
        for cell in &order {
            self.store.mark_stale(cell);
        }
        self.changed = true;

        debug!(
            "edited {}: {} cell(s) affected, {} reference(s) in sheet",
            name,
            order.len(),
            self.graph.size()
        );
        Ok(order)
    }

    /// Value of a cell, computing it (and anything it reads) if stale.
    /// Empty cells read as empty text.
    pub fn get_value(&self, name: &str) -> Result<CellValue> {
        let name = self.resolve_name(name)?;
        Ok(self.store.get_value(&name))
    }

    /// Content of a cell. Empty cells read as empty text.
    pub fn get_content(&self, name: &str) -> Result<CellContent> {
        let name = self.resolve_name(name)?;
        Ok(self
            .store
            .content(&name)
            .unwrap_or_else(|| CellContent::Text(String::new())))
    }

    /// Names of all non-empty cells, sorted.
    pub fn nonempty_cell_names(&self) -> Vec<CellName> {
        let mut names = self.store.names();
        names.sort();
        names
    }

    /// Cells whose formulas directly reference `name`.
    pub fn direct_dependents(&self, name: &str) -> Result<Vec<CellName>> {
        let name = self.resolve_name(name)?;
        let mut dependents: Vec<CellName> = self.graph.dependents_of(&name).cloned().collect();
        dependents.sort();
        Ok(dependents)
    }

    /// Force every formula, and everything that reads one, to be recomputed
    /// on its next read.
    pub fn recalculate_all(&mut self) -> Result<()> {
        let order = cells_to_recalculate_all(&self.graph, &self.store.formula_names())?;
        for name in &order {
            self.store.mark_stale(name);
        }
        debug!("recalculating {} cell(s)", order.len());
        Ok(())
    }
}
