//! Dependency graph between cells.
//!
//! Records "the formula in `dependent` reads `dependee`" as a pair of
//! adjacency maps that are always exact inverses of each other. Both maps are
//! only ever touched through the private `link`/`unlink` pair.
//!
//! The graph does not reject cycles. An edit may leave it cyclic for a moment
//! while the planner checks the change; the caller then restores the previous
//! edges.

use std::collections::{HashMap, HashSet};

use super::cell_name::CellName;

#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    /// Cell -> cells whose formulas reference it
    dependents: HashMap<CellName, HashSet<CellName>>,
    /// Cell -> cells its formula references
    dependees: HashMap<CellName, HashSet<CellName>>,
    edges: usize,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of edges.
    pub fn size(&self) -> usize {
        self.edges
    }

    /// Record that `dependent`'s formula references `dependee`. Idempotent.
    pub fn add_dependency(&mut self, dependee: &CellName, dependent: &CellName) {
        self.link(dependee, dependent);
    }

    /// Drop every dependee edge of `cell` and install `new_dependees` instead.
    pub fn replace_dependees<I>(&mut self, cell: &CellName, new_dependees: I)
    where
        I: IntoIterator<Item = CellName>,
    {
        let old: Vec<CellName> = self.dependees_of(cell).cloned().collect();
        for dependee in &old {
            self.unlink(dependee, cell);
        }
        for dependee in new_dependees {
            self.add_dependency(&dependee, cell);
        }
    }

    /// Cells whose formulas directly reference `cell`.
    pub fn dependents_of<'a>(&'a self, cell: &CellName) -> impl Iterator<Item = &'a CellName> + use<'a> {
        self.dependents.get(cell).into_iter().flat_map(|set| set.iter())
    }

    /// Cells directly referenced by `cell`'s formula.
    pub fn dependees_of<'a>(&'a self, cell: &CellName) -> impl Iterator<Item = &'a CellName> + use<'a> {
        self.dependees.get(cell).into_iter().flat_map(|set| set.iter())
    }

    fn link(&mut self, dependee: &CellName, dependent: &CellName) {
        let inserted = self
            .dependents
            .entry(dependee.clone())
            .or_default()
            .insert(dependent.clone());
        if inserted {
            self.dependees
                .entry(dependent.clone())
                .or_default()
                .insert(dependee.clone());
            self.edges += 1;
        }
    }

    fn unlink(&mut self, dependee: &CellName, dependent: &CellName) {
        let removed = match self.dependents.get_mut(dependee) {
            Some(set) => {
                let removed = set.remove(dependent);
                if set.is_empty() {
                    self.dependents.remove(dependee);
                }
                removed
            }
            None => false,
        };
        if removed {
            if let Some(set) = self.dependees.get_mut(dependent) {
                set.remove(dependee);
                if set.is_empty() {
                    self.dependees.remove(dependent);
                }
            }
            self.edges -= 1;
        }
    }
}
