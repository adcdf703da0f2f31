//! Recalculation planning and circular reference detection.
//!
//! When a cell changes, every cell that reads it (directly or through other
//! formulas) has to be recomputed, and in an order where each cell comes
//! after everything it depends on. This module walks the dependents graph
//! depth-first to produce that order, failing as soon as the walk re-enters
//! a cell that is still on the current path.

use std::collections::HashMap;

use log::trace;
use thiserror::Error;

use super::cell_name::CellName;
use super::graph::DependencyGraph;

/// The edited cell can reach itself through the dependents graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("circular reference involving {cell}")]
pub struct CircularReference {
    pub cell: CellName,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Cells to recompute after `start` changes, in evaluation order.
///
/// The result holds `start` (first) and every cell reachable from it through
/// dependents, once each. Every cell appears after all cells whose change can
/// affect it. The graph is only read.
pub fn cells_to_recalculate(
    graph: &DependencyGraph,
    start: &CellName,
) -> Result<Vec<CellName>, CircularReference> {
    cells_to_recalculate_all(graph, std::slice::from_ref(start))
}

/// Like [`cells_to_recalculate`] for several changed cells at once.
pub fn cells_to_recalculate_all(
    graph: &DependencyGraph,
    starts: &[CellName],
) -> Result<Vec<CellName>, CircularReference> {
    let mut marks: HashMap<&CellName, Mark> = HashMap::new();
    let mut finished: Vec<&CellName> = Vec::new();

    for start in starts {
        if !marks.contains_key(start) {
            visit(graph, start, &mut marks, &mut finished)?;
        }
    }

    trace!("recalculation plan from {} cell(s): {} cell(s)", starts.len(), finished.len());
    Ok(finished.into_iter().rev().cloned().collect())
}

/// Depth-first walk from `start` with an explicit stack, so chain length is
/// not limited by the thread's stack.
fn visit<'a>(
    graph: &'a DependencyGraph,
    start: &'a CellName,
    marks: &mut HashMap<&'a CellName, Mark>,
    finished: &mut Vec<&'a CellName>,
) -> Result<(), CircularReference> {
    marks.insert(start, Mark::InProgress);
    let mut path = vec![(start, graph.dependents_of(start))];

    while let Some((current, dependents)) = path.last_mut() {
        let current = *current;
        match dependents.next() {
            Some(dependent) => match marks.get(dependent) {
                Some(Mark::InProgress) => {
                    return Err(CircularReference {
                        cell: dependent.clone(),
                    });
                }
                Some(Mark::Done) => {}
                None => {
                    marks.insert(dependent, Mark::InProgress);
                    path.push((dependent, graph.dependents_of(dependent)));
                }
            },
            None => {
                marks.insert(current, Mark::Done);
                finished.push(current);
                path.pop();
            }
        }
    }
    Ok(())
}
