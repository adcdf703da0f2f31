//! sheetcalc_engine - Cell names, formulas, dependency graph and recalculation planning.

pub mod engine;
