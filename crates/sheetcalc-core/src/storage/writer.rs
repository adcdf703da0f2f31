//! Writer for saved spreadsheet documents

use crate::error::Result;
use sheetcalc_engine::engine::{CellContent, CellName};
use std::fs;
use std::path::Path;

/// Write cells to a document on disk
pub fn write_document(path: &Path, version: &str, cells: &[(CellName, CellContent)]) -> Result<()> {
    let content = write_document_content(version, cells);
    fs::write(path, content)?;
    Ok(())
}

/// Render cells as a document string.
///
/// Cells are written in name order; empty contents are skipped.
pub fn write_document_content(version: &str, cells: &[(CellName, CellContent)]) -> String {
    let mut sorted: Vec<_> = cells.iter().filter(|(_, c)| !c.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    out.push_str(&format!("<spreadsheet version=\"{}\">\n", escape_xml(version)));
    for (name, content) in sorted {
        out.push_str("  <cell>\n");
        out.push_str(&format!("    <name>{}</name>\n", escape_xml(name.as_str())));
        out.push_str(&format!(
            "    <contents>{}</contents>\n",
            escape_xml(&content.to_input_string())
        ));
        out.push_str("  </cell>\n");
    }
    out.push_str("</spreadsheet>\n");
    out
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
