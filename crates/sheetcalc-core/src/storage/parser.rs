//! Parser for saved spreadsheet documents

use crate::error::{Result, SheetError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::fs;
use std::path::Path;

/// Raw contents of a saved document: the version tag and every
/// `(name, contents)` pair in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDocument {
    pub version: String,
    pub cells: Vec<(String, String)>,
}

/// Parse a saved document from disk
pub fn parse_document(path: &Path) -> Result<SavedDocument> {
    let content = fs::read_to_string(path)?;
    parse_document_content(&content)
}

/// Version tag of a saved document, without interpreting its cells
pub fn read_saved_version(path: &Path) -> Result<String> {
    Ok(parse_document(path)?.version)
}

#[derive(Clone, Copy, PartialEq)]
enum Field {
    Name,
    Contents,
}

#[derive(Default)]
struct PendingCell {
    name: Option<String>,
    contents: Option<String>,
}

/// Parse a saved document from a string
pub fn parse_document_content(content: &str) -> Result<SavedDocument> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(false);

    let mut version: Option<String> = None;
    let mut closed = false;
    let mut cells = Vec::new();
    let mut cell: Option<PendingCell> = None;
    let mut field: Option<(Field, String)> = None;

    loop {
        let position = reader.buffer_position();
        let malformed = |message: String| SheetError::Malformed { position, message };

        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"spreadsheet" if version.is_none() && !closed => {
                    version = Some(version_attribute(&e, position)?);
                }
                b"cell" if version.is_some() && cell.is_none() && !closed => {
                    cell = Some(PendingCell::default());
                }
                b"name" if cell.is_some() && field.is_none() => {
                    field = Some((Field::Name, String::new()));
                }
                b"contents" if cell.is_some() && field.is_none() => {
                    field = Some((Field::Contents, String::new()));
                }
                other => {
                    return Err(malformed(format!(
                        "unexpected element <{}>",
                        String::from_utf8_lossy(other)
                    )));
                }
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"spreadsheet" if version.is_none() && !closed => {
                    version = Some(version_attribute(&e, position)?);
                    closed = true;
                }
                b"name" if cell.is_some() && field.is_none() => {
                    set_field(&mut cell, Field::Name, String::new(), position)?;
                }
                b"contents" if cell.is_some() && field.is_none() => {
                    set_field(&mut cell, Field::Contents, String::new(), position)?;
                }
                other => {
                    return Err(malformed(format!(
                        "unexpected element <{}/>",
                        String::from_utf8_lossy(other)
                    )));
                }
            },
            Event::Text(e) => {
                let text = e.unescape()?;
                match field.as_mut() {
                    Some((_, value)) => value.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(malformed(format!("unexpected text {:?}", text.trim()))),
                }
            }
            Event::CData(e) => {
                let raw = e.into_inner();
                let text = std::str::from_utf8(&raw)
                    .map_err(|_| malformed("CDATA is not valid UTF-8".to_string()))?;
                match field.as_mut() {
                    Some((_, value)) => value.push_str(text),
                    None => return Err(malformed("unexpected CDATA section".to_string())),
                }
            }
            Event::End(e) => match e.name().as_ref() {
                tag @ (b"name" | b"contents") => {
                    let expected = if tag == b"name" { Field::Name } else { Field::Contents };
                    match field.take() {
                        Some((which, value)) if which == expected => {
                            set_field(&mut cell, which, value, position)?;
                        }
                        _ => return Err(malformed("mismatched closing tag".to_string())),
                    }
                }
                b"cell" => {
                    let Some(PendingCell { name, contents }) = cell.take() else {
                        return Err(malformed("unbalanced </cell>".to_string()));
                    };
                    let name = name.ok_or_else(|| malformed("cell without <name>".to_string()))?;
                    let contents = contents
                        .ok_or_else(|| malformed(format!("cell {name} without <contents>")))?;
                    cells.push((name, contents));
                }
                b"spreadsheet" => {
                    if cell.is_some() {
                        return Err(malformed("unterminated <cell>".to_string()));
                    }
                    closed = true;
                }
                other => {
                    return Err(malformed(format!(
                        "unexpected closing tag </{}>",
                        String::from_utf8_lossy(other)
                    )));
                }
            },
            Event::Eof => break,
            // Declaration, comments, processing instructions, doctype
            _ => {}
        }
    }

    let version = version.ok_or_else(|| SheetError::Malformed {
        position: reader.buffer_position(),
        message: "missing <spreadsheet> element".to_string(),
    })?;
    if !closed {
        return Err(SheetError::Malformed {
            position: reader.buffer_position(),
            message: "unterminated <spreadsheet> element".to_string(),
        });
    }

    Ok(SavedDocument { version, cells })
}

fn version_attribute(e: &BytesStart<'_>, position: usize) -> Result<String> {
    match e
        .try_get_attribute("version")
        .map_err(quick_xml::Error::from)?
    {
        Some(attr) => Ok(attr.unescape_value()?.into_owned()),
        None => Err(SheetError::Malformed {
            position,
            message: "<spreadsheet> has no version attribute".to_string(),
        }),
    }
}

fn set_field(
    cell: &mut Option<PendingCell>,
    which: Field,
    value: String,
    position: usize,
) -> Result<()> {
    let Some(cell) = cell.as_mut() else {
        return Err(SheetError::Malformed {
            position,
            message: "field outside of <cell>".to_string(),
        });
    };
    let slot = match which {
        Field::Name => &mut cell.name,
        Field::Contents => &mut cell.contents,
    };
    if slot.is_some() {
        return Err(SheetError::Malformed {
            position,
            message: "duplicate field in <cell>".to_string(),
        });
    }
    *slot = Some(value);
    Ok(())
}
