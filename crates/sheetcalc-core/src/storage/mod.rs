//! Storage module for the XML document format

mod parser;
mod writer;

pub use parser::{SavedDocument, parse_document, parse_document_content, read_saved_version};
pub use writer::{write_document, write_document_content};
