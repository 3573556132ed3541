//! Map document decoding
//!
//! Map documents are strict JSON. Decoding failures surface as a named
//! `DecodeError` so callers can distinguish a malformed document from the
//! merge-time validation errors in [`crate::merge`].

use crate::models::MapDocument;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Error type for document decoding failures.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The document could not be read from disk
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The document is not a valid map JSON document
    #[error("malformed map document{}: {source}", .path.as_deref().map(|p| format!(" '{}'", p)).unwrap_or_default())]
    Malformed {
        path: Option<String>,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse a map document from a JSON string.
pub fn parse_document(json: &str) -> Result<MapDocument, DecodeError> {
    serde_json::from_str(json).map_err(|source| DecodeError::Malformed { path: None, source })
}

/// Parse a map document from a reader.
pub fn parse_reader<R: Read>(reader: R) -> Result<MapDocument, DecodeError> {
    serde_json::from_reader(reader)
        .map_err(|source| DecodeError::Malformed { path: None, source })
}

/// Read and parse a map document from a file path.
pub fn read_document(path: &Path) -> Result<MapDocument, DecodeError> {
    let file = File::open(path).map_err(|source| DecodeError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| DecodeError::Malformed {
        path: Some(path.display().to_string()),
        source,
    })
}
