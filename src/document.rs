//! Reading and writing the JSON document that backs a store.
//!
//! These functions are pure with respect to the store: they take or return an
//! [`Object`] and never hold state of their own.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{JsonKvError, Result};
use crate::value::Object;

/// Parses document text. Whitespace-only content is an empty object.
pub fn parse(path: &Path, contents: &str) -> Result<Object> {
    if contents.trim().is_empty() {
        return Ok(Object::new());
    }
    serde_json::from_str(contents).map_err(|e| JsonKvError::document(path, e))
}

/// Renders a snapshot with two-space indentation.
pub fn render(data: &Object) -> Result<String> {
    serde_json::to_string_pretty(data).map_err(|e| JsonKvError::InvalidValue(e.to_string()))
}

/// Reads and parses the document at `path`.
pub fn read(path: &Path) -> Result<Object> {
    let contents = fs::read_to_string(path).map_err(|e| JsonKvError::file(path, e))?;
    let data = parse(path, &contents)?;
    debug!(path = %path.display(), keys = data.len(), "loaded document");
    Ok(data)
}

/// Overwrites the document at `path` with a full snapshot of `data`.
///
/// The snapshot is written to a sibling temp file first and then renamed over
/// the target, so readers never see a half-written document.
pub fn write(path: &Path, data: &Object) -> Result<()> {
    let json = render(data)?;
    let temp_path = temp_path(path);
    fs::write(&temp_path, json).map_err(|e| JsonKvError::file(path, e))?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(JsonKvError::file(path, e));
    }
    debug!(path = %path.display(), keys = data.len(), "saved document");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
