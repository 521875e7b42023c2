//! JSON persistence for breed documents.
//!
//! The output file is a pretty-printed UTF-8 JSON array of
//! [`BreedDocument`]. Writes go to a temporary file in the target's
//! directory and are renamed into place, so a crash mid-write leaves any
//! previous file intact.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::models::BreedDocument;

/// Atomically replace `path` with `documents`.
///
/// Creates the parent directory when missing. Does not check the content
/// threshold; callers only pass accepted documents.
pub fn save_documents(path: &Path, documents: &[BreedDocument]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let json = serde_json::to_string_pretty(documents)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(json.as_bytes())?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    Ok(())
}

/// Read a document file written by [`save_documents`] (or by hand).
///
/// Records below the content threshold are returned as-is.
pub fn load_documents(path: &Path) -> Result<Vec<BreedDocument>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let docs: Vec<BreedDocument> = serde_json::from_str(&content)
        .with_context(|| format!("Malformed breed document file: {}", path.display()))?;
    Ok(docs)
}
