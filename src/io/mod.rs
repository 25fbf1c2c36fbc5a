//! Reading and writing environment documents.
//!
//! Documents are rendered with `serde_json`'s pretty printer (key order
//! preserved) and written atomically: content goes to a temporary sibling
//! file which is then renamed over the target, so a crash mid-write never
//! leaves a truncated environment behind.

pub mod walker;

pub use walker::DocumentFinder;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::config::OutputConfig;
use crate::errors::BatchError;
use crate::migrations::Document;

/// Read and parse a document.
pub fn read_document(path: &Path) -> Result<Document, BatchError> {
    read_document_with_raw(path).map(|(_, document)| document)
}

/// Read and parse a document, keeping the text it was parsed from.
pub fn read_document_with_raw(path: &Path) -> Result<(String, Document), BatchError> {
    let raw = fs::read_to_string(path).map_err(|source| BatchError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let document = Document::from_json_str(&raw).map_err(|source| BatchError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((raw, document))
}

/// Render a document the way it is written to disk.
pub fn render_document(document: &Document, output: &OutputConfig) -> Result<String, serde_json::Error> {
    let indent = " ".repeat(output.indent);
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    document.serialize(&mut serializer)?;

    // serde_json only emits valid UTF-8
    let mut rendered = String::from_utf8_lossy(&buf).into_owned();
    if output.trailing_newline {
        rendered.push('\n');
    }
    Ok(rendered)
}

/// Write `content` to `path` through a temporary sibling and a rename.
///
/// An existing target keeps its permissions.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), BatchError> {
    let temp_path = temp_sibling(path);
    let write_err = |source| BatchError::Write {
        path: path.to_path_buf(),
        source,
    };

    let result = fs::File::create(&temp_path)
        .and_then(|mut file| {
            file.write_all(content.as_bytes())?;
            file.sync_all()
        })
        .and_then(|()| match fs::metadata(path) {
            Ok(metadata) => fs::set_permissions(&temp_path, metadata.permissions()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        })
        .and_then(|()| fs::rename(&temp_path, path));

    if let Err(source) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(write_err(source));
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    path.with_file_name(format!(".{}.tmp.{}", file_name, std::process::id()))
}
