//! Submitted files and per-file tasks

use serde::{Deserialize, Serialize};
use std::path::Path;

/// MIME type reported when content sniffing finds nothing
pub const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

/// A raw file blob as handed to the controller (picker, drop, upload, CLI)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// File name including extension
    pub name: String,
    /// Declared MIME type
    pub mime_type: String,
    /// Raw file bytes
    pub data: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Read a file from disk, declaring its MIME type from magic bytes
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        let mime_type = infer::get(&data)
            .map(|kind| kind.mime_type())
            .unwrap_or(UNKNOWN_MIME_TYPE)
            .to_string();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            name,
            mime_type,
            data,
        })
    }

    /// Only `image/*` entries take part in a batch
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// One candidate file within a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTask {
    /// 1-based position within the filtered batch
    pub index: usize,
    pub name: String,
    pub mime_type: String,
}

/// Result of processing one FileTask
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Loaded into a new tab with this title
    Succeeded { title: String },
    Failed { reason: String },
}
