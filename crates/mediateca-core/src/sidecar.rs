//! Per-entry metadata files written next to each media file.
//!
//! The sidecar name is the title with every character outside `[A-Za-z0-9]`
//! removed, plus the configured extension. Titles that share an
//! alphanumeric skeleton ("AC/DC", "ACDC") map to the same sidecar.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::MediatecaError;
use crate::fsops::{move_file, parent_or_cwd};
use crate::models::MediaRecord;

pub const DEFAULT_EXTENSION: &str = "tpoo";

/// Stateless sidecar writer; only knows the extension to use.
#[derive(Debug, Clone)]
pub struct SidecarManager {
    extension: String,
}

impl Default for SidecarManager {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSION)
    }
}

impl SidecarManager {
    pub fn new(extension: impl Into<String>) -> Self {
        let extension = extension.into();
        let extension = extension.trim_start_matches('.').to_string();
        Self { extension }
    }

    pub fn file_name(&self, title: &str) -> String {
        let skeleton: String = title.chars().filter(char::is_ascii_alphanumeric).collect();
        format!("{skeleton}.{}", self.extension)
    }

    /// Expected sidecar path for `record`. Does not touch the disk.
    pub fn locate(&self, record: &MediaRecord) -> PathBuf {
        parent_or_cwd(record.path()).join(self.file_name(&record.title))
    }

    /// Write (or overwrite) the sidecar for `record`.
    pub fn generate(&self, record: &MediaRecord) -> Result<PathBuf, MediatecaError> {
        let path = self.locate(record);
        let kind = record.kind();
        let content = format!(
            "Media sidecar - {}\nTitle: {}\nCategory: {}\nDuration ({}): {}\nLocation: {}\nSize: {}\n",
            kind.label(),
            record.title,
            record.category,
            kind.duration_unit(),
            record.duration,
            record.location,
            record.disk_size,
        );
        fs::write(&path, content).map_err(|e| fs_error(&path, e))?;
        debug!(path = %path.display(), "Sidecar written");
        Ok(path)
    }

    /// Remove the sidecar if present. Returns whether a file was removed.
    pub fn delete(&self, record: &MediaRecord) -> Result<bool, MediatecaError> {
        let path = self.locate(record);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "Sidecar removed");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(fs_error(&path, e)),
        }
    }

    /// Move the sidecar of `record` (at its current location) into
    /// `new_dir`, keeping its file name. A missing sidecar is not an error.
    pub fn relocate(
        &self,
        record: &MediaRecord,
        new_dir: &Path,
    ) -> Result<Option<PathBuf>, MediatecaError> {
        let from = self.locate(record);
        if !from.is_file() {
            warn!(path = %from.display(), "Sidecar not found, nothing to relocate");
            return Ok(None);
        }

        let to = new_dir.join(self.file_name(&record.title));
        move_file(&from, &to).map_err(|e| fs_error(&from, e))?;
        debug!(from = %from.display(), to = %to.display(), "Sidecar relocated");
        Ok(Some(to))
    }
}

fn fs_error(path: &Path, e: std::io::Error) -> MediatecaError {
    MediatecaError::FileSystem(format!("sidecar {}: {e}", path.display()))
}
