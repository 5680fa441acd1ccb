//! The `HEAD` file.
//!
//! Head is stored as the 40-character hex fingerprint followed by a newline.
//! A missing or empty file means no commit has been made yet.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use gt_types::ObjectId;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{RefError, Result};
use crate::traits::RefStore;
use crate::types::Head;

/// [`RefStore`] backed by a single text file.
#[derive(Clone, Debug)]
pub struct FileRefStore {
    path: PathBuf,
}

impl FileRefStore {
    /// Use the head file at `path`. Nothing is read or created until used.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the head file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RefStore for FileRefStore {
    fn head(&self) -> Result<Head> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Head::Unborn),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(RefError::Malformed {
                    path: self.path.clone(),
                    reason: "not valid UTF-8".into(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(Head::Unborn);
        }
        let id = ObjectId::from_hex(trimmed).map_err(|e| RefError::Malformed {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        Ok(Head::At(id))
    }

    fn set_head(&self, commit: &ObjectId) -> Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        writeln!(tmp, "{commit}")?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!(head = %commit.short_hex(), path = %self.path.display(), "head updated");
        Ok(())
    }
}
