//! Where a repository keeps its files.
//!
//! ```text
//! <workdir>/
//!   .gt/
//!     HEAD          current commit, hex + newline
//!     config.toml   repository settings
//!     lock          advisory lock for mutating commands
//!     objects/      loose objects, <2 hex>/<38 hex>
//!     tmp/          checkout staging
//! ```

use std::path::{Path, PathBuf};

/// Name of the metadata directory at the root of the working directory.
pub const META_DIR: &str = ".gt";

/// Resolved paths for one repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoPaths {
    workdir: PathBuf,
    meta: PathBuf,
}

impl RepoPaths {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        let workdir = workdir.into();
        let meta = workdir.join(META_DIR);
        Self { workdir, meta }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn meta_dir(&self) -> &Path {
        &self.meta
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.meta.join("objects")
    }

    pub fn head_path(&self) -> PathBuf {
        self.meta.join("HEAD")
    }

    pub fn config_path(&self) -> PathBuf {
        self.meta.join("config.toml")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.meta.join("lock")
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.meta.join("tmp")
    }
}
