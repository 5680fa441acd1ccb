//! Repository configuration, stored as `<meta>/config.toml`.

use std::fs;
use std::io;
use std::path::Path;

use gt_worktree::ScanPolicy;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    pub core: CoreConfig,
    pub worktree: WorktreeConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Flush object files to disk before renaming them into place.
    pub fsync_objects: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorktreeConfig {
    pub scan_policy: ScanPolicy,
    /// Top-level names that are neither committed nor replaced by checkout.
    pub exclude: Vec<String>,
}

impl RepoConfig {
    /// Read the config file, falling back to defaults if it does not exist.
    pub fn load(path: &Path) -> SdkResult<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        Self::parse(&content).map_err(|e| SdkError::Config(format!("{}: {e}", path.display())))
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn save(&self, path: &Path) -> SdkResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| SdkError::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }
}
