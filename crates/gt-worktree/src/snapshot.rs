//! In-memory snapshots of the working directory.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{WorktreeError, WorktreeResult};

/// What to do with a file or directory that cannot be read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanPolicy {
    /// Abort the scan with an error.
    #[default]
    Strict,
    /// Log a warning, leave the entry out and keep going.
    Lenient,
}

/// A regular file captured by a scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct File {
    pub name: String,
    pub content: Vec<u8>,
}

impl File {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// A directory captured by a scan, in the order the filesystem listed it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Directory {
    pub name: String,
    pub files: Vec<File>,
    pub subdirectories: Vec<Directory>,
}

impl Directory {
    /// An empty directory called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a file (builder style, mostly for tests).
    pub fn with_file(mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.files.push(File::new(name, content));
        self
    }

    /// Add a subdirectory (builder style, mostly for tests).
    pub fn with_subdirectory(mut self, dir: Directory) -> Self {
        self.subdirectories.push(dir);
        self
    }

    /// Number of files in this directory and all directories below it.
    pub fn file_count(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(dir) = pending.pop() {
            count += dir.files.len();
            pending.extend(&dir.subdirectories);
        }
        count
    }
}

/// Result of scanning a working directory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// The working directory itself.
    pub root: Directory,
    /// Paths (relative to the root) left out by a lenient scan.
    pub skipped: Vec<PathBuf>,
}

/// Reads a working directory into a [`Snapshot`].
///
/// Ignored names are skipped at every depth, so a nested repository's
/// metadata is never captured. Protected names are skipped at the root only.
/// Symbolic links and special files are never captured.
#[derive(Clone, Debug)]
pub struct Scanner {
    root: PathBuf,
    ignored: BTreeSet<String>,
    protected: BTreeSet<String>,
    policy: ScanPolicy,
}

impl Scanner {
    /// Scan `root` with the strict policy and nothing protected.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignored: BTreeSet::new(),
            protected: BTreeSet::new(),
            policy: ScanPolicy::Strict,
        }
    }

    /// Never capture an entry called `name`, wherever it appears.
    pub fn ignore(mut self, name: impl Into<String>) -> Self {
        self.ignored.insert(name.into());
        self
    }

    /// Never capture the top-level entry called `name`.
    pub fn protect(mut self, name: impl Into<String>) -> Self {
        self.protected.insert(name.into());
        self
    }

    /// Protect every name in `names`.
    pub fn protect_all<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.protected.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_policy(mut self, policy: ScanPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Walk the working directory and read every regular file.
    pub fn scan(&self) -> WorktreeResult<Snapshot> {
        let root_name = self
            .root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        // stack[d] is the open directory at depth d; walkdir yields entries
        // depth-first, so a shallower entry closes everything deeper.
        let mut stack = vec![Directory::new(root_name)];
        let mut skipped = Vec::new();

        let (ignored, protected) = (&self.ignored, &self.protected);
        let mut walker = WalkDir::new(&self.root)
            .follow_links(false)
            .min_depth(1)
            .into_iter()
            .filter_entry(|entry| match entry.file_name().to_str() {
                Some(name) => {
                    !ignored.contains(name) && (entry.depth() != 1 || !protected.contains(name))
                }
                None => true,
            });

        while let Some(next) = walker.next() {
            let entry = match next {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().unwrap_or(self.root.as_path()).to_path_buf();
                    self.reject(&mut skipped, path, io::Error::from(err))?;
                    continue;
                }
            };

            let depth = entry.depth();
            close_deeper(&mut stack, depth);

            let file_type = entry.file_type();
            if file_type.is_symlink() {
                debug!(path = %entry.path().display(), "skipping symbolic link");
                continue;
            }

            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                match self.policy {
                    ScanPolicy::Strict => {
                        return Err(WorktreeError::NonUtf8Name {
                            path: entry.into_path(),
                        })
                    }
                    ScanPolicy::Lenient => {
                        warn!(path = %entry.path().display(), "skipping entry with non-UTF-8 name");
                        skipped.push(self.relative(entry.path()));
                        if file_type.is_dir() {
                            walker.skip_current_dir();
                        }
                        continue;
                    }
                }
            };

            if file_type.is_dir() {
                stack.push(Directory::new(name));
            } else if file_type.is_file() {
                match fs::read(entry.path()) {
                    Ok(content) => {
                        if let Some(dir) = stack.last_mut() {
                            dir.files.push(File { name, content });
                        }
                    }
                    Err(source) => self.reject(&mut skipped, entry.into_path(), source)?,
                }
            } else {
                debug!(path = %entry.path().display(), "skipping special file");
            }
        }

        close_deeper(&mut stack, 1);
        let root = stack.pop().unwrap_or_default();
        Ok(Snapshot { root, skipped })
    }

    /// Fail under the strict policy; record and carry on under the lenient one.
    fn reject(
        &self,
        skipped: &mut Vec<PathBuf>,
        path: PathBuf,
        source: io::Error,
    ) -> WorktreeResult<()> {
        match self.policy {
            ScanPolicy::Strict => Err(WorktreeError::Unreadable { path, source }),
            ScanPolicy::Lenient => {
                warn!(path = %path.display(), error = %source, "skipping unreadable entry");
                skipped.push(self.relative(&path));
                Ok(())
            }
        }
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root).unwrap_or(path).to_path_buf()
    }
}

/// Pop every directory deeper than `depth - 1` into its parent.
fn close_deeper(stack: &mut Vec<Directory>, depth: usize) {
    while stack.len() > depth.max(1) {
        let Some(done) = stack.pop() else { break };
        if let Some(parent) = stack.last_mut() {
            parent.subdirectories.push(done);
        }
    }
}
