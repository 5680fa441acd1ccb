use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use gt_refs::{FileRefStore, Head, RefStore};
use gt_store::{Blob, Commit, LooseObjectStore, ObjectKind, ObjectStore, StoredObject, Tree};
use gt_types::ObjectId;
use gt_worktree::{leftover_scratch, Checkout, CheckoutReport, Scanner, Snapshot};
use tracing::{info, warn};

use crate::commit::{commit_snapshot, CommitRecord};
use crate::config::RepoConfig;
use crate::error::{SdkError, SdkResult};
use crate::history::History;
use crate::lock::RepoLock;
use crate::paths::{RepoPaths, META_DIR};

/// Result of [`Repository::commit`].
#[derive(Clone, Debug)]
pub struct CommitOutcome {
    pub record: CommitRecord,
    /// Paths a lenient scan left out of the snapshot.
    pub skipped: Vec<PathBuf>,
}

/// Result of [`Repository::checkout`].
#[derive(Clone, Debug)]
pub struct CheckoutOutcome {
    pub record: CommitRecord,
    pub report: CheckoutReport,
}

/// A decoded object, as shown by `cat`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjectContent {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
}

impl ObjectContent {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Blob(_) => ObjectKind::Blob,
            Self::Tree(_) => ObjectKind::Tree,
            Self::Commit(_) => ObjectKind::Commit,
        }
    }

    fn decode(object: &StoredObject) -> SdkResult<Self> {
        Ok(match object.kind {
            ObjectKind::Blob => Self::Blob(Blob::from_stored_object(object)?),
            ObjectKind::Tree => Self::Tree(Tree::from_stored_object(object)?),
            ObjectKind::Commit => Self::Commit(Commit::from_stored_object(object)?),
        })
    }
}

/// A gtrack repository rooted at a working directory.
pub struct Repository {
    paths: RepoPaths,
    config: RepoConfig,
    store: LooseObjectStore,
    refs: FileRefStore,
}

impl Repository {
    /// Create the metadata directory in `workdir` and open the result.
    pub fn init(workdir: impl Into<PathBuf>) -> SdkResult<Self> {
        let paths = RepoPaths::new(workdir);
        if paths.meta_dir().exists() {
            return Err(SdkError::AlreadyInitialized(paths.workdir().to_path_buf()));
        }

        fs::create_dir_all(paths.meta_dir())?;
        let _lock = RepoLock::acquire(paths.lock_path())?;
        fs::create_dir_all(paths.objects_dir())?;
        fs::create_dir_all(paths.tmp_dir())?;
        let config = RepoConfig::default();
        config.save(&paths.config_path())?;

        info!(path = %paths.meta_dir().display(), "initialized empty repository");
        Ok(Self::with_config(paths, config))
    }

    /// Open the repository whose working directory is `workdir`.
    pub fn open(workdir: impl Into<PathBuf>) -> SdkResult<Self> {
        let paths = RepoPaths::new(workdir);
        if !paths.meta_dir().is_dir() {
            return Err(SdkError::NotInitialized(paths.workdir().to_path_buf()));
        }
        let config = RepoConfig::load(&paths.config_path())?;
        Ok(Self::with_config(paths, config))
    }

    fn with_config(paths: RepoPaths, config: RepoConfig) -> Self {
        let store = LooseObjectStore::new(paths.objects_dir()).with_fsync(config.core.fsync_objects);
        let refs = FileRefStore::new(paths.head_path());
        Self {
            paths,
            config,
            store,
            refs,
        }
    }

    pub fn paths(&self) -> &RepoPaths {
        &self.paths
    }

    pub fn workdir(&self) -> &Path {
        self.paths.workdir()
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    pub fn store(&self) -> &LooseObjectStore {
        &self.store
    }

    pub fn head(&self) -> SdkResult<Head> {
        Ok(self.refs.head()?)
    }

    /// Read the working directory, minus metadata and excluded names.
    pub fn snapshot(&self) -> SdkResult<Snapshot> {
        let snapshot = Scanner::new(self.paths.workdir())
            .ignore(META_DIR)
            .protect_all(self.config.worktree.exclude.iter().cloned())
            .with_policy(self.config.worktree.scan_policy)
            .scan()?;
        Ok(snapshot)
    }

    /// Commit the working directory with the current time.
    pub fn commit(&self, message: &str) -> SdkResult<CommitOutcome> {
        self.commit_at(message, Utc::now().timestamp())
    }

    /// Commit the working directory with an explicit timestamp.
    pub fn commit_at(&self, message: &str, timestamp: i64) -> SdkResult<CommitOutcome> {
        let _lock = self.lock()?;
        self.warn_leftover_checkouts();
        let head = self.refs.head()?;
        let snapshot = self.snapshot()?;

        let record = commit_snapshot(&self.store, head, &snapshot.root, message, timestamp)?;
        self.refs.set_head(&record.id)?;

        info!(
            commit = %record.id.short_hex(),
            parent = ?record.commit.parent.map(|p| p.short_hex()),
            files = snapshot.root.file_count(),
            skipped = snapshot.skipped.len(),
            "committed"
        );
        Ok(CommitOutcome {
            record,
            skipped: snapshot.skipped,
        })
    }

    /// Make the working directory match `id` and point head at it.
    ///
    /// Head moves only after the working directory has been replaced, so a
    /// failed checkout leaves both as they were.
    pub fn checkout(&self, id: &ObjectId) -> SdkResult<CheckoutOutcome> {
        let _lock = self.lock()?;
        self.warn_leftover_checkouts();
        let commit = self.store.read_commit(id)?;

        let report = Checkout::new(&self.store, self.paths.workdir(), self.paths.tmp_dir())
            .ignore(META_DIR)
            .protect(META_DIR)
            .protect_all(self.config.worktree.exclude.iter().cloned())
            .run(&commit.tree)?;
        self.refs.set_head(id)?;

        info!(
            commit = %id.short_hex(),
            files = report.files,
            replaced = report.replaced,
            "checked out"
        );
        Ok(CheckoutOutcome {
            record: CommitRecord { id: *id, commit },
            report,
        })
    }

    /// Walk history from the current head.
    pub fn log(&self) -> SdkResult<History<'_, LooseObjectStore>> {
        let head = self.refs.head()?;
        Ok(History::new(&self.store, head.commit()))
    }

    /// Read and decode any object.
    pub fn cat(&self, id: &ObjectId) -> SdkResult<ObjectContent> {
        ObjectContent::decode(&self.store.read_required(id)?)
    }

    /// Scratch directories an earlier checkout did not clean up.
    pub fn leftover_checkouts(&self) -> SdkResult<Vec<PathBuf>> {
        Ok(leftover_scratch(&self.paths.tmp_dir())?)
    }

    fn warn_leftover_checkouts(&self) {
        match self.leftover_checkouts() {
            Ok(dirs) => {
                for dir in dirs {
                    warn!(path = %dir.display(), "leftover checkout directory; its backup/ may hold an earlier working directory");
                }
            }
            Err(e) => warn!(error = %e, "cannot look for leftover checkout directories"),
        }
    }

    fn lock(&self) -> SdkResult<RepoLock> {
        RepoLock::acquire(self.paths.lock_path())
    }
}

/// Parse a full 40-character hex fingerprint.
pub fn parse_fingerprint(input: &str) -> SdkResult<ObjectId> {
    ObjectId::from_hex(input.trim()).map_err(|e| SdkError::InvalidFingerprint {
        input: input.to_string(),
        reason: e.to_string(),
    })
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("workdir", &self.paths.workdir())
            .finish()
    }
}
