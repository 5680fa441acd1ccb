//! Stage-then-swap checkout.
//!
//! A tree is first written out in full to a scratch directory. Only when that
//! succeeds is the working directory touched: its current entries are moved
//! into a backup directory, the staged entries are moved in, and the backup is
//! deleted. If any move fails, everything already moved is put back.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use gt_store::{EntryMode, ObjectStore};
use gt_types::ObjectId;
use tracing::{debug, error, warn};

use crate::error::{WorktreeError, WorktreeResult};

/// Counts from a completed checkout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CheckoutReport {
    /// Files written.
    pub files: usize,
    /// Directories created, not counting the working directory itself.
    pub directories: usize,
    /// Top-level entries of the previous working directory that were replaced.
    pub replaced: usize,
}

/// Prefix of the per-checkout directories created under the scratch directory.
pub const SCRATCH_PREFIX: &str = "checkout-";

/// Write the tree `tree` and everything below it into the existing directory
/// `dest`.
pub fn materialize<S: ObjectStore + ?Sized>(
    store: &S,
    tree: &ObjectId,
    dest: &Path,
) -> WorktreeResult<CheckoutReport> {
    write_tree(store, tree, dest, &BTreeSet::new())
}

/// Like [`materialize`], but entries named in `ignored` are left out at
/// every depth.
fn write_tree<S: ObjectStore + ?Sized>(
    store: &S,
    tree: &ObjectId,
    dest: &Path,
    ignored: &BTreeSet<String>,
) -> WorktreeResult<CheckoutReport> {
    let mut report = CheckoutReport::default();
    let mut pending = vec![(*tree, dest.to_path_buf())];

    while let Some((id, dir)) = pending.pop() {
        // Entry names were validated when the tree was decoded, so joining
        // them can never leave `dest`.
        for entry in store.read_tree(&id)?.entries {
            let path = dir.join(&entry.name);
            if ignored.contains(&entry.name) {
                warn!(path = %path.display(), "tree entry has an ignored name; not checked out");
                continue;
            }
            match entry.mode {
                EntryMode::Regular => {
                    let blob = store.read_blob(&entry.object_id)?;
                    fs::write(&path, &blob.data)?;
                    report.files += 1;
                }
                EntryMode::Directory => {
                    fs::create_dir(&path)?;
                    report.directories += 1;
                    pending.push((entry.object_id, path));
                }
            }
        }
    }

    Ok(report)
}

/// Checkout directories left in `scratch` by an interrupted checkout or a
/// failed rollback. Their `backup/` may hold the only copy of an earlier
/// working directory.
pub fn leftover_scratch(scratch: &Path) -> io::Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(scratch) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry?;
        let is_checkout = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(SCRATCH_PREFIX));
        if is_checkout && entry.file_type()?.is_dir() {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

/// Replaces a working directory's contents with a stored tree.
pub struct Checkout<'s, S: ObjectStore + ?Sized> {
    store: &'s S,
    workdir: PathBuf,
    scratch: PathBuf,
    ignored: BTreeSet<String>,
    protected: BTreeSet<OsString>,
}

impl<'s, S: ObjectStore + ?Sized> Checkout<'s, S> {
    /// Check out into `workdir`, staging under `scratch`.
    ///
    /// `scratch` must be on the same filesystem as `workdir` so entries can be
    /// renamed between them.
    pub fn new(store: &'s S, workdir: impl Into<PathBuf>, scratch: impl Into<PathBuf>) -> Self {
        Self {
            store,
            workdir: workdir.into(),
            scratch: scratch.into(),
            ignored: BTreeSet::new(),
            protected: BTreeSet::new(),
        }
    }

    /// Never write a tree entry called `name`, at any depth.
    pub fn ignore(mut self, name: impl Into<String>) -> Self {
        self.ignored.insert(name.into());
        self
    }

    /// Leave the top-level entry `name` alone.
    pub fn protect(mut self, name: impl Into<OsString>) -> Self {
        self.protected.insert(name.into());
        self
    }

    pub fn protect_all<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<OsString>,
    {
        self.protected.extend(names.into_iter().map(Into::into));
        self
    }

    /// Make the working directory match `tree`.
    ///
    /// Errors before the swap leave the working directory untouched. A failed
    /// swap is rolled back; see [`WorktreeError::SwapFailed`].
    pub fn run(&self, tree: &ObjectId) -> WorktreeResult<CheckoutReport> {
        fs::create_dir_all(&self.scratch)?;
        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(&self.scratch)?;

        let staged = scratch.path().join("staged");
        fs::create_dir(&staged)?;
        let mut report = write_tree(self.store, tree, &staged, &self.ignored)?;
        debug!(tree = %tree.short_hex(), files = report.files, staged = %staged.display(), "tree staged");

        let backup = scratch.path().join("backup");
        match self.swap(&staged, &backup) {
            Ok(replaced) => {
                report.replaced = replaced;
                if let Err(e) = scratch.close() {
                    warn!(error = %e, "failed to remove checkout scratch directory");
                }
                Ok(report)
            }
            Err(err @ WorktreeError::SwapFailed { restored: false, .. }) => {
                // The backup holds the only copy of the previous contents.
                let kept = scratch.into_path();
                error!(backup = %kept.display(), error = %err, "checkout rollback failed");
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Move the working directory's entries into `backup` and the staged ones
    /// into the working directory. Returns how many entries were replaced.
    fn swap(&self, staged: &Path, backup: &Path) -> WorktreeResult<usize> {
        fs::create_dir(backup)?;
        let outgoing = self.entries(&self.workdir)?;
        let incoming = self.entries(staged)?;

        let mut moved_out = Vec::new();
        let mut moved_in = Vec::new();
        let swapped = move_entries(&outgoing, &self.workdir, backup, &mut moved_out)
            .and_then(|()| move_entries(&incoming, staged, &self.workdir, &mut moved_in));

        let Err(source) = swapped else {
            return Ok(outgoing.len());
        };

        warn!(error = %source, "swap failed; restoring previous working directory");
        match self.rollback(backup, &moved_out, &moved_in) {
            Ok(()) => Err(WorktreeError::SwapFailed {
                restored: true,
                backup: None,
                source,
            }),
            Err(rollback) => {
                error!(error = %rollback, "could not restore working directory");
                Err(WorktreeError::SwapFailed {
                    restored: false,
                    backup: Some(backup.to_path_buf()),
                    source,
                })
            }
        }
    }

    fn rollback(&self, backup: &Path, moved_out: &[OsString], moved_in: &[OsString]) -> io::Result<()> {
        for name in moved_in.iter().rev() {
            remove_entry(&self.workdir.join(name))?;
        }
        for name in moved_out.iter().rev() {
            fs::rename(backup.join(name), self.workdir.join(name))?;
        }
        Ok(())
    }

    /// Top-level names in `dir`, minus protected ones.
    fn entries(&self, dir: &Path) -> io::Result<Vec<OsString>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let name = entry?.file_name();
            if self.protected.contains(&name) {
                if dir != self.workdir.as_path() {
                    warn!(name = %name.to_string_lossy(), "tree entry shadows a protected name; not checked out");
                }
                continue;
            }
            names.push(name);
        }
        Ok(names)
    }
}

fn move_entries(
    names: &[OsString],
    from: &Path,
    to: &Path,
    done: &mut Vec<OsString>,
) -> io::Result<()> {
    for name in names {
        fs::rename(from.join(name), to.join(name))?;
        done.push(name.clone());
    }
    Ok(())
}

fn remove_entry(path: &Path) -> io::Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gt_store::{InMemoryObjectStore, LooseObjectStore};

    use crate::builder::TreeBuilder;
    use crate::snapshot::{Directory, Scanner};

    struct Fixture {
        _tmp: tempfile::TempDir,
        workdir: PathBuf,
        store: LooseObjectStore,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = tempfile::tempdir().unwrap();
            let workdir = tmp.path().to_path_buf();
            fs::create_dir_all(workdir.join(".gt/objects")).unwrap();
            let store = LooseObjectStore::new(workdir.join(".gt/objects"));
            Self {
                _tmp: tmp,
                workdir,
                store,
            }
        }

        fn checkout(&self) -> Checkout<'_, LooseObjectStore> {
            Checkout::new(&self.store, &self.workdir, self.workdir.join(".gt/tmp"))
                .ignore(".gt")
                .protect(".gt")
        }

        fn snapshot_id(&self) -> ObjectId {
            let snap = Scanner::new(&self.workdir).ignore(".gt").scan().unwrap();
            TreeBuilder::new(&self.store).build(&snap.root).unwrap().id
        }

        fn write(&self, rel: &str, content: &str) {
            let path = self.workdir.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        fn read(&self, rel: &str) -> String {
            fs::read_to_string(self.workdir.join(rel)).unwrap()
        }

        fn top_level(&self) -> Vec<String> {
            let mut names: Vec<_> = fs::read_dir(&self.workdir)
                .unwrap()
                .map(|e| e.unwrap().file_name().into_string().unwrap())
                .collect();
            names.sort();
            names
        }
    }

    #[test]
    fn materialize_writes_nested_tree() {
        let store = InMemoryObjectStore::new();
        let root = Directory::new("r")
            .with_file("a.txt", "A")
            .with_subdirectory(Directory::new("sub").with_file("b.txt", "B"))
            .with_subdirectory(Directory::new("empty"));
        let id = TreeBuilder::new(&store).build(&root).unwrap().id;

        let dest = tempfile::tempdir().unwrap();
        let report = materialize(&store, &id, dest.path()).unwrap();
        assert_eq!(report.files, 2);
        assert_eq!(report.directories, 2);
        assert_eq!(fs::read(dest.path().join("a.txt")).unwrap(), b"A");
        assert_eq!(fs::read(dest.path().join("sub/b.txt")).unwrap(), b"B");
        assert!(dest.path().join("empty").is_dir());
    }

    #[test]
    fn checkout_round_trip_restores_bytes() {
        let fx = Fixture::new();
        fx.write("file1.txt", "version one");
        fx.write("dir/nested.txt", "nested one");
        let first = fx.snapshot_id();

        fx.write("file1.txt", "version two");
        fs::remove_dir_all(fx.workdir.join("dir")).unwrap();
        fx.write("new/only-in-second.txt", "second");
        let second = fx.snapshot_id();

        let report = fx.checkout().run(&first).unwrap();
        assert_eq!(report.replaced, 2);
        assert_eq!(fx.read("file1.txt"), "version one");
        assert_eq!(fx.read("dir/nested.txt"), "nested one");
        assert!(!fx.workdir.join("new").exists());
        assert_eq!(fx.snapshot_id(), first);

        fx.checkout().run(&second).unwrap();
        assert_eq!(fx.read("file1.txt"), "version two");
        assert_eq!(fx.read("new/only-in-second.txt"), "second");
        assert_eq!(fx.snapshot_id(), second);
    }

    #[test]
    fn metadata_directory_is_untouched() {
        let fx = Fixture::new();
        fx.write("tracked", "x");
        let id = fx.snapshot_id();
        fs::write(fx.workdir.join(".gt/HEAD"), "keep me").unwrap();
        fx.write("untracked", "y");

        fx.checkout().run(&id).unwrap();
        assert_eq!(fx.top_level(), [".gt", "tracked"]);
        assert_eq!(fx.read(".gt/HEAD"), "keep me");
        assert!(fx.store.exists(&id).unwrap());
    }

    #[test]
    fn scratch_directory_is_cleaned_up() {
        let fx = Fixture::new();
        fx.write("f", "1");
        let id = fx.snapshot_id();
        fx.checkout().run(&id).unwrap();
        assert_eq!(fs::read_dir(fx.workdir.join(".gt/tmp")).unwrap().count(), 0);
    }

    #[test]
    fn missing_object_leaves_workdir_untouched() {
        let fx = Fixture::new();
        fx.write("keep.txt", "precious");
        let missing = ObjectId::from_bytes(b"no such tree");

        let err = fx.checkout().run(&missing).unwrap_err();
        assert!(matches!(
            err,
            WorktreeError::Store(gt_store::StoreError::NotFound(_))
        ));
        assert_eq!(fx.read("keep.txt"), "precious");
        assert_eq!(fx.top_level(), [".gt", "keep.txt"]);
    }

    #[test]
    fn missing_blob_mid_tree_leaves_workdir_untouched() {
        let fx = Fixture::new();
        fx.write("a.txt", "aaa");
        fx.write("b.txt", "bbb");
        let id = fx.snapshot_id();

        let blob = fx.store.read_tree(&id).unwrap().get("b.txt").unwrap().object_id;
        fs::remove_file(fx.store.object_path(&blob)).unwrap();
        fx.write("a.txt", "modified");

        assert!(fx.checkout().run(&id).is_err());
        assert_eq!(fx.read("a.txt"), "modified");
        assert_eq!(fx.read("b.txt"), "bbb");
    }

    #[test]
    fn excluded_names_are_left_alone() {
        let fx = Fixture::new();
        fx.write("tracked", "x");
        let id = fx.snapshot_id();
        fx.write("target/build.out", "artifact");

        fx.checkout().protect("target").run(&id).unwrap();
        assert_eq!(fx.read("target/build.out"), "artifact");
        assert_eq!(fx.read("tracked"), "x");
    }

    #[test]
    fn rollback_restores_moved_entries() {
        let fx = Fixture::new();
        fx.write("one", "1");
        fx.write("two/inner", "2");
        let checkout = fx.checkout();

        let backup = fx.workdir.join(".gt/backup");
        fs::create_dir(&backup).unwrap();
        let names: Vec<OsString> = vec!["one".into(), "two".into()];
        let mut moved = Vec::new();
        move_entries(&names, &fx.workdir, &backup, &mut moved).unwrap();
        fx.write("one", "incoming");

        checkout
            .rollback(&backup, &moved, &[OsString::from("one")])
            .unwrap();
        assert_eq!(fx.read("one"), "1");
        assert_eq!(fx.read("two/inner"), "2");
        assert_eq!(fs::read_dir(&backup).unwrap().count(), 0);
    }

    #[test]
    fn ignored_names_are_not_materialized() {
        let fx = Fixture::new();
        fs::write(fx.workdir.join(".gt/HEAD"), "ours").unwrap();
        let root = Directory::new("r")
            .with_file("top.txt", "t")
            .with_subdirectory(
                Directory::new("sub")
                    .with_file("a.txt", "a")
                    .with_subdirectory(Directory::new(".gt").with_file("HEAD", "theirs")),
            );
        let id = TreeBuilder::new(&fx.store).build(&root).unwrap().id;

        let report = fx.checkout().run(&id).unwrap();
        assert_eq!(report.files, 2);
        assert_eq!(fx.read("sub/a.txt"), "a");
        assert!(!fx.workdir.join("sub/.gt").exists());
        assert_eq!(fx.read(".gt/HEAD"), "ours");
    }

    #[cfg(unix)]
    #[test]
    fn failed_swap_restores_previous_contents() {
        use std::os::unix::fs::PermissionsExt;

        let fx = Fixture::new();
        fx.write("a.txt", "before");
        fx.write("dir/inner", "inner before");

        let staged = fx.workdir.join(".gt/staged");
        let locked = staged.join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(staged.join("a.txt"), "after").unwrap();
        // Moving a directory to a new parent needs write access to it.
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();
        if fs::write(locked.join("w"), "").is_ok() {
            // Permission bits do not stop a privileged user.
            return;
        }

        let backup = fx.workdir.join(".gt/backup");
        let result = fx.checkout().swap(&staged, &backup);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(matches!(
            result,
            Err(WorktreeError::SwapFailed {
                restored: true,
                backup: None,
                ..
            })
        ));
        assert_eq!(fx.top_level(), [".gt", "a.txt", "dir"]);
        assert_eq!(fx.read("a.txt"), "before");
        assert_eq!(fx.read("dir/inner"), "inner before");
        assert_eq!(fs::read_dir(&backup).unwrap().count(), 0);
    }

    #[test]
    fn leftover_scratch_lists_checkout_dirs_only() {
        let tmp = tempfile::tempdir().unwrap();
        let scratch = tmp.path().join("tmp");
        assert!(leftover_scratch(&scratch).unwrap().is_empty());

        fs::create_dir_all(scratch.join("checkout-abc/backup")).unwrap();
        fs::create_dir_all(scratch.join("other")).unwrap();
        fs::write(scratch.join("checkout-file"), "").unwrap();

        assert_eq!(
            leftover_scratch(&scratch).unwrap(),
            [scratch.join("checkout-abc")]
        );
    }
}
