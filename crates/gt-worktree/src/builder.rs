//! Turns a [`Directory`] snapshot into stored blob and tree objects.

use gt_store::{Blob, EntryMode, ObjectStore, Tree, TreeEntry};
use gt_types::ObjectId;
use tracing::debug;

use crate::error::WorktreeResult;
use crate::snapshot::Directory;

/// The root tree produced by [`TreeBuilder::build`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltTree {
    pub id: ObjectId,
    pub tree: Tree,
    /// Blob writes issued, including ones the store already had.
    pub blobs: usize,
    /// Tree writes issued, root included.
    pub trees: usize,
}

/// Writes every file of a snapshot as a blob and every directory as a tree.
///
/// Directories are listed breadth-first and then written in reverse, so each
/// tree is written after all of its children without recursion. Entries are
/// sorted by name before encoding, so the result depends only on names and
/// contents, never on the order the snapshot lists them in.
pub struct TreeBuilder<'s, S: ObjectStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: ObjectStore + ?Sized> TreeBuilder<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Store `root` and everything below it, returning the root tree.
    pub fn build(&self, root: &Directory) -> WorktreeResult<BuiltTree> {
        // Every directory appears after its parent; parents[i] indexes dirs.
        let mut dirs = vec![root];
        let mut parents = vec![0];
        let mut next = 0;
        while let Some(dir) = dirs.get(next).copied() {
            for sub in &dir.subdirectories {
                dirs.push(sub);
                parents.push(next);
            }
            next += 1;
        }

        let mut pending: Vec<Vec<TreeEntry>> = vec![Vec::new(); dirs.len()];
        let mut blobs = 0;
        for index in (1..dirs.len()).rev() {
            let dir = dirs[index];
            let subtrees = std::mem::take(&mut pending[index]);
            let (id, _) = self.write_directory(dir, subtrees, &mut blobs)?;
            pending[parents[index]].push(TreeEntry::new(EntryMode::Directory, dir.name.clone(), id));
        }

        let subtrees = std::mem::take(&mut pending[0]);
        let (id, tree) = self.write_directory(root, subtrees, &mut blobs)?;
        Ok(BuiltTree {
            id,
            tree,
            blobs,
            trees: dirs.len(),
        })
    }

    /// Write `dir`'s files as blobs, then its tree.
    fn write_directory(
        &self,
        dir: &Directory,
        mut entries: Vec<TreeEntry>,
        blobs: &mut usize,
    ) -> WorktreeResult<(ObjectId, Tree)> {
        for file in &dir.files {
            let id = self
                .store
                .write(&Blob::new(file.content.clone()).to_stored_object())?;
            *blobs += 1;
            entries.push(TreeEntry::new(EntryMode::Regular, file.name.clone(), id));
        }

        let tree = Tree::new(entries);
        let id = self.store.write(&tree.to_stored_object()?)?;
        debug!(tree = %id.short_hex(), dir = %dir.name, entries = tree.len(), "tree written");
        Ok((id, tree))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gt_store::{InMemoryObjectStore, ObjectKind, StoreError};

    use crate::error::WorktreeError;
    use crate::snapshot::File;

    fn sample() -> Directory {
        Directory::new("root")
            .with_file("file1.txt", "content1")
            .with_subdirectory(
                Directory::new("a").with_subdirectory(Directory::new("b").with_file("x", "x")),
            )
            .with_subdirectory(Directory::new("c").with_file("y", "y"))
    }

    fn entry_id(tree: &Tree, name: &str) -> ObjectId {
        tree.get(name).unwrap().object_id
    }

    #[test]
    fn single_file_scenario() {
        let store = InMemoryObjectStore::new();
        let root = Directory::new("root").with_file("file1.txt", "content1");

        let built = TreeBuilder::new(&store).build(&root).unwrap();
        let entry = built.tree.get("file1.txt").unwrap();
        assert_eq!(entry.mode, EntryMode::Regular);
        assert_eq!(entry.kind(), ObjectKind::Blob);
        assert_eq!(
            entry.object_id.to_hex(),
            "dd954e7a4e1a62ff90c5a0709dce5928716535c1"
        );
        assert_eq!(store.get(&entry.object_id).unwrap(), b"content1");
        assert_eq!(
            store.get(&built.id).unwrap(),
            b"100644 file1.txt dd954e7a4e1a62ff90c5a0709dce5928716535c1\n"
        );
    }

    #[test]
    fn nested_trees_are_stored() {
        let store = InMemoryObjectStore::new();
        let built = TreeBuilder::new(&store).build(&sample()).unwrap();
        assert_eq!(built.blobs, 3);
        assert_eq!(built.trees, 4);

        let a = store.read_tree(&entry_id(&built.tree, "a")).unwrap();
        assert_eq!(a.get("b").unwrap().mode, EntryMode::Directory);
        let b = store.read_tree(&entry_id(&a, "b")).unwrap();
        assert_eq!(store.get(&entry_id(&b, "x")).unwrap(), b"x");
    }

    #[test]
    fn building_twice_is_deterministic() {
        let store = InMemoryObjectStore::new();
        let first = TreeBuilder::new(&store).build(&sample()).unwrap();
        let count = store.len();
        let second = TreeBuilder::new(&store).build(&sample()).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.len(), count);
    }

    #[test]
    fn enumeration_order_does_not_matter() {
        let store = InMemoryObjectStore::new();
        let mut reversed = sample();
        reversed.subdirectories.reverse();
        reversed.files.push(File::new("another", "z"));
        let mut forward = sample();
        forward.files.insert(0, File::new("another", "z"));

        let a = TreeBuilder::new(&store).build(&reversed).unwrap();
        let b = TreeBuilder::new(&store).build(&forward).unwrap();
        assert_eq!(a.id, b.id);
        let names: Vec<_> = a.tree.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "another", "c", "file1.txt"]);
    }

    #[test]
    fn change_propagates_to_ancestors_only() {
        let store = InMemoryObjectStore::new();
        let before = TreeBuilder::new(&store).build(&sample()).unwrap();

        let mut changed = sample();
        changed.subdirectories[0].subdirectories[0].files[0].content = b"changed".to_vec();
        let after = TreeBuilder::new(&store).build(&changed).unwrap();

        assert_ne!(before.id, after.id);
        let a_before = entry_id(&before.tree, "a");
        let a_after = entry_id(&after.tree, "a");
        assert_ne!(a_before, a_after);
        assert_ne!(
            entry_id(&store.read_tree(&a_before).unwrap(), "b"),
            entry_id(&store.read_tree(&a_after).unwrap(), "b")
        );
        // Sibling subtree and untouched file keep their fingerprints.
        assert_eq!(entry_id(&before.tree, "c"), entry_id(&after.tree, "c"));
        assert_eq!(
            entry_id(&before.tree, "file1.txt"),
            entry_id(&after.tree, "file1.txt")
        );
    }

    #[test]
    fn empty_directory_is_the_empty_tree() {
        let store = InMemoryObjectStore::new();
        let built = TreeBuilder::new(&store).build(&Directory::new("root")).unwrap();
        assert!(built.tree.is_empty());
        assert_eq!(
            built.id,
            Tree::empty().to_stored_object().unwrap().compute_id()
        );
    }

    #[test]
    fn deep_nesting_does_not_recurse() {
        let store = InMemoryObjectStore::new();
        let mut dir = Directory::new("leaf").with_file("f", "deep");
        for i in 0..2_000 {
            dir = Directory::new(format!("d{i}")).with_subdirectory(dir);
        }
        let built = TreeBuilder::new(&store).build(&dir).unwrap();
        assert_eq!(built.trees, 2_001);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let store = InMemoryObjectStore::new();
        let root = Directory::new("root")
            .with_file("same", "1")
            .with_subdirectory(Directory::new("same"));
        assert!(matches!(
            TreeBuilder::new(&store).build(&root),
            Err(WorktreeError::Store(StoreError::Encoding(_)))
        ));
    }
}
