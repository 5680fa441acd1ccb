use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use gt_types::ObjectId;

use crate::error::StoreResult;
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. Objects are cloned on read and write.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, StoredObject>>,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let map = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        Ok(map.get(id).cloned())
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        let mut map = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        // Same ID always maps to the same content, so an existing entry wins.
        map.entry(id).or_insert_with(|| object.clone());
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        Ok(map.contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::object::*;

    fn make_blob(content: &[u8]) -> StoredObject {
        Blob::new(content.to_vec()).to_stored_object()
    }

    fn make_tree() -> StoredObject {
        let tree = Tree::new(vec![
            TreeEntry::new(
                EntryMode::Regular,
                "hello.txt",
                ObjectId::from_bytes(b"hello"),
            ),
            TreeEntry::new(
                EntryMode::Directory,
                "subdir",
                ObjectId::from_bytes(b"subdir"),
            ),
        ]);
        tree.to_stored_object().unwrap()
    }

    #[test]
    fn new_store_is_empty() {
        let store = InMemoryObjectStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn write_and_read_blob() {
        let store = InMemoryObjectStore::new();
        let obj = make_blob(b"hello world");
        let id = store.write(&obj).unwrap();
        assert_eq!(store.read(&id).unwrap(), Some(obj));
        assert_eq!(store.get(&id).unwrap(), b"hello world");
    }

    #[test]
    fn write_is_idempotent() {
        let store = InMemoryObjectStore::new();
        let obj = make_tree();
        let id1 = store.write(&obj).unwrap();
        let id2 = store.write(&obj).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn put_matches_write() {
        let store = InMemoryObjectStore::new();
        let id = store.put(ObjectKind::Blob, b"payload").unwrap();
        assert_eq!(id, make_blob(b"payload").compute_id());
        assert!(store.exists(&id).unwrap());
    }

    #[test]
    fn get_missing_is_not_found() {
        let store = InMemoryObjectStore::new();
        let missing = ObjectId::from_bytes(b"nothing");
        assert!(store.read(&missing).unwrap().is_none());
        assert!(matches!(
            store.get(&missing),
            Err(StoreError::NotFound(id)) if id == missing
        ));
    }

    #[test]
    fn typed_reads_check_kind() {
        let store = InMemoryObjectStore::new();
        let blob_id = store.write(&make_blob(b"data")).unwrap();
        let tree_id = store.write(&make_tree()).unwrap();

        assert_eq!(store.read_tree(&tree_id).unwrap().len(), 2);
        assert!(matches!(
            store.read_tree(&blob_id),
            Err(StoreError::CorruptObject { .. })
        ));
        assert!(matches!(
            store.read_commit(&blob_id),
            Err(StoreError::CorruptObject { .. })
        ));
    }

    #[test]
    fn debug_shows_count() {
        let store = InMemoryObjectStore::new();
        store.write(&make_blob(b"x")).unwrap();
        assert!(format!("{store:?}").contains("object_count: 1"));
    }
}
