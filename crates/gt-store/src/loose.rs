//! Loose on-disk object store.
//!
//! Each object lives in its own file at `<objects>/<first 2 hex>/<other 38 hex>`
//! and holds the exact header-framed encoding that was hashed.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use gt_types::ObjectId;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// File-per-object store rooted at an `objects/` directory.
#[derive(Clone, Debug)]
pub struct LooseObjectStore {
    objects_dir: PathBuf,
    fsync: bool,
}

impl LooseObjectStore {
    /// Open a store rooted at `objects_dir`. The directory is created lazily.
    pub fn new(objects_dir: impl Into<PathBuf>) -> Self {
        Self {
            objects_dir: objects_dir.into(),
            fsync: false,
        }
    }

    /// Flush each object file to disk before it is renamed into place.
    pub fn with_fsync(mut self, fsync: bool) -> Self {
        self.fsync = fsync;
        self
    }

    /// The root `objects/` directory.
    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    /// Where the object `id` is (or would be) stored.
    pub fn object_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        let (dir, file) = hex.split_at(2);
        self.objects_dir.join(dir).join(file)
    }
}

impl ObjectStore for LooseObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let raw = match fs::read(self.object_path(id)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let object = StoredObject::decode(id, &raw)?;
        if !object.kind.hasher().verify(&object.data, id) {
            return Err(StoreError::CorruptObject {
                id: *id,
                reason: format!("content hashes to {}", object.compute_id()),
            });
        }
        Ok(Some(object))
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        let path = self.object_path(&id);
        if path.exists() {
            debug!(id = %id.short_hex(), kind = %object.kind, "object already stored; skipping write");
            return Ok(id);
        }

        let dir = path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "object path has no parent"))?;
        fs::create_dir_all(dir)?;

        // Write-then-rename: a crash never leaves a partial object behind.
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&object.encode())?;
        if self.fsync {
            tmp.as_file().sync_all()?;
        }
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!(id = %id.short_hex(), kind = %object.kind, size = object.size, "object written");
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        match fs::metadata(self.object_path(id)) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
