use gt_types::ObjectId;
use sha1::{Digest, Sha1};

/// Header-framing SHA-1 content hasher.
///
/// Each hasher carries an object kind tag (`"blob"`, `"tree"`, `"commit"`)
/// that is written in front of the payload together with the payload length.
/// A blob and a tree with identical payload bytes therefore hash differently.
pub struct ContentHasher {
    kind: &'static str,
}

impl ContentHasher {
    /// Hasher for blob objects.
    pub const BLOB: Self = Self { kind: "blob" };
    /// Hasher for tree objects.
    pub const TREE: Self = Self { kind: "tree" };
    /// Hasher for commit objects.
    pub const COMMIT: Self = Self { kind: "commit" };

    /// The object header for a payload of `len` bytes: `"<kind> <len>\0"`.
    pub fn header(&self, len: usize) -> Vec<u8> {
        format!("{} {}\0", self.kind, len).into_bytes()
    }

    /// Header followed by payload: the exact bytes written to disk.
    pub fn frame(&self, payload: &[u8]) -> Vec<u8> {
        let mut out = self.header(payload.len());
        out.extend_from_slice(payload);
        out
    }

    /// Fingerprint of the framed payload.
    ///
    /// Hashes header and payload incrementally, so the framed buffer is never
    /// materialized.
    pub fn hash(&self, payload: &[u8]) -> ObjectId {
        let mut hasher = Sha1::new();
        hasher.update(self.header(payload.len()));
        hasher.update(payload);
        let digest = hasher.finalize();
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&digest);
        ObjectId::from_hash(arr)
    }

    /// Verify that a payload produces the expected object ID.
    pub fn verify(&self, payload: &[u8], expected: &ObjectId) -> bool {
        self.hash(payload) == *expected
    }
}
