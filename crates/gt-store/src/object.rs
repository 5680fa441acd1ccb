use std::collections::HashSet;

use gt_crypto::ContentHasher;
use gt_types::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Raw file content.
    Blob,
    /// Directory listing: entries mapping names to object references.
    Tree,
    /// Snapshot metadata linking a tree to its parent commit.
    Commit,
}

impl ObjectKind {
    /// The header tag for this kind (`"blob"`, `"tree"`, `"commit"`).
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
        }
    }

    /// Parse a header tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "blob" => Some(Self::Blob),
            "tree" => Some(Self::Tree),
            "commit" => Some(Self::Commit),
            _ => None,
        }
    }

    /// The header-framing hasher for this kind.
    pub fn hasher(&self) -> &'static ContentHasher {
        match self {
            Self::Blob => &ContentHasher::BLOB,
            Self::Tree => &ContentHasher::TREE,
            Self::Commit => &ContentHasher::COMMIT,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A stored object: kind tag + payload + cached size.
///
/// `StoredObject` is the unit of storage. The payload excludes the
/// `"<kind> <len>\0"` header; [`encode`](Self::encode) adds it and
/// [`decode`](Self::decode) strips and checks it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// The type of this object.
    pub kind: ObjectKind,
    /// The payload bytes (header stripped).
    pub data: Vec<u8>,
    /// The size of `data` in bytes.
    pub size: u64,
}

impl StoredObject {
    /// Create a new stored object from kind and payload.
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    /// Compute the content-addressed ID for this object.
    pub fn compute_id(&self) -> ObjectId {
        self.kind.hasher().hash(&self.data)
    }

    /// The full on-disk encoding: header followed by payload.
    pub fn encode(&self) -> Vec<u8> {
        self.kind.hasher().frame(&self.data)
    }

    /// Decode an on-disk encoding read from the location of `id`.
    ///
    /// The header must name a known kind and declare exactly the number of
    /// payload bytes that follow the NUL separator.
    pub fn decode(id: &ObjectId, raw: &[u8]) -> StoreResult<Self> {
        let nul = raw
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| StoreError::corrupt(*id, "missing header separator"))?;
        let header = std::str::from_utf8(&raw[..nul])
            .map_err(|_| StoreError::corrupt(*id, "header is not valid UTF-8"))?;
        let (tag, len) = header
            .split_once(' ')
            .ok_or_else(|| StoreError::corrupt(*id, format!("malformed header {header:?}")))?;
        let kind = ObjectKind::from_tag(tag)
            .ok_or_else(|| StoreError::corrupt(*id, format!("unknown object kind {tag:?}")))?;
        let declared: usize = len
            .parse()
            .map_err(|_| StoreError::corrupt(*id, format!("invalid length {len:?}")))?;
        let data = &raw[nul + 1..];
        if declared != data.len() {
            return Err(StoreError::corrupt(
                *id,
                format!("header declares {declared} bytes, found {}", data.len()),
            ));
        }
        Ok(Self::new(kind, data.to_vec()))
    }

    fn expect_kind(&self, kind: ObjectKind) -> StoreResult<()> {
        if self.kind != kind {
            return Err(StoreError::corrupt(
                self.compute_id(),
                format!("expected {kind}, got {}", self.kind),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Raw content object (one file's bytes).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    /// Create a new blob from raw bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, self.data.clone())
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Blob)?;
        Ok(Self {
            data: obj.data.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// File mode for a tree entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryMode {
    /// Normal file (`100644`).
    Regular,
    /// Subtree / directory (`040000`).
    Directory,
}

impl EntryMode {
    /// The literal mode string written into tree payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "100644",
            Self::Directory => "040000",
        }
    }

    /// Parse the literal mode string of a tree entry line.
    pub fn from_mode_str(s: &str) -> Option<Self> {
        match s {
            "100644" => Some(Self::Regular),
            "040000" => Some(Self::Directory),
            _ => None,
        }
    }

    /// The kind of object an entry with this mode references.
    pub fn object_kind(&self) -> ObjectKind {
        match self {
            Self::Regular => ObjectKind::Blob,
            Self::Directory => ObjectKind::Tree,
        }
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check that `name` is a single path segment the tree encoding can carry.
pub fn validate_entry_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("entry name is empty".to_string());
    }
    if name == "." || name == ".." {
        return Err(format!("entry name {name:?} is reserved"));
    }
    if let Some(c) = name.chars().find(|c| matches!(c, '/' | '\0' | '\n')) {
        return Err(format!("entry name {name:?} contains forbidden character {c:?}"));
    }
    Ok(())
}

/// A single entry in a tree object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// File mode (regular file or directory).
    pub mode: EntryMode,
    /// Entry name (a single path segment).
    pub name: String,
    /// Content-addressed ID of the referenced object.
    pub object_id: ObjectId,
}

impl TreeEntry {
    /// Create a new tree entry.
    pub fn new(mode: EntryMode, name: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            mode,
            name: name.into(),
            object_id,
        }
    }

    /// Kind of the referenced object (blob for files, tree for directories).
    pub fn kind(&self) -> ObjectKind {
        self.mode.object_kind()
    }

    fn encode_line(&self) -> String {
        format!("{} {} {}\n", self.mode, self.name, self.object_id)
    }

    fn parse_line(line: &str) -> Option<Self> {
        let (mode, rest) = line.split_once(' ')?;
        let mode = EntryMode::from_mode_str(mode)?;
        // Names may contain spaces; the fingerprint never does.
        let (name, hex) = rest.rsplit_once(' ')?;
        let object_id = ObjectId::from_hex(hex).ok()?;
        validate_entry_name(name).ok()?;
        Some(Self::new(mode, name, object_id))
    }
}

impl PartialOrd for TreeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TreeEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

/// Directory listing object.
///
/// Payload: one `"<mode> <name> <hex-fingerprint>\n"` line per entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    /// Entries in this directory, sorted by name when built with [`Tree::new`].
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create a new tree with the given entries.
    ///
    /// Entries are sorted by name so the fingerprint does not depend on the
    /// order the filesystem listed them in.
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort();
        Self { entries }
    }

    /// Create an empty tree.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Convert into a `StoredObject` for storage.
    ///
    /// Fails with [`StoreError::Encoding`] if an entry name cannot be written
    /// as a single segment or appears twice.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        let mut data = String::new();
        for entry in &self.entries {
            validate_entry_name(&entry.name).map_err(StoreError::Encoding)?;
            if !seen.insert(entry.name.as_str()) {
                return Err(StoreError::Encoding(format!(
                    "duplicate tree entry name {:?}",
                    entry.name
                )));
            }
            data.push_str(&entry.encode_line());
        }
        Ok(StoredObject::new(ObjectKind::Tree, data.into_bytes()))
    }

    /// Decode from a `StoredObject`.
    ///
    /// Entry order is kept exactly as stored.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Tree)?;
        let id = obj.compute_id();
        let text = std::str::from_utf8(&obj.data)
            .map_err(|_| StoreError::corrupt(id, "tree payload is not valid UTF-8"))?;
        if !text.is_empty() && !text.ends_with('\n') {
            return Err(StoreError::corrupt(id, "unterminated tree entry line"));
        }

        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for line in text.split_terminator('\n') {
            let entry = TreeEntry::parse_line(line).ok_or_else(|| {
                StoreError::corrupt(id, format!("malformed tree entry line {line:?}"))
            })?;
            if !seen.insert(entry.name.clone()) {
                return Err(StoreError::corrupt(
                    id,
                    format!("duplicate tree entry name {:?}", entry.name),
                ));
            }
            entries.push(entry);
        }
        Ok(Self { entries })
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// Snapshot metadata: a root tree, at most one parent, a time and a message.
///
/// Payload: `tree <fp>`, optional `parent <fp>`, `timestamp <secs>` and
/// `message <text>` lines, each terminated by `\n`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Root tree of the snapshot.
    pub tree: ObjectId,
    /// The previous commit, `None` for the first commit.
    pub parent: Option<ObjectId>,
    /// Unix time in seconds.
    pub timestamp: i64,
    /// Single-line commit message.
    pub message: String,
}

impl Commit {
    /// Create a new commit.
    pub fn new(
        tree: ObjectId,
        parent: Option<ObjectId>,
        timestamp: i64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tree,
            parent,
            timestamp,
            message: message.into(),
        }
    }

    /// Check that a message survives the line-based encoding.
    pub fn validate_message(message: &str) -> StoreResult<()> {
        if message.contains(['\n', '\r']) {
            return Err(StoreError::Encoding(
                "commit message must be a single line".to_string(),
            ));
        }
        Ok(())
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        Self::validate_message(&self.message)?;
        let mut body = format!("tree {}\n", self.tree);
        if let Some(parent) = &self.parent {
            body.push_str(&format!("parent {parent}\n"));
        }
        body.push_str(&format!("timestamp {}\n", self.timestamp));
        body.push_str(&format!("message {}\n", self.message));
        Ok(StoredObject::new(ObjectKind::Commit, body.into_bytes()))
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Commit)?;
        let id = obj.compute_id();
        let text = std::str::from_utf8(&obj.data)
            .map_err(|_| StoreError::corrupt(id, "commit payload is not valid UTF-8"))?;

        let mut tree = None;
        let mut parent = None;
        let mut timestamp = None;
        let mut message = None;

        for line in text.split_terminator('\n') {
            let (key, value) = line
                .split_once(' ')
                .ok_or_else(|| StoreError::corrupt(id, format!("malformed commit line {line:?}")))?;
            let duplicate = match key {
                "tree" => tree.replace(parse_id(&id, key, value)?).is_some(),
                "parent" => parent.replace(parse_id(&id, key, value)?).is_some(),
                "timestamp" => {
                    let secs = value.parse::<i64>().map_err(|_| {
                        StoreError::corrupt(id, format!("invalid timestamp {value:?}"))
                    })?;
                    timestamp.replace(secs).is_some()
                }
                "message" => message.replace(value.to_string()).is_some(),
                other => {
                    return Err(StoreError::corrupt(
                        id,
                        format!("unknown commit field {other:?}"),
                    ))
                }
            };
            if duplicate {
                return Err(StoreError::corrupt(id, format!("duplicate commit field {key:?}")));
            }
        }

        Ok(Self {
            tree: tree.ok_or_else(|| StoreError::corrupt(id, "commit has no tree"))?,
            parent,
            timestamp: timestamp
                .ok_or_else(|| StoreError::corrupt(id, "commit has no timestamp"))?,
            message: message.ok_or_else(|| StoreError::corrupt(id, "commit has no message"))?,
        })
    }
}

fn parse_id(id: &ObjectId, field: &str, value: &str) -> StoreResult<ObjectId> {
    ObjectId::from_hex(value)
        .map_err(|e| StoreError::corrupt(*id, format!("invalid {field} fingerprint: {e}")))
}
