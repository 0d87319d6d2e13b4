//! Canonical tree encoding.
//!
//! A tree object's content is the concatenation of one record per child,
//! `"{mode in octal} {name}\0{20-byte id}"`, ordered by [`TreeEntry::sort_key`].
//! That ordering is what makes a tree's ID reproducible no matter how the
//! listing was paginated.

use std::collections::btree_map::{BTreeMap, Entry};

use crate::error::{Error, Result};
use crate::file_mode;
use crate::object::{Id, Kind, Object};

/// One child of a directory being assembled.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TreeEntry {
    /// Raw mode as reported by the remote; re-emitted unchanged.
    pub mode: u32,

    /// Base name (no path separators).
    pub name: String,

    /// ID of the blob or tree this entry points at.
    pub id: Id,

    /// Full path from the tree root. Only used for diagnostics and for
    /// fetching subdirectories.
    pub path: String,
}

impl TreeEntry {
    /// Returns true if this entry is a subdirectory.
    pub fn is_tree(&self) -> bool {
        file_mode::is_tree(self.mode)
    }

    /// The name with a trailing `/` appended for subdirectories.
    ///
    /// This places directory `foo` after file `foo.c` but before file `foo0`,
    /// matching the order git itself writes.
    pub fn sort_key(&self) -> String {
        let mut key = self.name.clone();
        if self.is_tree() {
            key.push('/');
        }
        key
    }

    /// Append this entry's framed record to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(format!("{:o} {}\0", self.mode, self.name).as_bytes());
        out.extend_from_slice(self.id.as_bytes());
    }
}

/// Collects the entries of one directory (possibly across several listing
/// pages) and produces the canonical tree object.
#[derive(Debug)]
pub struct TreeBuilder {
    path: String,
    entries: BTreeMap<String, TreeEntry>,
}

impl TreeBuilder {
    /// Create an empty builder for the directory at `path`.
    pub fn new<S: Into<String>>(path: S) -> TreeBuilder {
        TreeBuilder {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Path of the directory being assembled.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Record an entry.
    ///
    /// Fails with `DuplicateEntry` if an entry with the same sort key was
    /// already recorded, which happens when pages overlap.
    pub fn insert(&mut self, entry: TreeEntry) -> Result<()> {
        match self.entries.entry(entry.sort_key()) {
            Entry::Occupied(_) => Err(Error::DuplicateEntry {
                path: self.path.clone(),
                name: entry.name,
            }),
            Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok(())
            }
        }
    }

    /// Number of entries recorded so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries have been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the entries in canonical order.
    pub fn entries(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.values()
    }

    /// Concatenate all records in canonical order.
    pub fn encode(&self) -> Vec<u8> {
        let mut content = Vec::new();
        for entry in self.entries.values() {
            entry.encode_into(&mut content);
        }
        content
    }

    /// Consume the builder and produce the tree object.
    pub fn into_object(self) -> Object {
        Object::new(Kind::Tree, self.encode())
    }
}
