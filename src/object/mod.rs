//! Represents the git concept of an "object" which is a tuple of
//! object type and binary data identified by the hash of the binary data.

use sha1::{Digest, Sha1};

mod id;
pub use id::{Id, ParseIdError};

mod kind;
pub use kind::Kind;

/// Describes a single object about to be stored in a git repository.
///
/// The ID is always derived from the kind and content; it is never taken
/// on trust from elsewhere.
#[derive(Clone, Debug)]
pub struct Object {
    id: Id,
    kind: Kind,
    content: Vec<u8>,
}

impl Object {
    /// Create a new Object and compute its ID.
    ///
    /// This is functionally equivalent to the
    /// [`git hash-object`](https://git-scm.com/docs/git-hash-object) command
    /// without the `-w` option that would write the object to the repo.
    pub fn new(kind: Kind, content: Vec<u8>) -> Object {
        let mut hasher = Sha1::new();
        hasher.update(header(kind, content.len()));
        hasher.update(&content);

        let final_hash = hasher.finalize();
        let mut id = [0; 20];
        id.copy_from_slice(final_hash.as_slice());

        Object {
            id: Id::from_digest(id),
            kind,
            content,
        }
    }

    /// Return the ID of the object.
    pub fn id(&self) -> &Id {
        &self.id
    }

    /// Return the kind of the object.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Return the size (in bytes) of the object's content.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Returns true if the object is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Return the raw (unframed) content.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Return the framed representation `"{kind} {len}\0" + content`,
    /// which is what gets hashed and (compressed) written to disk.
    pub fn framed(&self) -> Vec<u8> {
        let mut framed = header(self.kind, self.content.len());
        framed.extend_from_slice(&self.content);
        framed
    }
}

fn header(kind: Kind, len: usize) -> Vec<u8> {
    format!("{} {}\0", kind, len).into_bytes()
}
