//! Represents the local object store that remote trees are mirrored into.
//!
//! Only loose blob and tree objects are written. There is no support for
//! packfiles, refs or commits.

use crate::error::Result;
use crate::object::{Id, Kind};

pub mod on_disk;

/// A struct that implements the `Repo` trait represents a particular mechanism
/// for storing objects.
pub trait Repo {
    /// Frame, hash and store `content` as an object of the given kind.
    ///
    /// If `expected_id` is given it must match the computed ID, otherwise the
    /// call fails with `Error::DigestMismatch` naming `path` and nothing is
    /// written. Storing an object that already exists is a no-op.
    ///
    /// Returns the object's ID.
    fn put_loose_object(
        &self,
        kind: Kind,
        expected_id: Option<&Id>,
        path: &str,
        content: Vec<u8>,
    ) -> Result<Id>;

    /// Returns true if an object with this ID is already stored.
    fn has_object(&self, id: &Id) -> bool;
}
