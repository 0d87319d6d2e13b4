//! Mirrors a remote source tree, exposed through a paginated tree/blob HTTP
//! API, into a local git object store as loose blob and tree objects.
//!
//! The pieces, bottom-up:
//!
//! * [`object`] frames content and derives its SHA-1 ID.
//! * [`tree`] assembles the canonical encoding of a directory.
//! * [`repo::on_disk::OnDisk`] writes verified, compressed objects exactly once.
//! * [`remote::RemoteTree`] pages through listings and downloads blobs.
//! * [`fetch::Fetcher`] walks the remote tree and ties it all together.

pub mod error;
pub use error::{Error, Result};

pub mod fetch;
pub mod file_mode;
pub mod object;
pub mod remote;
pub mod repo;
pub mod tree;
