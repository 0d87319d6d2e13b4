//! Mirrors a remote directory tree into a `Repo`.
//!
//! Each directory goes through the same steps: page through its listing,
//! persist every child (blobs directly, subdirectories by descending into
//! them), then assemble and write its own tree object. A directory's tree
//! object is only written once everything beneath it has been written and
//! verified, so a tree in the store never refers to a missing object.
//!
//! The walk keeps an explicit stack of open directories instead of recursing,
//! so tree depth does not consume call stack.

use std::collections::VecDeque;
use std::mem;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::file_mode;
use crate::object::{Id, Kind};
use crate::remote::{RemoteEntry, RemoteTree, Transport};
use crate::repo::Repo;
use crate::tree::{TreeBuilder, TreeEntry};

/// Receives progress events from a `Fetcher`.
pub trait Progress {
    /// An entry was listed. Called before the entry is persisted.
    fn entry(&self, id: &Id, path: &str);

    /// The requested tree has been written.
    fn root(&self, id: &Id, path: &str);
}

/// `Progress` that reports through the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogProgress;

impl Progress for LogProgress {
    fn entry(&self, id: &Id, path: &str) {
        info!("{} {}", id.short(12), path);
    }

    fn root(&self, id: &Id, path: &str) {
        info!("{} {}", id.short(12), path);
    }
}

/// Walks a remote tree and writes every reachable blob and tree into a repo.
pub struct Fetcher<'a, R: Repo + ?Sized, T: Transport> {
    repo: &'a R,
    remote: &'a RemoteTree<T>,
    progress: &'a dyn Progress,
}

// One directory that is being listed or waiting for a subdirectory.
struct Frame {
    builder: TreeBuilder,
    expected_id: Option<Id>,
    listed: VecDeque<RemoteEntry>,
    next_page: Option<String>,
}

impl Frame {
    fn new(path: String, expected_id: Option<Id>) -> Frame {
        Frame {
            builder: TreeBuilder::new(path),
            expected_id,
            listed: VecDeque::new(),
            next_page: Some("1".to_string()),
        }
    }
}

impl<'a, R: Repo + ?Sized, T: Transport> Fetcher<'a, R, T> {
    pub fn new(repo: &'a R, remote: &'a RemoteTree<T>, progress: &'a dyn Progress) -> Self {
        Fetcher {
            repo,
            remote,
            progress,
        }
    }

    /// Mirror the tree at `tree_path` as of `reference`.
    ///
    /// `known_tree_id` is the ID the remote advertised for this tree, if any;
    /// when given, the assembled tree must hash to it. The root of a fetch
    /// normally passes `None` since its ID isn't known up front.
    ///
    /// Returns the ID of the tree written for `tree_path`.
    pub fn fetch(
        &self,
        reference: &str,
        known_tree_id: Option<&Id>,
        tree_path: &str,
    ) -> Result<Id> {
        let mut open: Vec<Frame> = Vec::new();
        let mut frame = Frame::new(tree_path.to_string(), known_tree_id.copied());

        loop {
            if let Some(remote_entry) = frame.listed.pop_front() {
                let is_blob = remote_entry.is_blob();
                let entry = decode_entry(remote_entry)?;
                self.progress.entry(&entry.id, &entry.path);

                let subdir = if is_blob {
                    if self.repo.has_object(&entry.id) {
                        debug!("{} already present, not downloading", entry.path);
                    } else {
                        let content = self.remote.blob(&entry.id)?;
                        self.repo.put_loose_object(
                            Kind::Blob,
                            Some(&entry.id),
                            &entry.path,
                            content,
                        )?;
                    }
                    None
                } else if file_mode::is_submodule(entry.mode) {
                    // The commit lives in another repository.
                    debug!("not descending into submodule {}", entry.path);
                    None
                } else {
                    Some(Frame::new(entry.path.clone(), Some(entry.id)))
                };

                frame.builder.insert(entry)?;

                if let Some(subdir) = subdir {
                    open.push(mem::replace(&mut frame, subdir));
                }
            } else if let Some(page) = frame.next_page.take() {
                let page = self.remote.list_page(frame.builder.path(), reference, &page)?;
                frame.listed = page.entries;
                frame.next_page = page.next_page;
            } else {
                let id = self.write_tree(frame)?;
                match open.pop() {
                    Some(parent) => frame = parent,
                    None => {
                        self.progress.root(&id, tree_path);
                        return Ok(id);
                    }
                }
            }
        }
    }

    fn write_tree(&self, frame: Frame) -> Result<Id> {
        let Frame {
            builder,
            expected_id,
            ..
        } = frame;

        debug!(
            "assembling {} from {} entries",
            builder.path(),
            builder.len()
        );

        self.repo.put_loose_object(
            Kind::Tree,
            expected_id.as_ref(),
            builder.path(),
            builder.encode(),
        )
    }
}

/// Convert a listing entry into a tree entry, validating mode, ID and name.
pub fn decode_entry(remote: RemoteEntry) -> Result<TreeEntry> {
    let mode = match file_mode::parse_octal(&remote.mode) {
        Some(mode) => mode,
        None => {
            return Err(Error::InvalidMode {
                path: remote.path,
                mode: remote.mode,
            })
        }
    };

    let id = match Id::from_hex(&remote.id) {
        Ok(id) => id,
        Err(source) => {
            return Err(Error::InvalidId {
                path: remote.path,
                source,
            })
        }
    };

    if remote.name.is_empty() || remote.name.contains('/') || remote.name.contains('\0') {
        return Err(Error::InvalidName {
            path: remote.path,
            name: remote.name,
        });
    }

    Ok(TreeEntry {
        mode,
        name: remote.name,
        id,
        path: remote.path,
    })
}
