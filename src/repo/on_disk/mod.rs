//! A repository that stores content on the local file system.
//!
//! It intentionally uses the same `.git` folder format as command-line git,
//! so the mirrored objects can be inspected with `git cat-file` afterwards.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use log::debug;
use tempfile::NamedTempFile;

use super::Repo;
use crate::error::{Error, Result};
use crate::object::{Id, Kind, Object};

/// Implementation of `Repo` that stores content on the local file system.
#[derive(Debug)]
pub struct OnDisk {
    work_dir: PathBuf,
    git_dir: PathBuf,
}

impl OnDisk {
    /// Open an existing on-disk git repository.
    ///
    /// `work_dir` should be the top-level working directory. A `.git` directory should
    /// exist at this path. Use `init` function to create an empty on-disk repository if
    /// necessary.
    pub fn new<P: AsRef<Path>>(work_dir: P) -> Result<Self> {
        let work_dir = work_dir.as_ref().to_path_buf();
        if !work_dir.exists() {
            return Err(Error::WorkDirDoesntExist(work_dir));
        }

        let git_dir = work_dir.join(".git");
        if !git_dir.exists() {
            return Err(Error::GitDirDoesntExist(git_dir));
        }

        Ok(OnDisk { work_dir, git_dir })
    }

    /// Creates a new, empty git repository on the local file system.
    ///
    /// Analogous to [`git init`](https://git-scm.com/docs/git-init), minus
    /// hooks and sample files.
    pub fn init<P: AsRef<Path>>(work_dir: P) -> Result<Self> {
        let work_dir = work_dir.as_ref();
        let git_dir = work_dir.join(".git");
        if git_dir.exists() {
            return Err(Error::GitDirShouldntExist(git_dir));
        }

        fs::create_dir_all(&git_dir)?;

        create_config(&git_dir)?;
        create_head(&git_dir)?;
        create_objects_dir(&git_dir)?;
        create_refs_dir(&git_dir)?;

        Ok(OnDisk {
            work_dir: work_dir.to_path_buf(),
            git_dir,
        })
    }

    /// Return the working directory for this repo.
    pub fn work_dir(&self) -> &Path {
        self.work_dir.as_path()
    }

    /// Return the path to the `.git` directory.
    pub fn git_dir(&self) -> &Path {
        self.git_dir.as_path()
    }

    /// Return the path where the loose object with this ID lives
    /// (`.git/objects/xx/yyyy...`), whether or not it exists yet.
    pub fn object_path(&self, id: &Id) -> PathBuf {
        let (dir, file) = id.fan_out();
        let mut path = self.git_dir.join("objects");
        path.push(dir);
        path.push(file);
        path
    }
}

impl Repo for OnDisk {
    fn put_loose_object(
        &self,
        kind: Kind,
        expected_id: Option<&Id>,
        path: &str,
        content: Vec<u8>,
    ) -> Result<Id> {
        let object = Object::new(kind, content);
        let id = *object.id();

        if let Some(expected) = expected_id {
            if *expected != id {
                return Err(Error::DigestMismatch {
                    path: path.to_string(),
                    expected: *expected,
                    actual: id,
                });
            }
        }

        let (dir, file) = id.fan_out();
        let object_dir = self.git_dir.join("objects").join(dir);
        let object_path = object_dir.join(file);
        if object_path.exists() {
            debug!("{} {} already present", kind, id);
            return Ok(id);
        }

        fs::create_dir_all(&object_dir)?;

        // Stage into a temporary sibling so a partially written object is
        // never visible under its final name. The temp file is removed on drop
        // if anything below fails.
        let mut temp = NamedTempFile::new_in(&object_dir)?;
        {
            let mut encoder = ZlibEncoder::new(temp.as_file_mut(), Compression::default());
            encoder.write_all(&object.framed())?;
            encoder.finish()?;
        }

        let mut perms = temp.as_file().metadata()?.permissions();
        perms.set_readonly(true);
        temp.as_file().set_permissions(perms)?;

        temp.persist(&object_path).map_err(|e| e.error)?;
        debug!("wrote {} {} ({} bytes)", kind, id, object.len());

        Ok(id)
    }

    fn has_object(&self, id: &Id) -> bool {
        self.object_path(id).exists()
    }
}

fn create_config(git_dir: &Path) -> Result<()> {
    let config_path = git_dir.join("config");
    let config_txt = "[core]\n\trepositoryformatversion = 0\n\tfilemode = true\n\tbare = false\n\tlogallrefupdates = true\n";

    fs::write(config_path, config_txt).map_err(|e| e.into())
}

fn create_head(git_dir: &Path) -> Result<()> {
    let head_path = git_dir.join("HEAD");
    let head_txt = "ref: refs/heads/master\n";

    fs::write(head_path, head_txt).map_err(|e| e.into())
}

fn create_objects_dir(git_dir: &Path) -> Result<()> {
    let info_dir = git_dir.join("objects/info");
    fs::create_dir_all(&info_dir)?;

    let pack_dir = git_dir.join("objects/pack");
    fs::create_dir_all(&pack_dir).map_err(|e| e.into())
}

fn create_refs_dir(git_dir: &Path) -> Result<()> {
    let heads_dir = git_dir.join("refs/heads");
    fs::create_dir_all(&heads_dir)?;

    let tags_dir = git_dir.join("refs/tags");
    fs::create_dir_all(&tags_dir).map_err(|e| e.into())
}
