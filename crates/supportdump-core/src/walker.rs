//! Lazy directory tree walker feeding the payload contract.
//!
//! Files are visited depth-first with each directory's entries sorted by file
//! name, so the archive layout is stable across runs. Only regular files are
//! yielded; symlinks and special files are skipped.

use crate::error::{DumpError, DumpResult};
use crate::payload::{Payload, PayloadSource};
use std::fs;
use std::path::{Path, PathBuf};

/// One regular file found under the walked root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    /// Path inside the archive: `<prefix>/<relative path>` with forward slashes.
    pub archive_path: String,
    pub fs_path: PathBuf,
}

impl WalkedFile {
    /// Read the file body. Nothing is read until this is called.
    pub fn read(&self) -> DumpResult<Vec<u8>> {
        fs::read(&self.fs_path).map_err(|source| DumpError::Walk {
            path: self.fs_path.clone(),
            source,
        })
    }

    pub fn into_payload(self) -> DumpResult<Payload> {
        let data = self.read()?;
        Ok(Payload::new(self.archive_path, data))
    }
}

/// Walks `root`, mapping every regular file under it to `prefix/<relative path>`.
#[derive(Debug, Clone)]
pub struct DirWalker {
    root: PathBuf,
    prefix: String,
}

impl DirWalker {
    /// An empty `prefix` places files at the archive root.
    pub fn new(root: impl Into<PathBuf>, prefix: &str) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.trim_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> WalkIter {
        WalkIter {
            pending: vec![Pending::Dir {
                fs_path: self.root.clone(),
                archive_path: self.prefix.clone(),
            }],
        }
    }
}

impl PayloadSource for DirWalker {
    fn payloads(&self) -> Box<dyn Iterator<Item = DumpResult<Payload>> + Send + '_> {
        Box::new(self.files().map(|f| f.and_then(WalkedFile::into_payload)))
    }
}

enum Pending {
    Dir {
        fs_path: PathBuf,
        archive_path: String,
    },
    File(WalkedFile),
}

/// Iterator returned by [`DirWalker::files`].
pub struct WalkIter {
    // Stack; the next item to visit is at the end.
    pending: Vec<Pending>,
}

fn join_archive_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", base, name)
    }
}

impl WalkIter {
    fn expand(&mut self, dir: &Path, archive_base: &str) -> DumpResult<()> {
        let walk_err = |source| DumpError::Walk {
            path: dir.to_path_buf(),
            source,
        };

        let mut children = Vec::new();
        for entry in fs::read_dir(dir).map_err(walk_err)? {
            let entry = entry.map_err(walk_err)?;
            let file_type = entry.file_type().map_err(walk_err)?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let archive_path = join_archive_path(archive_base, &name);
            let fs_path = entry.path();

            if file_type.is_dir() {
                children.push((
                    name,
                    Pending::Dir {
                        fs_path,
                        archive_path,
                    },
                ));
            } else if file_type.is_file() {
                children.push((
                    name,
                    Pending::File(WalkedFile {
                        archive_path,
                        fs_path,
                    }),
                ));
            }
        }

        children.sort_by(|a, b| a.0.cmp(&b.0));
        // Reverse so the smallest name is popped first.
        self.pending
            .extend(children.into_iter().rev().map(|(_, item)| item));
        Ok(())
    }
}

impl Iterator for WalkIter {
    type Item = DumpResult<WalkedFile>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(item) = self.pending.pop() {
            match item {
                Pending::File(file) => return Some(Ok(file)),
                Pending::Dir {
                    fs_path,
                    archive_path,
                } => {
                    if let Err(err) = self.expand(&fs_path, &archive_path) {
                        return Some(Err(err));
                    }
                }
            }
        }
        None
    }
}
