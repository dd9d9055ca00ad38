//! Filesystem access used by the sweep.
//!
//! The walker and orchestrator only need to list a directory and remove a
//! directory tree, so that is all the trait exposes. Tests wrap
//! [`LocalFilesystem`] to inject failures.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

/// A single entry returned by [`TenantFilesystem::read_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub path: PathBuf,
    /// True only for real directories; symlinks are never followed.
    pub is_dir: bool,
}

impl DirEntryInfo {
    /// Final path component, lossily converted.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// An entry that showed up in a listing but could not be inspected, usually
/// because it vanished between the listing and the `lstat`.
#[derive(Debug)]
pub struct EntryFailure {
    pub path: PathBuf,
    pub error: io::Error,
}

/// Contents of one directory.
///
/// A failure on one entry does not discard its siblings: the entry is moved to
/// `failures` and the listing carries on.
#[derive(Debug, Default)]
pub struct DirListing {
    /// Inspected entries, sorted by file name.
    pub entries: Vec<DirEntryInfo>,
    pub failures: Vec<EntryFailure>,
}

#[async_trait]
pub trait TenantFilesystem: Send + Sync {
    /// List `path`. Only a directory that cannot be opened at all is an error.
    async fn read_dir(&self, path: &Path) -> io::Result<DirListing>;

    /// Remove `path` and everything below it.
    async fn remove_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// [`TenantFilesystem`] backed by the local disk through `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TenantFilesystem for LocalFilesystem {
    async fn read_dir(&self, path: &Path) -> io::Result<DirListing> {
        let mut reader = tokio::fs::read_dir(path).await?;
        let mut listing = DirListing::default();

        loop {
            let entry = match reader.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                // The stream cannot be resumed; keep what was listed so far.
                Err(error) => {
                    listing.failures.push(EntryFailure {
                        path: path.to_path_buf(),
                        error,
                    });
                    break;
                }
            };

            // file_type() does not traverse symlinks.
            match entry.file_type().await {
                Ok(file_type) => listing.entries.push(DirEntryInfo {
                    path: entry.path(),
                    is_dir: file_type.is_dir(),
                }),
                Err(error) => listing.failures.push(EntryFailure {
                    path: entry.path(),
                    error,
                }),
            }
        }

        listing
            .entries
            .sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
        Ok(listing)
    }

    async fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_dir_all(path).await
    }
}
