//! Storage backends for archives
//!
//! The cleanup engine sees storage only through `ArchiveStore`: list the
//! entries of a directory, remove one of them. The local filesystem and the
//! remote share are two implementations of the same contract.

pub mod local;
pub mod remote;

pub use local::LocalStore;
pub use remote::RemoteStore;

use std::fs::{self, Metadata};
use std::io;
use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDateTime};

use crate::audit::Backend;
use crate::error::BackupResult;

/// One entry observed in a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEntry {
    /// File or directory name, without any path
    pub name: String,
    /// Whether the entry is a directory
    pub is_dir: bool,
    /// Last-modified instant on the local civil clock, if known
    pub modified: Option<NaiveDateTime>,
    /// Size in bytes, if known
    pub size: Option<u64>,
}

impl CandidateEntry {
    /// Create a regular file entry
    pub fn file(name: impl Into<String>, modified: Option<NaiveDateTime>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            modified,
            size: None,
        }
    }

    /// Create a directory entry
    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            modified: None,
            size: None,
        }
    }

    /// Build an entry from filesystem metadata
    pub fn from_metadata(name: impl Into<String>, metadata: &Metadata) -> Self {
        Self {
            name: name.into(),
            is_dir: metadata.is_dir(),
            modified: metadata.modified().ok().map(to_local_naive),
            size: (!metadata.is_dir()).then(|| metadata.len()),
        }
    }
}

/// Build a sorted listing from raw directory entries
///
/// Entries that cannot be read or stat'ed are skipped with a warning, so one
/// vanished or unreadable file never hides the rest of the directory.
pub(crate) fn collect_listing<I>(dir: &str, raw: I) -> Vec<CandidateEntry>
where
    I: IntoIterator<Item = io::Result<(String, io::Result<Metadata>)>>,
{
    let mut entries = Vec::new();
    for item in raw {
        let (name, metadata) = match item {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!(dir = %dir, error = %e, "skipping unreadable directory entry");
                continue;
            }
        };

        match metadata {
            Ok(metadata) => entries.push(CandidateEntry::from_metadata(name, &metadata)),
            Err(e) => {
                tracing::warn!(
                    dir = %dir,
                    name = %name,
                    error = %e,
                    "skipping entry without metadata"
                );
            }
        }
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}

/// Name and metadata of a `read_dir` entry
pub(crate) fn describe_entry(entry: fs::DirEntry) -> (String, io::Result<Metadata>) {
    (entry.file_name().to_string_lossy().to_string(), entry.metadata())
}

/// Convert a system time to local civil time
pub fn to_local_naive(time: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(time).naive_local()
}

/// A directory tree holding archives that can be listed and pruned
pub trait ArchiveStore {
    /// How a directory is addressed on this backend
    type Dir: ?Sized;

    /// Which backend this is, for event reporting
    fn backend(&self) -> Backend;

    /// Display form of a directory
    fn display_dir(&self, dir: &Self::Dir) -> String;

    /// Display form of an entry inside a directory
    fn display_entry(&self, dir: &Self::Dir, name: &str) -> String;

    /// List the entries of a directory, non-recursively
    ///
    /// A missing directory is reported as a "not found" error.
    fn list(&self, dir: &Self::Dir) -> BackupResult<Vec<CandidateEntry>>;

    /// Remove one file from a directory
    fn remove(&self, dir: &Self::Dir, name: &str) -> BackupResult<()>;
}
