//! Remote share access
//!
//! The remote share is reached through a `ShareSession`: a handful of
//! file operations addressed by forward-slash paths relative to the share
//! root. `MountedShare` implements it over a CIFS mount, `ShareMount` owns
//! the mount's lifecycle, and `BoundedShare` puts a deadline on every call.

mod bounded;
mod mount;
mod mounted;

pub use bounded::{with_deadline, BoundedShare};
pub use mount::ShareMount;
pub use mounted::MountedShare;

use std::path::Path;

use crate::error::BackupResult;
use crate::storage::CandidateEntry;

/// File operations on a remote share
///
/// Paths are relative to the share root and always use `/`.
pub trait ShareSession: Send + Sync + 'static {
    /// List a directory; a missing directory is a "not found" error
    fn read_dir(&self, path: &str) -> BackupResult<Vec<CandidateEntry>>;

    /// Remove a file
    fn remove_file(&self, path: &str) -> BackupResult<()>;

    /// Create a directory and all of its parents
    fn create_dir_all(&self, path: &str) -> BackupResult<()>;

    /// Copy a local file to a remote path, returning the bytes written
    fn upload_file(&self, local: &Path, remote: &str) -> BackupResult<u64>;
}

/// Normalize a remote path: `/` separators, no empty or `.` segments
pub fn normalize_remote(path: &str) -> String {
    path.split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Join two remote path fragments with a single `/`
pub fn join_remote(dir: &str, name: &str) -> String {
    let dir = normalize_remote(dir);
    let name = normalize_remote(name);

    if dir.is_empty() {
        name
    } else if name.is_empty() {
        dir
    } else {
        format!("{}/{}", dir, name)
    }
}
