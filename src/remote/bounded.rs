//! Deadlines for remote operations
//!
//! A stalled network share blocks filesystem calls indefinitely. Each call is
//! run on a helper thread and the caller waits at most the configured timeout;
//! on expiry the caller gets `BackupError::TimedOut` and the helper thread is
//! abandoned.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;

use super::ShareSession;
use crate::error::{BackupError, BackupResult};
use crate::storage::CandidateEntry;

/// Run an operation, giving up after `timeout`
pub fn with_deadline<T, F>(operation: impl Into<String>, timeout: Duration, f: F) -> BackupResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> BackupResult<T> + Send + 'static,
{
    let operation = operation.into();
    let (tx, rx) = crossbeam_channel::bounded(1);

    thread::Builder::new()
        .name("share-op".into())
        .spawn(move || {
            // The receiver is gone if the deadline already passed
            let _ = tx.send(f());
        })
        .map_err(|e| BackupError::Remote(format!("Failed to start {}: {}", operation, e)))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(BackupError::TimedOut { operation, timeout }),
        Err(RecvTimeoutError::Disconnected) => {
            Err(BackupError::Remote(format!("{} aborted", operation)))
        }
    }
}

/// A share session whose every operation is bounded by a deadline
pub struct BoundedShare<S> {
    inner: Arc<S>,
    timeout: Duration,
}

impl<S: ShareSession> BoundedShare<S> {
    /// Wrap a session with a per-operation timeout
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            timeout,
        }
    }

    /// Get the per-operation timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn call<T, F>(&self, operation: String, f: F) -> BackupResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&S) -> BackupResult<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        with_deadline(operation, self.timeout, move || f(inner.as_ref()))
    }
}

impl<S: ShareSession> ShareSession for BoundedShare<S> {
    fn read_dir(&self, path: &str) -> BackupResult<Vec<CandidateEntry>> {
        let path = path.to_string();
        self.call(format!("read_dir {}", path), move |s| s.read_dir(&path))
    }

    fn remove_file(&self, path: &str) -> BackupResult<()> {
        let path = path.to_string();
        self.call(format!("remove {}", path), move |s| s.remove_file(&path))
    }

    fn create_dir_all(&self, path: &str) -> BackupResult<()> {
        let path = path.to_string();
        self.call(format!("mkdir {}", path), move |s| s.create_dir_all(&path))
    }

    fn upload_file(&self, local: &Path, remote: &str) -> BackupResult<u64> {
        let local: PathBuf = local.to_path_buf();
        let remote = remote.to_string();
        self.call(format!("upload {}", remote), move |s| s.upload_file(&local, &remote))
    }
}
