//! Remote share backend

use super::{ArchiveStore, CandidateEntry};
use crate::audit::Backend;
use crate::error::BackupResult;
use crate::remote::{join_remote, normalize_remote, ShareSession};

/// Archives on a remote share, addressed by forward-slash paths
pub struct RemoteStore<'a, S> {
    session: &'a S,
}

impl<'a, S: ShareSession> RemoteStore<'a, S> {
    /// Borrow an established share session
    pub fn new(session: &'a S) -> Self {
        Self { session }
    }
}

impl<S: ShareSession> ArchiveStore for RemoteStore<'_, S> {
    type Dir = str;

    fn backend(&self) -> Backend {
        Backend::Remote
    }

    fn display_dir(&self, dir: &str) -> String {
        normalize_remote(dir)
    }

    fn display_entry(&self, dir: &str, name: &str) -> String {
        join_remote(dir, name)
    }

    fn list(&self, dir: &str) -> BackupResult<Vec<CandidateEntry>> {
        self.session.read_dir(&normalize_remote(dir))
    }

    fn remove(&self, dir: &str, name: &str) -> BackupResult<()> {
        self.session.remove_file(&join_remote(dir, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MountedShare;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_remote_store_paths() {
        let share_dir = TempDir::new().unwrap();
        fs::create_dir_all(share_dir.path().join("logs/app.log")).unwrap();
        fs::write(
            share_dir.path().join("logs/app.log/log_20240101_000000.tar.gz"),
            b"x",
        )
        .unwrap();

        let share = MountedShare::new(share_dir.path());
        let store = RemoteStore::new(&share);
        assert_eq!(store.display_dir("logs\\app.log\\"), "logs/app.log");

        let entries = store.list("logs\\app.log").unwrap();
        assert_eq!(entries.len(), 1);

        store.remove("logs/app.log/", "log_20240101_000000.tar.gz").unwrap();
        assert!(store.list("logs/app.log").unwrap().is_empty());
    }
}
