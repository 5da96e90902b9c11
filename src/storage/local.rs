//! Local filesystem backend

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use super::{collect_listing, describe_entry, ArchiveStore, CandidateEntry};
use crate::audit::Backend;
use crate::error::{BackupError, BackupResult};

/// Archives on the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStore;

impl ArchiveStore for LocalStore {
    type Dir = Path;

    fn backend(&self) -> Backend {
        Backend::Local
    }

    fn display_dir(&self, dir: &Path) -> String {
        dir.display().to_string()
    }

    fn display_entry(&self, dir: &Path, name: &str) -> String {
        dir.join(name).display().to_string()
    }

    fn list(&self, dir: &Path) -> BackupResult<Vec<CandidateEntry>> {
        let read_dir = fs::read_dir(dir).map_err(|e| match e.kind() {
            ErrorKind::NotFound => BackupError::directory_not_found(dir.display().to_string()),
            _ => BackupError::Io(format!("Failed to read {}: {}", dir.display(), e)),
        })?;

        let raw = read_dir.map(|entry| entry.map(describe_entry));
        Ok(collect_listing(&dir.display().to_string(), raw))
    }

    fn remove(&self, dir: &Path, name: &str) -> BackupResult<()> {
        let path = dir.join(name);
        fs::remove_file(&path)
            .map_err(|e| BackupError::Io(format!("Failed to delete {}: {}", path.display(), e)))
    }
}
