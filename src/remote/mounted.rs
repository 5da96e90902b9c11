//! Share session over a mounted filesystem

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{normalize_remote, ShareSession};
use crate::error::{BackupError, BackupResult};
use crate::storage::{collect_listing, describe_entry, CandidateEntry};

/// A remote share reachable through a local mount point
#[derive(Debug, Clone)]
pub struct MountedShare {
    root: PathBuf,
}

impl MountedShare {
    /// Create a session rooted at a mount point
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a share-relative path onto the mount point
    fn resolve(&self, path: &str) -> BackupResult<PathBuf> {
        let normalized = normalize_remote(path);
        let mut resolved = self.root.clone();

        for segment in normalized.split('/').filter(|s| !s.is_empty()) {
            if segment == ".." {
                return Err(BackupError::Remote(format!(
                    "Path escapes the share root: {}",
                    path
                )));
            }
            resolved.push(segment);
        }

        Ok(resolved)
    }
}

impl ShareSession for MountedShare {
    fn read_dir(&self, path: &str) -> BackupResult<Vec<CandidateEntry>> {
        let dir = self.resolve(path)?;
        let read_dir = fs::read_dir(&dir).map_err(|e| match e.kind() {
            ErrorKind::NotFound => BackupError::directory_not_found(normalize_remote(path)),
            _ => BackupError::Remote(format!("Failed to list {}: {}", path, e)),
        })?;

        let raw = read_dir.map(|entry| entry.map(describe_entry));
        Ok(collect_listing(&normalize_remote(path), raw))
    }

    fn remove_file(&self, path: &str) -> BackupResult<()> {
        let target = self.resolve(path)?;
        fs::remove_file(&target)
            .map_err(|e| BackupError::Remote(format!("Failed to delete {}: {}", path, e)))
    }

    fn create_dir_all(&self, path: &str) -> BackupResult<()> {
        let target = self.resolve(path)?;
        fs::create_dir_all(&target)
            .map_err(|e| BackupError::Remote(format!("Failed to create {}: {}", path, e)))
    }

    fn upload_file(&self, local: &Path, remote: &str) -> BackupResult<u64> {
        let target = self.resolve(remote)?;
        let file_name = target
            .file_name()
            .ok_or_else(|| BackupError::Remote(format!("Invalid upload target: {}", remote)))?
            .to_string_lossy()
            .to_string();

        // Partial uploads never carry the archive extension
        let partial = target.with_file_name(format!(".{}.part", file_name));

        let written = fs::copy(local, &partial).map_err(|e| {
            let _ = fs::remove_file(&partial);
            BackupError::Remote(format!(
                "Failed to upload {} to {}: {}",
                local.display(),
                remote,
                e
            ))
        })?;

        fs::rename(&partial, &target).map_err(|e| {
            let _ = fs::remove_file(&partial);
            BackupError::Remote(format!("Failed to finalize {}: {}", remote, e))
        })?;

        Ok(written)
    }
}
