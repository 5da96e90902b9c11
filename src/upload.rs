//! Mirror the local archive tree onto the remote share

use std::collections::HashMap;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{BackupError, BackupResult};
use crate::remote::{join_remote, ShareSession};

/// Counts from one upload pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub uploaded: usize,
    /// Files already present remotely with the same size
    pub skipped: usize,
    pub failed: usize,
    pub bytes: u64,
}

/// Copy every file under `root` to the same relative path on the share
///
/// Directories are created as needed. Files whose remote copy already has
/// the same size are left alone. Individual failures are logged and counted;
/// only an unreadable root aborts the pass.
pub fn upload_tree<S>(root: &Path, session: &S) -> BackupResult<UploadReport>
where
    S: ShareSession + ?Sized,
{
    if !root.is_dir() {
        return Err(BackupError::directory_not_found(root.display().to_string()));
    }

    let mut report = UploadReport::default();
    let mut listings: HashMap<String, HashMap<String, Option<u64>>> = HashMap::new();

    for entry_result in WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                tracing::error!("Error in walkdir: {err}");
                report.failed += 1;
                continue;
            }
        };

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let remote = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .fold(String::new(), |acc, part| join_remote(&acc, &part));

        if entry.file_type().is_dir() {
            if let Err(e) = session.create_dir_all(&remote) {
                tracing::error!(remote = %remote, error = %e, "failed to create remote directory");
                report.failed += 1;
            }
            continue;
        }

        if !entry.file_type().is_file() {
            continue;
        }

        let local_size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                tracing::error!("Failed to get metadata from {}: {}", entry.path().display(), e);
                report.failed += 1;
                continue;
            }
        };

        let (parent, name) = remote.rsplit_once('/').unwrap_or(("", remote.as_str()));
        let existing = listings
            .entry(parent.to_string())
            .or_insert_with(|| remote_sizes(session, parent));

        if existing.get(name).copied().flatten() == Some(local_size) {
            tracing::debug!(remote = %remote, "already uploaded");
            report.skipped += 1;
            continue;
        }

        match session.upload_file(entry.path(), &remote) {
            Ok(written) => {
                tracing::info!(remote = %remote, bytes = written, "uploaded");
                report.uploaded += 1;
                report.bytes += written;
            }
            Err(e) => {
                tracing::error!(remote = %remote, error = %e, "upload failed");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Sizes of the files already in a remote directory
fn remote_sizes<S>(session: &S, dir: &str) -> HashMap<String, Option<u64>>
where
    S: ShareSession + ?Sized,
{
    match session.read_dir(dir) {
        Ok(entries) => entries
            .into_iter()
            .filter(|e| !e.is_dir)
            .map(|e| (e.name, e.size))
            .collect(),
        Err(e) => {
            if !e.is_not_found() {
                tracing::warn!(dir = %dir, error = %e, "could not list remote directory");
            }
            HashMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::testing::MemoryShare;
    use crate::remote::MountedShare;
    use tempfile::TempDir;

    fn local_tree() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let home = temp_dir.path().join("dirs/home");
        let shop = temp_dir.path().join("databases/shop");
        std::fs::create_dir_all(&home).unwrap();
        std::fs::create_dir_all(&shop).unwrap();
        std::fs::write(home.join("dir_20240601_000000.tar.gz"), b"archive-one").unwrap();
        std::fs::write(shop.join("db_20240601_000000.tar.gz"), b"dump").unwrap();
        temp_dir
    }

    #[test]
    fn test_upload_mirrors_tree() {
        let local = local_tree();
        let share = MemoryShare::new();

        let report = upload_tree(local.path(), &share).unwrap();

        assert_eq!(report.uploaded, 2);
        assert_eq!(report.bytes, 15);
        assert!(share.contains("dirs/home/dir_20240601_000000.tar.gz"));
        assert!(share.contains("databases/shop/db_20240601_000000.tar.gz"));
    }

    #[test]
    fn test_second_upload_skips_same_size() {
        let local = local_tree();
        let share_dir = TempDir::new().unwrap();
        let share = MountedShare::new(share_dir.path());

        upload_tree(local.path(), &share).unwrap();
        std::fs::write(
            local.path().join("dirs/home/dir_20240602_000000.tar.gz"),
            b"new",
        )
        .unwrap();

        let report = upload_tree(local.path(), &share).unwrap();
        assert_eq!(report.uploaded, 1);
        assert_eq!(report.skipped, 2);
        assert!(share_dir
            .path()
            .join("dirs/home/dir_20240602_000000.tar.gz")
            .is_file());
    }

    #[test]
    fn test_changed_size_is_uploaded_again() {
        let local = local_tree();
        let share_dir = TempDir::new().unwrap();
        let share = MountedShare::new(share_dir.path());

        upload_tree(local.path(), &share).unwrap();
        std::fs::write(
            local.path().join("databases/shop/db_20240601_000000.tar.gz"),
            b"longer dump",
        )
        .unwrap();

        let report = upload_tree(local.path(), &share).unwrap();
        assert_eq!(report.uploaded, 1);
        assert_eq!(
            std::fs::read(share_dir.path().join("databases/shop/db_20240601_000000.tar.gz"))
                .unwrap(),
            b"longer dump"
        );
    }

    #[test]
    fn test_missing_root_fails() {
        let temp_dir = TempDir::new().unwrap();
        let share = MemoryShare::new();
        let err = upload_tree(&temp_dir.path().join("absent"), &share).unwrap_err();
        assert!(err.is_not_found());
    }
}
