//! Storage layout for archives
//!
//! Archives live at `<root>/<category>/<item>/<archive>` locally, and at the
//! same relative path on the remote share.

use std::path::{Path, PathBuf};

use crate::error::{BackupError, BackupResult};
use crate::models::BackupCategory;
use crate::remote::join_remote;

/// Manages all paths under the local backup root
#[derive(Debug, Clone)]
pub struct BackupPaths {
    /// Root of the local archive tree
    root: PathBuf,
}

impl BackupPaths {
    /// Create a new BackupPaths for a root directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the directory holding all archives of one category
    pub fn category_dir(&self, category: BackupCategory) -> PathBuf {
        self.root.join(category.dir_name())
    }

    /// Get the directory holding one item's archives
    pub fn item_dir(&self, category: BackupCategory, item: &str) -> PathBuf {
        self.category_dir(category).join(item)
    }

    /// Relative, forward-slash path of an item's directory on the share
    pub fn remote_item_dir(category: BackupCategory, item: &str) -> String {
        join_remote(category.dir_name(), item)
    }

    /// Create the root directory
    pub fn ensure_root(&self) -> BackupResult<()> {
        std::fs::create_dir_all(&self.root).map_err(|e| {
            BackupError::Io(format!(
                "Failed to create {}: {}",
                self.root.display(),
                e
            ))
        })
    }

    /// Create an item's directory, returning its path
    pub fn ensure_item_dir(&self, category: BackupCategory, item: &str) -> BackupResult<PathBuf> {
        let dir = self.item_dir(category, item);
        std::fs::create_dir_all(&dir).map_err(|e| {
            BackupError::Io(format!("Failed to create directory {}: {}", dir.display(), e))
        })?;
        Ok(dir)
    }
}
