//! Backup category model
//!
//! A category decides both the archive filename prefix and the storage
//! subdirectory an archive lives in.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of backup target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupCategory {
    /// A directory tree
    Directory,
    /// A single file
    File,
    /// A log file, truncated after archiving
    Log,
    /// A database dump
    Database,
}

impl BackupCategory {
    /// Filename prefix, including the trailing underscore
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Directory => "dir_",
            Self::File => "file_",
            Self::Log => "log_",
            Self::Database => "db_",
        }
    }

    /// Storage subdirectory name under the backup root
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Directory => "dirs",
            Self::File => "files",
            Self::Log => "logs",
            Self::Database => "databases",
        }
    }
}

impl fmt::Display for BackupCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory => write!(f, "directory"),
            Self::File => write!(f, "file"),
            Self::Log => write!(f, "log"),
            Self::Database => write!(f, "database"),
        }
    }
}
