//! Backup configuration
//!
//! Declares backup targets, database credentials, retention lifetimes and the
//! remote share used for offsite copies. Loaded from a JSON file after
//! `$ENV:KEY` substitution.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::env::substitute_env;
use super::secret::Secret;
use crate::error::{BackupError, BackupResult};
use crate::models::RetentionPolicy;

/// Default per-operation deadline for the remote share
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 30;

/// A directory, file or log target
#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    /// Source path on the local machine
    pub path: PathBuf,

    /// Lifetime of archives in days (0 or absent keeps them forever)
    #[serde(default)]
    pub lifetime: i64,
}

impl Item {
    /// Retention policy for this item's archives
    pub fn policy(&self) -> RetentionPolicy {
        RetentionPolicy::from_lifetime(self.lifetime)
    }

    /// Name of the storage subdirectory for this item
    pub fn base_name(&self) -> String {
        base_name(&self.path)
    }
}

/// Shared connection parameters for database dumps
#[derive(Debug, Clone, Deserialize)]
pub struct DbUser {
    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: Secret,

    #[serde(default = "default_db_host")]
    pub host: String,

    /// Port, or the engine default when absent
    #[serde(default)]
    pub port: Option<u16>,
}

fn default_db_host() -> String {
    "localhost".to_string()
}

/// Supported database engines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseKind {
    Postgres,
    Mysql,
    Mongo,
}

impl DatabaseKind {
    /// Parse an engine name from the configuration
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            "mysql" | "mariadb" => Some(Self::Mysql),
            "mongo" | "mongodb" => Some(Self::Mongo),
            _ => None,
        }
    }

    /// Port the engine listens on by default
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Postgres => 5432,
            Self::Mysql => 3306,
            Self::Mongo => 27017,
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Postgres => write!(f, "postgres"),
            Self::Mysql => write!(f, "mysql"),
            Self::Mongo => write!(f, "mongo"),
        }
    }
}

/// A database target
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    /// Database name, also the storage subdirectory name
    pub name: String,

    /// Engine name as written in the configuration
    #[serde(rename = "type")]
    pub kind: String,

    /// Key into `databaseUsers`
    pub user_ref: String,

    #[serde(default)]
    pub lifetime: i64,
}

impl Database {
    /// Retention policy for this database's archives
    pub fn policy(&self) -> RetentionPolicy {
        RetentionPolicy::from_lifetime(self.lifetime)
    }

    /// Resolve the configured engine
    pub fn engine(&self) -> BackupResult<DatabaseKind> {
        DatabaseKind::parse(&self.kind).ok_or_else(|| {
            BackupError::Config(format!(
                "Unsupported database type '{}' for {}",
                self.kind, self.name
            ))
        })
    }
}

/// Remote share settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Upload {
    #[serde(default)]
    pub active: bool,

    #[serde(default, rename = "smbuser")]
    pub smb_user: String,

    #[serde(default, rename = "smbpassword")]
    pub smb_password: Secret,

    #[serde(default, rename = "smbhost")]
    pub smb_host: String,

    #[serde(default, rename = "smbshare")]
    pub smb_share: String,

    /// NTLM domain, empty for none
    #[serde(default)]
    pub domain: String,

    /// Where the share is (or will be) mounted
    #[serde(default, rename = "mountPoint")]
    pub mount_point: Option<PathBuf>,

    /// Deadline for each remote operation
    #[serde(default, rename = "timeoutSecs")]
    pub timeout_secs: Option<u64>,
}

impl Upload {
    /// Mount point, defaulting to `/mnt/<share>`
    pub fn mount_point(&self) -> PathBuf {
        self.mount_point
            .clone()
            .unwrap_or_else(|| PathBuf::from("/mnt").join(self.smb_share.trim_matches('/')))
    }

    /// Per-operation deadline
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(
            self.timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REMOTE_TIMEOUT_SECS),
        )
    }

    /// UNC-style source for the mount command
    pub fn unc_path(&self) -> String {
        format!(
            "//{}/{}",
            self.smb_host.trim_matches('/'),
            self.smb_share.trim_matches('/')
        )
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Root of the local archive tree
    pub local_backup_path: PathBuf,

    #[serde(default)]
    pub dirs: Vec<Item>,

    #[serde(default)]
    pub files: Vec<Item>,

    #[serde(default)]
    pub logs: Vec<Item>,

    #[serde(default)]
    pub database_users: BTreeMap<String, DbUser>,

    #[serde(default)]
    pub databases: Vec<Database>,

    #[serde(default)]
    pub upload: Upload,

    /// Optional JSONL file receiving every cleanup event
    #[serde(default)]
    pub audit_log: Option<PathBuf>,
}

impl Config {
    /// Load configuration from disk with `$ENV:KEY` substitution
    ///
    /// Unresolved placeholders are left verbatim and logged as warnings.
    pub fn load(path: &Path) -> BackupResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            BackupError::Config(format!(
                "Failed to read configuration file {}: {}",
                path.display(),
                e
            ))
        })?;

        let substitution = substitute_env(&raw);
        for key in &substitution.unresolved {
            tracing::warn!(key = %key, "environment variable not set, placeholder left as is");
        }

        Self::from_json(&substitution.text).map_err(|e| match e {
            BackupError::Json(msg) => BackupError::Config(format!(
                "Failed to parse {}: {}",
                path.display(),
                msg
            )),
            other => other,
        })
    }

    /// Parse and validate configuration from JSON text
    pub fn from_json(json: &str) -> BackupResult<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that serde cannot express
    pub fn validate(&self) -> BackupResult<()> {
        if self.local_backup_path.as_os_str().is_empty() {
            return Err(BackupError::Config("localBackupPath must not be empty".into()));
        }

        if self.upload.active
            && self.upload.smb_share.is_empty()
            && self.upload.mount_point.is_none()
        {
            return Err(BackupError::Config(
                "upload is active but neither smbshare nor mountPoint is set".into(),
            ));
        }

        Ok(())
    }

    /// Look up the credentials a database refers to
    pub fn database_user(&self, db: &Database) -> BackupResult<&DbUser> {
        self.database_users.get(&db.user_ref).ok_or_else(|| {
            BackupError::database_user_not_found(format!(
                "databaseUsers.{} (referenced by {})",
                db.user_ref, db.name
            ))
        })
    }
}

/// Final path component, used as the item's storage subdirectory
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| {
            let joined = path.to_string_lossy().replace(['/', '\\'], "_");
            let trimmed = joined.trim_matches('_');
            if trimmed.is_empty() {
                "root".to_string()
            } else {
                trimmed.to_string()
            }
        })
}
