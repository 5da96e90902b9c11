//! Retention cleanup engine
//!
//! Prunes expired archives from the local backup tree and from the remote
//! share with the same scanner, so both backends always reach the same
//! decision for the same listing.

mod remote;
mod scanner;

#[cfg(test)]
pub(crate) mod testing;

pub use remote::{RemoteCleanup, RemotePassReport};
pub use scanner::{CleanupReport, CleanupScanner};

use std::path::PathBuf;

use crate::config::{BackupPaths, Config};
use crate::models::{BackupCategory, RetentionPolicy};

/// One configured item whose archives are subject to retention
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupTarget {
    pub category: BackupCategory,
    /// Storage subdirectory name (source base name, or database name)
    pub item: String,
    pub policy: RetentionPolicy,
}

impl CleanupTarget {
    /// Every target declared in a configuration, in processing order
    pub fn from_config(config: &Config) -> Vec<Self> {
        let items = [
            (BackupCategory::Directory, &config.dirs),
            (BackupCategory::File, &config.files),
            (BackupCategory::Log, &config.logs),
        ];

        let mut targets: Vec<Self> = items
            .into_iter()
            .flat_map(|(category, items)| {
                items.iter().map(move |item| Self {
                    category,
                    item: item.base_name(),
                    policy: item.policy(),
                })
            })
            .collect();

        targets.extend(config.databases.iter().map(|db| Self {
            category: BackupCategory::Database,
            item: db.name.clone(),
            policy: db.policy(),
        }));

        targets
    }

    /// Directory holding this target's archives locally
    pub fn local_dir(&self, paths: &BackupPaths) -> PathBuf {
        paths.item_dir(self.category, &self.item)
    }

    /// Directory holding this target's archives on the share
    pub fn remote_dir(&self) -> String {
        BackupPaths::remote_item_dir(self.category, &self.item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_from_config() {
        let config = Config::from_json(
            r#"{
                "localBackupPath": "/b",
                "dirs": [{"path": "/home/alice", "lifetime": 30}],
                "files": [{"path": "/etc/hosts", "lifetime": 0}],
                "logs": [{"path": "/var/log/app.log", "lifetime": 7}],
                "databases": [
                    {"name": "shop", "type": "postgres", "userRef": "main", "lifetime": 14}
                ]
            }"#,
        )
        .unwrap();

        let targets = CleanupTarget::from_config(&config);
        let dirs: Vec<String> = targets.iter().map(CleanupTarget::remote_dir).collect();
        assert_eq!(
            dirs,
            vec!["dirs/alice", "files/hosts", "logs/app.log", "databases/shop"]
        );
        assert_eq!(targets[1].policy, RetentionPolicy::KeepForever);
        assert_eq!(targets[3].policy, RetentionPolicy::Days(14));

        let paths = BackupPaths::new("/b");
        assert_eq!(targets[0].local_dir(&paths), PathBuf::from("/b/dirs/alice"));
    }
}
