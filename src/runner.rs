//! Backup run orchestration
//!
//! One run archives every configured target in order (directories, files,
//! logs, databases), prunes each target's local directory right after its
//! archive is written, then uploads the tree and prunes the share.
//! A failing target is logged and counted; it never stops the run.

use std::fmt;

use chrono::{Local, NaiveDateTime};

use crate::audit::EventSink;
use crate::cleanup::{CleanupReport, CleanupScanner, CleanupTarget, RemoteCleanup};
use crate::config::{BackupPaths, Config, Database, Item};
use crate::error::BackupResult;
use crate::models::BackupCategory;
use crate::producers::{ArchiveProducer, ExternalTools, Produced};
use crate::remote::{ShareMount, ShareSession};
use crate::storage::LocalStore;
use crate::upload::{upload_tree, UploadReport};

/// Totals for one run
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    pub dry_run: bool,
    /// Archives written
    pub created: usize,
    /// Targets whose source was missing
    pub skipped: usize,
    /// Targets that failed to archive
    pub failed: usize,
    /// Archives removed (or that would be, in a dry run) locally
    pub pruned_local: usize,
    /// Archives removed (or that would be, in a dry run) on the share
    pub pruned_remote: usize,
    /// Failed listings and deletions across both backends
    pub cleanup_errors: usize,
    pub upload: Option<UploadReport>,
    /// Why the remote phase could not run
    pub remote_error: Option<String>,
}

impl RunSummary {
    /// Whether every step completed without error
    pub fn is_success(&self) -> bool {
        self.failed == 0
            && self.cleanup_errors == 0
            && self.remote_error.is_none()
            && self.upload.as_ref().map_or(true, |u| u.failed == 0)
    }

    fn add_local(&mut self, report: &CleanupReport) {
        self.pruned_local += report.deleted_count();
        self.cleanup_errors += report.failed + usize::from(report.list_error.is_some());
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.dry_run { "would prune" } else { "pruned" };
        write!(
            f,
            "{} archives created, {} skipped, {} failed; {} {} local and {} remote archives",
            self.created, self.skipped, self.failed, verb, self.pruned_local, self.pruned_remote
        )?;

        if let Some(upload) = &self.upload {
            write!(
                f,
                "; uploaded {} ({} bytes), {} unchanged",
                upload.uploaded, upload.bytes, upload.skipped
            )?;
        }
        if self.cleanup_errors > 0 {
            write!(f, "; {} cleanup errors", self.cleanup_errors)?;
        }
        if let Some(e) = &self.remote_error {
            write!(f, "; remote phase failed: {}", e)?;
        }
        Ok(())
    }
}

/// A configured source, in processing order
enum Source<'c> {
    Path(BackupCategory, &'c Item),
    Database(&'c Database),
}

impl Source<'_> {
    /// Whether there is anything to archive; databases are checked by their dump tool
    fn exists(&self) -> bool {
        match self {
            Source::Path(_, item) => item.path.exists(),
            Source::Database(_) => true,
        }
    }

    fn target(&self) -> CleanupTarget {
        match self {
            Source::Path(category, item) => CleanupTarget {
                category: *category,
                item: item.base_name(),
                policy: item.policy(),
            },
            Source::Database(db) => CleanupTarget {
                category: BackupCategory::Database,
                item: db.name.clone(),
                policy: db.policy(),
            },
        }
    }
}

/// Drives a complete backup run
pub struct BackupRunner<'a> {
    config: &'a Config,
    paths: BackupPaths,
    tools: &'a dyn ExternalTools,
    sink: &'a dyn EventSink,
    dry_run: bool,
}

impl<'a> BackupRunner<'a> {
    pub fn new(config: &'a Config, tools: &'a dyn ExternalTools, sink: &'a dyn EventSink) -> Self {
        Self {
            config,
            paths: BackupPaths::new(&config.local_backup_path),
            tools,
            sink,
            dry_run: false,
        }
    }

    /// Evaluate retention without archiving, uploading or deleting
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run the local phase, then the remote phase when upload is active
    pub fn run(&self) -> BackupResult<RunSummary> {
        let now = Local::now().naive_local();
        let mut summary = self.run_local(now)?;

        if self.config.upload.active {
            let mount = if self.dry_run {
                ShareMount::existing(&self.config.upload)
            } else {
                ShareMount::attach(&self.config.upload)
            };
            match mount {
                Ok(mount) => {
                    let session = mount.session();
                    self.run_remote(&session, now, &mut summary);
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        "remote share unavailable, skipping upload and remote cleanup"
                    );
                    summary.remote_error = Some(e.to_string());
                }
            }
        } else {
            tracing::debug!("upload disabled");
        }

        tracing::info!(summary = %summary, "backup run finished");
        Ok(summary)
    }

    /// Archive and prune every target locally
    pub fn run_local(&self, now: NaiveDateTime) -> BackupResult<RunSummary> {
        let mut summary = RunSummary {
            dry_run: self.dry_run,
            ..RunSummary::default()
        };

        if !self.dry_run {
            self.paths.ensure_root()?;
        }

        let producer = ArchiveProducer::new(&self.paths, self.tools);
        let scanner = CleanupScanner::new(&LocalStore, self.sink).dry_run(self.dry_run);

        for source in self.sources() {
            let target = source.target();

            if self.dry_run {
                // A missing source leaves its archives alone
                if !source.exists() {
                    summary.skipped += 1;
                    continue;
                }
            } else {
                match self.produce(&producer, &source, now) {
                    Ok(Produced::Created(_)) => summary.created += 1,
                    Ok(Produced::Skipped) => {
                        summary.skipped += 1;
                        continue;
                    }
                    Err(e) => {
                        tracing::error!(
                            category = %target.category,
                            item = %target.item,
                            error = %e,
                            "backup failed"
                        );
                        summary.failed += 1;
                        continue;
                    }
                }
            }

            let dir = target.local_dir(&self.paths);
            let report =
                scanner.clean(dir.as_path(), target.category.prefix(), target.policy, now);
            summary.add_local(&report);
        }

        Ok(summary)
    }

    /// Upload the local tree and prune every target on the share
    pub fn run_remote<S: ShareSession>(
        &self,
        session: &S,
        now: NaiveDateTime,
        summary: &mut RunSummary,
    ) {
        if !self.dry_run {
            match upload_tree(self.paths.root(), session) {
                Ok(report) => summary.upload = Some(report),
                Err(e) => {
                    tracing::error!(error = %e, "upload failed");
                    summary.remote_error = Some(e.to_string());
                }
            }
        }

        let targets = CleanupTarget::from_config(self.config);
        let report = RemoteCleanup::new(session, self.sink)
            .dry_run(self.dry_run)
            .run(&targets, now);

        summary.pruned_remote += report.deleted_count();
        summary.cleanup_errors += report.error_count();
    }

    fn sources(&self) -> Vec<Source<'a>> {
        let config = self.config;
        let mut sources: Vec<Source<'a>> = Vec::new();
        sources.extend(config.dirs.iter().map(|i| Source::Path(BackupCategory::Directory, i)));
        sources.extend(config.files.iter().map(|i| Source::Path(BackupCategory::File, i)));
        sources.extend(config.logs.iter().map(|i| Source::Path(BackupCategory::Log, i)));
        sources.extend(config.databases.iter().map(Source::Database));
        sources
    }

    fn produce(
        &self,
        producer: &ArchiveProducer<'_>,
        source: &Source<'_>,
        now: NaiveDateTime,
    ) -> BackupResult<Produced> {
        match source {
            Source::Path(category, item) => producer.archive_item(*category, item, now),
            Source::Database(db) => {
                let user = self.config.database_user(db)?;
                producer
                    .archive_database(db, user, now)
                    .map(Produced::Created)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{EventKind, MemorySink};
    use crate::cleanup::testing::MemoryShare;
    use crate::config::Upload;
    use crate::producers::testing::FakeTools;
    use chrono::NaiveDate;
    use std::path::Path;
    use tempfile::TempDir;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_hms_opt(2, 0, 0)
            .unwrap()
    }

    fn config(root: &Path, sources: &Path) -> Config {
        let json = serde_json::json!({
            "localBackupPath": root.join("backups"),
            "dirs": [{"path": sources.join("project"), "lifetime": 30}],
            "files": [{"path": sources.join("missing.conf"), "lifetime": 30}],
            "logs": [{"path": sources.join("app.log"), "lifetime": 7}],
            "databaseUsers": {"main": {"user": "backup", "password": "pw"}},
            "databases": [
                {"name": "shop", "type": "postgres", "userRef": "main", "lifetime": 14},
                {"name": "crm", "type": "mysql", "userRef": "nobody", "lifetime": 14}
            ]
        });
        Config::from_json(&json.to_string()).unwrap()
    }

    fn fixture() -> (TempDir, Config) {
        let temp_dir = TempDir::new().unwrap();
        let sources = temp_dir.path().join("src");
        std::fs::create_dir_all(sources.join("project")).unwrap();
        std::fs::write(sources.join("app.log"), b"log line\n").unwrap();
        let config = config(temp_dir.path(), &sources);
        (temp_dir, config)
    }

    fn seed(dir: &Path, name: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(name), b"old").unwrap();
    }

    #[test]
    fn test_local_phase_archives_and_prunes() {
        let (temp_dir, config) = fixture();
        let backups = temp_dir.path().join("backups");
        seed(&backups.join("dirs/project"), "dir_20240101_000000.tar.gz");
        seed(&backups.join("dirs/project"), "dir_20240601_000000.tar.gz");

        let tools = FakeTools::new();
        let sink = MemorySink::new();
        let summary = BackupRunner::new(&config, &tools, &sink)
            .run_local(now())
            .unwrap();

        assert_eq!(summary.created, 3);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.pruned_local, 1);
        assert!(!summary.is_success());

        let remaining: Vec<String> = std::fs::read_dir(backups.join("dirs/project"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.contains(&"dir_20240610_020000.tar.gz".to_string()));
        assert!(!remaining.contains(&"dir_20240101_000000.tar.gz".to_string()));

        assert!(backups.join("databases/shop/db_20240610_020000.tar.gz").exists());
        assert!(!backups.join("databases/crm").exists());
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let (temp_dir, config) = fixture();
        let old = temp_dir
            .path()
            .join("backups/logs/app.log/log_20240101_000000.tar.gz");
        seed(old.parent().unwrap(), "log_20240101_000000.tar.gz");

        let tools = FakeTools::new();
        let sink = MemorySink::new();
        let summary = BackupRunner::new(&config, &tools, &sink)
            .dry_run(true)
            .run_local(now())
            .unwrap();

        assert!(tools.calls().is_empty());
        assert_eq!(summary.created, 0);
        assert_eq!(summary.pruned_local, 1);
        assert!(old.exists());
        assert_eq!(
            sink.filter(|k| matches!(k, EventKind::WouldDelete { .. })).len(),
            1
        );
        assert!(summary.to_string().contains("would prune 1 local"));
    }

    #[test]
    fn test_failed_target_keeps_old_archives() {
        let (temp_dir, config) = fixture();
        let dir = temp_dir.path().join("backups/dirs/project");
        seed(&dir, "dir_20240101_000000.tar.gz");

        let tools = FakeTools::new().failing("tar");
        let sink = MemorySink::new();
        let summary = BackupRunner::new(&config, &tools, &sink)
            .run_local(now())
            .unwrap();

        assert_eq!(summary.created, 0);
        assert!(dir.join("dir_20240101_000000.tar.gz").exists());
    }

    #[test]
    fn test_missing_source_keeps_last_archives() {
        let (temp_dir, config) = fixture();
        let dir = temp_dir.path().join("backups/files/missing.conf");
        seed(&dir, "file_20240101_000000.tar.gz");

        for dry_run in [false, true] {
            let tools = FakeTools::new();
            let sink = MemorySink::new();
            let summary = BackupRunner::new(&config, &tools, &sink)
                .dry_run(dry_run)
                .run_local(now())
                .unwrap();

            assert_eq!(summary.skipped, 1);
            assert_eq!(summary.pruned_local, 0);
            assert!(dir.join("file_20240101_000000.tar.gz").exists());
            assert!(!sink
                .events()
                .iter()
                .any(|e| e.location.contains("missing.conf")));
        }
    }

    #[test]
    fn test_remote_phase_uploads_and_prunes() {
        let (_temp_dir, config) = fixture();
        let share = MemoryShare::new();
        share.add_file("dirs/project", "dir_20230101_000000.tar.gz", None);
        share.add_file("logs/app.log", "log_20240605_000000.tar.gz", None);

        let tools = FakeTools::new();
        let sink = MemorySink::new();
        let runner = BackupRunner::new(&config, &tools, &sink);
        let mut summary = runner.run_local(now()).unwrap();
        runner.run_remote(&share, now(), &mut summary);

        let upload = summary.upload.clone().unwrap();
        assert_eq!(upload.uploaded, 3);
        assert_eq!(summary.pruned_remote, 1);
        assert_eq!(
            share.files_in("dirs/project"),
            vec!["dir_20240610_020000.tar.gz"]
        );
        assert!(share.contains("logs/app.log/log_20240605_000000.tar.gz"));
        assert!(share.contains("databases/shop/db_20240610_020000.tar.gz"));
    }

    #[test]
    fn test_dry_run_does_not_mount_share() {
        let (temp_dir, mut config) = fixture();
        let mount_point = temp_dir.path().join("share");
        config.upload = Upload {
            active: true,
            smb_host: "nas.invalid".into(),
            smb_share: "archive".into(),
            mount_point: Some(mount_point.clone()),
            ..Upload::default()
        };

        let tools = FakeTools::new();
        let sink = MemorySink::new();
        let summary = BackupRunner::new(&config, &tools, &sink)
            .dry_run(true)
            .run()
            .unwrap();

        let error = summary.remote_error.unwrap();
        assert!(error.contains("is not mounted at"), "{}", error);
        assert!(!mount_point.exists());
        assert!(tools.calls().is_empty());
    }

    #[test]
    fn test_summary_display() {
        let summary = RunSummary {
            created: 2,
            skipped: 1,
            pruned_local: 3,
            pruned_remote: 1,
            remote_error: Some("mount failed".into()),
            ..RunSummary::default()
        };
        assert_eq!(
            summary.to_string(),
            "2 archives created, 1 skipped, 0 failed; pruned 3 local and 1 remote archives; \
             remote phase failed: mount failed"
        );
    }
}
