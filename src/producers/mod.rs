//! Archive producers
//!
//! Turns configured sources into timestamped archives under the local
//! backup tree. Directories, files and logs are archived directly; databases
//! are dumped into a scratch directory first.

mod database;
mod tools;

#[cfg(test)]
pub(crate) mod testing;

pub use database::{dump_plan, DumpPlan};
pub use tools::{ExternalTools, SystemTools};

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::config::{BackupPaths, Database, DbUser, Item};
use crate::error::{BackupError, BackupResult};
use crate::models::{archive_name, BackupCategory};

/// Outcome of archiving one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Produced {
    /// Archive written to this path
    Created(PathBuf),
    /// Source was missing; nothing was written
    Skipped,
}

/// Writes archives for configured targets
pub struct ArchiveProducer<'a> {
    paths: &'a BackupPaths,
    tools: &'a dyn ExternalTools,
}

impl<'a> ArchiveProducer<'a> {
    pub fn new(paths: &'a BackupPaths, tools: &'a dyn ExternalTools) -> Self {
        Self { paths, tools }
    }

    /// Archive a directory, file or log target
    ///
    /// A missing source is skipped with a warning. Logs must be regular files
    /// and are truncated once their archive is verified.
    pub fn archive_item(
        &self,
        category: BackupCategory,
        item: &Item,
        now: NaiveDateTime,
    ) -> BackupResult<Produced> {
        if !item.path.exists() {
            tracing::warn!(
                category = %category,
                source = %item.path.display(),
                "source does not exist, skipping"
            );
            return Ok(Produced::Skipped);
        }

        if category == BackupCategory::Log && !item.path.is_file() {
            return Err(BackupError::Archive(format!(
                "log source is not a regular file: {}",
                item.path.display()
            )));
        }

        let archive = self.archive_path(category, &item.base_name(), now)?;
        let (base_dir, entry) = split_source(&item.path);
        self.tools.archive(&archive, &base_dir, &entry)?;
        verify(&archive)?;

        if category == BackupCategory::Log {
            truncate(&item.path)?;
        }

        tracing::info!(
            category = %category,
            source = %item.path.display(),
            archive = %archive.display(),
            "archive created"
        );
        Ok(Produced::Created(archive))
    }

    /// Dump a database and archive the dump
    pub fn archive_database(
        &self,
        db: &Database,
        user: &DbUser,
        now: NaiveDateTime,
    ) -> BackupResult<PathBuf> {
        let kind = db.engine()?;
        let work_dir = tempfile::Builder::new().prefix("db-dump-").tempdir()?;

        let plan = dump_plan(kind, &db.name, user, work_dir.path());
        tracing::debug!(database = %db.name, tool = plan.tool, "dumping database");
        self.tools.run(plan.tool, plan.command)?;

        let archive = self.archive_path(BackupCategory::Database, &db.name, now)?;
        self.tools.archive(&archive, work_dir.path(), plan.entry)?;
        verify(&archive)?;

        tracing::info!(
            database = %db.name,
            engine = %kind,
            archive = %archive.display(),
            "archive created"
        );
        Ok(archive)
    }

    fn archive_path(
        &self,
        category: BackupCategory,
        item: &str,
        now: NaiveDateTime,
    ) -> BackupResult<PathBuf> {
        let dir = self.paths.ensure_item_dir(category, item)?;
        Ok(dir.join(archive_name(category, now)))
    }
}

/// Split a source into the directory tar runs from and the entry it archives
fn split_source(path: &Path) -> (PathBuf, String) {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let base = if parent.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                parent.to_path_buf()
            };
            (base, name.to_string_lossy().to_string())
        }
        _ => (path.to_path_buf(), ".".to_string()),
    }
}

fn verify(archive: &Path) -> BackupResult<()> {
    if archive.is_file() {
        Ok(())
    } else {
        Err(BackupError::Archive(format!(
            "archive was not created: {}",
            archive.display()
        )))
    }
}

fn truncate(path: &Path) -> BackupResult<()> {
    OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(path)
        .map(|_| ())
        .map_err(|e| BackupError::Io(format!("Failed to truncate {}: {}", path.display(), e)))
}
