//! Retention cleanup scanner
//!
//! One algorithm for every backend: list a directory, keep the entries that
//! follow the naming convention for a prefix, work out each archive's age
//! from its name (or from metadata when the name carries no timestamp), and
//! remove the ones the retention policy has expired.

use chrono::NaiveDateTime;

use crate::audit::{CleanupEvent, EventKind, EventSink};
use crate::models::{
    age_in_days, decode_timestamp, is_archive_candidate, is_expired, AgeSource, RetentionPolicy,
};
use crate::storage::ArchiveStore;

/// Outcome of cleaning one directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Archives that matched the prefix and extension
    pub scanned: usize,
    /// Names of removed archives (in a dry run, the ones that would be removed)
    pub deleted: Vec<String>,
    /// Archives left in place
    pub kept: usize,
    /// Expired archives whose removal failed
    pub failed: usize,
    /// The directory did not exist
    pub directory_missing: bool,
    /// The directory existed but could not be listed
    pub list_error: Option<String>,
}

impl CleanupReport {
    /// Number of removed archives
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }

    /// Whether anything went wrong during the scan
    pub fn has_errors(&self) -> bool {
        self.failed > 0 || self.list_error.is_some()
    }
}

/// Applies a retention policy to one directory of a backend
pub struct CleanupScanner<'a, S: ArchiveStore + ?Sized> {
    store: &'a S,
    sink: &'a dyn EventSink,
    dry_run: bool,
}

impl<'a, S: ArchiveStore + ?Sized> CleanupScanner<'a, S> {
    /// Create a scanner over a store, reporting to a sink
    pub fn new(store: &'a S, sink: &'a dyn EventSink) -> Self {
        Self {
            store,
            sink,
            dry_run: false,
        }
    }

    /// Evaluate without removing anything
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn emit(&self, location: String, kind: EventKind) {
        self.sink
            .record(CleanupEvent::new(self.store.backend(), location, kind));
    }

    /// Remove expired archives named `<prefix>...` from a directory
    pub fn clean(
        &self,
        dir: &S::Dir,
        prefix: &str,
        policy: RetentionPolicy,
        now: NaiveDateTime,
    ) -> CleanupReport {
        let mut report = CleanupReport::default();
        let location = self.store.display_dir(dir);

        if !policy.prunes() {
            tracing::debug!(location = %location, "retention disabled, skipping cleanup");
            return report;
        }

        let entries = match self.store.list(dir) {
            Ok(entries) => entries,
            Err(e) if e.is_not_found() => {
                report.directory_missing = true;
                self.emit(location, EventKind::DirectoryMissing);
                return report;
            }
            Err(e) => {
                report.list_error = Some(e.to_string());
                self.emit(location, EventKind::ListFailed { error: e.to_string() });
                return report;
            }
        };

        for entry in entries {
            if entry.is_dir || !is_archive_candidate(&entry.name, prefix) {
                continue;
            }
            report.scanned += 1;

            let entry_location = self.store.display_entry(dir, &entry.name);
            let Some(age) = AgeSource::resolve(decode_timestamp(&entry.name), entry.modified) else {
                report.kept += 1;
                self.emit(entry_location, EventKind::AgeUnknown);
                continue;
            };

            if age.is_fallback() {
                self.emit(entry_location.clone(), EventKind::MetadataFallback);
            }

            if !is_expired(age, policy, now) {
                report.kept += 1;
                continue;
            }

            let age_days = age_in_days(age.instant(), now);
            if self.dry_run {
                self.emit(entry_location, EventKind::WouldDelete { age_days });
                report.deleted.push(entry.name);
                continue;
            }

            match self.store.remove(dir, &entry.name) {
                Ok(()) => {
                    self.emit(entry_location, EventKind::Deleted { age_days });
                    report.deleted.push(entry.name);
                }
                Err(e) => {
                    report.failed += 1;
                    self.emit(entry_location, EventKind::DeleteFailed { error: e.to_string() });
                }
            }
        }

        self.emit(
            location,
            EventKind::ScanSummary {
                scanned: report.scanned,
                deleted: report.deleted.len(),
                kept: report.kept,
            },
        );

        report
    }
}
