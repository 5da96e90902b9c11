//! Remote cleanup pass
//!
//! After upload, every configured target is checked on the share in one
//! sequential pass. Targets are independent: a missing directory, a listing
//! failure or a failed delete in one never stops the rest.

use chrono::NaiveDateTime;

use super::scanner::{CleanupReport, CleanupScanner};
use super::CleanupTarget;
use crate::audit::{Backend, CleanupEvent, EventKind, EventSink};
use crate::remote::ShareSession;
use crate::storage::RemoteStore;

/// Result of a remote pass
#[derive(Debug, Default)]
pub struct RemotePassReport {
    /// Per-target results, in processing order
    pub targets: Vec<(CleanupTarget, CleanupReport)>,
}

impl RemotePassReport {
    /// Total archives removed across all targets
    pub fn deleted_count(&self) -> usize {
        self.targets.iter().map(|(_, r)| r.deleted_count()).sum()
    }

    /// Total failed removals and listings
    pub fn error_count(&self) -> usize {
        self.targets
            .iter()
            .map(|(_, r)| r.failed + usize::from(r.list_error.is_some()))
            .sum()
    }
}

/// Applies every target's retention policy on the remote share
pub struct RemoteCleanup<'a, S: ShareSession> {
    store: RemoteStore<'a, S>,
    sink: &'a dyn EventSink,
    dry_run: bool,
}

impl<'a, S: ShareSession> RemoteCleanup<'a, S> {
    /// Create a pass over an established session
    pub fn new(session: &'a S, sink: &'a dyn EventSink) -> Self {
        Self {
            store: RemoteStore::new(session),
            sink,
            dry_run: false,
        }
    }

    /// Evaluate without removing anything
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Clean every target's directory on the share
    pub fn run(&self, targets: &[CleanupTarget], now: NaiveDateTime) -> RemotePassReport {
        let scanner = CleanupScanner::new(&self.store, self.sink).dry_run(self.dry_run);
        let mut report = RemotePassReport::default();

        for target in targets {
            let dir = target.remote_dir();
            let result = scanner.clean(dir.as_str(), target.category.prefix(), target.policy, now);
            report.targets.push((target.clone(), result));
        }

        self.sink.record(CleanupEvent::new(
            Backend::Remote,
            "",
            EventKind::PassSummary {
                targets: targets.len(),
                deleted: report.deleted_count(),
            },
        ));

        report
    }
}
