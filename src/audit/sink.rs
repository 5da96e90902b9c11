//! Event sinks
//!
//! Components that make cleanup decisions report them to an injected
//! `EventSink` instead of writing to the console directly.

use std::sync::{Mutex, PoisonError};

use super::event::{CleanupEvent, EventKind};

/// Receives cleanup events
pub trait EventSink {
    /// Record one event
    fn record(&self, event: CleanupEvent);
}

impl<T: EventSink + ?Sized> EventSink for &T {
    fn record(&self, event: CleanupEvent) {
        (**self).record(event)
    }
}

impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn record(&self, event: CleanupEvent) {
        self.0.record(event.clone());
        self.1.record(event);
    }
}

impl<T: EventSink> EventSink for Option<T> {
    fn record(&self, event: CleanupEvent) {
        if let Some(sink) = self {
            sink.record(event);
        }
    }
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: CleanupEvent) {
        let backend = event.backend;
        let location = event.location.as_str();

        match &event.kind {
            EventKind::Deleted { age_days } => {
                tracing::info!(%backend, location, age_days, "deleted old backup");
            }
            EventKind::WouldDelete { age_days } => {
                tracing::info!(%backend, location, age_days, "would delete old backup (dry run)");
            }
            EventKind::DeleteFailed { error } => {
                tracing::warn!(%backend, location, error = %error, "failed to delete old backup");
            }
            EventKind::DirectoryMissing => {
                tracing::info!(
                    %backend,
                    location,
                    "directory not found, backups may not exist yet"
                );
            }
            EventKind::ListFailed { error } => {
                tracing::warn!(
                    %backend,
                    location,
                    error = %error,
                    "cleanup failed, directory could not be listed"
                );
            }
            EventKind::MetadataFallback => {
                tracing::debug!(
                    %backend,
                    location,
                    "no timestamp in name, using modification time"
                );
            }
            EventKind::AgeUnknown => {
                tracing::warn!(%backend, location, "cannot determine backup age, keeping it");
            }
            EventKind::ScanSummary {
                scanned,
                deleted,
                kept,
            } => {
                if *deleted > 0 {
                    tracing::info!(
                        %backend,
                        location,
                        scanned,
                        deleted,
                        kept,
                        "cleaned up old backups"
                    );
                } else {
                    tracing::debug!(%backend, location, scanned, kept, "nothing to clean up");
                }
            }
            EventKind::PassSummary { targets, deleted } => {
                tracing::info!(%backend, targets, deleted, "cleanup pass complete");
            }
        }
    }
}

/// Collects events in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<CleanupEvent>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event recorded so far
    pub fn events(&self) -> Vec<CleanupEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events matching a predicate on their kind
    pub fn filter(&self, predicate: impl Fn(&EventKind) -> bool) -> Vec<CleanupEvent> {
        self.events()
            .into_iter()
            .filter(|e| predicate(&e.kind))
            .collect()
    }

    /// Locations of every deletion recorded
    pub fn deleted_locations(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(CleanupEvent::is_deletion)
            .map(|e| e.location)
            .collect()
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: CleanupEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
