//! Cleanup event data structures
//!
//! Every decision the cleanup scanners make is described by a `CleanupEvent`.
//! Events are serialized one per line by the audit logger and forwarded to
//! `tracing` by the console sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage backend an event was observed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Local filesystem under the backup root
    Local,
    /// Remote share
    Remote,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Local => write!(f, "local"),
            Backend::Remote => write!(f, "remote"),
        }
    }
}

/// What happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum EventKind {
    /// An expired archive was removed
    Deleted { age_days: i64 },

    /// An expired archive would have been removed (dry run)
    WouldDelete { age_days: i64 },

    /// Removing an expired archive failed
    DeleteFailed { error: String },

    /// The directory to scan does not exist yet
    DirectoryMissing,

    /// The directory could not be listed
    ListFailed { error: String },

    /// The filename carried no timestamp; metadata was used instead
    MetadataFallback,

    /// Neither the filename nor metadata gave an age; the archive was kept
    AgeUnknown,

    /// End of one directory scan
    ScanSummary {
        scanned: usize,
        deleted: usize,
        kept: usize,
    },

    /// End of a remote cleanup pass over all targets
    PassSummary { targets: usize, deleted: usize },
}

/// A single cleanup event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupEvent {
    /// When the event occurred (UTC)
    pub timestamp: DateTime<Utc>,

    /// Backend the event concerns
    pub backend: Backend,

    /// Directory or archive path, as displayed by the backend
    pub location: String,

    #[serde(flatten)]
    pub kind: EventKind,
}

impl CleanupEvent {
    /// Create an event stamped with the current time
    pub fn new(backend: Backend, location: impl Into<String>, kind: EventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            backend,
            location: location.into(),
            kind,
        }
    }

    /// Whether this event reports a removed archive
    pub fn is_deletion(&self) -> bool {
        matches!(self.kind, EventKind::Deleted { .. })
    }
}
