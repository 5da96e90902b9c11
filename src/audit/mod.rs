//! Audit trail for cleanup decisions
//!
//! Records every deletion, skipped directory and failure the cleanup
//! scanners encounter.
//!
//! # Architecture
//!
//! - `CleanupEvent`: one decision or observation, with backend, location and kind.
//! - `EventSink`: the collaborator scanners report to. Implemented by
//!   `TracingSink` (console), `MemorySink` (tests) and `AuditLogger`
//!   (append-only JSONL file). Two sinks combine as a tuple.
//!
//! # Example
//!
//! ```rust,ignore
//! use backup_tool::audit::{AuditLogger, TracingSink};
//!
//! let sink = (TracingSink, AuditLogger::new("/var/log/backup-tool/audit.log"));
//! let scanner = CleanupScanner::new(&LocalStore, &sink);
//! ```

mod event;
mod logger;
mod sink;

pub use event::{Backend, CleanupEvent, EventKind};
pub use logger::AuditLogger;
pub use sink::{EventSink, MemorySink, TracingSink};
