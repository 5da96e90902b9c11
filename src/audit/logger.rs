//! Audit logger for append-only cleanup log
//!
//! Writes cleanup events to a JSONL file, one event per line, flushed
//! immediately so that a record of every deletion survives a crash.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::error::{BackupError, BackupResult};

use super::event::CleanupEvent;
use super::sink::EventSink;

/// Handles writing cleanup events to the audit log file
pub struct AuditLogger {
    /// Path to the audit log file
    log_path: PathBuf,
}

impl AuditLogger {
    /// Create a new AuditLogger that writes to the specified path
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
        }
    }

    /// Append an event as a JSON line
    pub fn log(&self, event: &CleanupEvent) -> BackupResult<()> {
        if let Some(parent) = self.log_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    BackupError::Io(format!("Failed to create audit log directory: {}", e))
                })?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| BackupError::Io(format!("Failed to open audit log: {}", e)))?;

        let json = serde_json::to_string(event)
            .map_err(|e| BackupError::Json(format!("Failed to serialize audit event: {}", e)))?;

        writeln!(file, "{}", json)
            .map_err(|e| BackupError::Io(format!("Failed to write audit event: {}", e)))?;

        file.flush()
            .map_err(|e| BackupError::Io(format!("Failed to flush audit log: {}", e)))?;

        Ok(())
    }
}

impl EventSink for AuditLogger {
    fn record(&self, event: CleanupEvent) {
        if let Err(e) = self.log(&event) {
            tracing::warn!(
                path = %self.log_path.display(),
                error = %e,
                "failed to write audit log"
            );
        }
    }
}
