//! Custom error types for the backup tool
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use std::time::Duration;

use thiserror::Error;

/// The main error type for backup operations
#[derive(Error, Debug)]
pub enum BackupError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Entity not found errors (missing sources, directories, users)
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// An external tool (tar, pg_dump, ...) failed or could not be started
    #[error("{tool} failed: {message}")]
    Tool { tool: String, message: String },

    /// Archive creation or verification errors
    #[error("Archive error: {0}")]
    Archive(String),

    /// Remote share errors (mount, session, protocol)
    #[error("Remote share error: {0}")]
    Remote(String),

    /// A remote operation exceeded its deadline
    #[error("{operation} timed out after {}s", .timeout.as_secs())]
    TimedOut {
        operation: String,
        timeout: Duration,
    },
}

impl BackupError {
    /// Create a "not found" error for a directory
    pub fn directory_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Directory",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for a database user reference
    pub fn database_user_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Database user",
            identifier: identifier.into(),
        }
    }

    /// Create a tool failure error
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a deadline expiry
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

impl From<std::io::Error> for BackupError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BackupError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for backup operations
pub type BackupResult<T> = Result<T, BackupError>;
