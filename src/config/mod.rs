//! Configuration module for the backup tool
//!
//! This module provides configuration management including:
//! - JSON configuration with `$ENV:KEY` substitution and `.env` loading
//! - The local and remote storage layout
//! - Redacted credential handling

pub mod env;
pub mod paths;
pub mod secret;
pub mod settings;

pub use paths::BackupPaths;
pub use secret::Secret;
pub use settings::{Config, Database, DatabaseKind, DbUser, Item, Upload};
