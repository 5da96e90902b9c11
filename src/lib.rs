//! backup-tool - scheduled backups with retention cleanup
//!
//! Archives directories, files, logs and databases into a local tree of
//! timestamped `.tar.gz` files, mirrors that tree onto an SMB share, and
//! prunes archives older than each target's lifetime on both sides.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration loading, env substitution and path layout
//! - `error`: Custom error types
//! - `models`: Archive naming, timestamp codec and retention policy
//! - `storage`: Listing and removal backends for the cleanup scanner
//! - `cleanup`: Retention cleanup engine (local and remote)
//! - `audit`: Cleanup event sinks
//! - `producers`: Archive creation via tar and database dump tools
//! - `remote`: SMB share sessions and mount lifecycle
//! - `upload`: Mirroring the local tree onto the share
//! - `runner`: One complete backup run
//!
//! # Example
//!
//! ```rust,ignore
//! use backup_tool::audit::TracingSink;
//! use backup_tool::config::Config;
//! use backup_tool::producers::SystemTools;
//! use backup_tool::runner::BackupRunner;
//!
//! let config = Config::load(Path::new("config.json"))?;
//! let summary = BackupRunner::new(&config, &SystemTools, &TracingSink).run()?;
//! println!("{}", summary);
//! ```

pub mod audit;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod producers;
pub mod remote;
pub mod runner;
pub mod storage;
pub mod upload;

pub use error::{BackupError, BackupResult};
