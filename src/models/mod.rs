//! Core data models for the backup tool
//!
//! This module contains the naming protocol for archives, the backup
//! categories, and the retention policy evaluator.

pub mod archive_name;
pub mod category;
pub mod retention;

pub use archive_name::{
    archive_name, decode_timestamp, encode_timestamp, is_archive_candidate, ARCHIVE_EXTENSION,
};
pub use category::BackupCategory;
pub use retention::{age_in_days, is_expired, AgeSource, RetentionPolicy};
