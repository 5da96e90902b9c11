//! Retention policy evaluation
//!
//! Decides whether an archive has outlived its configured lifetime. Ages are
//! compared on the local civil clock, and lifetimes are subtracted as calendar
//! days rather than multiples of 24 hours.

use chrono::{Days, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How long archives of a target are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "kind", content = "days")]
pub enum RetentionPolicy {
    /// Never prune (configured lifetime is zero, negative, or absent)
    #[default]
    KeepForever,
    /// Prune archives older than this many calendar days
    Days(u32),
}

impl RetentionPolicy {
    /// Build a policy from a configured lifetime in days
    ///
    /// Zero and negative values mean "keep forever".
    pub fn from_lifetime(days: i64) -> Self {
        if days <= 0 {
            Self::KeepForever
        } else {
            Self::Days(u32::try_from(days).unwrap_or(u32::MAX))
        }
    }

    /// The cutoff instant: archives created at or before it are expired
    pub fn cutoff(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Self::KeepForever => None,
            Self::Days(days) => Some(
                now.checked_sub_days(Days::new(u64::from(*days)))
                    .unwrap_or(NaiveDateTime::MIN),
            ),
        }
    }

    /// Whether this policy ever prunes anything
    pub fn prunes(&self) -> bool {
        matches!(self, Self::Days(_))
    }
}

impl fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeepForever => write!(f, "keep forever"),
            Self::Days(1) => write!(f, "1 day"),
            Self::Days(days) => write!(f, "{} days", days),
        }
    }
}

/// Where an archive's age came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeSource {
    /// Timestamp decoded from the archive filename
    Encoded(NaiveDateTime),
    /// Last-modified time reported by the storage backend
    Modified(NaiveDateTime),
}

impl AgeSource {
    /// Prefer the encoded timestamp, falling back to metadata
    pub fn resolve(
        encoded: Option<NaiveDateTime>,
        modified: Option<NaiveDateTime>,
    ) -> Option<Self> {
        encoded
            .map(Self::Encoded)
            .or_else(|| modified.map(Self::Modified))
    }

    /// The instant this source reports
    pub fn instant(&self) -> NaiveDateTime {
        match self {
            Self::Encoded(t) | Self::Modified(t) => *t,
        }
    }

    /// Whether this age came from the metadata fallback
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Modified(_))
    }
}

/// Decide whether an archive has expired under a policy
pub fn is_expired(age: AgeSource, policy: RetentionPolicy, now: NaiveDateTime) -> bool {
    match policy.cutoff(now) {
        Some(cutoff) => age.instant() <= cutoff,
        None => false,
    }
}

/// Whole days between an instant and now, for log output
pub fn age_in_days(instant: NaiveDateTime, now: NaiveDateTime) -> i64 {
    now.signed_duration_since(instant).num_days()
}
