//! Archive naming protocol
//!
//! Archives are named `<prefix><YYYYMMDD>_<HHMMSS>.tar.gz`. The timestamp is
//! the creation instant on the local civil clock and is the authoritative age
//! of an archive whenever it can be parsed back out of the name.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::category::BackupCategory;

/// Extension of every archive the tool produces
pub const ARCHIVE_EXTENSION: &str = ".tar.gz";

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Length of `_YYYYMMDD_HHMMSS`
const STAMP_LEN: usize = 16;

/// Format a creation instant as `YYYYMMDD_HHMMSS`
pub fn encode_timestamp(instant: NaiveDateTime) -> String {
    instant.format(TIMESTAMP_FORMAT).to_string()
}

/// Extract the creation instant from an archive filename
///
/// Only the `_YYYYMMDD_HHMMSS` fragment immediately before `.tar.gz` is
/// considered; digit runs elsewhere in the name are ignored.
pub fn decode_timestamp(filename: &str) -> Option<NaiveDateTime> {
    let stem = filename.strip_suffix(ARCHIVE_EXTENSION)?;
    let start = stem.len().checked_sub(STAMP_LEN)?;
    let stamp = stem.get(start..)?.as_bytes();

    if stamp[0] != b'_' || stamp[9] != b'_' {
        return None;
    }

    let date_part = &stamp[1..9];
    let time_part = &stamp[10..16];
    if !date_part.iter().chain(time_part).all(u8::is_ascii_digit) {
        return None;
    }

    let year = digits(&date_part[0..4]) as i32;
    let month = digits(&date_part[4..6]);
    let day = digits(&date_part[6..8]);
    let hour = digits(&time_part[0..2]);
    let minute = digits(&time_part[2..4]);
    let second = digits(&time_part[4..6]);

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = NaiveTime::from_hms_opt(hour, minute, second)?;

    Some(NaiveDateTime::new(date, time))
}

fn digits(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
}

/// Build the name for a new archive of the given category
pub fn archive_name(category: BackupCategory, created_at: NaiveDateTime) -> String {
    format!(
        "{}{}{}",
        category.prefix(),
        encode_timestamp(created_at),
        ARCHIVE_EXTENSION
    )
}

/// Check whether a filename is a candidate archive for a prefix filter
pub fn is_archive_candidate(filename: &str, prefix: &str) -> bool {
    filename.starts_with(prefix) && filename.ends_with(ARCHIVE_EXTENSION)
}
