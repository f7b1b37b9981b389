//! FILETIME → UTC conversion (MS-CFB `creation_time`/`modified_time` fields).

use chrono::{DateTime, Utc};

/// Converts a raw Windows FILETIME (100-ns ticks since 1601-01-01 UTC) to a UTC
/// timestamp. A raw value of zero means "absent" and is not passed in here by
/// callers; this function only handles the conversion itself.
pub fn from_filetime(raw: u64) -> Option<DateTime<Utc>> {
    epochs::windows_file(raw as i64).map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}
