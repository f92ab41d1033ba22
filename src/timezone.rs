//! Resolves the server's configured timezone to a UTC offset and produces
//! the timestamps stored in the database.

use time::{OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

/// Get the current UTC offset of `canonical_timezone`, e.g. "Pacific/Auckland".
///
/// Returns `None` if `canonical_timezone` is not a known timezone name.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Convert `date_time` to the form stored in the database: UTC with whole
/// seconds.
///
/// Every stored timestamp and every timestamp bound in a query must go
/// through this function so that their text encodings compare in
/// chronological order.
pub fn normalize_timestamp(date_time: OffsetDateTime) -> OffsetDateTime {
    date_time
        .to_offset(UtcOffset::UTC)
        .replace_nanosecond(0)
        .unwrap_or_else(|_| date_time.to_offset(UtcOffset::UTC))
}

/// The current time, normalized with [normalize_timestamp].
pub fn current_timestamp() -> OffsetDateTime {
    normalize_timestamp(OffsetDateTime::now_utc())
}

#[cfg(test)]
mod tests {
    use time::{UtcOffset, macros::datetime};

    use super::{get_local_offset, normalize_timestamp};

    #[test]
    fn utc_has_zero_offset() {
        assert_eq!(get_local_offset("Etc/UTC"), Some(UtcOffset::UTC));
    }

    #[test]
    fn unknown_timezone_is_none() {
        assert_eq!(get_local_offset("Middle/Earth"), None);
    }

    #[test]
    fn normalize_converts_to_utc_and_truncates() {
        let local = datetime!(2024-01-05 09:30:15.123456 +13:00);

        let normalized = normalize_timestamp(local);

        assert_eq!(normalized, datetime!(2024-01-04 20:30:15 UTC));
        assert_eq!(normalized.offset(), UtcOffset::UTC);
    }
}
