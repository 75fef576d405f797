// SQLite-backed persistence for gatepasses, users and the audit trail

pub mod audit;
pub mod sqlite;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::lifecycle::errors::GatepassError;

pub use audit::AuditRecorder;
pub use sqlite::SqliteGatepassStore;

/// Fixed-width UTC format so stored timestamps compare correctly as text
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Wall-clock format of the requested movement date/time
pub const REQUESTED_FOR_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, GatepassError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| corrupt(format!("bad timestamp '{raw}': {e}")))
}

pub(crate) fn decode_optional_timestamp(
    raw: Option<&str>,
) -> Result<Option<DateTime<Utc>>, GatepassError> {
    raw.map(decode_timestamp).transpose()
}

pub(crate) fn encode_requested_for(at: NaiveDateTime) -> String {
    at.format(REQUESTED_FOR_FORMAT).to_string()
}

pub(crate) fn decode_requested_for(raw: &str) -> Result<NaiveDateTime, GatepassError> {
    NaiveDateTime::parse_from_str(raw, REQUESTED_FOR_FORMAT)
        .map_err(|e| corrupt(format!("bad requested date '{raw}': {e}")))
}

/// A stored value this crate cannot read back
pub(crate) fn corrupt(message: String) -> GatepassError {
    GatepassError::StorageUnavailable(sqlx::Error::Decode(message.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_timestamps_sort_as_text() {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
        let earlier = encode_timestamp(base);
        let later = encode_timestamp(base + Duration::microseconds(1));
        let much_later = encode_timestamp(base + Duration::seconds(3601));

        assert_eq!(earlier, "2025-01-01T08:00:00.000000Z");
        assert!(earlier < later);
        assert!(later < much_later);
        assert_eq!(decode_timestamp(&later).unwrap(), base + Duration::microseconds(1));
    }

    #[test]
    fn test_bad_timestamp_is_reported() {
        assert!(matches!(
            decode_timestamp("yesterday"),
            Err(GatepassError::StorageUnavailable(sqlx::Error::Decode(_)))
        ));
    }
}
