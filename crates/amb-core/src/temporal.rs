//! # UTC Timestamps
//!
//! `Timestamp` is a UTC-only timestamp truncated to seconds. It is used for
//! ledger event times, relayer state `updated_at` fields, and the deployment
//! record. Non-UTC inputs are rejected at parse time.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse an RFC 3339 string. Only the `Z` suffix is accepted.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        if !s.ends_with('Z') {
            return Err(ValidationError::InvalidTimestamp(format!(
                "timestamp must use Z suffix (UTC only), got: {s:?}"
            )));
        }
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| ValidationError::InvalidTimestamp(format!("{s:?}: {e}")))?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Seconds elapsed from `self` until `later`, saturating at zero.
    pub fn seconds_until(&self, later: &Timestamp) -> u64 {
        let delta = later.0.timestamp() - self.0.timestamp();
        u64::try_from(delta).unwrap_or(0)
    }

    /// Render as `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn now_has_no_subseconds() {
        assert_eq!(Timestamp::now().as_datetime().nanosecond(), 0);
    }

    #[test]
    fn parse_accepts_z_and_truncates() {
        let ts = Timestamp::parse("2026-01-15T12:00:00.123Z").unwrap();
        assert_eq!(ts.to_iso8601(), "2026-01-15T12:00:00Z");
    }

    #[test]
    fn parse_rejects_offsets() {
        assert!(Timestamp::parse("2026-01-15T12:00:00+00:00").is_err());
        assert!(Timestamp::parse("not-a-date").is_err());
    }

    #[test]
    fn seconds_until_saturates() {
        let a = Timestamp::from_utc(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        let b = Timestamp::from_utc(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 30).unwrap());
        assert_eq!(a.seconds_until(&b), 30);
        assert_eq!(b.seconds_until(&a), 0);
    }
}
