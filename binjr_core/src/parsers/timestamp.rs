//! Timestamp strategies for delimited text payloads.

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use shared_utils::tz::{Resolved, resolve_local};

/// Format of the timestamp column served by JRDS.
pub const JRDS_TIMESTAMP_PATTERN: &str = "%Y-%m-%d %H:%M:%S";

/// Converts the text of a timestamp field into an instant.
///
/// `previous` is the instant of the preceding row, if any. Strategies reading local
/// wall-clock times use it to resolve repeated hours at a DST fall-back.
pub trait TimestampParser: Send + Sync {
    fn parse(&self, text: &str, previous: Option<DateTime<Utc>>) -> Result<DateTime<Utc>, chrono::ParseError>;
}

/// Local wall-clock timestamps in a fixed zone, read with a `strftime` pattern.
///
/// Times skipped by a DST gap are shifted forward by the gap length. A time that
/// occurs twice resolves to its first occurrence, unless the preceding row is already
/// at or past it, in which case the second occurrence is used.
#[derive(Debug, Clone)]
pub struct LocalTimestampParser {
    pattern: String,
    zone: Tz,
}

impl LocalTimestampParser {
    pub fn new(pattern: impl Into<String>, zone: Tz) -> Self {
        Self {
            pattern: pattern.into(),
            zone,
        }
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }
}

impl TimestampParser for LocalTimestampParser {
    fn parse(&self, text: &str, previous: Option<DateTime<Utc>>) -> Result<DateTime<Utc>, chrono::ParseError> {
        let naive = NaiveDateTime::parse_from_str(text, &self.pattern)?;
        Ok(match resolve_local(naive, self.zone) {
            Resolved::Single(dt) | Resolved::Shifted(dt) => dt,
            Resolved::Ambiguous { earliest, latest } => {
                if previous.is_some_and(|p| p >= earliest) {
                    latest
                } else {
                    earliest
                }
            }
        })
    }
}

/// RFC 3339 timestamps carrying their own offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rfc3339TimestampParser;

impl TimestampParser for Rfc3339TimestampParser {
    fn parse(&self, text: &str, _previous: Option<DateTime<Utc>>) -> Result<DateTime<Utc>, chrono::ParseError> {
        Ok(DateTime::parse_from_rfc3339(text)?.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn paris() -> LocalTimestampParser {
        LocalTimestampParser::new(JRDS_TIMESTAMP_PATTERN, chrono_tz::Europe::Paris)
    }

    #[test]
    fn parses_in_zone() {
        let utc = LocalTimestampParser::new(JRDS_TIMESTAMP_PATTERN, chrono_tz::UTC);
        assert_eq!(
            utc.parse("2020-01-01 00:00:00", None).unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            paris().parse("2020-01-01 01:00:00", None).unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
        );
        assert!(utc.parse("01/01/2020", None).is_err());
    }

    #[test]
    fn gap_is_shifted_forward() {
        // 2024-03-31 02:30 does not exist in Paris; clocks jump from 02:00 to 03:00.
        assert_eq!(
            paris().parse("2024-03-31 02:30:00", None).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 31, 1, 30, 0).unwrap()
        );
    }

    #[test]
    fn repeated_hour_keeps_series_increasing() {
        // 2024-10-27 02:30 occurs at 00:30Z and again at 01:30Z in Paris.
        let p = paris();
        let first = p.parse("2024-10-27 02:30:00", None).unwrap();
        assert_eq!(first, Utc.with_ymd_and_hms(2024, 10, 27, 0, 30, 0).unwrap());

        let after_first = p.parse("2024-10-27 02:45:00", Some(first)).unwrap();
        assert_eq!(after_first, Utc.with_ymd_and_hms(2024, 10, 27, 0, 45, 0).unwrap());

        let second = p.parse("2024-10-27 02:30:00", Some(after_first)).unwrap();
        assert_eq!(second, Utc.with_ymd_and_hms(2024, 10, 27, 1, 30, 0).unwrap());
    }

    #[test]
    fn rfc3339_carries_offset() {
        assert_eq!(
            Rfc3339TimestampParser.parse("2020-01-01T02:00:00+02:00", None).unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
        );
    }
}
