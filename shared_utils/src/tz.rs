//! Time zone parsing and local time resolution.
//!
//! - [`parse_tz`]: parse an IANA zone name (e.g. "Europe/Paris") into a [`chrono_tz::Tz`].
//! - [`resolve_local`]: classify how a naive local timestamp maps onto UTC in a zone:
//!   a single instant, two candidate instants (fall-back), or an instant shifted past
//!   a spring-forward gap.
//!
//! Ambiguous local times happen during "fall back" when a wall time occurs twice.
//! Nonexistent local times happen during "spring forward" when a wall time is skipped;
//! they are read with the offset in force before the gap, which moves them later by
//! the length of the gap (02:30 becomes 03:30 on a one-hour gap).

use chrono::{DateTime, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("bad tz: {0}")]
pub struct UnknownZoneError(pub String);

/// Parses an IANA time zone name.
pub fn parse_tz(name: &str) -> Result<Tz, UnknownZoneError> {
    name.trim()
        .parse()
        .map_err(|_| UnknownZoneError(name.to_string()))
}

/// How a naive local timestamp maps onto the UTC timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    /// Exactly one instant.
    Single(DateTime<Utc>),
    /// The wall time occurs twice; `earliest < latest`.
    Ambiguous {
        earliest: DateTime<Utc>,
        latest: DateTime<Utc>,
    },
    /// The wall time falls in a gap; this is the instant obtained with the offset
    /// that was in force just before the gap.
    Shifted(DateTime<Utc>),
}

/// Classifies `naive` in `tz`. Never fails.
pub fn resolve_local(naive: NaiveDateTime, tz: Tz) -> Resolved {
    use chrono::offset::LocalResult::*;
    match tz.from_local_datetime(&naive) {
        Single(dt) => Resolved::Single(dt.with_timezone(&Utc)),
        Ambiguous(a, b) => {
            let (a, b) = (a.with_timezone(&Utc), b.with_timezone(&Utc));
            Resolved::Ambiguous {
                earliest: a.min(b),
                latest: a.max(b),
            }
        }
        None => {
            // A day earlier is comfortably before any transition.
            let before = tz
                .offset_from_utc_datetime(&(naive - TimeDelta::days(1)))
                .fix();
            let utc = naive - TimeDelta::seconds(i64::from(before.local_minus_utc()));
            Resolved::Shifted(Utc.from_utc_datetime(&utc))
        }
    }
}
