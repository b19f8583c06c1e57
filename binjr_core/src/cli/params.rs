use chrono::{DateTime, TimeDelta, Utc};

use crate::{Error, models::interval::TimeInterval};

fn parse_instant(name: &str, text: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(text.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            Error::Config(shared_utils::config::ConfigError::InvalidValue {
                key: name.to_string(),
                message: e.to_string(),
            })
        })
}

/// Interval from explicit bounds, or the last `last_minutes` minutes ending `now`.
pub fn resolve_interval(
    begin: Option<&str>,
    end: Option<&str>,
    last_minutes: i64,
    now: DateTime<Utc>,
) -> Result<TimeInterval, Error> {
    match (begin, end) {
        (Some(b), Some(e)) => Ok(TimeInterval::new(parse_instant("begin", b)?, parse_instant("end", e)?)?),
        _ => Ok(TimeInterval::ending_at(now, TimeDelta::minutes(last_minutes))?),
    }
}
