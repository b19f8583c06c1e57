use super::TransformStage;
use crate::models::{info::SeriesMap, interval::TimeInterval};

pub const INTERVAL_CLIP: &str = "IntervalClip";

/// Drops samples outside `[begin, end)` of `interval`.
pub fn interval_clip(interval: TimeInterval) -> TransformStage {
    TransformStage::new(INTERVAL_CLIP, move |mut series: SeriesMap| {
        for s in series.values_mut() {
            s.retain_within(&interval);
        }
        Ok(series)
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeDelta, TimeZone, Utc};

    use super::*;
    use crate::models::{binding::SeriesBinding, info::TimeSeriesInfo, series::TimeSeries};

    #[test]
    fn clips_to_half_open_interval() {
        let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let mut s = TimeSeries::new();
        for i in 0..5 {
            s.push(t0 + TimeDelta::minutes(i), i as f64).unwrap();
        }
        let info = TimeSeriesInfo::new(Arc::new(SeriesBinding::new("a", "1", "src")));
        let interval = TimeInterval::new(t0 + TimeDelta::minutes(1), t0 + TimeDelta::minutes(3)).unwrap();

        let out = interval_clip(interval).transform(SeriesMap::from([(info, s)]), true).unwrap();
        let values: Vec<f64> = out[0].samples().iter().map(|s| s.value).collect();
        assert_eq!(values, vec![1.0, 2.0]);
    }
}
