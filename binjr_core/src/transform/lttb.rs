//! Largest-Triangle-Three-Buckets down-sampling.

use super::{TransformError, TransformStage};
use crate::models::{info::SeriesMap, series::{Sample, TimeSeries}};

pub const SAMPLE_REDUCTION: &str = "LargestTriangleThreeBuckets";

fn x(s: &Sample) -> f64 {
    s.timestamp.timestamp_millis() as f64
}

/// Reduces `samples` to at most `threshold` points that preserve the visual shape.
///
/// The first and last samples are always kept. Inputs no longer than `threshold`, or
/// thresholds below 3, are returned unchanged.
pub fn lttb(samples: &[Sample], threshold: usize) -> Vec<Sample> {
    if threshold < 3 || samples.len() <= threshold {
        return samples.to_vec();
    }

    let mut out = Vec::with_capacity(threshold);
    out.push(samples[0]);

    let n = samples.len();
    // Interior points split into threshold - 2 buckets.
    let every = (n - 2) as f64 / (threshold - 2) as f64;
    let mut a = 0usize;

    for i in 0..threshold - 2 {
        let avg_start = (((i + 1) as f64 * every) as usize + 1).min(n - 1);
        let avg_end = (((i + 2) as f64 * every) as usize + 1).clamp(avg_start + 1, n);
        let next = &samples[avg_start..avg_end];
        let len = next.len() as f64;
        let avg_x = next.iter().map(x).sum::<f64>() / len;
        let avg_y = next.iter().map(|s| s.value).sum::<f64>() / len;

        let range_start = (i as f64 * every) as usize + 1;
        let range_end = (((i + 1) as f64 * every) as usize + 1).min(n - 1);

        let (ax, ay) = (x(&samples[a]), samples[a].value);
        let mut best = range_start;
        let mut best_area = -1.0;
        for (j, s) in samples[range_start..range_end].iter().enumerate() {
            let area = ((ax - avg_x) * (s.value - ay) - (ax - x(s)) * (avg_y - ay)).abs();
            if area > best_area {
                best_area = area;
                best = range_start + j;
            }
        }
        out.push(samples[best]);
        a = best;
    }

    out.push(samples[n - 1]);
    out
}

/// Stage down-sampling every series to at most `threshold` samples.
pub fn sample_reduction(threshold: usize) -> TransformStage {
    TransformStage::new(SAMPLE_REDUCTION, move |series: SeriesMap| {
        series
            .into_iter()
            .map(|(info, s)| {
                if s.len() <= threshold {
                    return Ok((info, s));
                }
                let reduced = TimeSeries::from_samples(lttb(s.samples(), threshold))
                    .map_err(|e| TransformError::new(SAMPLE_REDUCTION, e.to_string()))?;
                Ok((info, reduced))
            })
            .collect()
    })
}
