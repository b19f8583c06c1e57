//! Named transformations applied to a set of fetched series.
//!
//! A [`TransformStage`] wraps a function from [`SeriesMap`] to [`SeriesMap`]. Stages
//! are chained in a [`TransformPipeline`], each with its own enabled flag; a
//! disabled stage passes its input through untouched without calling the function.

pub mod clip;
pub mod lttb;

use std::{
    fmt,
    sync::atomic::{AtomicBool, Ordering},
    time::Instant,
};

use thiserror::Error;
use tracing::{debug, trace};

pub use clip::interval_clip;
pub use lttb::{lttb, sample_reduction};

use crate::models::info::SeriesMap;

#[derive(Debug, Error)]
#[error("Transform {stage} failed: {message}")]
pub struct TransformError {
    pub stage: String,
    pub message: String,
}

impl TransformError {
    pub fn new(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

pub type TransformFn = Box<dyn Fn(SeriesMap) -> Result<SeriesMap, TransformError> + Send + Sync>;

/// Space separated labels of the series in a map, rendered on demand.
struct SeriesNames<'a>(&'a SeriesMap);

impl fmt::Display for SeriesNames<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<none>");
        }
        for (i, info) in self.0.keys().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(info.binding().label())?;
        }
        Ok(())
    }
}

/// A named series transformation.
pub struct TransformStage {
    name: String,
    apply: TransformFn,
}

impl TransformStage {
    pub fn new<F>(name: impl Into<String>, apply: F) -> Self
    where
        F: Fn(SeriesMap) -> Result<SeriesMap, TransformError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            apply: Box::new(apply),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Applies the stage when `enabled`; otherwise returns `series` unchanged.
    pub fn transform(&self, series: SeriesMap, enabled: bool) -> Result<SeriesMap, TransformError> {
        if !enabled {
            debug!(stage = %self.name, series = %SeriesNames(&series), "Transform is disabled");
            return Ok(series);
        }
        let started = Instant::now();
        let out = (self.apply)(series)?;
        trace!(stage = %self.name, series = %SeriesNames(&out), elapsed = ?started.elapsed(), "Applied transform");
        Ok(out)
    }
}

impl fmt::Debug for TransformStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformStage").field("name", &self.name).finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct Entry {
    stage: TransformStage,
    enabled: AtomicBool,
}

/// Ordered chain of stages.
#[derive(Debug, Default)]
pub struct TransformPipeline {
    entries: Vec<Entry>,
}

impl TransformPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an enabled stage.
    pub fn with_stage(mut self, stage: TransformStage) -> Self {
        self.push(stage, true);
        self
    }

    pub fn push(&mut self, stage: TransformStage, enabled: bool) {
        self.entries.push(Entry {
            stage,
            enabled: AtomicBool::new(enabled),
        });
    }

    /// Toggles every stage named `name`. Returns `false` if there is none.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        let mut found = false;
        for entry in self.entries.iter().filter(|e| e.stage.name == name) {
            entry.enabled.store(enabled, Ordering::Relaxed);
            found = true;
        }
        found
    }

    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.entries
            .iter()
            .find(|e| e.stage.name == name)
            .map(|e| e.enabled.load(Ordering::Relaxed))
    }

    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.stage.name())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs the stages in registration order.
    pub fn apply(&self, series: SeriesMap) -> Result<SeriesMap, TransformError> {
        self.entries.iter().try_fold(series, |acc, entry| {
            entry.stage.transform(acc, entry.enabled.load(Ordering::Relaxed))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::{binding::SeriesBinding, info::TimeSeriesInfo, series::TimeSeries};

    fn sample_map() -> SeriesMap {
        let mut s = TimeSeries::new();
        s.push(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(), 1.0).unwrap();
        let info = TimeSeriesInfo::new(Arc::new(SeriesBinding::new("cpu", "42", "src")));
        SeriesMap::from([(info, s)])
    }

    fn doubling(calls: Arc<AtomicUsize>) -> TransformStage {
        TransformStage::new("Double", move |series: SeriesMap| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(series
                .into_iter()
                .map(|(k, v)| {
                    let samples = v
                        .into_samples()
                        .into_iter()
                        .map(|mut s| {
                            s.value *= 2.0;
                            s
                        })
                        .collect();
                    (k, TimeSeries::from_samples(samples).unwrap())
                })
                .collect())
        })
    }

    #[test]
    fn disabled_stage_is_identity_and_not_invoked() {
        let calls = Arc::new(AtomicUsize::new(0));
        let stage = doubling(calls.clone());
        let input = sample_map();
        let out = stage.transform(input.clone(), false).unwrap();
        assert_eq!(out, input);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let out = stage.transform(input, true).unwrap();
        assert_eq!(out[0].samples()[0].value, 2.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn pipeline_runs_in_order_and_honors_flags() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = TransformPipeline::new()
            .with_stage(doubling(calls.clone()))
            .with_stage(TransformStage::new("AddOne", |series: SeriesMap| {
                Ok(series
                    .into_iter()
                    .map(|(k, v)| {
                        let samples = v
                            .into_samples()
                            .into_iter()
                            .map(|mut s| {
                                s.value += 1.0;
                                s
                            })
                            .collect();
                        (k, TimeSeries::from_samples(samples).unwrap())
                    })
                    .collect())
            }));

        assert_eq!(pipeline.apply(sample_map()).unwrap()[0].samples()[0].value, 3.0);

        assert!(pipeline.set_enabled("Double", false));
        assert_eq!(pipeline.is_enabled("Double"), Some(false));
        assert_eq!(pipeline.apply(sample_map()).unwrap()[0].samples()[0].value, 2.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!pipeline.set_enabled("Missing", true));
        assert_eq!(pipeline.stage_names().collect::<Vec<_>>(), vec!["Double", "AddOne"]);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn trace_names_the_transformed_series() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let stage = doubling(Arc::new(AtomicUsize::new(0)));
        tracing::subscriber::with_default(subscriber, || stage.transform(sample_map(), true).unwrap());

        let logged = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("Applied transform"));
        assert!(logged.contains("stage=Double"));
        assert!(logged.contains("series=cpu"));
    }

    #[test]
    fn stage_errors_stop_the_pipeline() {
        let pipeline = TransformPipeline::new()
            .with_stage(TransformStage::new("Fail", |_| Err(TransformError::new("Fail", "nope"))));
        let err = pipeline.apply(sample_map()).unwrap_err();
        assert_eq!(err.to_string(), "Transform Fail failed: nope");
    }

    #[test]
    fn series_names_render_labels() {
        assert_eq!(SeriesNames(&sample_map()).to_string(), "cpu");
        assert_eq!(SeriesNames(&SeriesMap::new()).to_string(), "<none>");
    }
}
