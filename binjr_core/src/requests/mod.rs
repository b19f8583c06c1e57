//! Fetch flow turning series descriptors into transformed data.
//!
//! Series sharing an adapter and path are downloaded once; distinct paths are fetched
//! concurrently. Each payload is parsed with its adapter's parser, every requested
//! series is cut out of it by column, clipped to the requested interval and finally
//! passed through the caller's [`TransformPipeline`].

use std::{collections::HashMap, sync::Arc};

use futures::future::try_join_all;
use indexmap::IndexMap;
use snafu::OptionExt;
use tracing::debug;

use crate::{
    adapters::{DataAdapter, errors::AdapterReleasedSnafu},
    errors::Error,
    models::{
        info::{SeriesMap, TimeSeriesInfo},
        interval::TimeInterval,
        series::TimeSeries,
    },
    parsers::ParsedSeries,
    transform::{TransformPipeline, interval_clip},
};

/// Downloads and parses the raw data of `path` over `interval`.
pub async fn fetch_path(
    adapter: &dyn DataAdapter,
    path: &str,
    interval: &TimeInterval,
) -> Result<ParsedSeries, Error> {
    let mut payload = Vec::new();
    let written = adapter
        .get_data(path, interval.begin(), interval.end(), &mut payload)
        .await?;
    debug!(source = %adapter.source_name(), path, bytes = written, "Downloaded series data");
    adapter
        .parser()
        .parse(&mut payload.as_slice())
        .map_err(|source| Error::Parse {
            path: path.to_string(),
            source,
        })
}

/// Picks the column of `parsed` that `info` refers to.
///
/// The binding's column index wins; bindings without one are matched by label. An
/// empty payload yields an empty series.
fn select_column(parsed: &ParsedSeries, info: &TimeSeriesInfo) -> Result<TimeSeries, Error> {
    if parsed.is_empty() {
        return Ok(TimeSeries::new());
    }
    let binding = info.binding();
    let found = match binding.column() {
        Some(i) => parsed.get_index(i).map(|(_, s)| s),
        None => parsed.get(binding.label()),
    };
    found.cloned().ok_or_else(|| Error::MissingColumn {
        path: binding.path().to_string(),
        column: binding
            .column()
            .map_or_else(|| binding.label().to_string(), |i| i.to_string()),
    })
}

/// Identity of a live adapter instance; two servers may share a display name.
fn adapter_id(adapter: &Arc<dyn DataAdapter>) -> usize {
    Arc::as_ptr(adapter).cast::<()>() as usize
}

/// Fetches every series in `infos` over `interval` and applies `pipeline`.
///
/// The result follows the order of `infos`. Any failure aborts the whole request.
pub async fn fetch_series(
    infos: &[TimeSeriesInfo],
    interval: TimeInterval,
    pipeline: &TransformPipeline,
) -> Result<SeriesMap, Error> {
    let mut groups: IndexMap<(usize, &str), (Arc<dyn DataAdapter>, Vec<&TimeSeriesInfo>)> = IndexMap::new();
    for info in infos {
        let binding = info.binding();
        let adapter = binding
            .adapter()
            .context(AdapterReleasedSnafu { path: binding.path() })?;
        groups
            .entry((adapter_id(&adapter), binding.path()))
            .or_insert_with(|| (adapter, Vec::new()))
            .1
            .push(info);
    }

    let fetched = try_join_all(groups.iter().map(|(&(_, path), (adapter, members))| async move {
        let parsed = fetch_path(adapter.as_ref(), path, &interval).await?;
        let selected = members
            .iter()
            .map(|info| Ok(((*info).clone(), select_column(&parsed, info)?)))
            .collect::<Result<Vec<_>, Error>>()?;
        Ok::<_, Error>(selected)
    }))
    .await?;

    let mut by_info: HashMap<TimeSeriesInfo, TimeSeries> = fetched.into_iter().flatten().collect();
    let series: SeriesMap = infos.iter().filter_map(|i| by_info.remove_entry(i)).collect();

    let clipped = interval_clip(interval).transform(series, true)?;
    Ok(pipeline.apply(clipped)?)
}
