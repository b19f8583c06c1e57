//! Command line front end.

pub mod commands;
pub mod params;

use std::{
    io::{self, Write},
    sync::Arc,
};

use chrono::{SecondsFormat, Utc};
use shared_utils::env::get_env_var_opt;

use self::{
    commands::{Cli, Commands},
    params::resolve_interval,
};
use crate::{
    Error,
    adapters::{DataAdapter, TreeFilter, registry::AdapterRegistry, transport::HttpTransport},
    config::{AdapterConfig, BinjrConfig, CONFIG_ENV_VAR},
    models::{
        binding::SeriesBinding,
        info::{SeriesMap, TimeSeriesInfo},
    },
    notify::TracingReporter,
    requests::fetch_path,
    transform::{TransformPipeline, interval_clip, sample_reduction},
    tree::{NodeKind, SourceTreeNode},
};

fn load_config(cli: &Cli) -> Result<BinjrConfig, Error> {
    if let Some(path) = &cli.config {
        return Ok(BinjrConfig::load(path)?);
    }
    if get_env_var_opt(CONFIG_ENV_VAR).is_some() {
        return Ok(BinjrConfig::from_env()?);
    }
    Ok(BinjrConfig::default())
}

fn open_adapter(cli: &Cli, registry: &AdapterRegistry, config: &BinjrConfig) -> Result<Arc<dyn DataAdapter>, Error> {
    let adapter_config = match &cli.url {
        Some(url) => AdapterConfig {
            zone: cli.zone.clone(),
            ..AdapterConfig::default().with_url(url.as_str())
        },
        None => config.adapter(&cli.adapter).cloned().unwrap_or_default(),
    };
    Ok(registry.new_adapter(&cli.adapter, &adapter_config)?)
}

fn tree_filter(requested: Option<&str>, adapter: &dyn DataAdapter) -> TreeFilter {
    requested.map_or_else(|| adapter.default_filter(), TreeFilter::new)
}

/// Expands every pending branch below `node`, depth first.
async fn expand_all(node: Arc<SourceTreeNode>) {
    let mut stack = vec![node];
    while let Some(n) = stack.pop() {
        let children = if n.is_pending() {
            n.expand(&TracingReporter).await
        } else {
            n.children()
        };
        stack.extend(children);
    }
}

fn print_tree(root: &SourceTreeNode, out: &mut dyn Write) -> io::Result<()> {
    let mut result = Ok(());
    root.walk(&mut |depth, node| {
        if result.is_err() {
            return;
        }
        let indent = "  ".repeat(depth);
        result = match (node.kind(), node.binding()) {
            (NodeKind::Placeholder, _) | (_, None) => writeln!(out, "{indent}..."),
            (NodeKind::Leaf, Some(b)) => match b.column() {
                Some(c) => writeln!(out, "{indent}{} [{}#{c}]", b.label(), b.path()),
                None => writeln!(out, "{indent}{} [{}]", b.label(), b.path()),
            },
            (NodeKind::Branch, Some(b)) => writeln!(out, "{indent}{} ({})", b.label(), b.path()),
        };
    });
    result
}

fn print_csv(series: &SeriesMap, out: &mut dyn Write) -> io::Result<()> {
    write!(out, "timestamp")?;
    for info in series.keys() {
        write!(out, ",{}", info.display_name())?;
    }
    writeln!(out)?;

    let mut rows: std::collections::BTreeMap<_, Vec<Option<f64>>> = Default::default();
    for (col, s) in series.values().enumerate() {
        for sample in s.samples() {
            rows.entry(sample.timestamp).or_insert_with(|| vec![None; series.len()])[col] = Some(sample.value);
        }
    }
    for (ts, values) in rows {
        write!(out, "{}", ts.to_rfc3339_opts(SecondsFormat::Secs, true))?;
        for v in values {
            match v {
                Some(v) => write!(out, ",{v}")?,
                None => write!(out, ",")?,
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Executes the parsed command line, writing results to stdout.
pub async fn run(cli: Cli, transport: Arc<dyn HttpTransport>) -> Result<(), Error> {
    let config = load_config(&cli)?;
    let mut registry = AdapterRegistry::with_builtin(transport);
    registry.apply_preferences(&config);
    let mut out = io::stdout();

    match &cli.command {
        Commands::Adapters => {
            for info in registry.all_adapters() {
                let state = if info.is_enabled() { "enabled" } else { "disabled" };
                writeln!(out, "{}\t{}\t{}\t{state}", info.key(), info.name(), info.description())?;
            }
        }
        Commands::Tree { filter, expand } => {
            let adapter = open_adapter(&cli, &registry, &config)?;
            let root = adapter.binding_tree(&tree_filter(filter.as_deref(), adapter.as_ref())).await?;
            if *expand {
                expand_all(Arc::clone(&root)).await;
            }
            print_tree(&root, &mut out)?;
        }
        Commands::Fetch { path, begin, end, last, reduce } => {
            let adapter = open_adapter(&cli, &registry, &config)?;
            let interval = resolve_interval(begin.as_deref(), end.as_deref(), *last, Utc::now())?;
            let parsed = fetch_path(adapter.as_ref(), path, &interval).await?;

            let series: SeriesMap = parsed
                .into_iter()
                .enumerate()
                .map(|(i, (name, s))| {
                    let binding = SeriesBinding::new(name.as_str(), path.as_str(), adapter.source_name()).with_column(i);
                    (TimeSeriesInfo::new(Arc::new(binding)), s)
                })
                .collect();

            let mut pipeline = TransformPipeline::new().with_stage(interval_clip(interval));
            if let Some(threshold) = reduce {
                pipeline.push(sample_reduction(*threshold), true);
            }
            print_csv(&pipeline.apply(series)?, &mut out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::series::TimeSeries;

    #[test]
    fn csv_output_aligns_columns() {
        let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 1, 0).unwrap();
        let mut a = TimeSeries::new();
        a.push(t0, 1.0).unwrap();
        a.push(t1, 2.0).unwrap();
        let mut b = TimeSeries::new();
        b.push(t1, 3.5).unwrap();
        let series = SeriesMap::from([
            (TimeSeriesInfo::new(Arc::new(SeriesBinding::new("a", "p", "s"))), a),
            (TimeSeriesInfo::new(Arc::new(SeriesBinding::new("b", "p", "s"))), b),
        ]);

        let mut out = Vec::new();
        print_csv(&series, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "timestamp,a,b\n2020-01-01T00:00:00Z,1,\n2020-01-01T00:01:00Z,2,3.5\n"
        );
    }

    #[test]
    fn tree_filter_falls_back_to_configured_view() {
        let config = AdapterConfig {
            tree_filter: Some("servicestab".into()),
            ..AdapterConfig::default().with_url("http://jrds.test:8080/jrds")
        };
        let transport: Arc<dyn HttpTransport> = Arc::new(crate::adapters::transport::ReqwestTransport::new().unwrap());
        let adapter = AdapterRegistry::with_builtin(transport).new_adapter("jrds", &config).unwrap();

        assert_eq!(tree_filter(None, adapter.as_ref()).command(), "servicestab");
        assert_eq!(tree_filter(Some("tagstab"), adapter.as_ref()).command(), "tagstab");
    }

    #[test]
    fn tree_output_indents_by_depth() {
        let root = SourceTreeNode::branch(SeriesBinding::new("src", "/", "s"));
        root.push_child(Arc::new(SourceTreeNode::leaf(SeriesBinding::new("cpu", "42", "s").with_column(1))));
        let mut out = Vec::new();
        print_tree(&root, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "src (/)\n  cpu [42#1]\n");
    }
}
