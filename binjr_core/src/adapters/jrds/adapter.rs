use std::{
    collections::HashSet,
    io::Write,
    sync::{Arc, Weak},
    time::Instant,
};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use encoding_rs::Encoding;
use reqwest::Url;
use shared_utils::{config::ConfigError, tz::parse_tz};
use snafu::{OptionExt, ResultExt};
use tracing::{debug, trace, warn};

use super::{LEGACY_PROBE_SECONDS, loader::GraphdescLoader, params::JrdsTreeFilter};
use crate::{
    adapters::{
        AdapterError, DataAdapter, Fetched, TreeFilter,
        errors::{
            InvalidIntervalSnafu, LegacyHeaderSnafu, MalformedCatalogueSnafu,
            MalformedDescriptorSnafu, SinkSnafu, StatusSnafu, TransportSnafu, UrlSnafu,
        },
        transport::{HttpResponse, HttpTransport},
    },
    config::AdapterConfig,
    models::{binding::SeriesBinding, graphdesc::Graphdesc, interval::TimeInterval},
    parsers::{
        CsvParser, DataParser,
        csv::JRDS_SEPARATOR,
        lines::DecodedLines,
    },
    tree::{LeafLoader, SourceTreeNode, catalogue::Catalogue},
};

/// Connects to one JRDS server.
///
/// Always handled through an `Arc`: the bindings and lazy tree nodes it creates hold
/// weak references back to it.
pub struct JrdsDataAdapter {
    base: Url,
    host: String,
    port: u16,
    zone: Tz,
    encoding: &'static Encoding,
    tree_filter: JrdsTreeFilter,
    transport: Arc<dyn HttpTransport>,
    me: Weak<JrdsDataAdapter>,
}

impl JrdsDataAdapter {
    /// Creates an adapter for the server rooted at `base` (scheme, host, optional port
    /// and path).
    pub fn new(
        base: Url,
        zone: Tz,
        encoding: &'static Encoding,
        tree_filter: JrdsTreeFilter,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Arc<Self>, AdapterError> {
        let host = base
            .host_str()
            .context(UrlSnafu {
                message: format!("{base} has no host"),
            })?
            .to_string();
        let port = base.port_or_known_default().context(UrlSnafu {
            message: format!("{base} has no port and its scheme has no default"),
        })?;
        if base.cannot_be_a_base() {
            return UrlSnafu {
                message: format!("{base} cannot be used as a base URL"),
            }
            .fail();
        }
        let mut base = base;
        base.set_query(None);
        base.set_fragment(None);

        Ok(Arc::new_cyclic(|me| Self {
            base,
            host,
            port,
            zone,
            encoding,
            tree_filter,
            transport,
            me: me.clone(),
        }))
    }

    /// Parses `url` and creates a UTF-8 adapter for it. A trailing slash is ignored.
    pub fn from_url(
        url: &str,
        zone: Tz,
        tree_filter: JrdsTreeFilter,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Arc<Self>, AdapterError> {
        let base = Url::parse(url.trim().trim_end_matches('/')).map_err(|e| {
            UrlSnafu {
                message: format!("{url}: {e}"),
            }
            .build()
        })?;
        Self::new(base, zone, encoding_rs::UTF_8, tree_filter, transport)
    }

    /// Creates an adapter from its preferences entry.
    pub fn from_config(config: &AdapterConfig, transport: Arc<dyn HttpTransport>) -> Result<Arc<Self>, ConfigError> {
        let invalid = |key: &str, message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let url = config.require_url()?;
        let base = Url::parse(url.trim().trim_end_matches('/')).map_err(|e| invalid("url", e.to_string()))?;
        let zone = parse_tz(&config.zone).map_err(|e| invalid("zone", e.to_string()))?;
        let encoding = Encoding::for_label(config.encoding.trim().as_bytes())
            .ok_or_else(|| invalid("encoding", format!("unknown encoding {}", config.encoding)))?;
        let tree_filter = match &config.tree_filter {
            Some(f) => f.parse().unwrap_or_default(),
            None => JrdsTreeFilter::default(),
        };
        Self::new(base, zone, encoding, tree_filter, transport).map_err(|e| invalid("url", e.to_string()))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The catalogue view configured for this source.
    pub fn tree_filter(&self) -> &JrdsTreeFilter {
        &self.tree_filter
    }

    fn endpoint_url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, AdapterError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                UrlSnafu {
                    message: format!("{} cannot be used as a base URL", self.base),
                }
                .build()
            })?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn send(&self, url: &Url) -> Result<HttpResponse, AdapterError> {
        debug!(%url, "Executing HTTP request");
        let started = Instant::now();
        let response = self
            .transport
            .get(url)
            .await
            .context(TransportSnafu { url: url.as_str() })?;
        trace!(%url, status = response.status, elapsed = ?started.elapsed(), "HTTP response received");
        Ok(response)
    }

    fn ensure_success(url: &Url, response: HttpResponse) -> Result<HttpResponse, AdapterError> {
        if response.is_success() {
            return Ok(response);
        }
        StatusSnafu {
            url: url.as_str(),
            status: response.status,
            reason: response.reason,
        }
        .fail()
    }

    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, AdapterError> {
        let response = Self::ensure_success(url, self.send(url).await?)?;
        response
            .into_bytes()
            .await
            .context(TransportSnafu { url: url.as_str() })
    }

    /// Streams a successful response body into `sink`, returning the bytes written.
    async fn download(&self, url: &Url, sink: &mut (dyn Write + Send)) -> Result<u64, AdapterError> {
        let mut response = Self::ensure_success(url, self.send(url).await?)?;
        let mut written = 0u64;
        while let Some(chunk) = response
            .body
            .chunk()
            .await
            .context(TransportSnafu { url: url.as_str() })?
        {
            sink.write_all(&chunk).context(SinkSnafu)?;
            written += chunk.len() as u64;
        }
        sink.flush().context(SinkSnafu)?;
        Ok(written)
    }

    fn interval_millis(begin: DateTime<Utc>, end: DateTime<Utc>) -> Result<Option<(String, String)>, AdapterError> {
        let interval = TimeInterval::new(begin, end).context(InvalidIntervalSnafu)?;
        if interval.is_empty() {
            return Ok(None);
        }
        Ok(Some((
            interval.begin().timestamp_millis().to_string(),
            interval.end().timestamp_millis().to_string(),
        )))
    }

    /// Downloads the samples of one probe of `target_host`, bypassing graph ids.
    pub async fn probe_data(
        &self,
        target_host: &str,
        probe: &str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        sink: &mut (dyn Write + Send),
    ) -> Result<u64, AdapterError> {
        let Some((begin, end)) = Self::interval_millis(begin, end)? else {
            return Ok(0);
        };
        let url = self.endpoint_url(
            &["download", "probe", target_host, probe],
            &[("begin", &begin), ("end", &end)],
        )?;
        self.download(&url, sink).await
    }

    /// Retrieves the sub-series layout of graph `id`.
    ///
    /// Servers without the `graphdesc` endpoint answer 404; the layout is then derived
    /// from the header of a short download.
    pub async fn graph_descriptor(&self, id: &str) -> Result<Graphdesc, AdapterError> {
        match self.fetch_graph_descriptor(id).await? {
            Fetched::Found(desc) => Ok(desc),
            Fetched::NotFound => {
                warn!(id, "Cannot find graphdesc service; falling back to legacy mode");
                self.graph_descriptor_legacy(id).await
            }
        }
    }

    async fn fetch_graph_descriptor(&self, id: &str) -> Result<Fetched<Graphdesc>, AdapterError> {
        let url = self.endpoint_url(&["graphdesc"], &[("id", id)])?;
        let response = self.send(&url).await?;
        if response.is_not_found() {
            return Ok(Fetched::NotFound);
        }
        let payload = Self::ensure_success(&url, response)?
            .into_bytes()
            .await
            .context(TransportSnafu { url: url.as_str() })?;
        let desc = Graphdesc::from_reader(payload.as_slice()).context(MalformedDescriptorSnafu { url: url.as_str() })?;
        Ok(Fetched::Found(desc))
    }

    async fn graph_descriptor_legacy(&self, id: &str) -> Result<Graphdesc, AdapterError> {
        let window = TimeInterval::ending_at(Utc::now(), TimeDelta::seconds(LEGACY_PROBE_SECONDS))
            .context(InvalidIntervalSnafu)?;
        let mut payload = Vec::new();
        self.get_data(id, window.begin(), window.end(), &mut payload).await?;

        let mut reader = payload.as_slice();
        let header = DecodedLines::new(&mut reader, self.encoding)
            .next_line()
            .map_err(|e| {
                LegacyHeaderSnafu {
                    path: id,
                    message: e.to_string(),
                }
                .build()
            })?
            .context(LegacyHeaderSnafu {
                path: id,
                message: "CSV payload is empty",
            })?;
        if header.trim().is_empty() {
            return LegacyHeaderSnafu {
                path: id,
                message: "header line in CSV is blank",
            }
            .fail();
        }
        let desc = Graphdesc::from_header(&header, JRDS_SEPARATOR);
        if desc.series.is_empty() {
            return LegacyHeaderSnafu {
                path: id,
                message: "header line in CSV has no value columns",
            }
            .fail();
        }
        let mut seen = HashSet::new();
        for (i, series) in desc.series.iter().enumerate() {
            let name = series.label();
            if name.is_empty() {
                return LegacyHeaderSnafu {
                    path: id,
                    message: format!("value column {} in CSV header is blank", i + 1),
                }
                .fail();
            }
            if !seen.insert(name) {
                return LegacyHeaderSnafu {
                    path: id,
                    message: format!("duplicate column {name:?} in CSV header"),
                }
                .fail();
            }
        }
        Ok(desc)
    }

    fn weak_self(&self) -> Weak<dyn DataAdapter> {
        self.me.clone()
    }

    fn binding(&self, label: &str, path: &str) -> SeriesBinding {
        SeriesBinding::new(label, path, self.source_name()).with_adapter(self.weak_self())
    }

    /// One leaf binding per visible sub-series of `desc`, bound to its column index.
    pub fn leaf_bindings(&self, desc: &Graphdesc, path: &str) -> Vec<SeriesBinding> {
        desc.visible_series()
            .map(|(column, series)| {
                self.binding(series.label(), path)
                    .with_column(column)
                    .with_unit(desc.vertical_label.clone())
                    .with_graph_type(series.graph_type.clone())
                    .with_color(series.color.clone())
            })
            .collect()
    }
}

#[async_trait]
impl DataAdapter for JrdsDataAdapter {
    async fn binding_tree(&self, filter: &TreeFilter) -> Result<Arc<SourceTreeNode>, AdapterError> {
        let url = self.endpoint_url(&["jsontree"], &[("tab", filter.command())])?;
        let payload = self.fetch_bytes(&url).await?;
        let catalogue = Catalogue::from_slice(&payload).map_err(|e| {
            MalformedCatalogueSnafu {
                url: url.as_str(),
                message: e.to_string(),
            }
            .build()
        })?;

        let root = Arc::new(SourceTreeNode::branch(self.binding(&self.source_name(), "/")));
        let loader: Arc<dyn LeafLoader> = Arc::new(GraphdescLoader::new(self.me.clone()));
        catalogue
            .attach_to(&root, |item, path| {
                let binding = self.binding(&item.name, path);
                if item.is_deferred() {
                    SourceTreeNode::deferred(binding, Arc::clone(&loader))
                } else {
                    SourceTreeNode::branch(binding)
                }
            })
            .map_err(|e| {
                MalformedCatalogueSnafu {
                    url: url.as_str(),
                    message: e.to_string(),
                }
                .build()
            })?;
        debug!(source = %self.source_name(), filter = %filter, "Built binding tree");
        Ok(root)
    }

    async fn get_data(
        &self,
        path: &str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        sink: &mut (dyn Write + Send),
    ) -> Result<u64, AdapterError> {
        let Some((begin, end)) = Self::interval_millis(begin, end)? else {
            return Ok(0);
        };
        let url = self.endpoint_url(&["download"], &[("id", path), ("begin", &begin), ("end", &end)])?;
        self.download(&url, sink).await
    }

    fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    fn time_zone(&self) -> Tz {
        self.zone
    }

    fn parser(&self) -> Box<dyn DataParser> {
        Box::new(CsvParser::jrds(self.encoding, self.zone))
    }

    fn source_name(&self) -> String {
        format!("[JRDS] {}:{} ({})", self.host, self.port, self.zone.name())
    }

    fn default_filter(&self) -> TreeFilter {
        TreeFilter::from(&self.tree_filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::transport::ReqwestTransport;

    fn adapter(url: &str) -> Arc<JrdsDataAdapter> {
        JrdsDataAdapter::from_url(
            url,
            chrono_tz::Europe::Paris,
            JrdsTreeFilter::HostsTab,
            Arc::new(ReqwestTransport::new().unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn source_name_embeds_host_port_and_zone() {
        assert_eq!(
            adapter("http://jrds.example.com:8080/jrds/").source_name(),
            "[JRDS] jrds.example.com:8080 (Europe/Paris)"
        );
        assert_eq!(adapter("https://jrds.example.com/jrds").port(), 443);
    }

    #[test]
    fn endpoints_are_appended_to_base_path() {
        let a = adapter("http://h:8080/jrds/");
        let url = a.endpoint_url(&["download"], &[("id", "42"), ("begin", "0"), ("end", "1000")]).unwrap();
        assert_eq!(url.as_str(), "http://h:8080/jrds/download?id=42&begin=0&end=1000");

        let url = a.endpoint_url(&["download", "probe", "web 01", "cpu"], &[]).unwrap();
        assert_eq!(url.as_str(), "http://h:8080/jrds/download/probe/web%2001/cpu");
    }

    #[test]
    fn rejects_urls_without_host() {
        assert!(matches!(
            JrdsDataAdapter::from_url("not a url", chrono_tz::UTC, JrdsTreeFilter::HostsTab, Arc::new(ReqwestTransport::new().unwrap())),
            Err(AdapterError::Url { .. })
        ));
    }

    #[test]
    fn from_config_validates_settings() {
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new().unwrap());
        let cfg = AdapterConfig {
            zone: "Mars/Olympus".into(),
            ..AdapterConfig::default().with_url("http://h/jrds")
        };
        assert!(matches!(
            JrdsDataAdapter::from_config(&cfg, transport.clone()),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "zone"
        ));

        let cfg = AdapterConfig {
            encoding: "latin1".into(),
            tree_filter: Some("tagstab".into()),
            ..AdapterConfig::default().with_url("http://h/jrds")
        };
        let a = JrdsDataAdapter::from_config(&cfg, transport).unwrap();
        assert_eq!(a.encoding(), encoding_rs::WINDOWS_1252);
        assert_eq!(a.tree_filter(), &JrdsTreeFilter::TagsTab);
        assert_eq!(a.default_filter().command(), "tagstab");
        assert_eq!(a.port(), 80);
    }

    #[test]
    fn bindings_hold_weak_references() {
        let a = adapter("http://h:8080/jrds");
        let b = a.binding("cpu", "42");
        assert!(b.adapter().is_some());
        drop(a);
        assert!(b.adapter().is_none());
    }
}
