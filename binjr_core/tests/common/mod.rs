#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use binjr_core::adapters::{
    jrds::{JrdsDataAdapter, JrdsTreeFilter},
    transport::{HttpResponse, HttpTransport, ResponseBody, TransportError},
};
use bytes::Bytes;
use reqwest::Url;

pub const BASE_URL: &str = "http://jrds.test:8080/jrds";

#[derive(Clone)]
enum Route {
    Respond(u16, Vec<u8>),
    Fail(String),
    Truncate(Vec<u8>, String),
}

/// Yields its first chunk, then fails as a dropped connection would.
struct TruncatedBody {
    first: Option<Bytes>,
    error: String,
}

#[async_trait]
impl ResponseBody for TruncatedBody {
    async fn chunk(&mut self) -> Result<Option<Bytes>, TransportError> {
        match self.first.take() {
            Some(chunk) => Ok(Some(chunk)),
            None => Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                self.error.clone(),
            ))),
        }
    }
}

/// In-memory transport answering by URL path; unknown paths get a 404.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<Url>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn route(&self, path: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), Route::Respond(status, body.into()));
    }

    pub fn fail(&self, path: &str, message: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), Route::Fail(message.to_string()));
    }

    /// Like [`FakeTransport::route`], restricted to requests carrying `id=<id>`.
    pub fn route_id(&self, path: &str, id: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.routes
            .lock()
            .unwrap()
            .insert(format!("{path}?id={id}"), Route::Respond(status, body.into()));
    }

    /// Answers 200 with `first` as the only chunk, then fails reading the body.
    pub fn truncate(&self, path: &str, first: impl Into<Vec<u8>>, message: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), Route::Truncate(first.into(), message.to_string()));
    }

    pub fn calls(&self) -> Vec<Url> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls().iter().filter(|u| u.path() == path).count()
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "",
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        self.calls.lock().unwrap().push(url.clone());
        let id = url.query_pairs().find(|(k, _)| k == "id").map(|(_, v)| v.into_owned());
        let route = {
            let routes = self.routes.lock().unwrap();
            id.and_then(|id| routes.get(&format!("{}?id={id}", url.path())).cloned())
                .or_else(|| routes.get(url.path()).cloned())
        };
        match route {
            Some(Route::Respond(status, body)) => Ok(HttpResponse::buffered(status, reason(status), body)),
            Some(Route::Fail(message)) => Err(TransportError::Other(message)),
            Some(Route::Truncate(first, error)) => Ok(HttpResponse {
                status: 200,
                reason: reason(200).to_string(),
                body: Box::new(TruncatedBody {
                    first: Some(first.into()),
                    error,
                }),
            }),
            None => Ok(HttpResponse::buffered(404, reason(404), Vec::new())),
        }
    }
}

pub fn jrds(transport: &Arc<FakeTransport>) -> Arc<JrdsDataAdapter> {
    JrdsDataAdapter::from_url(BASE_URL, chrono_tz::UTC, JrdsTreeFilter::HostsTab, transport.clone()).unwrap()
}

pub const CATALOGUE: &str = r#"{
    "identifier": "id",
    "label": "name",
    "items": [
        {"id": "tree.hosts", "name": "Hosts", "type": "tree",
         "children": [{"_reference": "node.web01"}]},
        {"id": "node.web01", "name": "web01", "type": "node",
         "children": [{"_reference": "filter.42"}, {"_reference": "filter.43"}]},
        {"id": "filter.42", "name": "eth0", "type": "graph"},
        {"id": "filter.43", "name": "cpu", "type": "graph"}
    ]
}"#;

pub const GRAPHDESC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<graphdesc>
  <name>ifx</name>
  <verticalLabel>bit/s</verticalLabel>
  <add><name>ifInOctets</name><graphType>none</graphType></add>
  <add><name>in</name><graphType>area</graphType><color>#00ff00</color><legend>Bits received</legend></add>
  <add><name>out</name><graphType>line</graphType></add>
</graphdesc>"#;
