//! Fetches the two published sheets and turns them into a `CareerDataSet`.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA};
use thiserror::Error;
use time::OffsetDateTime;
use url::Url;

use crate::graph_utils::graph::CareerDataSet;
use super::csv_table::CsvTable;
use super::normalize::{normalize_dataset, NormalizePolicy, EDGE_KEY_COLUMNS, NODE_KEY_COLUMNS};

pub const CACHE_BUST_PARAM: &str = "t";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SheetResource {
    Nodes,
    Edges,
}

impl fmt::Display for SheetResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetResource::Nodes => f.write_str("nodes"),
            SheetResource::Edges => f.write_str("edges"),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("invalid {resource} sheet url '{url}': {reason}")]
    InvalidUrl { resource: SheetResource, url: String, reason: String },
    #[error("could not build HTTP client: {0}")]
    Client(String),
    #[error("fetching {resource} sheet failed: {reason}")]
    Transport { resource: SheetResource, reason: String },
    #[error("{resource} sheet responded with HTTP {status}")]
    Status { resource: SheetResource, status: u16 },
    #[error("{resource} sheet is missing column(s): {}", .missing.join(", "))]
    MissingColumns { resource: SheetResource, missing: Vec<String> },
    #[error("nodes sheet produced no usable rows")]
    NoNodes,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetSources {
    pub nodes: Url,
    pub edges: Url,
}

impl SheetSources {
    pub fn parse(nodes: &str, edges: &str) -> Result<Self, LoadError> {
        Ok(Self {
            nodes: parse_url(SheetResource::Nodes, nodes)?,
            edges: parse_url(SheetResource::Edges, edges)?,
        })
    }

    pub fn url(&self, resource: SheetResource) -> &Url {
        match resource {
            SheetResource::Nodes => &self.nodes,
            SheetResource::Edges => &self.edges,
        }
    }
}

fn parse_url(resource: SheetResource, raw: &str) -> Result<Url, LoadError> {
    Url::parse(raw.trim()).map_err(|e| LoadError::InvalidUrl {
        resource,
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Append the cache-busting query parameter so every request sees fresh sheet data.
pub fn with_cache_bust(url: &Url, stamp_millis: i128) -> Url {
    let mut busted = url.clone();
    busted
        .query_pairs_mut()
        .append_pair(CACHE_BUST_PARAM, &stamp_millis.to_string());
    busted
}

fn now_millis() -> i128 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000
}

/// Transport seam for the loader. Implementations return the raw CSV body.
#[async_trait]
pub trait SheetFetcher: Send + Sync {
    async fn fetch_text(&self, resource: SheetResource, url: &Url) -> Result<String, LoadError>;
}

pub struct HttpSheetFetcher {
    client: reqwest::Client,
}

impl HttpSheetFetcher {
    pub fn new(timeout: Duration) -> Result<Self, LoadError> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| LoadError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SheetFetcher for HttpSheetFetcher {
    async fn fetch_text(&self, resource: SheetResource, url: &Url) -> Result<String, LoadError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| LoadError::Transport { resource, reason: e.to_string() })?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status { resource, status: status.as_u16() });
        }
        response
            .text()
            .await
            .map_err(|e| LoadError::Transport { resource, reason: e.to_string() })
    }
}

pub struct DatasetLoader<F> {
    fetcher: F,
    sources: SheetSources,
    policy: NormalizePolicy,
}

impl<F: SheetFetcher> DatasetLoader<F> {
    pub fn new(fetcher: F, sources: SheetSources, policy: NormalizePolicy) -> Self {
        Self { fetcher, sources, policy }
    }

    pub fn sources(&self) -> &SheetSources {
        &self.sources
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch both sheets concurrently and build a dataset.
    ///
    /// Either fetch failing fails the whole load; no dataset is ever
    /// assembled from one sheet alone.
    pub async fn load(&self) -> Result<CareerDataSet, LoadError> {
        let stamp = now_millis();
        let nodes_url = with_cache_bust(self.sources.url(SheetResource::Nodes), stamp);
        let edges_url = with_cache_bust(self.sources.url(SheetResource::Edges), stamp);
        debug!("fetching sheets {} and {}", nodes_url, edges_url);

        let (nodes_csv, edges_csv) = tokio::try_join!(
            self.fetcher.fetch_text(SheetResource::Nodes, &nodes_url),
            self.fetcher.fetch_text(SheetResource::Edges, &edges_url),
        )?;
        build_dataset(&nodes_csv, &edges_csv, &self.policy)
    }
}

fn require_columns(table: &CsvTable, resource: SheetResource, required: &[&str]) -> Result<(), LoadError> {
    let missing = table.missing_columns(required);
    if missing.is_empty() {
        return Ok(());
    }
    Err(LoadError::MissingColumns {
        resource,
        missing: missing.into_iter().map(str::to_string).collect(),
    })
}

/// Parse and normalize both sheet bodies.
pub fn build_dataset(nodes_csv: &str, edges_csv: &str, policy: &NormalizePolicy) -> Result<CareerDataSet, LoadError> {
    let node_table = CsvTable::parse(nodes_csv);
    require_columns(&node_table, SheetResource::Nodes, &NODE_KEY_COLUMNS)?;
    let edge_table = CsvTable::parse(edges_csv);
    require_columns(&edge_table, SheetResource::Edges, &EDGE_KEY_COLUMNS)?;

    let (dataset, report) = normalize_dataset(&node_table.records, &edge_table.records, policy);
    for id in &report.duplicate_ids {
        warn!("duplicate node id '{}' in nodes sheet, keeping the first row", id);
    }
    if dataset.is_empty() {
        return Err(LoadError::NoNodes);
    }
    Ok(dataset)
}
