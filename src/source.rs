//! Record sources for the visibility log.
//!
//! A source supplies the raw rows (timestamp + free-text payload) as an
//! ordered sequence. The tabular resource is CSV with two fixed column
//! names, `Timestamp` and `Data_Row`; there is no schema versioning.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

use crate::fetch::{fetch_bytes, HttpClient};

/// One raw log row, exactly as the source reports it. Consumed once by the
/// extraction pass; never kept after readings are built.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Data_Row")]
    pub payload: String,
}

/// Supplies raw rows in source order. Implementations cover HTTP, local
/// files, and in-memory fixtures; a failed read surfaces as a single error
/// for the whole invocation, never a partial sequence.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_records(&self) -> Result<Vec<RawRecord>>;
}

/// CSV log published over HTTP.
pub struct CsvUrlSource<C: HttpClient> {
    client: C,
    url: String,
}

impl<C: HttpClient> CsvUrlSource<C> {
    pub fn new(client: C, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl<C: HttpClient> RecordSource for CsvUrlSource<C> {
    async fn fetch_records(&self) -> Result<Vec<RawRecord>> {
        let bytes = fetch_bytes(&self.client, &self.url)
            .await
            .with_context(|| format!("fetching visibility log from {}", self.url))?;
        parse_csv_records(&bytes)
    }
}

/// CSV log on the local filesystem.
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecordSource for CsvFileSource {
    async fn fetch_records(&self) -> Result<Vec<RawRecord>> {
        let bytes = std::fs::read(&self.path)
            .with_context(|| format!("reading visibility log {}", self.path.display()))?;
        parse_csv_records(&bytes)
    }
}

/// Fixed in-memory rows, used by tests and embedding hosts.
pub struct InMemorySource(pub Vec<RawRecord>);

#[async_trait]
impl RecordSource for InMemorySource {
    async fn fetch_records(&self) -> Result<Vec<RawRecord>> {
        Ok(self.0.clone())
    }
}

/// Decodes CSV bytes into raw records, preserving row order.
///
/// Structurally broken rows (wrong field count, bad UTF-8) are excluded the
/// same way malformed payloads are later: dropped, logged at debug, never
/// fatal. Only an unreadable resource fails the invocation.
pub fn parse_csv_records(bytes: &[u8]) -> Result<Vec<RawRecord>> {
    let mut rdr = csv::Reader::from_reader(bytes);
    let mut rows = Vec::new();

    for result in rdr.deserialize() {
        match result {
            Ok(record) => rows.push(record),
            Err(e) => debug!(error = %e, "Skipping malformed CSV row"),
        }
    }

    Ok(rows)
}
