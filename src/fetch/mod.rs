//! HTTP boundary for remote visibility logs.
//!
//! The client sits behind a trait so record sources can be exercised
//! against a mock transport. Any host-level timeout belongs here, on the
//! request; the engine treats the read as one atomic step.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::Result;

/// Performs a GET against `url` and returns the response body.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?;
    Ok(resp.bytes().await?.to_vec())
}
