//! HTTP plumbing used by the census API source.
//!
//! [`HttpClient`] is the seam: the census client is generic over it so that
//! auth wrappers such as [`auth::UrlParam`] can be layered on a
//! [`BasicClient`].

mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result, bail};
use tracing::debug;

/// Issues a GET for `url` and returns the response body.
///
/// Non-success statuses are turned into errors carrying the status and body,
/// so callers never parse an error page as data.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(
        reqwest::Method::GET,
        url.parse().with_context(|| format!("invalid url '{url}'"))?,
    );

    let resp = client
        .execute(req)
        .await
        .with_context(|| format!("request to '{url}' failed"))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("GET {} returned status {}: {}", url, status, body);
    }

    let bytes = resp.bytes().await?.to_vec();
    debug!(url, bytes = bytes.len(), "Response body received");
    Ok(bytes)
}
