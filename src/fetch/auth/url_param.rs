use crate::fetch::client::HttpClient;
use async_trait::async_trait;

/// An [`HttpClient`] wrapper that appends an API key as a URL query parameter.
///
/// The Census Data API takes its key this way (`&key=...`). When no key is
/// configured the wrapper passes requests through untouched, which keeps the
/// anonymous quota usable for small refreshes.
pub struct UrlParam<C> {
    pub inner: C,
    pub param_name: String,
    pub key: Option<String>,
}

impl<C> UrlParam<C> {
    pub fn census_key(inner: C, key: Option<String>) -> Self {
        Self {
            inner,
            param_name: "key".to_string(),
            key,
        }
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for UrlParam<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        if let Some(key) = &self.key {
            req.url_mut()
                .query_pairs_mut()
                .append_pair(&self.param_name, key);
        }
        self.inner.execute(req).await
    }
}
