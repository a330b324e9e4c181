//! Outbound HTTP for providers, answered from the provider's cache when possible

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use super::http_cache::{CachedResponse, HttpCacheError, HttpCacheStore};

/// Timeout applied to every provider request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors that can occur when fetching through the caching client
#[derive(Debug, Error)]
pub enum HttpError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Cache read/write error
    #[error("HTTP cache error: {0}")]
    Cache(#[from] HttpCacheError),
}

/// Cache key for a request
pub fn fingerprint(method: &str, url: &str) -> String {
    format!("{} {}", method.to_ascii_uppercase(), url)
}

/// HTTP client bound to one provider's response cache
///
/// Successful (2xx) responses are stored; anything else is passed through
/// uncached so that it is retried next time.
#[derive(Clone)]
pub struct CachingClient {
    http_client: Client,
    store: Arc<HttpCacheStore>,
}

impl CachingClient {
    /// Creates a client that reads and writes `store`
    pub fn new(store: Arc<HttpCacheStore>) -> Result<Self, HttpError> {
        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { http_client, store })
    }

    /// The cache backing this client
    pub fn store(&self) -> &Arc<HttpCacheStore> {
        &self.store
    }

    /// Performs a GET request
    ///
    /// # Returns
    /// * `Ok(CachedResponse)` from the cache if an unexpired entry exists,
    ///   otherwise from the network
    /// * `Err(HttpError)` if the request or the cache fails
    pub async fn get(&self, url: &str) -> Result<CachedResponse, HttpError> {
        let key = fingerprint("GET", url);
        if let Some(hit) = self.store.get(&key)? {
            debug!(url, "HTTP cache hit");
            return Ok(hit);
        }

        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        let fetched = CachedResponse {
            status: status.as_u16(),
            headers,
            body,
        };
        if status.is_success() {
            self.store.set(&key, &fetched)?;
        } else {
            debug!(url, status = status.as_u16(), "not caching unsuccessful response");
        }

        Ok(fetched)
    }
}
