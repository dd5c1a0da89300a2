/// Catalog provider abstraction
///
/// Each media family is backed by one external metadata service (Open Library for
/// books, TMDB for movies and TV). A provider turns a previously consumed item into
/// similar items from its service.
use std::time::Duration;

use reqwest::{header::CONTENT_TYPE, Client as HttpClient, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::{
    error::{AppError, AppResult},
    models::{ConsumedRecord, Recommendation},
};

pub mod open_library;
pub mod tmdb;

pub use open_library::OpenLibraryProvider;
pub use tmdb::TmdbProvider;

/// Trait for catalog providers
///
/// `expand_seed` and `cold_start` never fail: every upstream or parse error is
/// logged and reported as an empty list, which callers treat as "try the next
/// fallback". `search` does surface errors so the search endpoint can report them.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Similar items for one consumed item
    async fn expand_seed(&self, seed: &ConsumedRecord) -> Vec<Recommendation>;

    /// Items for a user with no productive seed in this provider's families
    async fn cold_start(&self) -> Vec<Recommendation> {
        Vec::new()
    }

    /// Free-text title search
    async fn search(&self, query: &str) -> AppResult<Vec<Recommendation>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Builds the HTTP client shared by all providers
///
/// The timeout bounds every upstream call; a hung request counts as a failure.
pub fn build_http_client(timeout: Duration) -> AppResult<HttpClient> {
    HttpClient::builder()
        .timeout(timeout)
        .user_agent(concat!("nextpick-api/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(AppError::from)
}

/// Sends a request and decodes its JSON body
///
/// Non-success statuses and non-JSON content types become `ExternalApi` errors.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    provider: &'static str,
    request: RequestBuilder,
) -> AppResult<T> {
    let response = request.send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::ExternalApi(format!(
            "{} returned status {}: {}",
            provider, status, body
        )));
    }

    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("application/json"))
        .unwrap_or(false);

    if !is_json {
        return Err(AppError::ExternalApi(format!(
            "{} returned a non-JSON response",
            provider
        )));
    }

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        tracing::debug!(provider, response = %text, "Undecodable upstream response");
        AppError::ExternalApi(format!("Failed to parse {} response: {}", provider, e))
    })
}
