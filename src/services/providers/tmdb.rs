/// TMDB catalog provider
///
/// Covers movies and TV. Seeds are expanded through the per-title
/// recommendations endpoint (/{movie|tv}/{id}/recommendations); there is no
/// cold-start listing for screen media.
use reqwest::Client as HttpClient;

use crate::{
    config::PipelineSettings,
    error::{AppError, AppResult},
    models::{ConsumedRecord, MediaFamily, MediaId, Recommendation, TmdbResultPage},
    services::providers::{fetch_json, CatalogProvider},
};

const PROVIDER: &str = "tmdb";

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    settings: PipelineSettings,
}

impl TmdbProvider {
    pub fn new(
        http_client: HttpClient,
        api_key: String,
        api_url: String,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            settings,
        }
    }

    async fn recommendations_for(
        &self,
        family: MediaFamily,
        external_id: u64,
    ) -> AppResult<Vec<Recommendation>> {
        let url = format!("{}/{}/{}/recommendations", self.api_url, family, external_id);
        let page: TmdbResultPage = fetch_json(
            PROVIDER,
            self.http_client
                .get(&url)
                .query(&[("api_key", self.api_key.as_str())]),
        )
        .await?;

        Ok(page
            .results
            .into_iter()
            .filter_map(|result| result.into_recommendation(family))
            .take(self.settings.results_per_seed)
            .collect())
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbProvider {
    async fn expand_seed(&self, seed: &ConsumedRecord) -> Vec<Recommendation> {
        let (family, external_id) = match seed.parsed_id() {
            Ok(MediaId::Screen {
                family,
                external_id,
            }) => (family, external_id),
            Ok(_) | Err(_) => {
                tracing::warn!(seed = %seed.media_id, provider = PROVIDER, "Skipping malformed screen seed");
                return Vec::new();
            }
        };

        match self.recommendations_for(family, external_id).await {
            Ok(recommendations) => {
                tracing::info!(
                    seed = %seed.media_id,
                    results = recommendations.len(),
                    provider = PROVIDER,
                    "Seed expanded"
                );
                recommendations
            }
            Err(e) => {
                tracing::warn!(error = %e, seed = %seed.media_id, provider = PROVIDER, "Recommendations lookup failed");
                Vec::new()
            }
        }
    }

    async fn search(&self, query: &str) -> AppResult<Vec<Recommendation>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let url = format!("{}/search/multi", self.api_url);
        let page: TmdbResultPage = fetch_json(
            PROVIDER,
            self.http_client
                .get(&url)
                .query(&[("api_key", self.api_key.as_str()), ("query", query)]),
        )
        .await?;

        let titles: Vec<Recommendation> = page
            .results
            .into_iter()
            .filter_map(|result| {
                let family = match result.media_type.as_deref() {
                    Some("movie") => MediaFamily::Movie,
                    Some("tv") => MediaFamily::Tv,
                    // people and collections
                    _ => return None,
                };
                result.into_recommendation(family)
            })
            .take(self.settings.results_per_seed * 2)
            .collect();

        tracing::info!(query = %query, results = titles.len(), provider = PROVIDER, "Title search completed");

        Ok(titles)
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> TmdbProvider {
        TmdbProvider::new(
            reqwest::Client::new(),
            "test_key".to_string(),
            server.uri(),
            PipelineSettings::default(),
        )
    }

    fn inception() -> ConsumedRecord {
        ConsumedRecord::new("movie_27205", MediaFamily::Movie, "Inception", Some("2010".into()))
    }

    #[tokio::test]
    async fn test_expand_seed_maps_recommendations() {
        let server = MockServer::start().await;

        let results: Vec<_> = (1..=7)
            .map(|i| json!({"id": i, "title": format!("Movie {}", i), "release_date": "2001-05-04"}))
            .collect();

        Mock::given(method("GET"))
            .and(path("/movie/27205/recommendations"))
            .and(query_param("api_key", "test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "page": 1, "results": results })))
            .expect(1)
            .mount(&server)
            .await;

        let recommendations = provider(&server).expand_seed(&inception()).await;

        assert_eq!(recommendations.len(), 5);
        assert_eq!(recommendations[0].id, "movie_1");
        assert_eq!(recommendations[0].subtitle.as_deref(), Some("2001"));
        assert!(recommendations.iter().all(|r| r.media_type == MediaFamily::Movie));
    }

    #[tokio::test]
    async fn test_expand_seed_tv_family() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/tv/1396/recommendations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"id": 60059, "name": "Better Call Saul", "first_air_date": "2015-02-08"}]
            })))
            .mount(&server)
            .await;

        let seed = ConsumedRecord::new("tv_1396", MediaFamily::Tv, "Breaking Bad", None);
        let recommendations = provider(&server).expand_seed(&seed).await;

        assert_eq!(
            recommendations,
            vec![Recommendation::new(
                "tv_60059",
                "Better Call Saul",
                Some("2015".to_string()),
                MediaFamily::Tv
            )]
        );
    }

    #[tokio::test]
    async fn test_non_ok_status_yields_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/movie/27205/recommendations"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"status_message": "Invalid API key"})))
            .mount(&server)
            .await;

        assert!(provider(&server).expand_seed(&inception()).await.is_empty());
    }

    #[tokio::test]
    async fn test_non_json_content_type_yields_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/movie/27205/recommendations"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"results": []}"#))
            .mount(&server)
            .await;

        assert!(provider(&server).expand_seed(&inception()).await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_seed_is_skipped() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(0)
            .mount(&server)
            .await;

        let seed = ConsumedRecord::new("movie-27205", MediaFamily::Movie, "Inception", None);
        assert!(provider(&server).expand_seed(&seed).await.is_empty());
    }

    #[tokio::test]
    async fn test_screen_provider_has_no_cold_start() {
        let server = MockServer::start().await;
        assert!(provider(&server).cold_start().await.is_empty());
    }

    #[tokio::test]
    async fn test_search_skips_people() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search/multi"))
            .and(query_param("query", "matrix"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"id": 603, "media_type": "movie", "title": "The Matrix", "release_date": "1999-03-30"},
                    {"id": 6384, "media_type": "person", "name": "Keanu Reeves"},
                    {"id": 100, "media_type": "tv", "name": "Matrix", "first_air_date": "1993-03-01"}
                ]
            })))
            .mount(&server)
            .await;

        let results = provider(&server).search("matrix").await.unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["movie_603", "tv_100"]);
    }
}
