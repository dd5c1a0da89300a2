/// Open Library catalog provider
///
/// Expands a consumed book into related works. The seed's work record is fetched
/// first, then the expansion strategies run in order until one yields results:
/// 1. Subject: /subjects/{first subject}.json
/// 2. Author: /authors/{primary author}/works.json
///
/// Users without a productive book seed get works from a default subject instead.
use reqwest::Client as HttpClient;

use crate::{
    config::PipelineSettings,
    error::{AppError, AppResult},
    models::{
        ConsumedRecord, MediaFamily, MediaId, OpenLibraryAuthor, OpenLibraryAuthorWorks,
        OpenLibrarySearch, OpenLibrarySubject, OpenLibraryWork, Recommendation,
    },
    services::providers::{fetch_json, CatalogProvider},
};

const PROVIDER: &str = "open_library";

/// Ways of deriving related works from a seed's work record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExpansionStrategy {
    Subject,
    Author,
}

const STRATEGIES: [ExpansionStrategy; 2] = [ExpansionStrategy::Subject, ExpansionStrategy::Author];

#[derive(Clone)]
pub struct OpenLibraryProvider {
    http_client: HttpClient,
    api_url: String,
    settings: PipelineSettings,
}

impl OpenLibraryProvider {
    pub fn new(http_client: HttpClient, api_url: String, settings: PipelineSettings) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            settings,
        }
    }

    async fn fetch_work(&self, work_key: &str) -> AppResult<OpenLibraryWork> {
        let url = format!("{}{}.json", self.api_url, work_key);
        fetch_json(PROVIDER, self.http_client.get(&url)).await
    }

    /// First `results_per_seed` works filed under a subject
    pub async fn works_in_subject(&self, subject: &str) -> AppResult<Vec<Recommendation>> {
        let slug = subject_slug(subject);
        if slug.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/subjects/{}.json", self.api_url, slug);
        let limit = self.settings.subject_fetch_limit.to_string();
        let listing: OpenLibrarySubject =
            fetch_json(PROVIDER, self.http_client.get(&url).query(&[("limit", limit)])).await?;

        let recommendations: Vec<Recommendation> = listing
            .works
            .into_iter()
            .filter_map(|work| {
                let id = MediaId::work(&work.key).ok()?;
                let title = work.title?;
                let author = work.authors.into_iter().find_map(|a| a.name);
                Some(Recommendation::new(
                    id.to_string(),
                    title,
                    author,
                    MediaFamily::Book,
                ))
            })
            .take(self.settings.results_per_seed)
            .collect();

        tracing::debug!(
            subject = %slug,
            results = recommendations.len(),
            provider = PROVIDER,
            "Subject works fetched"
        );

        Ok(recommendations)
    }

    /// First `results_per_seed` works by an author
    ///
    /// Subtitles carry the queried author's display name, or the seed's subtitle
    /// when the author record has no name.
    async fn works_by_author(
        &self,
        author_key: &str,
        seed: &ConsumedRecord,
    ) -> AppResult<Vec<Recommendation>> {
        let url = format!("{}{}/works.json", self.api_url, author_key);
        let limit = self.settings.subject_fetch_limit.to_string();
        let listing: OpenLibraryAuthorWorks =
            fetch_json(PROVIDER, self.http_client.get(&url).query(&[("limit", limit)])).await?;

        if listing.entries.is_empty() {
            return Ok(Vec::new());
        }

        let author_name = match self.author_name(author_key).await {
            Ok(Some(name)) => Some(name),
            Ok(None) => seed.subtitle.clone(),
            Err(e) => {
                tracing::debug!(error = %e, author = %author_key, "Author lookup failed");
                seed.subtitle.clone()
            }
        };

        Ok(listing
            .entries
            .into_iter()
            .filter_map(|entry| {
                let id = MediaId::work(&entry.key).ok()?;
                let title = entry.title?;
                Some(Recommendation::new(
                    id.to_string(),
                    title,
                    author_name.clone(),
                    MediaFamily::Book,
                ))
            })
            .take(self.settings.results_per_seed)
            .collect())
    }

    async fn author_name(&self, author_key: &str) -> AppResult<Option<String>> {
        let url = format!("{}{}.json", self.api_url, author_key);
        let author: OpenLibraryAuthor = fetch_json(PROVIDER, self.http_client.get(&url)).await?;
        Ok(author.name.filter(|n| !n.trim().is_empty()))
    }

    async fn run_strategy(
        &self,
        strategy: ExpansionStrategy,
        seed: &ConsumedRecord,
        work: &OpenLibraryWork,
    ) -> AppResult<Vec<Recommendation>> {
        match strategy {
            ExpansionStrategy::Subject => match work.subjects.first() {
                Some(subject) => self.works_in_subject(subject).await,
                None => Ok(Vec::new()),
            },
            ExpansionStrategy::Author => match work.primary_author_key() {
                Some(author_key) => self.works_by_author(author_key, seed).await,
                None => Ok(Vec::new()),
            },
        }
    }
}

/// Open Library subject slug: lowercase words joined by underscores
fn subject_slug(subject: &str) -> String {
    subject
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

#[async_trait::async_trait]
impl CatalogProvider for OpenLibraryProvider {
    async fn expand_seed(&self, seed: &ConsumedRecord) -> Vec<Recommendation> {
        let work_key = match seed.parsed_id() {
            Ok(MediaId::Work(key)) => key,
            Ok(_) | Err(_) => {
                tracing::warn!(seed = %seed.media_id, provider = PROVIDER, "Skipping malformed book seed");
                return Vec::new();
            }
        };

        let work = match self.fetch_work(&work_key).await {
            Ok(work) => work,
            Err(e) => {
                tracing::warn!(error = %e, seed = %work_key, provider = PROVIDER, "Work lookup failed");
                return Vec::new();
            }
        };

        for strategy in STRATEGIES {
            match self.run_strategy(strategy, seed, &work).await {
                Ok(recommendations) if !recommendations.is_empty() => {
                    tracing::info!(
                        seed = %work_key,
                        strategy = ?strategy,
                        results = recommendations.len(),
                        provider = PROVIDER,
                        "Seed expanded"
                    );
                    return recommendations;
                }
                Ok(_) => {
                    tracing::debug!(seed = %work_key, strategy = ?strategy, "Strategy produced nothing");
                }
                Err(e) => {
                    tracing::warn!(error = %e, seed = %work_key, strategy = ?strategy, "Strategy failed");
                }
            }
        }

        Vec::new()
    }

    async fn cold_start(&self) -> Vec<Recommendation> {
        match self.works_in_subject(&self.settings.fallback_subject).await {
            Ok(recommendations) => recommendations,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    subject = %self.settings.fallback_subject,
                    provider = PROVIDER,
                    "Default subject lookup failed"
                );
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

        let url = format!("{}/search.json", self.api_url);
        let limit = (self.settings.results_per_seed * 2).to_string();
        let results: OpenLibrarySearch = fetch_json(
            PROVIDER,
            self.http_client
                .get(&url)
                .query(&[("q", query), ("limit", limit.as_str())]),
        )
        .await?;

        let books: Vec<Recommendation> = results
            .docs
            .into_iter()
            .filter_map(|doc| {
                let id = MediaId::work(&doc.key).ok()?;
                let title = doc.title?;
                let author = doc.author_name.into_iter().next();
                Some(Recommendation::new(id.to_string(), title, author, MediaFamily::Book))
            })
            .collect();

        tracing::info!(query = %query, results = books.len(), provider = PROVIDER, "Title search completed");

        Ok(books)
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::build_http_client;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> OpenLibraryProvider {
        OpenLibraryProvider::new(
            reqwest::Client::new(),
            server.uri(),
            PipelineSettings::default(),
        )
    }

    fn neuromancer() -> ConsumedRecord {
        ConsumedRecord::new(
            "/works/OL82563W",
            MediaFamily::Book,
            "Neuromancer",
            Some("William Gibson".to_string()),
        )
    }

    fn subject_works(count: usize) -> serde_json::Value {
        let works: Vec<_> = (1..=count)
            .map(|i| {
                json!({
                    "key": format!("/works/OL{}W", 1000 + i),
                    "title": format!("Cyberpunk Novel {}", i),
                    "authors": [{"key": "/authors/OL1A", "name": format!("Author {}", i)}]
                })
            })
            .collect();
        json!({ "name": "cyberpunk", "works": works })
    }

    #[test]
    fn test_subject_slug() {
        assert_eq!(subject_slug("Science fiction"), "science_fiction");
        assert_eq!(subject_slug("cyberpunk"), "cyberpunk");
        assert_eq!(subject_slug("Fiction, science fiction, general"), "fiction_science_fiction_general");
        assert_eq!(subject_slug("  "), "");
    }

    #[tokio::test]
    async fn test_expand_seed_uses_first_subject() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/works/OL82563W.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "title": "Neuromancer",
                "subjects": ["cyberpunk", "Science fiction"],
                "authors": [{"author": {"key": "/authors/OL26320A"}}]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/subjects/cyberpunk.json"))
            .and(query_param("limit", "8"))
            .respond_with(ResponseTemplate::new(200).set_body_json(subject_works(8)))
            .expect(1)
            .mount(&server)
            .await;

        let recommendations = provider(&server).expand_seed(&neuromancer()).await;

        assert_eq!(recommendations.len(), 5);
        for (i, rec) in recommendations.iter().enumerate() {
            assert_eq!(rec.id, format!("/works/OL{}W", 1001 + i));
            assert_eq!(rec.media_type, MediaFamily::Book);
            assert_eq!(rec.subtitle, Some(format!("Author {}", i + 1)));
        }
    }

    #[tokio::test]
    async fn test_untitled_subject_work_is_skipped() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/works/OL82563W.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "subjects": ["cyberpunk"],
                "authors": [{"author": {"key": "/authors/OL26320A"}}]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/subjects/cyberpunk.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "works": [
                    {"key": "/works/OL1001W", "authors": [{"name": "Nobody"}]},
                    {"key": "/works/OL45804W", "title": "Snow Crash", "authors": [{"name": "Neal Stephenson"}]}
                ]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/authors/OL26320A/works.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"entries": []})))
            .expect(0)
            .mount(&server)
            .await;

        let recommendations = provider(&server).expand_seed(&neuromancer()).await;

        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].id, "/works/OL45804W");
        assert_eq!(recommendations[0].title, "Snow Crash");
    }

    #[tokio::test]
    async fn test_hung_upstream_counts_as_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/works/OL82563W.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"subjects": ["cyberpunk"]}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let provider = OpenLibraryProvider::new(
            build_http_client(Duration::from_millis(50)).unwrap(),
            server.uri(),
            PipelineSettings::default(),
        );

        assert!(provider.expand_seed(&neuromancer()).await.is_empty());
    }

    #[tokio::test]
    async fn test_expand_seed_falls_back_to_author_without_subjects() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/works/OL82563W.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "title": "Neuromancer",
                "authors": [{"author": {"key": "/authors/OL26320A"}}]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/authors/OL26320A/works.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entries": [
                    {"key": "/works/OL27258W", "title": "Count Zero"},
                    {"key": "/works/OL27259W"},
                    {"key": "/works/OL27260W", "title": "Mona Lisa Overdrive"}
                ]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/authors/OL26320A.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "W. Gibson"
            })))
            .mount(&server)
            .await;

        let recommendations = provider(&server).expand_seed(&neuromancer()).await;

        assert_eq!(recommendations.len(), 2);
        assert_eq!(recommendations[0].title, "Count Zero");
        assert_eq!(recommendations[1].title, "Mona Lisa Overdrive");
        assert!(recommendations
            .iter()
            .all(|r| r.subtitle.as_deref() == Some("W. Gibson")));
    }

    #[tokio::test]
    async fn test_author_fallback_uses_seed_subtitle_when_name_missing() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/works/OL82563W.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "subjects": ["cyberpunk"],
                "authors": [{"author": {"key": "/authors/OL26320A"}}]
            })))
            .mount(&server)
            .await;

        // Subject listing is empty, so the author strategy runs
        Mock::given(method("GET"))
            .and(path("/subjects/cyberpunk.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"works": []})))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/authors/OL26320A/works.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entries": [{"key": "/works/OL27258W", "title": "Count Zero"}]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/authors/OL26320A.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let recommendations = provider(&server).expand_seed(&neuromancer()).await;

        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].subtitle.as_deref(), Some("William Gibson"));
    }

    #[tokio::test]
    async fn test_expand_seed_returns_empty_when_upstream_fails() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/works/OL82563W.json"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let recommendations = provider(&server).expand_seed(&neuromancer()).await;
        assert!(recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_expand_seed_returns_empty_when_all_strategies_fail() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/works/OL82563W.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "subjects": ["cyberpunk"],
                "authors": [{"author": {"key": "/authors/OL26320A"}}]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/subjects/cyberpunk.json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/authors/OL26320A/works.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let recommendations = provider(&server).expand_seed(&neuromancer()).await;
        assert!(recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_seed_makes_no_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let seed = ConsumedRecord::new("book_neuromancer", MediaFamily::Book, "Neuromancer", None);
        assert!(provider(&server).expand_seed(&seed).await.is_empty());
    }

    #[tokio::test]
    async fn test_cold_start_uses_default_subject() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/subjects/science_fiction.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(subject_works(3)))
            .expect(1)
            .mount(&server)
            .await;

        let recommendations = provider(&server).cold_start().await;
        assert_eq!(recommendations.len(), 3);
    }

    #[tokio::test]
    async fn test_search_maps_docs() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search.json"))
            .and(query_param("q", "snow crash"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "docs": [
                    {"key": "/works/OL45804W", "title": "Snow Crash", "author_name": ["Neal Stephenson"]},
                    {"key": "/authors/OL1A", "title": "Not a work"}
                ]
            })))
            .mount(&server)
            .await;

        let results = provider(&server).search("snow crash").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "/works/OL45804W");
        assert_eq!(results[0].subtitle.as_deref(), Some("Neal Stephenson"));
    }

    #[tokio::test]
    async fn test_search_rejects_blank_query() {
        let server = MockServer::start().await;
        let result = provider(&server).search("   ").await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
