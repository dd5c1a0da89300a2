use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod media;

pub use media::{MediaFamily, MediaId};

/// One item a user has finished reading or watching
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsumedRecord {
    /// Work key for books, `<family>_<id>` for screen media
    pub media_id: String,
    pub media_family: MediaFamily,
    pub title: String,
    /// Author for books, release year for screen media
    pub subtitle: Option<String>,
    pub consumed_at: DateTime<Utc>,
}

impl ConsumedRecord {
    pub fn new(
        media_id: impl Into<String>,
        media_family: MediaFamily,
        title: impl Into<String>,
        subtitle: Option<String>,
    ) -> Self {
        Self {
            media_id: media_id.into(),
            media_family,
            title: title.into(),
            subtitle,
            consumed_at: Utc::now(),
        }
    }

    /// Parses `media_id` according to the record's family
    pub fn parsed_id(&self) -> crate::error::AppResult<MediaId> {
        MediaId::parse(self.media_family, &self.media_id)
    }

    /// The id a recommendation for this item would carry
    ///
    /// Unparseable ids are returned as stored.
    pub fn canonical_id(&self) -> String {
        self.parsed_id()
            .map(|id| id.to_string())
            .unwrap_or_else(|_| self.media_id.clone())
    }
}

/// A recommended item returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub media_type: MediaFamily,
}

impl Recommendation {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        subtitle: Option<String>,
        media_type: MediaFamily,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            subtitle,
            media_type,
        }
    }
}

// ============================================================================
// Open Library API Types
// ============================================================================

/// Response from GET /works/{id}.json
#[derive(Debug, Clone, Deserialize)]
pub struct OpenLibraryWork {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub authors: Vec<OpenLibraryWorkAuthor>,
}

impl OpenLibraryWork {
    /// Key of the first listed author, e.g. `/authors/OL26320A`
    pub fn primary_author_key(&self) -> Option<&str> {
        self.authors
            .first()
            .and_then(|a| a.author.as_ref())
            .map(|r| r.key.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenLibraryWorkAuthor {
    #[serde(default)]
    pub author: Option<OpenLibraryKeyRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenLibraryKeyRef {
    pub key: String,
}

/// Response from GET /subjects/{slug}.json
#[derive(Debug, Clone, Deserialize)]
pub struct OpenLibrarySubject {
    #[serde(default)]
    pub works: Vec<OpenLibrarySubjectWork>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenLibrarySubjectWork {
    pub key: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<OpenLibraryAuthorName>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenLibraryAuthorName {
    #[serde(default)]
    pub name: Option<String>,
}

/// Response from GET /authors/{id}/works.json
#[derive(Debug, Clone, Deserialize)]
pub struct OpenLibraryAuthorWorks {
    #[serde(default)]
    pub entries: Vec<OpenLibraryAuthorWork>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenLibraryAuthorWork {
    pub key: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Response from GET /authors/{id}.json
#[derive(Debug, Clone, Deserialize)]
pub struct OpenLibraryAuthor {
    #[serde(default)]
    pub name: Option<String>,
}

/// Response from GET /search.json
#[derive(Debug, Clone, Deserialize)]
pub struct OpenLibrarySearch {
    #[serde(default)]
    pub docs: Vec<OpenLibrarySearchDoc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenLibrarySearchDoc {
    pub key: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author_name: Vec<String>,
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Paged result list shared by /{family}/{id}/recommendations and /search/multi
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbResultPage {
    #[serde(default)]
    pub results: Vec<TmdbResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbResult {
    pub id: u64,
    /// Movies carry `title`, TV shows carry `name`
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    /// Only present on multi-search results
    #[serde(default)]
    pub media_type: Option<String>,
}

impl TmdbResult {
    pub fn display_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .filter(|t| !t.trim().is_empty())
    }

    /// Four-digit year, preferring the movie release date over first air date
    pub fn year(&self) -> Option<String> {
        let date = self
            .release_date
            .as_deref()
            .filter(|d| !d.is_empty())
            .or(self.first_air_date.as_deref())?;

        date.get(..4).map(str::to_string)
    }

    /// Maps the result into a recommendation within the given family
    pub fn into_recommendation(self, family: MediaFamily) -> Option<Recommendation> {
        let title = self.display_title()?.to_string();
        let year = self.year();
        let id = MediaId::screen(family, self.id);

        Some(Recommendation::new(id.to_string(), title, year, family))
    }
}
