use std::sync::Arc;

use crate::{
    config::PipelineSettings,
    models::{ConsumedRecord, MediaFamily, Recommendation},
    services::providers::CatalogProvider,
};

/// Builds the raw candidate pool from a user's consumption history
///
/// Books and screen media are expanded independently and concurrently. Within a
/// family, seeds are tried in history order and the first seed that yields any
/// candidates ends the search. The output may contain duplicates and items the
/// user already consumed; `merge::finalize` cleans it up.
#[derive(Clone)]
pub struct CandidateGenerator {
    books: Arc<dyn CatalogProvider>,
    screen: Arc<dyn CatalogProvider>,
    seeds_per_family: usize,
}

impl CandidateGenerator {
    pub fn new(
        books: Arc<dyn CatalogProvider>,
        screen: Arc<dyn CatalogProvider>,
        settings: &PipelineSettings,
    ) -> Self {
        Self {
            books,
            screen,
            seeds_per_family: settings.seeds_per_family,
        }
    }

    pub fn book_provider(&self) -> &Arc<dyn CatalogProvider> {
        &self.books
    }

    pub fn screen_provider(&self) -> &Arc<dyn CatalogProvider> {
        &self.screen
    }

    /// Book candidates followed by screen candidates
    pub async fn generate(&self, consumed: &[ConsumedRecord]) -> Vec<Recommendation> {
        let book_seeds = select_seeds(consumed, self.seeds_per_family, |f| {
            f == MediaFamily::Book
        });
        let screen_seeds = select_seeds(consumed, self.seeds_per_family, |f| f.is_screen());

        // Each family falls back independently; screen media has no cold-start
        // listing, so an empty screen result stays empty.
        let (books, screen) = tokio::join!(
            expand_family(self.books.as_ref(), &book_seeds),
            expand_family(self.screen.as_ref(), &screen_seeds),
        );

        tracing::debug!(
            book_seeds = book_seeds.len(),
            screen_seeds = screen_seeds.len(),
            book_candidates = books.len(),
            screen_candidates = screen.len(),
            "Candidate pool generated"
        );

        let mut pool = books;
        pool.extend(screen);
        pool
    }
}

/// The first `cap` records whose family matches, in history order
fn select_seeds<'a>(
    consumed: &'a [ConsumedRecord],
    cap: usize,
    family_filter: impl Fn(MediaFamily) -> bool,
) -> Vec<&'a ConsumedRecord> {
    consumed
        .iter()
        .filter(|record| family_filter(record.media_family))
        .take(cap)
        .collect()
}

/// Candidates for one family, using the provider's cold start when no seed produces
async fn expand_family(
    provider: &dyn CatalogProvider,
    seeds: &[&ConsumedRecord],
) -> Vec<Recommendation> {
    let candidates = expand_first_productive(provider, seeds).await;
    if !candidates.is_empty() {
        return candidates;
    }

    tracing::info!(provider = provider.name(), "No productive seed, using cold start");
    provider.cold_start().await
}

/// Expands seeds in order, stopping at the first one with results
async fn expand_first_productive(
    provider: &dyn CatalogProvider,
    seeds: &[&ConsumedRecord],
) -> Vec<Recommendation> {
    for seed in seeds {
        let candidates = provider.expand_seed(seed).await;
        if !candidates.is_empty() {
            return candidates;
        }
        tracing::debug!(seed = %seed.media_id, provider = provider.name(), "Seed produced no candidates");
    }
    Vec::new()
}
