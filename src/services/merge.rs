use std::collections::{HashMap, HashSet};

use crate::models::{MediaFamily, Recommendation};

/// Maximum number of recommendations returned to a user
pub const MAX_RECOMMENDATIONS: usize = 10;

/// Ordered map keyed by recommendation id with last-write-wins values
///
/// An id keeps the position where it was first inserted; a later insert with the
/// same id replaces the stored value in place.
#[derive(Debug, Default)]
struct LastWriteWins {
    positions: HashMap<String, usize>,
    entries: Vec<Recommendation>,
}

impl LastWriteWins {
    fn insert(&mut self, recommendation: Recommendation) {
        match self.positions.get(&recommendation.id) {
            Some(&position) => self.entries[position] = recommendation,
            None => {
                self.positions
                    .insert(recommendation.id.clone(), self.entries.len());
                self.entries.push(recommendation);
            }
        }
    }

    fn into_vec(self) -> Vec<Recommendation> {
        self.entries
    }
}

/// Turns the raw candidate pool into the list shown to the user
///
/// 1. Drops candidates the user already consumed.
/// 2. Deduplicates by id (first-seen position, last value).
/// 3. Keeps the first `MAX_RECOMMENDATIONS`.
/// 4. Substitutes `fallback_recommendations` if nothing is left.
pub fn finalize(
    raw: impl IntoIterator<Item = Recommendation>,
    consumed_ids: &HashSet<String>,
) -> Vec<Recommendation> {
    let mut deduped = LastWriteWins::default();

    for recommendation in raw {
        if !consumed_ids.contains(&recommendation.id) {
            deduped.insert(recommendation);
        }
    }

    let mut recommendations = deduped.into_vec();
    recommendations.truncate(MAX_RECOMMENDATIONS);

    if recommendations.is_empty() {
        return fallback_recommendations();
    }

    recommendations
}

/// Static list served when no candidate survives filtering
pub fn fallback_recommendations() -> Vec<Recommendation> {
    vec![
        Recommendation::new(
            "/works/OL82563W",
            "Neuromancer",
            Some("William Gibson".to_string()),
            MediaFamily::Book,
        ),
        Recommendation::new("movie_268", "Blade Runner", Some("1982".to_string()), MediaFamily::Movie),
        Recommendation::new("tv_1396", "Breaking Bad", Some("2008".to_string()), MediaFamily::Tv),
        Recommendation::new(
            "/works/OL45804W",
            "Snow Crash",
            Some("Neal Stephenson".to_string()),
            MediaFamily::Book,
        ),
        Recommendation::new("movie_27205", "Inception", Some("2010".to_string()), MediaFamily::Movie),
    ]
}
