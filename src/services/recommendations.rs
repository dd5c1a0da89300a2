use std::collections::HashSet;

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::Recommendation,
    services::{generator::CandidateGenerator, history::HistoryProvider, merge},
};

/// Generates recommendations for a signed-in user
///
/// Loads the user's history, expands it into a candidate pool and finalizes the
/// pool. Upstream catalog failures never surface here; the result is never empty.
/// A history lookup failure is returned as an error rather than treating the user
/// as new, which would risk recommending consumed items.
pub async fn get_recommendations(
    history: &dyn HistoryProvider,
    generator: &CandidateGenerator,
    user_id: Uuid,
) -> AppResult<Vec<Recommendation>> {
    let consumed = history.list_consumed(user_id).await?;
    let consumed_ids: HashSet<String> = consumed.iter().map(|r| r.canonical_id()).collect();

    let pool = generator.generate(&consumed).await;
    let pool_size = pool.len();
    let recommendations = merge::finalize(pool, &consumed_ids);

    tracing::info!(
        user_id = %user_id,
        consumed = consumed.len(),
        candidates = pool_size,
        returned = recommendations.len(),
        "Recommendations generated"
    );

    Ok(recommendations)
}
