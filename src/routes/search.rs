use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{error::AppResult, models::Recommendation, routes::AppState, services::title_search};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

/// Handler for title search across both catalogs
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<Recommendation>>> {
    let titles = title_search::search_titles(
        state.generator.book_provider().as_ref(),
        state.generator.screen_provider().as_ref(),
        &params.q,
    )
    .await?;
    Ok(Json(titles))
}
