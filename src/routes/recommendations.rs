use axum::{extract::State, http::StatusCode, Extension, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::{CurrentUser, RequestId},
    models::Recommendation,
    routes::AppState,
    services::recommendations,
};

/// Handler for the recommendations endpoint
///
/// Anonymous callers get `401` with an empty list rather than an error body.
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<(StatusCode, Json<Vec<Recommendation>>)> {
    let Some(user_id) = user_id else {
        tracing::info!(request_id = %request_id, "Recommendations requested without a session");
        return Ok((StatusCode::UNAUTHORIZED, Json(Vec::new())));
    };

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        "Processing recommendations request"
    );

    let recommendations =
        recommendations::get_recommendations(state.history.as_ref(), &state.generator, user_id)
            .await?;

    Ok((StatusCode::OK, Json(recommendations)))
}
