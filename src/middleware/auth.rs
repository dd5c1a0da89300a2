use std::{convert::Infallible, sync::Arc};

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
        HeaderMap,
    },
};
use uuid::Uuid;

use crate::routes::AppState;

/// Cookie holding the session token for browser clients
pub const SESSION_COOKIE: &str = "session";

/// The signed-in user, if the request carries a valid session
///
/// Never rejects: a missing, unknown or unverifiable token yields `None` and the
/// handler decides how to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Option<Uuid>);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers) else {
            return Ok(CurrentUser(None));
        };

        match state.sessions.resolve(&token).await {
            Ok(user_id) => Ok(CurrentUser(user_id)),
            Err(e) => {
                tracing::warn!(error = %e, "Session lookup failed");
                Ok(CurrentUser(None))
            }
        }
    }
}

/// Bearer token, or the session cookie when no Authorization header is sent
fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        return value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|t| !t.is_empty())
}
