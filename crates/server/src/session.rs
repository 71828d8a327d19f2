use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use server_api::{auth::AdminSession, authorize_admin};
use shared::error::ApiError;

use crate::app_state::AppState;

pub(crate) const SESSION_COOKIE: &str = "garden_admin";

/// Admin session carried by the request's cookie. Rejects with 401 when the
/// cookie is absent, forged or expired.
pub(crate) struct RequireAdmin(pub(crate) AdminSession);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = (StatusCode, Json<ApiError>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        authorize_admin(&state.api, session_token(&parts.headers))
            .map(RequireAdmin)
            .map_err(|e| (StatusCode::UNAUTHORIZED, Json(e)))
    }
}

pub(crate) fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

pub(crate) fn session_cookie(token: &str, max_age_seconds: i64) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_seconds}"
    ))
    .ok()
}

pub(crate) fn cleared_session_cookie() -> HeaderValue {
    HeaderValue::from_static("garden_admin=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
