use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::jwt::JwtKeys;
use crate::auth::repo_types::User;
use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated principal, consumed by every feature area.
///
/// The token proves identity; the record is re-fetched per request so
/// profile changes are reflected and vanished users are rejected. Every
/// failure collapses to `Unauthenticated`.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::Unauthenticated)?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(ApiError::Unauthenticated)?;

        let user_id = JwtKeys::from_ref(state).verify_session(token).map_err(|e| {
            warn!(error = %e, "session token rejected");
            ApiError::Unauthenticated
        })?;

        let user = User::find_by_id(&state.db, user_id)
            .await?
            .ok_or(ApiError::Unauthenticated)?;

        Ok(AuthUser(user))
    }
}
