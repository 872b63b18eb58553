use axum::{
    extract::{FromRef, Query, State},
    response::Redirect,
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::auth::jwt::JwtKeys;
use crate::error::{ApiError, ApiResult};
use crate::sso::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/sso/login", get(sso_login))
        .route("/auth/sso/callback", get(sso_callback))
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: String,
    state: String,
}

#[instrument(skip(state))]
async fn sso_login(State(state): State<AppState>) -> ApiResult<Redirect> {
    let client = state.sso.as_ref().ok_or(ApiError::SsoNotConfigured)?;

    let sso_state = JwtKeys::from_ref(&state).sign_sso_state()?;
    let redirect_uri = services::callback_url(&state.config.public_url);
    let url = client.authorization_url(&redirect_uri, &sso_state).await?;

    info!(%redirect_uri, "initiating SSO login");
    Ok(Redirect::temporary(&url))
}

#[instrument(skip(state, params))]
async fn sso_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> ApiResult<Redirect> {
    let url = services::complete_login(&state, &params.code, &params.state).await?;
    Ok(Redirect::temporary(&url))
}
