use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::auth::dto::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, PublicUser,
    RegisterRequest, ResetPasswordRequest, UpdateProfileRequest,
};
use crate::auth::extractors::AuthUser;
use crate::auth::services;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me).put(update_me))
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    services::register(&state, payload).await.map(Json)
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    services::login(&state, payload).await.map(Json)
}

/// Always answers with the same generic payload; account existence never
/// leaks through this endpoint.
#[instrument(skip(state, payload))]
async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    services::request_password_reset(&state, &payload.email).await?;
    Ok(Json(MessageResponse {
        message: "If an account exists for this email, a reset link has been sent",
    }))
}

#[instrument(skip(state, payload))]
async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    services::confirm_password_reset(&state, &payload.token, &payload.new_password).await?;
    Ok(Json(MessageResponse {
        message: "Password has been reset",
    }))
}

#[instrument(skip(user))]
async fn get_me(AuthUser(user): AuthUser) -> ApiResult<Json<PublicUser>> {
    Ok(Json(user.into()))
}

#[instrument(skip(state, user, payload))]
async fn update_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<Json<PublicUser>> {
    services::update_profile(&state, user.id, payload)
        .await
        .map(Json)
}
