use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::extractors::AuthUser;
use crate::connections::dto::{ConnectionActionRequest, ConnectionView};
use crate::connections::services;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/connections/request/:user_id", post(send_request))
        .route("/connections/respond/:request_id", put(respond))
        .route("/connections/pending", get(pending))
        .route("/connections", get(accepted))
        .route("/connections/status/:user_id", get(status_between))
}

#[instrument(skip(state, user))]
async fn send_request(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<ConnectionView>> {
    services::request(&state, user.id, user_id).await.map(Json)
}

#[instrument(skip(state, user, payload))]
async fn respond(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<ConnectionActionRequest>,
) -> ApiResult<Json<ConnectionView>> {
    services::respond(&state, request_id, user.id, payload.action)
        .await
        .map(Json)
}

#[instrument(skip(state, user))]
async fn pending(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<ConnectionView>>> {
    services::list_pending(&state, user.id).await.map(Json)
}

#[instrument(skip(state, user))]
async fn accepted(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<ConnectionView>>> {
    services::list_accepted(&state, user.id).await.map(Json)
}

#[instrument(skip(state, user))]
async fn status_between(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Option<ConnectionView>>> {
    services::status_between(&state, user.id, user_id)
        .await
        .map(Json)
}
