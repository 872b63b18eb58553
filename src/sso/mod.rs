use axum::Router;

use crate::state::AppState;

pub mod client;
pub mod handlers;
mod services;

pub fn router() -> Router<AppState> {
    handlers::router()
}
