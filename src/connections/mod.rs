use axum::Router;

use crate::state::AppState;

mod dto;
pub mod handlers;
mod repo;
mod services;

pub fn router() -> Router<AppState> {
    handlers::router()
}
