//! HTTP routes, one file per area.

use axum::Router;

pub mod matching;
pub mod ranking;
pub mod system;

/// All protected routes.
pub fn router() -> Router {
    Router::new().merge(matching::router()).merge(ranking::router())
}
