//! HTTP route definitions.

mod health;
mod titles;
mod uploads;
mod ws;

use crate::AppState;
use axum::Router;

/// Create all application routes.
pub fn create_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(titles::routes())
        .merge(uploads::routes())
        .merge(ws::routes())
}
