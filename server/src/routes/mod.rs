//! HTTP route definitions.

mod collections;
mod credentials;
mod events;
mod health;

use crate::AppState;
use axum::Router;

/// Create all application routes.
pub fn create_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(collections::routes())
        .merge(credentials::routes())
        .merge(events::routes())
}
