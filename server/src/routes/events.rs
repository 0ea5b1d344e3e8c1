//! Host webhook ingestion.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use sift_engine::MutationEvent;

use crate::auth::AdminUser;
use crate::error::{AppError, Result};
use crate::AppState;

#[derive(Serialize)]
pub struct EventAccepted {
    /// Whether a subscription picked the event up
    pub delivered: bool,
}

/// Create event routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/events", post(ingest_event))
}

/// POST /events - Hand a mutation event to the dispatcher.
///
/// Answers immediately; synchronization happens in the background.
async fn ingest_event(
    State(state): State<AppState>,
    _admin: AdminUser,
    event: std::result::Result<Json<MutationEvent>, JsonRejection>,
) -> Result<(StatusCode, Json<EventAccepted>)> {
    let Json(event) = event.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let delivered = state.hub.emit(event);
    Ok((StatusCode::ACCEPTED, Json(EventAccepted { delivered })))
}
