//! Collection administration routes.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::auth::AdminUser;
use crate::error::Result;
use crate::sync::{CollectionReport, ReloadOutcome};
use crate::AppState;

/// Create collection routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/collections", get(list_collections))
        .route(
            "/collections/{name}",
            post(add_collection)
                .put(update_collection)
                .delete(remove_collection),
        )
        .route("/reload", post(reload))
}

/// GET /collections - Every known collection with its index state.
async fn list_collections(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<CollectionReport>>> {
    Ok(Json(state.service.list_collection_reports().await?))
}

/// POST /collections/{name} - Index a collection and start listening to it.
async fn add_collection(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(name): Path<String>,
) -> Result<Json<CollectionReport>> {
    Ok(Json(state.service.add_collection(&name).await?))
}

/// PUT /collections/{name} - Reindex a listened collection.
async fn update_collection(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(name): Path<String>,
) -> Result<Json<CollectionReport>> {
    Ok(Json(state.service.update_collection(&name).await?))
}

/// DELETE /collections/{name} - Stop listening and clear the collection's documents.
async fn remove_collection(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(name): Path<String>,
) -> Result<Json<CollectionReport>> {
    Ok(Json(state.service.remove_collection(&name).await?))
}

/// POST /reload - Rebuild subscriptions from the listened set.
async fn reload(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<ReloadOutcome>> {
    Ok(Json(state.service.reload().await?))
}
