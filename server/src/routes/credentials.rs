//! Search engine credential routes.

use axum::{extract::State, routing::get, Json, Router};
use sift_engine::{Credentials, ResolvedCredentials};

use crate::auth::AdminUser;
use crate::error::Result;
use crate::AppState;

/// Create credential routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/credentials", get(get_credentials).post(set_credentials))
}

/// GET /credentials - Effective credentials and which fields are read-only.
async fn get_credentials(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ResolvedCredentials>> {
    Ok(Json(state.service.get_credentials().await?))
}

/// POST /credentials - Store new credentials. Read-only fields are kept.
async fn set_credentials(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(update): Json<Credentials>,
) -> Result<Json<ResolvedCredentials>> {
    Ok(Json(state.service.set_credentials(update).await?))
}
