//! Unified error handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sift_engine::{Classified, ErrorBody, ErrorKind, ErrorMessage};

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A failed admin operation, already classified and logged
    #[error("{}", .0.message)]
    Sync(Classified),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,
}

impl From<Classified> for AppError {
    fn from(classified: Classified) -> Self {
        AppError::Sync(classified)
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Sync(classified) => match classified.kind {
                ErrorKind::EngineValidation
                | ErrorKind::ConfigurationError
                | ErrorKind::UnsupportedBulkOperation => StatusCode::BAD_REQUEST,
                ErrorKind::TransformAborted => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::EngineUnreachable => StatusCode::BAD_GATEWAY,
                ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Sync(classified) => classified.into_body(),
            other => ErrorBody {
                error: ErrorMessage {
                    message: other.to_string(),
                    link: None,
                },
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_error_kind() {
        let unreachable = AppError::Sync(Classified {
            kind: ErrorKind::EngineUnreachable,
            message: "down".into(),
            link: None,
        });
        assert_eq!(unreachable.status(), StatusCode::BAD_GATEWAY);

        let config = AppError::from(Classified {
            kind: ErrorKind::ConfigurationError,
            message: "unknown collection".into(),
            link: None,
        });
        assert_eq!(config.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn response_carries_structured_body() {
        let response = AppError::BadRequest("missing body".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
