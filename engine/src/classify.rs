//! Error classifier.
//!
//! Maps engine errors onto a small taxonomy with user-facing messages. Pure:
//! callers decide whether to log, surface or swallow the result.

use crate::Error;
use serde::Serialize;

/// Error category shown to administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    EngineValidation,
    EngineUnreachable,
    ConfigurationError,
    TransformAborted,
    UnsupportedBulkOperation,
    Unknown,
}

/// A classified error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classified {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Body of a failed administrative response: `{"error": {"message", "link"?}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: ErrorMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorMessage {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Classified {
    pub fn into_body(self) -> ErrorBody {
        ErrorBody {
            error: ErrorMessage {
                message: self.message,
                link: self.link,
            },
        }
    }
}

/// Classify `error`. `configured_host` is the search engine host currently in
/// effect; unreachable errors are reworded around it.
pub fn classify(error: &Error, configured_host: &str) -> Classified {
    match error {
        Error::EngineValidation { message, link, .. } => Classified {
            kind: ErrorKind::EngineValidation,
            message: message.clone(),
            link: link.clone(),
        },
        Error::EngineUnreachable { .. } => Classified {
            kind: ErrorKind::EngineUnreachable,
            message: unreachable_message(configured_host),
            link: None,
        },
        Error::Configuration(_) => Classified {
            kind: ErrorKind::ConfigurationError,
            message: error.to_string(),
            link: None,
        },
        Error::TransformAborted { .. } => Classified {
            kind: ErrorKind::TransformAborted,
            message: error.to_string(),
            link: None,
        },
        Error::UnsupportedBulkOperation { .. } => Classified {
            kind: ErrorKind::UnsupportedBulkOperation,
            message: error.to_string(),
            link: None,
        },
        Error::Store(_) | Error::Host(_) | Error::Timeout(_) => Classified {
            kind: ErrorKind::Unknown,
            message: error.to_string(),
            link: None,
        },
    }
}

fn unreachable_message(host: &str) -> String {
    if host.is_empty() {
        "The search engine could not be reached: no host is configured.".to_string()
    } else {
        format!(
            "The search engine could not be reached at \"{host}\". Check that the host is correct \
             and that the engine is running."
        )
    }
}
