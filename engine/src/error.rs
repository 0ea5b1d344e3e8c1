//! Error types for the Sift engine.

use crate::CollectionName;
use thiserror::Error;

/// All possible errors raised while synchronizing collections with a search engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Search engine errors
    #[error("{message}")]
    EngineValidation {
        message: String,
        code: Option<String>,
        link: Option<String>,
    },

    #[error("search engine unreachable at {host}: {reason}")]
    EngineUnreachable { host: String, reason: String },

    // Setup errors
    #[error("configuration error: {0}")]
    Configuration(String),

    // Pipeline errors
    #[error("entries of collection '{collection}' could not be {action}: {reason}")]
    TransformAborted {
        collection: CollectionName,
        action: PipelineAction,
        reason: String,
    },

    #[error(
        "'{event}' on collection '{collection}' is not supported: bulk creates and updates do not \
         carry the ids of the affected entries, so they cannot be synchronized"
    )]
    UnsupportedBulkOperation {
        collection: CollectionName,
        event: String,
    },

    // Collaborator errors
    #[error("store error: {0}")]
    Store(String),

    #[error("host error: {0}")]
    Host(String),

    #[error("operation timed out after {0}ms")]
    Timeout(u64),
}

/// Pipeline stage that aborted a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineAction {
    Filtered,
    Transformed,
}

impl std::fmt::Display for PipelineAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineAction::Filtered => write!(f, "filtered"),
            PipelineAction::Transformed => write!(f, "transformed"),
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
