//! Error types for the block cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::block::Cid;

// == Blockstore Error Enum ==
/// Unified error type for the backing store and every cache layer above it.
///
/// Cache layers only ever produce `NotFound` on their own; everything else
/// they return comes verbatim from the layer below.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockstoreError {
    /// Block does not exist
    #[error("block not found: {0}")]
    NotFound(Cid),

    /// A cache was constructed with invalid sizing parameters
    #[error("invalid cache configuration: {0}")]
    InvalidConfig(String),

    /// Failure reported by the backing store
    #[error("backend error: {0}")]
    Backend(String),

    /// The bloom filter was not ready before the caller's deadline
    #[error("bloom filter not ready before deadline ({added} elements added)")]
    DeadlineExceeded { added: u64 },

    /// Identifier could not be parsed
    #[error("invalid cid: {0}")]
    InvalidCid(String),

    /// Malformed HTTP request body
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl BlockstoreError {
    /// Returns true for the canonical "block does not exist" signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlockstoreError::NotFound(_))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for BlockstoreError {
    fn into_response(self) -> Response {
        let status = match &self {
            BlockstoreError::NotFound(_) => StatusCode::NOT_FOUND,
            BlockstoreError::InvalidCid(_) | BlockstoreError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            BlockstoreError::DeadlineExceeded { .. } => StatusCode::SERVICE_UNAVAILABLE,
            BlockstoreError::InvalidConfig(_) | BlockstoreError::Backend(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for block store operations.
pub type Result<T> = std::result::Result<T, BlockstoreError>;
