//! RPC error types

use thiserror::Error;
use trellis_core::limits::ValidationError;
use trellis_store::StoreError;

/// Result type alias for RPC handlers
pub type RpcResult<T> = std::result::Result<T, RpcError>;

pub const PARSE_ERROR: i32 = -32700;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
/// The session is not in a state to serve the request yet
pub const NOT_READY: i32 = -32002;
/// The note store could not be reached or answered garbage
pub const STORE_UNAVAILABLE: i32 = -32001;
/// The note store refused the request
pub const STORE_ERROR: i32 = -32000;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Parse error: {0}")]
    Parse(serde_json::Error),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(#[from] serde_json::Error),

    #[error("Invalid value: {0}")]
    Validation(#[from] ValidationError),

    #[error("No document has been sent")]
    NoDocument,

    #[error("Graph not loaded; call graph/refresh first")]
    GraphNotLoaded,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl RpcError {
    /// JSON-RPC error code
    pub fn code(&self) -> i32 {
        match self {
            Self::Parse(_) => PARSE_ERROR,
            Self::MethodNotFound(_) => METHOD_NOT_FOUND,
            Self::InvalidParams(_) | Self::Validation(_) => INVALID_PARAMS,
            Self::NoDocument | Self::GraphNotLoaded => NOT_READY,
            Self::Store(e) if e.is_transport() => STORE_UNAVAILABLE,
            Self::Store(_) => STORE_ERROR,
        }
    }
}
