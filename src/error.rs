//! Tool Errors
//!
//! Error taxonomy returned across the tool boundary. Each variant maps to a
//! JSON-RPC error code and a stable `kind` string so an orchestrator can tell
//! a bad identifier apart from a broken datastore.

use thiserror::Error;

use crate::mcp::error_codes;

/// Errors surfaced by tool operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("Invalid params: {0}")]
    InvalidParams(String),
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Datastore unavailable: {0}")]
    DatastoreUnavailable(String),
    #[error("Timed out: {0}")]
    Timeout(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ToolResult<T> = std::result::Result<T, ToolError>;

impl ToolError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidParams(_) => "invalid_params",
            Self::UnknownTool(_) => "unknown_tool",
            Self::DatastoreUnavailable(_) => "datastore_unavailable",
            Self::Timeout(_) => "timeout",
            Self::Internal(_) => "internal",
        }
    }

    /// JSON-RPC error code for this error
    pub fn code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => error_codes::RESOURCE_NOT_FOUND,
            Self::InvalidParams(_) => error_codes::INVALID_PARAMS,
            Self::UnknownTool(_) => error_codes::TOOL_NOT_FOUND,
            Self::DatastoreUnavailable(_) => error_codes::DATASTORE_UNAVAILABLE,
            Self::Timeout(_) => error_codes::TIMEOUT,
            Self::Internal(_) => error_codes::INTERNAL_ERROR,
        }
    }
}

impl From<rusqlite::Error> for ToolError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match &err {
            rusqlite::Error::SqliteFailure(e, _) => match e.code {
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::OperationInterrupted => {
                    Self::Timeout(err.to_string())
                }
                ErrorCode::CannotOpen
                | ErrorCode::NotADatabase
                | ErrorCode::SystemIoFailure
                | ErrorCode::PermissionDenied
                | ErrorCode::DatabaseCorrupt
                | ErrorCode::ReadOnly => Self::DatastoreUnavailable(err.to_string()),
                _ => Self::Internal(err.to_string()),
            },
            rusqlite::Error::InvalidPath(_) => Self::DatastoreUnavailable(err.to_string()),
            _ => Self::Internal(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("Serialization error: {}", err))
    }
}

impl From<reqwest::Error> for ToolError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}
