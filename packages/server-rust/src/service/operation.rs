//! Error taxonomy of the admin layer and its HTTP mapping.
//!
//! `MetaError` is what the metadata service reports; `AdminError` is
//! everything a request can fail with at this layer. Each `AdminError`
//! maps to exactly one status code and one stable error code.

use http::{Method, StatusCode};
use meta_admin_core::{AppStatus, CommandError};

/// Stable machine-readable error codes carried in every response body.
pub mod error_codes {
    pub const OK: &str = "ERR_OK";
    pub const HANDLER_NOT_FOUND: &str = "ERR_HANDLER_NOT_FOUND";
    pub const INVALID_PARAMETERS: &str = "ERR_INVALID_PARAMETERS";
    pub const FORWARD_TO_OTHERS: &str = "ERR_FORWARD_TO_OTHERS";
    pub const SERVICE_NOT_ACTIVE: &str = "ERR_SERVICE_NOT_ACTIVE";
    pub const APP_NOT_EXIST: &str = "ERR_APP_NOT_EXIST";
    pub const APP_DROPPED: &str = "ERR_APP_DROPPED";
    pub const OBJECT_NOT_FOUND: &str = "ERR_OBJECT_NOT_FOUND";
    pub const BUSY: &str = "ERR_BUSY";
    pub const INVALID_STATE: &str = "ERR_INVALID_STATE";
    pub const OPERATION_DISABLED: &str = "ERR_OPERATION_DISABLED";
    pub const INACTIVE_STATE: &str = "ERR_INACTIVE_STATE";
    pub const INTERNAL: &str = "ERR_INTERNAL";
}

/// Failures reported by the metadata service.
#[derive(Debug, thiserror::Error)]
pub enum MetaError {
    #[error("app {0} does not exist")]
    AppNotFound(String),
    #[error("app {app_name} is not available, current status is {status}")]
    AppUnavailable { app_name: String, status: AppStatus },
    #[error("backup policy {0} does not exist")]
    PolicyNotFound(String),
    #[error("app {0} is already executing bulk load")]
    BulkLoadAlreadyRunning(String),
    #[error("app {0} is not executing bulk load")]
    NoActiveBulkLoad(String),
    #[error("{0} is disabled on this cluster")]
    OperationDisabled(&'static str),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("this meta server stopped being primary during the operation")]
    LeadershipLost,
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Everything a single admin request can fail with.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("no operation registered for {path}")]
    NotFound { path: String },
    #[error("{path} expects {expected}, got {method}")]
    MethodNotAllowed {
        path: String,
        method: Method,
        expected: Method,
    },
    #[error("{0}")]
    InvalidQuery(String),
    #[error(transparent)]
    InvalidCommand(#[from] CommandError),
    #[error("not primary and no primary meta server is known")]
    LeaderUnknown,
    #[error(transparent)]
    Meta(#[from] MetaError),
}

impl AdminError {
    /// HTTP status this error is rendered with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidQuery(_) | Self::InvalidCommand(_) => StatusCode::BAD_REQUEST,
            Self::LeaderUnknown => StatusCode::SERVICE_UNAVAILABLE,
            Self::Meta(err) => match err {
                MetaError::AppNotFound(_)
                | MetaError::PolicyNotFound(_)
                | MetaError::NoActiveBulkLoad(_) => StatusCode::NOT_FOUND,
                MetaError::AppUnavailable { .. } | MetaError::BulkLoadAlreadyRunning(_) => {
                    StatusCode::CONFLICT
                }
                MetaError::OperationDisabled(_) | MetaError::InvalidParameter(_) => {
                    StatusCode::BAD_REQUEST
                }
                MetaError::LeadershipLost | MetaError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// Stable error code this error is rendered with.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => error_codes::HANDLER_NOT_FOUND,
            Self::MethodNotAllowed { .. } | Self::InvalidQuery(_) | Self::InvalidCommand(_) => {
                error_codes::INVALID_PARAMETERS
            }
            Self::LeaderUnknown => error_codes::SERVICE_NOT_ACTIVE,
            Self::Meta(err) => match err {
                MetaError::AppNotFound(_) => error_codes::APP_NOT_EXIST,
                MetaError::AppUnavailable { .. } => error_codes::APP_DROPPED,
                MetaError::PolicyNotFound(_) => error_codes::OBJECT_NOT_FOUND,
                MetaError::BulkLoadAlreadyRunning(_) => error_codes::BUSY,
                MetaError::NoActiveBulkLoad(_) => error_codes::INVALID_STATE,
                MetaError::OperationDisabled(_) => error_codes::OPERATION_DISABLED,
                MetaError::InvalidParameter(_) => error_codes::INVALID_PARAMETERS,
                MetaError::LeadershipLost => error_codes::INACTIVE_STATE,
                MetaError::Internal(_) => error_codes::INTERNAL,
            },
        }
    }

    /// `true` for 5xx errors.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }
}
