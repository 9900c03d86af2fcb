//! Error types for the Delta engine.
//!
//! Errors come in two tiers. [`RequestError`] rejects a whole batch before any
//! method runs. [`Error`] is the failure of a single method call and is
//! reported inline in the batch response as a [`MethodError`].

use crate::{AccountId, ModSeq};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All possible errors from a single engine operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Argument errors
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("record at position {0} has no id")]
    IdRequired(usize),

    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    // State errors
    #[error("cannot calculate changes from state {since} (valid range {lowest}..={highest})")]
    CannotCalculateChanges {
        since: ModSeq,
        lowest: ModSeq,
        highest: ModSeq,
    },

    #[error("state mismatch: expected {expected}, current {actual}")]
    StateMismatch { expected: String, actual: String },

    // Limits
    #[error("request too large: {requested} objects, limit is {max}")]
    RequestTooLarge { requested: usize, max: usize },

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// The error type reported to clients for this failure.
    pub fn error_type(&self) -> ErrorType {
        match self {
            Error::InvalidArguments(_) | Error::IdRequired(_) => ErrorType::InvalidArguments,
            Error::UnknownMethod(_) => ErrorType::UnknownMethod,
            Error::AccountNotFound(_) => ErrorType::AccountNotFound,
            Error::CannotCalculateChanges { .. } => ErrorType::CannotCalculateChanges,
            Error::StateMismatch { .. } => ErrorType::StateMismatch,
            Error::RequestTooLarge { .. } => ErrorType::RequestTooLarge,
            Error::Internal(_) => ErrorType::ServerFail,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Internal(err.to_string())
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Method-level error types, as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorType {
    InvalidArguments,
    UnknownMethod,
    AccountNotFound,
    CannotCalculateChanges,
    StateMismatch,
    RequestTooLarge,
    ServerFail,
}

/// Payload of an `error` entry in a batch response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodError {
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&Error> for MethodError {
    fn from(err: &Error) -> Self {
        Self {
            error_type: err.error_type(),
            description: Some(err.to_string()),
        }
    }
}

/// Per-item failure inside a `/set` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SetErrorType {
    NotFound,
    AlreadyExists,
    InvalidProperties,
}

/// A rejected create, update, or destroy within a `/set` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetError {
    #[serde(rename = "type")]
    pub error_type: SetErrorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SetError {
    pub fn not_found() -> Self {
        Self {
            error_type: SetErrorType::NotFound,
            description: None,
        }
    }

    pub fn already_exists(id: &str) -> Self {
        Self {
            error_type: SetErrorType::AlreadyExists,
            description: Some(format!("record {id} already exists")),
        }
    }

    pub fn invalid_properties(description: impl Into<String>) -> Self {
        Self {
            error_type: SetErrorType::InvalidProperties,
            description: Some(description.into()),
        }
    }
}

/// Request-level error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestErrorType {
    /// The body was not valid JSON.
    #[serde(rename = "notJSON")]
    NotJson,
    /// The body was JSON but not a well-formed request.
    #[serde(rename = "notRequest")]
    NotRequest,
}

/// A failure that rejects a whole batch before any method is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{detail}")]
pub struct RequestError {
    #[serde(rename = "type")]
    pub error_type: RequestErrorType,
    pub status: u16,
    pub detail: String,
}

impl RequestError {
    pub fn not_json(detail: impl Into<String>) -> Self {
        Self {
            error_type: RequestErrorType::NotJson,
            status: 400,
            detail: detail.into(),
        }
    }

    pub fn not_request(detail: impl Into<String>) -> Self {
        Self {
            error_type: RequestErrorType::NotRequest,
            status: 400,
            detail: detail.into(),
        }
    }
}
