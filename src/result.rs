//! Uniform envelope returned by every directory operation.

use serde::Serialize;
use tracing::error;

use crate::graph::error::GraphError;
use crate::graph::odata::ODataError;

pub const UNKNOWN_ERROR_CODE: &str = "Unknown";
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";
/// Rejected locally, before any call to the service.
pub const INVALID_INPUT_CODE: &str = "InvalidInput";

/// Failure reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationError {
    pub code: String,
    pub message: String,
    /// Untouched transport error the failure was built from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<GraphError>,
}

impl OperationError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }
}

/// Outcome of an operation: `success` with an optional payload, or a failure carrying an
/// [`OperationError`]. Partial outcomes carry both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,
}

impl<T> OperationResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: OperationError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }

    /// Failed outcome that still reports what was done.
    pub fn partial(data: T, error: OperationError) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Same outcome with the payload transformed.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> OperationResult<U> {
        OperationResult {
            success: self.success,
            data: self.data.map(f),
            error: self.error,
        }
    }
}

impl OperationResult<()> {
    /// Successful outcome without payload.
    pub fn done() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }
}

/// One page of a listing. `next_link` is only meaningful to the listing that returned it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

/// Paging input of listing operations. When `next_link` is set it is followed verbatim and
/// `top` is ignored, the link already carries it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOptions {
    pub top: Option<u32>,
    pub next_link: Option<String>,
}

impl ListOptions {
    pub fn top(top: u32) -> Self {
        Self {
            top: Some(top),
            next_link: None,
        }
    }

    pub fn next(next_link: impl Into<String>) -> Self {
        Self {
            top: None,
            next_link: Some(next_link.into()),
        }
    }
}

/// Converts a failed Graph call into an [`OperationError`].
///
/// Code and message are resolved independently: the `error.code`/`error.message` of a JSON error
/// body win, then whatever the error carries itself, then the generic fallback.
pub fn normalize(area: &str, operation: &str, err: GraphError) -> OperationError {
    let body = err.body().and_then(ODataError::parse);
    let (body_code, body_message) = body
        .map(|b| (b.code, b.message))
        .unwrap_or_default();

    let code = body_code
        .or_else(|| err.code())
        .unwrap_or_else(|| UNKNOWN_ERROR_CODE.to_string());
    let message = body_message
        .or_else(|| err.message())
        .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string());

    error!(area, operation, code = %code, message = %message, "directory operation failed");

    OperationError {
        code,
        message,
        details: Some(err),
    }
}

/// Wraps the outcome of a Graph backed operation into the uniform envelope.
pub(crate) fn complete<T>(
    area: &str,
    operation: &str,
    result: Result<T, GraphError>,
) -> OperationResult<T> {
    match result {
        Ok(data) => OperationResult::ok(data),
        Err(err) => OperationResult::failure(normalize(area, operation, err)),
    }
}

/// Same as [`complete`] for operations without payload.
pub(crate) fn complete_unit(
    area: &str,
    operation: &str,
    result: Result<(), GraphError>,
) -> OperationResult<()> {
    match result {
        Ok(()) => OperationResult::done(),
        Err(err) => OperationResult::failure(normalize(area, operation, err)),
    }
}
