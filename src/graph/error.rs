use http::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::TokenRetrieverError;
use crate::http_client::HttpClientError;

/// Failure of a single Graph call.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GraphError {
    /// The access token could not be obtained.
    #[error("acquiring access token: `{message}`")]
    Token { message: String },
    /// The request never produced a response.
    #[error("transport error: `{message}`")]
    Transport { message: String },
    /// The service answered with a non-success status.
    #[error("graph responded with status `{status}`: `{body}`")]
    Api { status: u16, body: String },
    /// The request could not be built.
    #[error("encoding request: `{message}`")]
    Encode { message: String },
    /// The response body did not have the expected shape.
    #[error("decoding response: `{message}`")]
    Decode { message: String },
}

impl GraphError {
    /// Code carried by the error itself, without looking into the response body.
    pub fn code(&self) -> Option<String> {
        match self {
            GraphError::Api { status, .. } => Some(status.to_string()),
            GraphError::Token { .. } => Some("TokenAcquisitionFailed".to_string()),
            GraphError::Transport { .. }
            | GraphError::Encode { .. }
            | GraphError::Decode { .. } => None,
        }
    }

    /// Message carried by the error itself, without looking into the response body. For
    /// service errors this is the reason phrase of the status; the body stays in [`Self::body`].
    pub fn message(&self) -> Option<String> {
        match self {
            GraphError::Token { message }
            | GraphError::Transport { message }
            | GraphError::Encode { message }
            | GraphError::Decode { message } => Some(message.to_owned()),
            GraphError::Api { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .map(str::to_string),
        }
    }

    /// Response body, when the service sent one.
    pub fn body(&self) -> Option<&str> {
        match self {
            GraphError::Api { body, .. } if !body.is_empty() => Some(body),
            _ => None,
        }
    }
}

impl From<TokenRetrieverError> for GraphError {
    fn from(err: TokenRetrieverError) -> Self {
        GraphError::Token {
            message: err.to_string(),
        }
    }
}

impl From<HttpClientError> for GraphError {
    fn from(err: HttpClientError) -> Self {
        GraphError::Transport {
            message: err.to_string(),
        }
    }
}
