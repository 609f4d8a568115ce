pub mod authenticator;
pub mod commands;
pub mod config;
pub mod environment;
pub mod graph;
pub mod groups;
pub mod http;
pub mod http_client;
pub mod mfa;
pub mod models;
pub mod parameters;
pub mod result;
pub mod sdk;
pub mod sign_in_logs;
pub mod token;
pub mod token_retriever;
pub mod users;

use crate::token::Token;
use thiserror::Error;

pub use crate::config::SdkConfig;
pub use crate::result::{OperationError, OperationResult, PagedResult};
pub use crate::sdk::DirectorySdk;

pub type ClientID = String;

#[derive(Error, Debug, Clone)]
pub enum TokenRetrieverError {
    #[error("retrieving token: `{0}`")]
    TokenRetrieverError(String),
    #[error("fetching access token: `{0}`")]
    AuthenticatorError(#[from] authenticator::AuthenticateError),
    #[error("acquiring cache mutex lock")]
    PoisonError,
}

/// The TokenRetriever is responsible for handing out a valid authorization token
pub trait TokenRetriever {
    fn retrieve(&self) -> Result<Token, TokenRetrieverError>;
}
