//! Concrete HTTP transport used by the token retriever and the Graph client.

pub mod client;
pub mod config;
