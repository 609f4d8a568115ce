use crate::authenticator::{Authenticator, GrantType, TokenRetrievalRequest};
use crate::config::ClientSecret;
use crate::token::Token;
use crate::{ClientID, TokenRetriever, TokenRetrieverError};

use chrono::TimeDelta;
use std::fmt;
use std::sync::Mutex;
use tracing::debug;

/// Tokens this close to their expiration are refreshed before being handed out.
pub const DEFAULT_REFRESH_MARGIN: TimeDelta = TimeDelta::minutes(5);

/// Client credentials token retriever that keeps the last token until it is about to expire.
///
/// Refresh is attempted once per call: a failure is returned to the caller that needed the
/// token and the next call tries again.
pub struct TokenRetrieverWithCache<A>
where
    A: Authenticator,
{
    client_id: ClientID,
    secret: ClientSecret,
    scope: String,
    tokens: Mutex<Option<Token>>,
    authenticator: A,
    refresh_margin: TimeDelta,
}

impl<A> fmt::Debug for TokenRetrieverWithCache<A>
where
    A: Authenticator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRetrieverWithCache")
            .field("client_id", &self.client_id)
            .field("scope", &self.scope)
            .field("refresh_margin", &self.refresh_margin)
            .finish_non_exhaustive()
    }
}

impl<A> TokenRetriever for TokenRetrieverWithCache<A>
where
    A: Authenticator,
{
    fn retrieve(&self) -> Result<Token, TokenRetrieverError> {
        let mut cached_token = self
            .tokens
            .lock()
            .map_err(|_| TokenRetrieverError::PoisonError)?;

        if let Some(token) = cached_token.as_ref() {
            if !token.expires_within(self.refresh_margin) {
                return Ok(token.to_owned());
            }
        }

        let token = self.refresh_token().inspect_err(|e| {
            debug!("error refreshing token: {e}");
        })?;
        debug!(expires_at = %token.expires_at(), "access token refreshed");
        *cached_token = Some(token.clone());

        Ok(token)
    }
}

impl<A> TokenRetrieverWithCache<A>
where
    A: Authenticator,
{
    pub fn new(client_id: ClientID, secret: ClientSecret, scope: String, authenticator: A) -> Self {
        Self {
            client_id,
            secret,
            scope,
            tokens: Mutex::new(None),
            authenticator,
            refresh_margin: DEFAULT_REFRESH_MARGIN,
        }
    }

    pub fn with_refresh_margin(self, refresh_margin: TimeDelta) -> Self {
        Self {
            refresh_margin,
            ..self
        }
    }

    fn refresh_token(&self) -> Result<Token, TokenRetrieverError> {
        let request = TokenRetrievalRequest {
            client_id: self.client_id.to_owned(),
            grant_type: GrantType::ClientCredentials,
            client_secret: self.secret.to_owned(),
            scope: self.scope.to_owned(),
        };

        let response = self.authenticator.authenticate(request)?;

        Token::try_from(response)
    }
}
