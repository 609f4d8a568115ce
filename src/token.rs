use std::fmt;
use std::time::Duration;

use crate::{TokenRetrieverError, authenticator::TokenRetrievalResponse};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

pub type AccessToken = String;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum TokenType {
    Bearer,
}

/// An app-only access token for the Graph API.
#[derive(Serialize, Deserialize, Clone, PartialEq)]
pub struct Token {
    expires_at: DateTime<Utc>,
    access_token: AccessToken,
    token_type: TokenType,
}

impl TryFrom<&str> for TokenType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.eq_ignore_ascii_case("bearer") {
            Ok(TokenType::Bearer)
        } else {
            Err(format!("Invalid token type: {value}"))
        }
    }
}

impl Token {
    pub fn new(
        access_token: AccessToken,
        token_type: TokenType,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Token {
            access_token,
            token_type,
            expires_at,
        }
    }

    /// True when the token is expired or will be within `margin`.
    pub fn expires_within(&self, margin: TimeDelta) -> bool {
        Utc::now() + margin >= self.expires_at
    }

    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    pub fn token_type(&self) -> &TokenType {
        &self.token_type
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Value for the `Authorization` header.
    pub fn authorization_value(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Bearer => write!(f, "Bearer"),
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("token_type", &self.token_type)
            .field("access_token", &"redacted")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl TryFrom<TokenRetrievalResponse> for Token {
    type Error = TokenRetrieverError;

    fn try_from(response: TokenRetrievalResponse) -> Result<Self, Self::Error> {
        let token_type = TokenType::try_from(response.token_type.as_str())
            .map_err(TokenRetrieverError::TokenRetrieverError)?;

        // `expires_in` is expressed in seconds
        let time_delta = TimeDelta::from_std(Duration::from_secs(response.expires_in))
            .map_err(|e| TokenRetrieverError::TokenRetrieverError(e.to_string()))?;

        let expires_at = Utc::now().checked_add_signed(time_delta).ok_or_else(|| {
            TokenRetrieverError::TokenRetrieverError(
                "Failed to calculate expiration time".to_string(),
            )
        })?;

        Ok(Token::new(response.access_token, token_type, expires_at))
    }
}

#[cfg(test)]
mod test {
    use crate::{
        TokenRetrieverError,
        authenticator::TokenRetrievalResponse,
        token::{AccessToken, Token, TokenType},
    };
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeDelta, Utc};

    #[test]
    fn expired_token_is_always_within_the_margin() {
        let past = Utc::now() - Duration::milliseconds(10);
        let token = Token::new(AccessToken::from("some-token"), TokenType::Bearer, past);
        assert!(token.expires_within(TimeDelta::zero()))
    }

    #[test]
    fn token_expiring_inside_the_margin() {
        let soon = Utc::now() + Duration::minutes(2);
        let token = Token::new(AccessToken::from("some-token"), TokenType::Bearer, soon);

        assert!(!token.expires_within(TimeDelta::zero()));
        assert!(token.expires_within(TimeDelta::minutes(5)));
        assert!(!token.expires_within(TimeDelta::seconds(30)));
    }

    #[test]
    fn token_from_response() {
        let response = TokenRetrievalResponse {
            access_token: "some-token".to_string(),
            token_type: "bearer".to_string(),
            expires_in: 3599,
        };

        let token = Token::try_from(response).unwrap();

        assert_eq!(token.token_type(), &TokenType::Bearer);
        assert_eq!(token.authorization_value(), "Bearer some-token");
        assert!(!token.expires_within(TimeDelta::minutes(55)));
        assert!(!format!("{token:?}").contains("some-token"));
    }

    #[test]
    fn token_from_response_with_unknown_type() {
        let response = TokenRetrievalResponse {
            access_token: "some-token".to_string(),
            token_type: "pop".to_string(),
            expires_in: 3599,
        };

        assert_matches!(
            Token::try_from(response),
            Err(TokenRetrieverError::TokenRetrieverError(msg)) if msg == "Invalid token type: pop"
        );
    }

    #[test]
    fn token_retrieval_response_incorrect_time() {
        let response = TokenRetrievalResponse {
            access_token: "some-token".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: u64::MAX,
        };

        assert_matches!(
            Token::try_from(response),
            Err(TokenRetrieverError::TokenRetrieverError(msg))
                if msg == "Source duration value is out of range for the target type"
        );
    }
}
