use http::header::{ACCEPT, CONTENT_TYPE};
use http::{Request, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use url::form_urlencoded;

use crate::ClientID;
use crate::config::ClientSecret;
use crate::http_client::HttpClient;
use crate::token::AccessToken;

#[derive(Error, Debug, Clone)]
pub enum AuthenticateError {
    #[error("unable to build token request: `{0}`")]
    SerializeError(String),
    #[error("unable to deserialize token: `{0}`")]
    DeserializeError(String),
    #[error("identity platform error: Status code: `{0}`, Reason: `{1}`")]
    HttpResponseError(u16, String),
    #[error("http transport error: `{0}`")]
    HttpTransportError(String),
}

pub trait Authenticator {
    fn authenticate(
        &self,
        req: TokenRetrievalRequest,
    ) -> Result<TokenRetrievalResponse, AuthenticateError>;
}

/// Obtains app-only access tokens from the tenant token endpoint.
pub struct HttpAuthenticator<C> {
    /// HTTP client
    http_client: C,
    /// Tenant token endpoint URL
    url: Url,
}

impl<C> HttpAuthenticator<C> {
    pub fn new(http_client: C, url: Url) -> Self {
        Self { http_client, url }
    }
}

impl<C> Authenticator for HttpAuthenticator<C>
where
    C: HttpClient,
{
    /// Executes a form-encoded POST request against the token endpoint and returns the decoded
    /// token response.
    fn authenticate(
        &self,
        req: TokenRetrievalRequest,
    ) -> Result<TokenRetrievalResponse, AuthenticateError> {
        let request = Request::builder()
            .method("POST")
            .uri(self.url.as_str())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(ACCEPT, "application/json")
            .body(req.form_encoded().into_bytes())
            .map_err(|e| AuthenticateError::SerializeError(e.to_string()))?;

        let response = self
            .http_client
            .send(request)
            .map_err(|e| AuthenticateError::HttpTransportError(e.to_string()))?;

        let body = response.body();

        if response.status() != StatusCode::OK {
            return Err(AuthenticateError::HttpResponseError(
                response.status().as_u16(),
                describe_failure(body),
            ));
        }

        serde_json::from_slice(body).map_err(|e| AuthenticateError::DeserializeError(e.to_string()))
    }
}

/// Extracts the OAuth2 error description, falling back to the raw body.
fn describe_failure(body: &[u8]) -> String {
    match serde_json::from_slice::<OAuthErrorResponse>(body) {
        Ok(OAuthErrorResponse {
            error,
            error_description: Some(description),
        }) => format!("{error}: {description}"),
        Ok(OAuthErrorResponse { error, .. }) => error,
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    ClientCredentials,
}

impl GrantType {
    fn as_str(&self) -> &'static str {
        match self {
            GrantType::ClientCredentials => "client_credentials",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenRetrievalRequest {
    pub client_id: ClientID,
    pub grant_type: GrantType,
    pub client_secret: ClientSecret,
    pub scope: String,
}

impl TokenRetrievalRequest {
    pub(crate) fn form_encoded(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", self.grant_type.as_str())
            .append_pair("client_id", &self.client_id)
            .append_pair("client_secret", self.client_secret.expose())
            .append_pair("scope", &self.scope)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TokenRetrievalResponse {
    pub access_token: AccessToken,
    /// The lifetime in seconds of the access token.
    pub expires_in: u64,
    pub token_type: String,
}

#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    error_description: Option<String>,
}
