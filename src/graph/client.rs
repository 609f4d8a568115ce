use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderValue, Request};
use serde_json::Value;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::error::GraphError;
use super::request::GraphRequest;
use super::GraphTransport;
use crate::http_client::HttpClient;
use crate::token::Token;
use crate::TokenRetriever;

const CONSISTENCY_LEVEL_HEADER: &str = "ConsistencyLevel";
const CLIENT_REQUEST_ID_HEADER: &str = "client-request-id";

/// [`GraphTransport`] over an [`HttpClient`], authenticating every call with a token from the
/// [`TokenRetriever`].
pub struct GraphClient<C, T>
where
    C: HttpClient,
    T: TokenRetriever,
{
    http_client: C,
    token_retriever: T,
    /// Versioned base, e.g. `https://graph.microsoft.com/v1.0`.
    base_url: Url,
}

impl<C, T> GraphClient<C, T>
where
    C: HttpClient,
    T: TokenRetriever,
{
    pub fn new(http_client: C, token_retriever: T, base_url: Url) -> Self {
        Self {
            http_client,
            token_retriever,
            base_url,
        }
    }

    fn build_request(
        &self,
        request: &GraphRequest,
        token: &Token,
    ) -> Result<Request<Vec<u8>>, GraphError> {
        let url = request.url(&self.base_url)?;

        let mut bearer_token_header =
            HeaderValue::from_str(&token.authorization_value()).map_err(|_| GraphError::Encode {
                message: "invalid HTTP header value set for Authorization".to_string(),
            })?;
        bearer_token_header.set_sensitive(true);

        let body = match request.json_body() {
            Some(body) => serde_json::to_vec(body).map_err(|e| GraphError::Encode {
                message: format!("Failed to encode JSON: {e}"),
            })?,
            None => Vec::new(),
        };

        let mut builder = Request::builder()
            .method(request.method().clone())
            .uri(url.as_str())
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, bearer_token_header)
            .header(CLIENT_REQUEST_ID_HEADER, Uuid::now_v7().to_string());

        if request.json_body().is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        if request.counted() {
            builder = builder.header(CONSISTENCY_LEVEL_HEADER, "eventual");
        }

        builder.body(body).map_err(|e| GraphError::Encode {
            message: format!("Failed to build request: {e}"),
        })
    }
}

impl<C, T> GraphTransport for GraphClient<C, T>
where
    C: HttpClient,
    T: TokenRetriever,
{
    fn execute(&self, request: GraphRequest) -> Result<Option<Value>, GraphError> {
        let token = self.token_retriever.retrieve()?;
        let http_request = self.build_request(&request, &token)?;

        debug!(method = %request.method(), path = %request.path(), "sending graph request");
        let response = self.http_client.send(http_request)?;

        let status = response.status();
        let body = response.body();
        debug!(method = %request.method(), path = %request.path(), status = status.as_u16(), "graph response received");

        if !status.is_success() {
            return Err(GraphError::Api {
                status: status.as_u16(),
                body: String::from_utf8_lossy(body).into_owned(),
            });
        }

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        serde_json::from_slice(body)
            .map(Some)
            .map_err(|e| GraphError::Decode {
                message: format!(
                    "Failed to decode JSON response: {e}. Response body: {}",
                    String::from_utf8_lossy(body)
                ),
            })
    }
}
