use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::authenticator::HttpAuthenticator;
use crate::config::SdkConfig;
use crate::graph::GraphTransport;
use crate::graph::client::GraphClient;
use crate::groups::GroupOperations;
use crate::http::client::{HttpBuildError, HttpClient};
use crate::mfa::MfaOperations;
use crate::sign_in_logs::SignInLogOperations;
use crate::token_retriever::TokenRetrieverWithCache;
use crate::users::UserOperations;

/// Transport used by [`DirectorySdk::new`]: reqwest for HTTP and a cached client credentials
/// token.
pub type DefaultGraphClient =
    GraphClient<HttpClient, TokenRetrieverWithCache<HttpAuthenticator<HttpClient>>>;

#[derive(Error, Debug)]
pub enum SdkBuildError {
    #[error("building http client: `{0}`")]
    HttpClient(#[from] HttpBuildError),
}

/// Entry point of the crate, grouping the operations over one tenant.
pub struct DirectorySdk<G> {
    pub users: UserOperations<G>,
    pub mfa: MfaOperations<G>,
    pub groups: GroupOperations<G>,
    pub sign_in_logs: SignInLogOperations<G>,
}

impl DirectorySdk<DefaultGraphClient> {
    /// Builds the SDK talking to the cloud selected in `config`.
    pub fn new(config: &SdkConfig) -> Result<Self, SdkBuildError> {
        let environment = config.environment();
        let http_client = HttpClient::new(config.http())?;

        let token_url = environment.token_endpoint(config.tenant_id());
        debug!(%token_url, "using token endpoint");
        let authenticator = HttpAuthenticator::new(http_client.clone(), token_url);
        let token_retriever = TokenRetrieverWithCache::new(
            config.client_id().to_string(),
            config.client_secret().clone(),
            environment.default_scope(),
            authenticator,
        );

        let graph = GraphClient::new(http_client, token_retriever, environment.graph_api_base());
        Ok(Self::with_transport(graph, config))
    }
}

impl<G> DirectorySdk<G>
where
    G: GraphTransport,
{
    /// Composes the operation groups over any transport.
    pub fn with_transport(graph: G, config: &SdkConfig) -> Self {
        let graph = Arc::new(graph);
        let groups = GroupOperations::new(
            Arc::clone(&graph),
            config.environment().graph_api_base().as_str(),
        );
        Self {
            users: UserOperations::new(
                Arc::clone(&graph),
                groups.clone(),
                config.issuer_domain(),
                config.deactivated_group_id().map(str::to_string),
            ),
            mfa: MfaOperations::new(Arc::clone(&graph)),
            sign_in_logs: SignInLogOperations::new(graph),
            groups,
        }
    }
}
