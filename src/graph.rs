//! Access to the Microsoft Graph REST API.
pub mod client;
pub mod error;
pub mod odata;
pub mod request;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::graph::error::GraphError;
use crate::graph::odata::ODataPage;
use crate::graph::request::GraphRequest;
use crate::result::PagedResult;

/// Executes Graph requests on behalf of the operation groups.
///
/// Successful calls return the decoded JSON body, or `None` when the service answered without
/// content (typically `204`). Any non-success status is reported as [`GraphError::Api`].
pub trait GraphTransport {
    fn execute(&self, request: GraphRequest) -> Result<Option<Value>, GraphError>;
}

// Accept closures as GraphTransport implementations
impl<F> GraphTransport for F
where
    F: Fn(GraphRequest) -> Result<Option<Value>, GraphError>,
{
    fn execute(&self, request: GraphRequest) -> Result<Option<Value>, GraphError> {
        self(request)
    }
}

/// Executes `request` and decodes its body into `T`. A missing body is a decode failure.
pub(crate) fn fetch<G, T>(graph: &G, request: GraphRequest) -> Result<T, GraphError>
where
    G: GraphTransport + ?Sized,
    T: DeserializeOwned,
{
    let path = request.path();
    let value = graph
        .execute(request)?
        .ok_or_else(|| GraphError::Decode {
            message: format!("empty response from `{path}`"),
        })?;
    decode(value)
}

/// Executes a collection request and decodes one page of it.
pub(crate) fn fetch_page<G, T>(graph: &G, request: GraphRequest) -> Result<PagedResult<T>, GraphError>
where
    G: GraphTransport + ?Sized,
    T: DeserializeOwned,
{
    fetch::<G, ODataPage<T>>(graph, request).map(PagedResult::from)
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, GraphError> {
    serde_json::from_value(value).map_err(|e| GraphError::Decode {
        message: e.to_string(),
    })
}

/// Executes `request` ignoring whatever body comes back.
pub(crate) fn send<G>(graph: &G, request: GraphRequest) -> Result<(), GraphError>
where
    G: GraphTransport + ?Sized,
{
    graph.execute(request).map(|_| ())
}
