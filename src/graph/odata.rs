//! OData envelopes returned by Graph.

use serde::Deserialize;

use crate::result::PagedResult;

/// A page of a collection.
#[derive(Debug, Deserialize)]
pub struct ODataPage<T> {
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
    #[serde(rename = "@odata.count")]
    pub count: Option<u64>,
}

impl<T> From<ODataPage<T>> for PagedResult<T> {
    fn from(page: ODataPage<T>) -> Self {
        PagedResult {
            items: page.value,
            next_link: page.next_link,
            total_count: page.count,
        }
    }
}

/// Error document sent along with unsuccessful responses. Every field is optional so a partial
/// document still contributes what it has.
#[derive(Debug, Deserialize)]
pub struct ODataError {
    pub error: Option<ODataErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct ODataErrorBody {
    pub code: Option<String>,
    pub message: Option<String>,
}

impl ODataError {
    /// Parses an error document, `None` when the body is not one.
    pub fn parse(body: &str) -> Option<ODataErrorBody> {
        serde_json::from_str::<ODataError>(body)
            .ok()
            .and_then(|doc| doc.error)
    }
}
