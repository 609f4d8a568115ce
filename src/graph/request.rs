use http::Method;
use serde_json::Value;
use url::Url;

use super::error::GraphError;
use crate::environment::extend_path;

/// Where a request is sent: a resource path under the Graph base, or an opaque continuation
/// link returned by a previous page, used verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestTarget {
    Resource(Vec<String>),
    Link(String),
}

/// Fluent description of a single Graph call.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphRequest {
    method: Method,
    target: RequestTarget,
    filter: Option<String>,
    select: Vec<String>,
    top: Option<u32>,
    order_by: Option<String>,
    count: bool,
    body: Option<Value>,
}

impl GraphRequest {
    /// Request against a resource path. Each segment is percent-encoded on its own, so ids
    /// can never break out of their segment.
    pub fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_target(
            method,
            RequestTarget::Resource(segments.into_iter().map(Into::into).collect()),
        )
    }

    pub fn get<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::GET, segments)
    }

    pub fn post<I, S>(segments: I, body: Value) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::POST, segments).body(body)
    }

    pub fn patch<I, S>(segments: I, body: Value) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::PATCH, segments).body(body)
    }

    pub fn delete<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::DELETE, segments)
    }

    /// GET of a continuation link returned as `@odata.nextLink`. Links of counted listings
    /// repeat `$count=true` and keep requiring eventual consistency.
    pub fn next_page(link: impl Into<String>) -> Self {
        let link = link.into();
        let count = link_requests_count(&link);
        Self {
            count,
            ..Self::with_target(Method::GET, RequestTarget::Link(link))
        }
    }

    fn with_target(method: Method, target: RequestTarget) -> Self {
        Self {
            method,
            target,
            filter: None,
            select: Vec::new(),
            top: None,
            order_by: None,
            count: false,
            body: None,
        }
    }

    pub fn filter(self, filter: impl Into<String>) -> Self {
        Self {
            filter: Some(filter.into()),
            ..self
        }
    }

    pub fn select(self, fields: &[&str]) -> Self {
        Self {
            select: fields.iter().map(|f| f.to_string()).collect(),
            ..self
        }
    }

    pub fn top(self, top: u32) -> Self {
        Self {
            top: Some(top),
            ..self
        }
    }

    pub fn order_by(self, order_by: impl Into<String>) -> Self {
        Self {
            order_by: Some(order_by.into()),
            ..self
        }
    }

    /// Asks the service to include `@odata.count`. Requires eventual consistency.
    pub fn count(self) -> Self {
        Self {
            count: true,
            ..self
        }
    }

    pub fn body(self, body: Value) -> Self {
        Self {
            body: Some(body),
            ..self
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn target(&self) -> &RequestTarget {
        &self.target
    }

    /// Human readable path, `/users/{id}` for resources or the link itself.
    pub fn path(&self) -> String {
        match &self.target {
            RequestTarget::Resource(segments) => format!("/{}", segments.join("/")),
            RequestTarget::Link(link) => link.to_owned(),
        }
    }

    pub fn filter_expr(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn selected(&self) -> &[String] {
        &self.select
    }

    pub fn top_value(&self) -> Option<u32> {
        self.top
    }

    pub fn order(&self) -> Option<&str> {
        self.order_by.as_deref()
    }

    pub fn counted(&self) -> bool {
        self.count
    }

    pub fn json_body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Resolves the absolute url against the versioned Graph base.
    pub fn url(&self, base: &Url) -> Result<Url, GraphError> {
        match &self.target {
            RequestTarget::Link(link) => Url::parse(link).map_err(|e| GraphError::Encode {
                message: format!("invalid continuation link `{link}`: {e}"),
            }),
            RequestTarget::Resource(segments) => {
                let mut url = base.to_owned();
                let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
                extend_path(&mut url, &segments);
                self.append_query(&mut url);
                Ok(url)
            }
        }
    }

    fn append_query(&self, url: &mut Url) {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(filter) = &self.filter {
            params.push(("$filter", filter.to_owned()));
        }
        if !self.select.is_empty() {
            params.push(("$select", self.select.join(",")));
        }
        if let Some(top) = self.top {
            params.push(("$top", top.to_string()));
        }
        if let Some(order_by) = &self.order_by {
            params.push(("$orderby", order_by.to_owned()));
        }
        if self.count {
            params.push(("$count", "true".to_string()));
        }
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
    }
}

fn link_requests_count(link: &str) -> bool {
    Url::parse(link).is_ok_and(|url| {
        url.query_pairs()
            .any(|(key, value)| key == "$count" && value.eq_ignore_ascii_case("true"))
    })
}

/// Quotes a value as an OData string literal, doubling embedded single quotes.
pub fn odata_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
