//! Time windowed queries over the sign-in audit log.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

use crate::graph::request::{GraphRequest, odata_literal};
use crate::graph::{GraphTransport, fetch_page};
use crate::models::SignInLog;
use crate::result::{INVALID_INPUT_CODE, OperationError, OperationResult, PagedResult, complete};

const AREA: &str = "sign_in_logs";

pub const USER_DEFAULT_PAGE_SIZE: u32 = 25;
pub const USER_DEFAULT_DAYS_BACK: u32 = 7;
pub const FAILED_DEFAULT_PAGE_SIZE: u32 = 50;
pub const FAILED_DEFAULT_DAYS_BACK: u32 = 1;

/// Window and paging of a sign-in query. Unset values fall back to the query defaults, and a
/// `next_link` replaces the whole query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignInQuery {
    pub top: Option<u32>,
    pub days_back: Option<u32>,
    pub next_link: Option<String>,
}

pub struct SignInLogOperations<G> {
    graph: Arc<G>,
}

impl<G> SignInLogOperations<G>
where
    G: GraphTransport,
{
    pub fn new(graph: Arc<G>) -> Self {
        Self { graph }
    }

    /// Sign-ins of one user, newest first. Defaults to 25 entries from the last 7 days.
    pub fn get_by_user(
        &self,
        user_id: &str,
        query: SignInQuery,
    ) -> OperationResult<PagedResult<SignInLog>> {
        self.get_by_user_since(user_id, query, Utc::now())
    }

    /// Failed sign-ins of every user, newest first. Defaults to 50 entries from the last day.
    pub fn get_failed_sign_ins(&self, query: SignInQuery) -> OperationResult<PagedResult<SignInLog>> {
        self.get_failed_sign_ins_since(query, Utc::now())
    }

    fn get_by_user_since(
        &self,
        user_id: &str,
        query: SignInQuery,
        now: DateTime<Utc>,
    ) -> OperationResult<PagedResult<SignInLog>> {
        let predicate = format!("userId eq {}", odata_literal(user_id));
        let request = match windowed(
            predicate,
            query,
            USER_DEFAULT_PAGE_SIZE,
            USER_DEFAULT_DAYS_BACK,
            now,
        ) {
            Ok(request) => request,
            Err(err) => return OperationResult::failure(err),
        };
        complete(AREA, "get_by_user", fetch_page(self.graph.as_ref(), request))
    }

    fn get_failed_sign_ins_since(
        &self,
        query: SignInQuery,
        now: DateTime<Utc>,
    ) -> OperationResult<PagedResult<SignInLog>> {
        let request = match windowed(
            "status/errorCode ne 0".to_string(),
            query,
            FAILED_DEFAULT_PAGE_SIZE,
            FAILED_DEFAULT_DAYS_BACK,
            now,
        ) {
            Ok(request) => request,
            Err(err) => return OperationResult::failure(err),
        };
        complete(
            AREA,
            "get_failed_sign_ins",
            fetch_page(self.graph.as_ref(), request),
        )
    }
}

fn windowed(
    predicate: String,
    query: SignInQuery,
    default_top: u32,
    default_days_back: u32,
    now: DateTime<Utc>,
) -> Result<GraphRequest, OperationError> {
    if let Some(link) = query.next_link {
        return Ok(GraphRequest::next_page(link));
    }
    let days_back = query.days_back.unwrap_or(default_days_back);
    let since = window_start(now, days_back).ok_or_else(|| {
        OperationError::new(
            INVALID_INPUT_CODE,
            format!("A window of {days_back} days back is out of range"),
        )
    })?;
    Ok(GraphRequest::get(["auditLogs", "signIns"])
        .filter(format!(
            "{predicate} and createdDateTime ge {}",
            since.to_rfc3339_opts(SecondsFormat::Millis, true)
        ))
        .top(query.top.unwrap_or(default_top))
        .order_by("createdDateTime desc"))
}

/// Lower bound of the window, `None` when it falls outside the representable range.
fn window_start(now: DateTime<Utc>, days_back: u32) -> Option<DateTime<Utc>> {
    TimeDelta::try_days(i64::from(days_back)).and_then(|delta| now.checked_sub_signed(delta))
}

#[cfg(test)]
mod tests {
    use mockall::predicate::function;
    use serde_json::json;

    use super::*;
    use crate::graph::request::RequestTarget;
    use crate::graph::tests::MockGraphTransport;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-08T12:30:15.250Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn sign_in(id: &str, created: &str, error_code: i64) -> serde_json::Value {
        json!({
            "id": id,
            "createdDateTime": created,
            "userId": "u1",
            "status": {"errorCode": error_code}
        })
    }

    #[test]
    fn by_user_defaults_to_a_week() {
        let mut graph = MockGraphTransport::new();
        graph
            .expect_execute()
            .once()
            .with(function(|r: &GraphRequest| {
                r.path() == "/auditLogs/signIns"
                    && r.filter_expr()
                        == Some("userId eq 'u1' and createdDateTime ge 2024-03-01T12:30:15.250Z")
                    && r.top_value() == Some(25)
                    && r.order() == Some("createdDateTime desc")
            }))
            .returning(|_| {
                Ok(Some(json!({"value": [
                    sign_in("s2", "2024-03-08T10:00:00Z", 0),
                    sign_in("s1", "2024-03-07T10:00:00Z", 50126)
                ]})))
            });

        let result = SignInLogOperations::new(Arc::new(graph)).get_by_user_since(
            "u1",
            SignInQuery::default(),
            now(),
        );

        let page = result.data.unwrap();
        assert!(page.items[0].succeeded());
        assert!(!page.items[1].succeeded());
        assert!(page.items[0].created_date_time > page.items[1].created_date_time);
    }

    #[test]
    fn failed_defaults_to_a_day() {
        let mut graph = MockGraphTransport::new();
        graph
            .expect_execute()
            .once()
            .with(function(|r: &GraphRequest| {
                r.filter_expr()
                    == Some("status/errorCode ne 0 and createdDateTime ge 2024-03-07T12:30:15.250Z")
                    && r.top_value() == Some(50)
            }))
            .returning(|_| Ok(Some(json!({"value": []}))));

        let result = SignInLogOperations::new(Arc::new(graph))
            .get_failed_sign_ins_since(SignInQuery::default(), now());

        assert!(result.success);
    }

    #[test]
    fn explicit_window_and_page_size() {
        let mut graph = MockGraphTransport::new();
        graph
            .expect_execute()
            .once()
            .with(function(|r: &GraphRequest| {
                r.filter_expr()
                    == Some("status/errorCode ne 0 and createdDateTime ge 2024-02-07T12:30:15.250Z")
                    && r.top_value() == Some(5)
            }))
            .returning(|_| Ok(Some(json!({"value": []}))));
        let query = SignInQuery {
            top: Some(5),
            days_back: Some(30),
            next_link: None,
        };

        let result =
            SignInLogOperations::new(Arc::new(graph)).get_failed_sign_ins_since(query, now());

        assert!(result.success);
    }

    #[test]
    fn out_of_range_window_is_rejected_locally() {
        let mut graph = MockGraphTransport::new();
        graph.expect_execute().never();
        let logs = SignInLogOperations::new(Arc::new(graph));
        let query = SignInQuery {
            days_back: Some(u32::MAX),
            ..Default::default()
        };

        let failed = logs.get_failed_sign_ins_since(query.clone(), now());
        let by_user = logs.get_by_user_since("u1", query, now());

        assert!(!failed.success);
        assert_eq!(failed.error.unwrap().code, INVALID_INPUT_CODE);
        assert_eq!(by_user.error.unwrap().code, INVALID_INPUT_CODE);
    }

    #[test]
    fn window_start_bounds() {
        assert_eq!(window_start(now(), 0), Some(now()));
        assert!(window_start(now(), 36_500).is_some());
        assert_eq!(window_start(now(), u32::MAX), None);
    }

    #[test]
    fn continuation_link_replaces_the_query() {
        let link = "https://graph.microsoft.com/v1.0/auditLogs/signIns?$skiptoken=abc";
        let mut graph = MockGraphTransport::new();
        graph
            .expect_execute()
            .once()
            .with(function(move |r: &GraphRequest| {
                r.target() == &RequestTarget::Link(link.to_string()) && r.filter_expr().is_none()
            }))
            .returning(|_| Ok(Some(json!({"value": [sign_in("s0", "2024-03-01T09:00:00Z", 0)]}))));
        let query = SignInQuery {
            next_link: Some(link.to_string()),
            ..Default::default()
        };

        let result = SignInLogOperations::new(Arc::new(graph)).get_by_user("u1", query);

        assert_eq!(result.data.unwrap().items[0].id, "s0");
    }
}
