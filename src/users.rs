//! User account administration.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use crate::graph::request::{GraphRequest, odata_literal};
use crate::graph::{GraphTransport, fetch, fetch_page, send};
use crate::groups::GroupOperations;
use crate::models::group::GROUP_SELECT_FIELDS;
use crate::models::user::USER_SELECT_FIELDS;
use crate::models::{CreateUserInput, EntraUser, Group, PasswordResetInput, UpdateUserInput};
use crate::result::{
    INVALID_INPUT_CODE, ListOptions, OperationError, OperationResult, PagedResult, complete,
    complete_unit,
};

const AREA: &str = "users";

pub const DEFAULT_PAGE_SIZE: u32 = 25;

pub const USER_NOT_FOUND_CODE: &str = "UserNotFound";

pub struct UserOperations<G> {
    graph: Arc<G>,
    groups: GroupOperations<G>,
    /// Issuer of the `userName` identity of local accounts.
    issuer_domain: String,
    deactivated_group_id: Option<String>,
}

impl<G> UserOperations<G>
where
    G: GraphTransport,
{
    pub fn new(
        graph: Arc<G>,
        groups: GroupOperations<G>,
        issuer_domain: impl Into<String>,
        deactivated_group_id: Option<String>,
    ) -> Self {
        Self {
            graph,
            groups,
            issuer_domain: issuer_domain.into(),
            deactivated_group_id,
        }
    }

    /// Users whose display name, mail or principal name starts with `query`.
    pub fn search(&self, query: &str) -> OperationResult<PagedResult<EntraUser>> {
        let literal = odata_literal(query);
        let filter = ["displayName", "mail", "userPrincipalName"]
            .iter()
            .map(|field| format!("startswith({field},{literal})"))
            .collect::<Vec<_>>()
            .join(" or ");
        let request = GraphRequest::get(["users"])
            .filter(filter)
            .select(USER_SELECT_FIELDS)
            .top(DEFAULT_PAGE_SIZE);
        complete(AREA, "search", fetch_page(self.graph.as_ref(), request))
    }

    pub fn list(&self, options: ListOptions) -> OperationResult<PagedResult<EntraUser>> {
        let request = match options.next_link {
            Some(link) => GraphRequest::next_page(link),
            None => GraphRequest::get(["users"])
                .select(USER_SELECT_FIELDS)
                .top(options.top.unwrap_or(DEFAULT_PAGE_SIZE))
                .order_by("displayName")
                .count(),
        };
        complete(AREA, "list", fetch_page(self.graph.as_ref(), request))
    }

    pub fn get_by_id(&self, user_id: &str) -> OperationResult<EntraUser> {
        let request = GraphRequest::get(["users", user_id]).select(USER_SELECT_FIELDS);
        complete(AREA, "get_by_id", fetch(self.graph.as_ref(), request))
    }

    /// Resolves a local account from its logon name.
    pub fn get_by_username(&self, username: &str) -> OperationResult<EntraUser> {
        let filter = format!(
            "identities/any(c:c/issuerAssignedId eq {} and c/issuer eq {})",
            odata_literal(username),
            odata_literal(&self.issuer_domain)
        );
        let request = GraphRequest::get(["users"])
            .filter(filter)
            .select(USER_SELECT_FIELDS);

        match fetch_page::<_, EntraUser>(self.graph.as_ref(), request) {
            Ok(page) => match page.items.into_iter().next() {
                Some(user) => OperationResult::ok(user),
                None => OperationResult::failure(OperationError::new(
                    USER_NOT_FOUND_CODE,
                    format!("No user found with username '{username}'"),
                )),
            },
            Err(err) => complete(AREA, "get_by_username", Err(err)),
        }
    }

    /// Creates an enabled local account with a temporary password.
    pub fn create(&self, input: &CreateUserInput) -> OperationResult<EntraUser> {
        if let Some(field) = input.missing_field() {
            return OperationResult::failure(OperationError::new(
                INVALID_INPUT_CODE,
                format!("`{field}` is required"),
            ));
        }
        let request = GraphRequest::post(["users"], input.to_body(&self.issuer_domain));
        complete(AREA, "create", fetch(self.graph.as_ref(), request))
    }

    /// Updates only the fields set in `input`.
    pub fn update(&self, user_id: &str, input: &UpdateUserInput) -> OperationResult<()> {
        let request = GraphRequest::patch(["users", user_id], input.to_body());
        complete_unit(AREA, "update", send(self.graph.as_ref(), request))
    }

    pub fn reset_password(&self, input: &PasswordResetInput) -> OperationResult<()> {
        let request = GraphRequest::patch(["users", input.user_id.as_str()], input.to_body());
        complete_unit(AREA, "reset_password", send(self.graph.as_ref(), request))
    }

    pub fn enable(&self, user_id: &str) -> OperationResult<()> {
        self.set_account_enabled(user_id, true, "enable")
    }

    pub fn disable(&self, user_id: &str) -> OperationResult<()> {
        self.set_account_enabled(user_id, false, "disable")
    }

    fn set_account_enabled(
        &self,
        user_id: &str,
        enabled: bool,
        operation: &str,
    ) -> OperationResult<()> {
        let request = GraphRequest::patch(["users", user_id], json!({ "accountEnabled": enabled }));
        complete_unit(AREA, operation, send(self.graph.as_ref(), request))
    }

    /// Disables the account, then moves it to the deactivated group when one is configured.
    ///
    /// Not transactional: when adding to the group fails the account stays disabled and the
    /// group error is returned.
    pub fn deactivate(&self, user_id: &str) -> OperationResult<()> {
        let disabled = self.disable(user_id);
        if !disabled.success {
            return disabled;
        }

        let Some(group_id) = self.deactivated_group_id.as_deref() else {
            warn!(user_id, "no deactivated group configured, user was only disabled");
            return disabled;
        };

        debug!(user_id, group_id, "adding user to the deactivated group");
        self.groups.add_member(group_id, user_id)
    }

    /// Removes the account from the deactivated group when one is configured, then enables it.
    ///
    /// Stops at the first failing step, so a failed group removal leaves the account disabled.
    pub fn reactivate(&self, user_id: &str) -> OperationResult<()> {
        if let Some(group_id) = self.deactivated_group_id.as_deref() {
            debug!(user_id, group_id, "removing user from the deactivated group");
            let removed = self.groups.remove_member(group_id, user_id);
            if !removed.success {
                return removed;
            }
        }
        self.enable(user_id)
    }

    /// Soft deletes the account. The service keeps it restorable for 30 days.
    pub fn delete(&self, user_id: &str) -> OperationResult<()> {
        let request = GraphRequest::delete(["users", user_id]);
        complete_unit(AREA, "delete", send(self.graph.as_ref(), request))
    }

    /// Groups the user is a direct member of.
    pub fn get_groups(&self, user_id: &str) -> OperationResult<Vec<Group>> {
        let request = GraphRequest::get(["users", user_id, "memberOf", "microsoft.graph.group"])
            .select(GROUP_SELECT_FIELDS);
        let result = fetch_page::<_, Group>(self.graph.as_ref(), request).map(|page| page.items);
        complete(AREA, "get_groups", result)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http::Method;
    use mockall::Sequence;
    use mockall::predicate::function;
    use serde_json::{Value, json};

    use super::*;
    use crate::graph::error::GraphError;
    use crate::graph::request::RequestTarget;
    use crate::graph::tests::{MockGraphTransport, api_error};

    const GRAPH_BASE: &str = "https://graph.microsoft.com/v1.0";
    const ISSUER: &str = "contoso.onmicrosoft.com";

    fn operations<G: GraphTransport>(graph: G, group: Option<&str>) -> UserOperations<G> {
        let graph = Arc::new(graph);
        let groups = GroupOperations::new(Arc::clone(&graph), GRAPH_BASE);
        UserOperations::new(graph, groups, ISSUER, group.map(str::to_string))
    }

    fn user(id: &str, name: &str) -> Value {
        json!({"id": id, "displayName": name, "accountEnabled": true})
    }

    #[test]
    fn search_matches_name_mail_and_principal() {
        let mut graph = MockGraphTransport::new();
        graph
            .expect_execute()
            .once()
            .with(function(|r: &GraphRequest| {
                r.path() == "/users"
                    && r.filter_expr()
                        == Some(
                            "startswith(displayName,'o''bri') or startswith(mail,'o''bri') or startswith(userPrincipalName,'o''bri')",
                        )
                    && r.top_value() == Some(25)
            }))
            .returning(|_| Ok(Some(json!({"value": [user("u1", "Pat O'Brien")]}))));

        let result = operations(graph, None).search("o'bri");

        assert_eq!(result.data.unwrap().items[0].id, "u1");
    }

    #[test]
    fn list_requests_a_count() {
        let mut graph = MockGraphTransport::new();
        graph
            .expect_execute()
            .once()
            .with(function(|r: &GraphRequest| {
                r.counted() && r.order() == Some("displayName") && r.top_value() == Some(25)
            }))
            .returning(|_| {
                Ok(Some(json!({
                    "@odata.count": 3,
                    "value": [user("u1", "Ada"), user("u2", "Grace")],
                    "@odata.nextLink": "https://graph.microsoft.com/v1.0/users?$skiptoken=p2"
                })))
            });

        let page = operations(graph, None)
            .list(ListOptions::default())
            .data
            .unwrap();

        assert_eq!(page.total_count, Some(3));
        assert_eq!(page.items.len(), 2);
    }

    #[test]
    fn pagination_round_trip() {
        let next_link = "https://graph.microsoft.com/v1.0/users?$top=2&$skiptoken=p2";
        let mut graph = MockGraphTransport::new();
        graph
            .expect_execute()
            .once()
            .with(function(|r: &GraphRequest| {
                matches!(r.target(), RequestTarget::Resource(_)) && r.top_value() == Some(2)
            }))
            .returning(move |_| {
                Ok(Some(json!({
                    "value": [user("u1", "Ada"), user("u2", "Grace")],
                    "@odata.nextLink": next_link
                })))
            });
        graph
            .expect_execute()
            .once()
            .with(function(move |r: &GraphRequest| {
                r.target() == &RequestTarget::Link(next_link.to_string())
            }))
            .returning(|_| Ok(Some(json!({"value": [user("u3", "Hedy")]}))));
        let users = operations(graph, None);

        let first = users.list(ListOptions::top(2)).data.unwrap();
        let second = users
            .list(ListOptions::next(first.next_link.clone().unwrap()))
            .data
            .unwrap();

        let first_ids: Vec<&str> = first.items.iter().map(|u| u.id.as_str()).collect();
        let second_ids: Vec<&str> = second.items.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(first_ids, ["u1", "u2"]);
        assert_eq!(second_ids, ["u3"]);
        assert_eq!(second.next_link, None);
        let names: Vec<_> = first
            .items
            .iter()
            .chain(second.items.iter())
            .map(|u| u.display_name.clone().unwrap())
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn get_by_username_uses_the_local_identity() {
        let mut graph = MockGraphTransport::new();
        graph
            .expect_execute()
            .once()
            .with(function(|r: &GraphRequest| {
                r.filter_expr()
                    == Some(
                        "identities/any(c:c/issuerAssignedId eq 'ada' and c/issuer eq 'contoso.onmicrosoft.com')",
                    )
            }))
            .returning(|_| Ok(Some(json!({"value": [user("u1", "Ada")]}))));

        let result = operations(graph, None).get_by_username("ada");

        assert_eq!(result.data.unwrap().id, "u1");
    }

    #[test]
    fn get_by_username_without_match() {
        let mut graph = MockGraphTransport::new();
        graph
            .expect_execute()
            .once()
            .returning(|_| Ok(Some(json!({"value": []}))));

        let result = operations(graph, None).get_by_username("nobody");

        assert!(!result.success);
        assert_eq!(result.error.unwrap().code, USER_NOT_FOUND_CODE);
    }

    #[test]
    fn create_posts_the_user() {
        let mut graph = MockGraphTransport::new();
        graph
            .expect_execute()
            .once()
            .with(function(|r: &GraphRequest| {
                let body = r.json_body().unwrap();
                r.method() == Method::POST
                    && r.path() == "/users"
                    && body["identities"][0]["issuer"] == ISSUER
                    && body["passwordProfile"]["forceChangePasswordNextSignIn"] == false
            }))
            .returning(|_| Ok(Some(user("u9", "Ada"))));
        let input = CreateUserInput {
            display_name: "Ada".into(),
            username: "ada".into(),
            password: "Temp#1234".into(),
            force_change_password: Some(false),
            ..Default::default()
        };

        let result = operations(graph, None).create(&input);

        assert_eq!(result.data.unwrap().id, "u9");
    }

    #[test]
    fn create_rejects_blank_input_locally() {
        let mut graph = MockGraphTransport::new();
        graph.expect_execute().never();
        let input = CreateUserInput {
            display_name: "Ada".into(),
            username: "ada".into(),
            password: "".into(),
            ..Default::default()
        };

        let result = operations(graph, None).create(&input);

        let error = result.error.unwrap();
        assert_eq!(error.code, INVALID_INPUT_CODE);
        assert_eq!(error.details, None);
    }

    #[test]
    fn update_and_password_reset_patch_the_user() {
        let mut graph = MockGraphTransport::new();
        graph
            .expect_execute()
            .once()
            .with(function(|r: &GraphRequest| {
                r.method() == Method::PATCH
                    && r.path() == "/users/u1"
                    && r.json_body() == Some(&json!({"displayName": "Ada L.", "mobilePhone": null}))
            }))
            .returning(|_| Ok(None));
        graph
            .expect_execute()
            .once()
            .with(function(|r: &GraphRequest| {
                r.json_body()
                    == Some(&json!({"passwordProfile": {"password": "N3w#Pass", "forceChangePasswordNextSignIn": true}}))
            }))
            .returning(|_| Ok(None));
        let users = operations(graph, None);

        let updated = users.update(
            "u1",
            &UpdateUserInput {
                display_name: Some("Ada L.".into()),
                mobile_phone: Some(None),
                ..Default::default()
            },
        );
        let reset = users.reset_password(&PasswordResetInput {
            user_id: "u1".into(),
            new_password: "N3w#Pass".into(),
            force_change_on_next_sign_in: None,
        });

        assert!(updated.success);
        assert!(reset.success);
    }

    #[test]
    fn get_groups_reads_group_memberships() {
        let mut graph = MockGraphTransport::new();
        graph
            .expect_execute()
            .once()
            .with(function(|r: &GraphRequest| {
                r.path() == "/users/u1/memberOf/microsoft.graph.group"
            }))
            .returning(|_| Ok(Some(json!({"value": [{"id": "g1", "displayName": "Staff"}]}))));

        let groups = operations(graph, None).get_groups("u1").data.unwrap();

        assert_eq!(groups[0].id, "g1");
    }

    #[test]
    fn deactivate_without_group_only_disables() {
        let mut graph = MockGraphTransport::new();
        graph
            .expect_execute()
            .once()
            .with(function(|r: &GraphRequest| {
                r.json_body() == Some(&json!({"accountEnabled": false}))
            }))
            .returning(|_| Ok(None));

        let result = operations(graph, None).deactivate("u1");

        assert_eq!(result, OperationResult::done());
    }

    #[test]
    fn deactivate_disables_before_grouping() {
        let mut seq = Sequence::new();
        let mut graph = MockGraphTransport::new();
        graph
            .expect_execute()
            .once()
            .in_sequence(&mut seq)
            .with(function(|r: &GraphRequest| {
                r.method() == Method::PATCH && r.path() == "/users/u1"
            }))
            .returning(|_| Ok(None));
        graph
            .expect_execute()
            .once()
            .in_sequence(&mut seq)
            .with(function(|r: &GraphRequest| {
                r.method() == Method::POST && r.path() == "/groups/g-off/members/$ref"
            }))
            .returning(|_| Ok(None));

        assert!(operations(graph, Some("g-off")).deactivate("u1").success);
    }

    #[test]
    fn deactivate_stops_when_disable_fails() {
        let mut graph = MockGraphTransport::new();
        graph
            .expect_execute()
            .once()
            .returning(|_| Err(api_error(403, "Authorization_RequestDenied", "Insufficient privileges")));

        let result = operations(graph, Some("g-off")).deactivate("u1");

        assert_eq!(result.error.unwrap().code, "Authorization_RequestDenied");
    }

    /// In-memory directory holding the enabled flag of a single user, rejecting group changes.
    fn directory_rejecting_group_changes(
        enabled: Arc<Mutex<bool>>,
    ) -> impl Fn(GraphRequest) -> Result<Option<Value>, GraphError> {
        move |request: GraphRequest| {
            let mut enabled = enabled.lock().unwrap();
            let is_user = request.path() == "/users/u1";
            if is_user && request.method() == Method::PATCH {
                if let Some(flag) = request.json_body().and_then(|b| b["accountEnabled"].as_bool()) {
                    *enabled = flag;
                }
                Ok(None)
            } else if is_user && request.method() == Method::GET {
                Ok(Some(json!({"id": "u1", "accountEnabled": *enabled})))
            } else {
                Err(api_error(404, "Request_ResourceNotFound", "Group 'g-off' does not exist."))
            }
        }
    }

    #[test]
    fn deactivate_keeps_the_account_disabled_when_grouping_fails() {
        let enabled = Arc::new(Mutex::new(true));
        let users = operations(
            directory_rejecting_group_changes(Arc::clone(&enabled)),
            Some("g-off"),
        );

        let result = users.deactivate("u1");

        assert!(!result.success);
        assert_eq!(result.error.unwrap().code, "Request_ResourceNotFound");
        let user = users.get_by_id("u1").data.unwrap();
        assert_eq!(user.account_enabled, Some(false));
    }

    #[test]
    fn reactivate_leaves_the_account_disabled_when_removal_fails() {
        let enabled = Arc::new(Mutex::new(false));
        let users = operations(
            directory_rejecting_group_changes(Arc::clone(&enabled)),
            Some("g-off"),
        );

        let result = users.reactivate("u1");

        assert!(!result.success);
        assert!(!*enabled.lock().unwrap());
    }

    #[test]
    fn reactivate_removes_then_enables() {
        let mut seq = Sequence::new();
        let mut graph = MockGraphTransport::new();
        graph
            .expect_execute()
            .once()
            .in_sequence(&mut seq)
            .with(function(|r: &GraphRequest| {
                r.method() == Method::DELETE && r.path() == "/groups/g-off/members/u1/$ref"
            }))
            .returning(|_| Ok(None));
        graph
            .expect_execute()
            .once()
            .in_sequence(&mut seq)
            .with(function(|r: &GraphRequest| {
                r.json_body() == Some(&json!({"accountEnabled": true}))
            }))
            .returning(|_| Ok(None));

        assert!(operations(graph, Some("g-off")).reactivate("u1").success);
    }

    #[test]
    fn delete_user() {
        let mut graph = MockGraphTransport::new();
        graph
            .expect_execute()
            .once()
            .with(function(|r: &GraphRequest| {
                r.method() == Method::DELETE && r.path() == "/users/u1"
            }))
            .returning(|_| Ok(None));

        assert!(operations(graph, None).delete("u1").success);
    }
}
