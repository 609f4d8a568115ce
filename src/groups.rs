//! Group lookups and membership management.

use std::sync::Arc;

use serde::de::IgnoredAny;
use serde_json::json;

use crate::graph::request::{GraphRequest, odata_literal};
use crate::graph::{GraphTransport, fetch, fetch_page, send};
use crate::models::group::{GROUP_SELECT_FIELDS, MEMBER_SELECT_FIELDS, mail_nickname};
use crate::models::{Group, GroupMember};
use crate::result::{ListOptions, OperationResult, PagedResult, complete, complete_unit};

const AREA: &str = "groups";

pub const DEFAULT_PAGE_SIZE: u32 = 25;

pub struct GroupOperations<G> {
    graph: Arc<G>,
    /// Versioned Graph base used to build `@odata.id` references.
    graph_api_base: String,
}

impl<G> Clone for GroupOperations<G> {
    fn clone(&self) -> Self {
        Self {
            graph: Arc::clone(&self.graph),
            graph_api_base: self.graph_api_base.clone(),
        }
    }
}

impl<G> GroupOperations<G>
where
    G: GraphTransport,
{
    pub fn new(graph: Arc<G>, graph_api_base: impl Into<String>) -> Self {
        Self {
            graph,
            graph_api_base: graph_api_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn get_by_id(&self, group_id: &str) -> OperationResult<Group> {
        let request = GraphRequest::get(["groups", group_id]).select(GROUP_SELECT_FIELDS);
        complete(AREA, "get_by_id", fetch(self.graph.as_ref(), request))
    }

    /// Groups whose display name starts with `query`, ordered by display name.
    pub fn search(&self, query: &str, top: Option<u32>) -> OperationResult<PagedResult<Group>> {
        let request = GraphRequest::get(["groups"])
            .filter(format!("startswith(displayName,{})", odata_literal(query)))
            .select(GROUP_SELECT_FIELDS)
            .top(top.unwrap_or(DEFAULT_PAGE_SIZE))
            .order_by("displayName");
        complete(AREA, "search", fetch_page(self.graph.as_ref(), request))
    }

    pub fn list_members(
        &self,
        group_id: &str,
        options: ListOptions,
    ) -> OperationResult<PagedResult<GroupMember>> {
        let request = match options.next_link {
            Some(link) => GraphRequest::next_page(link),
            None => GraphRequest::get(["groups", group_id, "members"])
                .select(MEMBER_SELECT_FIELDS)
                .top(options.top.unwrap_or(DEFAULT_PAGE_SIZE)),
        };
        complete(AREA, "list_members", fetch_page(self.graph.as_ref(), request))
    }

    /// Adds a user to the group. Adding an existing member is reported as whatever the service
    /// answers; membership is not checked beforehand.
    pub fn add_member(&self, group_id: &str, user_id: &str) -> OperationResult<()> {
        let reference = format!("{}/directoryObjects/{user_id}", self.graph_api_base);
        let request = GraphRequest::post(
            ["groups", group_id, "members", "$ref"],
            json!({ "@odata.id": reference }),
        );
        complete_unit(AREA, "add_member", send(self.graph.as_ref(), request))
    }

    pub fn remove_member(&self, group_id: &str, user_id: &str) -> OperationResult<()> {
        let request = GraphRequest::delete(["groups", group_id, "members", user_id, "$ref"]);
        complete_unit(AREA, "remove_member", send(self.graph.as_ref(), request))
    }

    pub fn is_member(&self, group_id: &str, user_id: &str) -> OperationResult<bool> {
        let request = GraphRequest::get(["groups", group_id, "members"])
            .filter(format!("id eq {}", odata_literal(user_id)))
            .select(&["id"]);
        let result = fetch_page::<_, IgnoredAny>(self.graph.as_ref(), request)
            .map(|page| !page.items.is_empty());
        complete(AREA, "is_member", result)
    }

    /// Creates a security group, e.g. the one deactivated users are moved to.
    pub fn create_security_group(
        &self,
        display_name: &str,
        description: &str,
    ) -> OperationResult<Group> {
        let request = GraphRequest::post(
            ["groups"],
            json!({
                "displayName": display_name,
                "description": description,
                "securityEnabled": true,
                "mailEnabled": false,
                "mailNickname": mail_nickname(display_name),
                "groupTypes": [],
            }),
        );
        complete(
            AREA,
            "create_security_group",
            fetch(self.graph.as_ref(), request),
        )
    }
}
