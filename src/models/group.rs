use serde::{Deserialize, Serialize};

/// Fields requested whenever a group is read.
pub const GROUP_SELECT_FIELDS: &[&str] = &[
    "id",
    "displayName",
    "description",
    "groupTypes",
    "securityEnabled",
    "mailEnabled",
    "membershipRule",
];

pub const MEMBER_SELECT_FIELDS: &[&str] = &["id", "displayName", "userPrincipalName"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub group_types: Vec<String>,
    /// Only set for groups with dynamic membership.
    #[serde(default)]
    pub membership_rule: Option<String>,
    #[serde(default)]
    pub security_enabled: bool,
    #[serde(default)]
    pub mail_enabled: bool,
}

/// Member of a group as listed by `/groups/{id}/members`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Absent for members that are not users.
    #[serde(default)]
    pub user_principal_name: Option<String>,
}

/// Mail nickname derived from a display name: lower case, whitespace runs replaced by `-`.
pub fn mail_nickname(display_name: &str) -> String {
    let mut nickname = String::with_capacity(display_name.len());
    let mut in_whitespace = false;
    for c in display_name.to_lowercase().chars() {
        if !c.is_whitespace() {
            nickname.push(c);
        } else if !in_whitespace {
            nickname.push('-');
        }
        in_whitespace = c.is_whitespace();
    }
    nickname
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case("Deactivated Users", "deactivated-users")]
    #[case("Ops  On\tCall", "ops-on-call")]
    #[case("single", "single")]
    #[case(" Padded ", "-padded-")]
    fn nickname_from_display_name(#[case] display_name: &str, #[case] nickname: &str) {
        assert_eq!(mail_nickname(display_name), nickname);
    }

    #[test]
    fn group_deserialization() {
        let group: Group = serde_json::from_value(json!({
            "id": "g1",
            "displayName": "Deactivated Users",
            "description": null,
            "groupTypes": [],
            "securityEnabled": true,
            "mailEnabled": false
        }))
        .unwrap();

        assert_eq!(group.description, None);
        assert_eq!(group.membership_rule, None);
        assert!(group.security_enabled);
        assert!(!group.mail_enabled);
    }
}
