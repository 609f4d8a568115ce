use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Fields requested whenever a user is read.
pub const USER_SELECT_FIELDS: &[&str] = &[
    "id",
    "displayName",
    "userPrincipalName",
    "mail",
    "accountEnabled",
    "createdDateTime",
    "signInActivity",
    "identities",
    "jobTitle",
    "department",
    "companyName",
    "mobilePhone",
];

/// `signInType` of the identity holding the logon name of local accounts.
pub const USERNAME_SIGN_IN_TYPE: &str = "userName";

/// Password policies applied to every created account.
pub const CREATED_PASSWORD_POLICIES: &str = "DisablePasswordExpiration";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntraUser {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub user_principal_name: Option<String>,
    #[serde(default)]
    pub mail: Option<String>,
    #[serde(default)]
    pub account_enabled: Option<bool>,
    #[serde(default)]
    pub created_date_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_in_activity: Option<SignInActivity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<ObjectIdentity>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub mobile_phone: Option<String>,
}

impl EntraUser {
    /// Logon name of a local account, taken from its `userName` identity.
    pub fn username(&self) -> Option<&str> {
        self.identities
            .iter()
            .find(|i| i.sign_in_type == USERNAME_SIGN_IN_TYPE)
            .map(|i| i.issuer_assigned_id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInActivity {
    #[serde(default)]
    pub last_sign_in_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_non_interactive_sign_in_date_time: Option<DateTime<Utc>>,
}

/// Sign-in identity linked to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectIdentity {
    pub sign_in_type: String,
    pub issuer: String,
    pub issuer_assigned_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    pub display_name: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Defaults to `true`.
    #[serde(default)]
    pub force_change_password: Option<bool>,
    #[serde(default)]
    pub mobile_phone: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

impl CreateUserInput {
    /// Name of the first blank required field, if any.
    pub(crate) fn missing_field(&self) -> Option<&'static str> {
        [
            ("displayName", &self.display_name),
            ("username", &self.username),
            ("password", &self.password),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }

    pub(crate) fn to_body(&self, issuer_domain: &str) -> Value {
        let mut body = json!({
            "displayName": self.display_name,
            "accountEnabled": true,
            "identities": [{
                "signInType": USERNAME_SIGN_IN_TYPE,
                "issuer": issuer_domain,
                "issuerAssignedId": self.username,
            }],
            "passwordProfile": {
                "password": self.password,
                "forceChangePasswordNextSignIn": self.force_change_password.unwrap_or(true),
            },
            "passwordPolicies": CREATED_PASSWORD_POLICIES,
        });
        if let Some(fields) = body.as_object_mut() {
            insert_present(fields, "mail", &self.email);
            insert_present(fields, "mobilePhone", &self.mobile_phone);
            insert_present(fields, "companyName", &self.company_name);
            insert_present(fields, "jobTitle", &self.job_title);
            insert_present(fields, "department", &self.department);
        }
        body
    }
}

/// Partial update. `None` leaves a field untouched; for the nullable fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateUserInput {
    pub display_name: Option<String>,
    pub account_enabled: Option<bool>,
    pub mobile_phone: Option<Option<String>>,
    pub company_name: Option<Option<String>>,
    pub job_title: Option<Option<String>>,
    pub department: Option<Option<String>>,
}

impl UpdateUserInput {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn to_body(&self) -> Value {
        let mut fields = Map::new();
        if let Some(display_name) = &self.display_name {
            fields.insert("displayName".into(), json!(display_name));
        }
        if let Some(enabled) = self.account_enabled {
            fields.insert("accountEnabled".into(), json!(enabled));
        }
        for (name, value) in [
            ("mobilePhone", &self.mobile_phone),
            ("companyName", &self.company_name),
            ("jobTitle", &self.job_title),
            ("department", &self.department),
        ] {
            if let Some(value) = value {
                fields.insert(name.into(), json!(value));
            }
        }
        Value::Object(fields)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetInput {
    pub user_id: String,
    pub new_password: String,
    /// Defaults to `true`.
    #[serde(default)]
    pub force_change_on_next_sign_in: Option<bool>,
}

impl PasswordResetInput {
    pub(crate) fn to_body(&self) -> Value {
        json!({
            "passwordProfile": {
                "password": self.new_password,
                "forceChangePasswordNextSignIn": self.force_change_on_next_sign_in.unwrap_or(true),
            }
        })
    }
}

fn insert_present(fields: &mut Map<String, Value>, name: &str, value: &Option<String>) {
    if let Some(value) = value {
        fields.insert(name.to_string(), json!(value));
    }
}
