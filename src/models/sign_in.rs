use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entry of the sign-in audit log. Read only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInLog {
    pub id: String,
    pub created_date_time: DateTime<Utc>,
    #[serde(default)]
    pub user_display_name: Option<String>,
    #[serde(default)]
    pub user_principal_name: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub app_display_name: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub client_app_used: Option<String>,
    pub status: SignInStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SignInLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mfa_detail: Option<MfaDetail>,
}

impl SignInLog {
    pub fn succeeded(&self) -> bool {
        self.status.error_code == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInStatus {
    /// `0` on success.
    pub error_code: i64,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub additional_details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInLocation {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country_or_region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MfaDetail {
    #[serde(default)]
    pub auth_method: Option<String>,
    #[serde(default)]
    pub auth_detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn failed_sign_in() {
        let log: SignInLog = serde_json::from_value(json!({
            "id": "s1",
            "createdDateTime": "2024-03-01T12:00:00Z",
            "userDisplayName": "Ada Lovelace",
            "userPrincipalName": "ada@contoso.onmicrosoft.com",
            "userId": "u1",
            "appDisplayName": "Portal",
            "ipAddress": "203.0.113.7",
            "clientAppUsed": "Browser",
            "status": {"errorCode": 50126, "failureReason": "Invalid username or password.", "additionalDetails": null},
            "location": {"city": "Dallas", "state": "Texas", "countryOrRegion": "US"},
            "mfaDetail": null
        }))
        .unwrap();

        assert!(!log.succeeded());
        assert_eq!(
            log.status.failure_reason.as_deref(),
            Some("Invalid username or password.")
        );
        assert_eq!(log.location.unwrap().city.as_deref(), Some("Dallas"));
        assert_eq!(log.mfa_detail, None);
    }
}
