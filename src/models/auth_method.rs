use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

const ODATA_TYPE_PREFIX: &str = "#microsoft.graph.";

/// Kind of a registered authentication method.
///
/// Discriminators the crate does not know about are kept verbatim in [`AuthMethodType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AuthMethodType {
    Phone,
    Email,
    MicrosoftAuthenticator,
    SoftwareOath,
    Fido2,
    Password,
    TemporaryAccessPass,
    Other(String),
}

impl AuthMethodType {
    /// Maps the `@odata.type` discriminator sent by Graph.
    pub fn from_odata_type(odata_type: &str) -> Self {
        let known = odata_type
            .strip_prefix(ODATA_TYPE_PREFIX)
            .and_then(|name| match name {
                "phoneAuthenticationMethod" => Some(Self::Phone),
                "emailAuthenticationMethod" => Some(Self::Email),
                "microsoftAuthenticatorAuthenticationMethod" => {
                    Some(Self::MicrosoftAuthenticator)
                }
                "softwareOathAuthenticationMethod" => Some(Self::SoftwareOath),
                "fido2AuthenticationMethod" => Some(Self::Fido2),
                "passwordAuthenticationMethod" => Some(Self::Password),
                "temporaryAccessPassAuthenticationMethod" => Some(Self::TemporaryAccessPass),
                _ => None,
            });
        known.unwrap_or_else(|| Self::Other(odata_type.to_string()))
    }

    /// Parses a canonical tag as returned by [`AuthMethodType::as_str`].
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "phone" => Self::Phone,
            "email" => Self::Email,
            "microsoftAuthenticator" => Self::MicrosoftAuthenticator,
            "softwareOath" => Self::SoftwareOath,
            "fido2" => Self::Fido2,
            "password" => Self::Password,
            "temporaryAccessPass" => Self::TemporaryAccessPass,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Phone => "phone",
            Self::Email => "email",
            Self::MicrosoftAuthenticator => "microsoftAuthenticator",
            Self::SoftwareOath => "softwareOath",
            Self::Fido2 => "fido2",
            Self::Password => "password",
            Self::TemporaryAccessPass => "temporaryAccessPass",
            Self::Other(raw) => raw,
        }
    }

    /// Sub-resource under `/users/{id}/authentication` holding methods of this kind, when they
    /// can be deleted individually.
    pub fn resource_segment(&self) -> Option<&'static str> {
        match self {
            Self::Phone => Some("phoneMethods"),
            Self::Email => Some("emailMethods"),
            Self::MicrosoftAuthenticator => Some("microsoftAuthenticatorMethods"),
            Self::SoftwareOath => Some("softwareOathMethods"),
            Self::Fido2 => Some("fido2Methods"),
            Self::TemporaryAccessPass => Some("temporaryAccessPassMethods"),
            Self::Password | Self::Other(_) => None,
        }
    }
}

impl fmt::Display for AuthMethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AuthMethodType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A registered method in the unified shape used across method kinds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthMethod {
    pub id: String,
    pub method_type: AuthMethodType,
    /// Phone number, email address or device name, depending on the kind.
    pub detail: String,
}

impl AuthMethod {
    /// `type:id` tag used when reporting bulk resets.
    pub fn tag(&self) -> String {
        format!("{}:{}", self.method_type, self.id)
    }
}

/// Method as listed by `/authentication/methods`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawAuthMethod {
    id: String,
    #[serde(rename = "@odata.type", default)]
    odata_type: String,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    email_address: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

impl From<RawAuthMethod> for AuthMethod {
    fn from(raw: RawAuthMethod) -> Self {
        let detail = [raw.phone_number, raw.email_address, raw.display_name]
            .into_iter()
            .flatten()
            .find(|d| !d.is_empty())
            .unwrap_or_default();
        AuthMethod {
            method_type: AuthMethodType::from_odata_type(&raw.odata_type),
            id: raw.id,
            detail,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneAuthMethod {
    pub id: String,
    pub phone_number: String,
    /// `mobile`, `alternateMobile` or `office`.
    pub phone_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms_sign_in_state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAuthMethod {
    pub id: String,
    pub email_address: String,
}

/// Outcome of resetting every method of a user, as `type:id` tags.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResetOutcome {
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
}
