use url::Url;

// Known national cloud endpoints.
const GLOBAL_LOGIN_ENDPOINT_STR: &str = "https://login.microsoftonline.com";
const GLOBAL_GRAPH_ENDPOINT_STR: &str = "https://graph.microsoft.com";

const US_GOV_LOGIN_ENDPOINT_STR: &str = "https://login.microsoftonline.us";
const US_GOV_GRAPH_ENDPOINT_STR: &str = "https://graph.microsoft.us";

const CHINA_LOGIN_ENDPOINT_STR: &str = "https://login.chinacloudapi.cn";
const CHINA_GRAPH_ENDPOINT_STR: &str = "https://microsoftgraph.chinacloudapi.cn";

/// Graph API version every resource path is resolved against.
pub const GRAPH_API_VERSION: &str = "v1.0";

/// Represents the cloud hosting the directory tenant.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CloudEnvironment {
    #[default]
    Global,
    UsGovernment,
    China,
    Custom {
        login_endpoint: Url,
        graph_endpoint: Url,
    },
}

impl TryFrom<&str> for CloudEnvironment {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "global" => Ok(Self::Global),
            "usgov" | "usgovernment" => Ok(Self::UsGovernment),
            "china" => Ok(Self::China),
            _ => Err(format!("Invalid cloud environment: {value}")),
        }
    }
}

impl CloudEnvironment {
    /// Root of the identity platform, e.g. `https://login.microsoftonline.com`.
    pub fn login_endpoint(&self) -> Url {
        match self {
            Self::Global => known_url(GLOBAL_LOGIN_ENDPOINT_STR),
            Self::UsGovernment => known_url(US_GOV_LOGIN_ENDPOINT_STR),
            Self::China => known_url(CHINA_LOGIN_ENDPOINT_STR),
            Self::Custom { login_endpoint, .. } => login_endpoint.to_owned(),
        }
    }

    /// Root of the Graph service, e.g. `https://graph.microsoft.com`.
    pub fn graph_endpoint(&self) -> Url {
        match self {
            Self::Global => known_url(GLOBAL_GRAPH_ENDPOINT_STR),
            Self::UsGovernment => known_url(US_GOV_GRAPH_ENDPOINT_STR),
            Self::China => known_url(CHINA_GRAPH_ENDPOINT_STR),
            Self::Custom { graph_endpoint, .. } => graph_endpoint.to_owned(),
        }
    }

    /// OAuth2 v2 token endpoint for the given tenant.
    pub fn token_endpoint(&self, tenant_id: &str) -> Url {
        let mut url = self.login_endpoint();
        extend_path(&mut url, &[tenant_id, "oauth2", "v2.0", "token"]);
        url
    }

    /// Versioned Graph base every resource path is appended to.
    pub fn graph_api_base(&self) -> Url {
        let mut url = self.graph_endpoint();
        extend_path(&mut url, &[GRAPH_API_VERSION]);
        url
    }

    /// The `.default` scope requested in the client credentials grant.
    pub fn default_scope(&self) -> String {
        format!(
            "{}/.default",
            self.graph_endpoint().as_str().trim_end_matches('/')
        )
    }
}

fn known_url(value: &str) -> Url {
    Url::parse(value).expect("constant valid url value")
}

/// Appends percent-encoded segments to the url path, ignoring any trailing slash.
pub(crate) fn extend_path(url: &mut Url, segments: &[&str]) {
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
}
