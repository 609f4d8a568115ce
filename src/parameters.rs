use std::env;
use std::env::VarError;
use std::path::PathBuf;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::{Args, Error, Subcommand, ValueEnum};
use url::Url;

use crate::environment::CloudEnvironment;
use crate::http::config::{HttpConfig, ProxyConfig, ProxyError};
use crate::models::{CreateUserInput, PasswordResetInput, UpdateUserInput};
use crate::result::ListOptions;
use crate::sign_in_logs::SignInQuery;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// User accounts: lookup, provisioning and lifecycle.
    Users {
        #[command(subcommand)]
        action: UserCommands,
    },
    /// Registered authentication methods.
    Mfa {
        #[command(subcommand)]
        action: MfaCommands,
    },
    /// Groups and group membership.
    Groups {
        #[command(subcommand)]
        action: GroupCommands,
    },
    /// Sign-in audit log.
    SignIns {
        #[command(subcommand)]
        action: SignInCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Search users whose display name, mail or principal name starts with the query
    Search { query: String },
    /// List users ordered by display name
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Get a user by id
    Get { user_id: String },
    /// Get a local account by its logon name
    GetByUsername { username: String },
    /// Create a local account with a temporary password
    Create(CreateUserArgs),
    /// Update the provided fields of a user
    Update(UpdateUserArgs),
    /// Set a new password
    ResetPassword {
        user_id: String,
        #[arg(long)]
        new_password: String,
        /// Do not require a password change on next sign-in
        #[arg(long)]
        no_force_change: bool,
    },
    Enable { user_id: String },
    Disable { user_id: String },
    /// Disable the account and add it to the deactivated group
    Deactivate { user_id: String },
    /// Remove the account from the deactivated group and enable it
    Reactivate { user_id: String },
    /// Soft delete the account (restorable for 30 days)
    Delete { user_id: String },
    /// List the groups the user belongs to
    Groups { user_id: String },
}

#[derive(Args, Debug, Clone)]
pub struct CreateUserArgs {
    #[arg(long)]
    display_name: String,
    /// Logon name of the local account
    #[arg(long)]
    username: String,
    /// Temporary password
    #[arg(long)]
    password: String,
    #[arg(long)]
    email: Option<String>,
    /// Do not require a password change on first sign-in
    #[arg(long)]
    no_force_change_password: bool,
    #[arg(long)]
    mobile_phone: Option<String>,
    #[arg(long)]
    company_name: Option<String>,
    #[arg(long)]
    job_title: Option<String>,
    #[arg(long)]
    department: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct UpdateUserArgs {
    user_id: String,
    #[arg(long)]
    display_name: Option<String>,
    #[arg(long)]
    account_enabled: Option<bool>,
    #[arg(long, conflicts_with = "clear_mobile_phone")]
    mobile_phone: Option<String>,
    #[arg(long)]
    clear_mobile_phone: bool,
    #[arg(long, conflicts_with = "clear_company_name")]
    company_name: Option<String>,
    #[arg(long)]
    clear_company_name: bool,
    #[arg(long, conflicts_with = "clear_job_title")]
    job_title: Option<String>,
    #[arg(long)]
    clear_job_title: bool,
    #[arg(long, conflicts_with = "clear_department")]
    department: Option<String>,
    #[arg(long)]
    clear_department: bool,
}

#[derive(Subcommand, Debug)]
pub enum MfaCommands {
    /// List every registered method
    List { user_id: String },
    /// List phone methods
    Phone { user_id: String },
    /// List email methods
    Email { user_id: String },
    /// Delete one method
    Delete {
        user_id: String,
        /// Method type tag, e.g. phone, email, microsoftAuthenticator, softwareOath, fido2
        #[arg(long)]
        method_type: String,
        #[arg(long)]
        method_id: String,
    },
    /// Delete every method except the password
    Reset { user_id: String },
}

#[derive(Subcommand, Debug)]
pub enum GroupCommands {
    Get { group_id: String },
    /// Search groups whose display name starts with the query
    Search {
        query: String,
        #[arg(long)]
        top: Option<u32>,
    },
    Members {
        group_id: String,
        #[command(flatten)]
        page: PageArgs,
    },
    AddMember { group_id: String, user_id: String },
    RemoveMember { group_id: String, user_id: String },
    IsMember { group_id: String, user_id: String },
    /// Create a security group, e.g. the deactivated users group
    CreateSecurityGroup {
        #[arg(long)]
        display_name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum SignInCommands {
    /// Sign-ins of a user (defaults: last 7 days, 25 entries)
    User {
        user_id: String,
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Failed sign-ins of every user (defaults: last day, 50 entries)
    Failed {
        #[command(flatten)]
        window: WindowArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct PageArgs {
    /// Page size
    #[arg(long)]
    top: Option<u32>,
    /// Continuation link returned by the previous page
    #[arg(long)]
    next_link: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct WindowArgs {
    #[arg(long)]
    top: Option<u32>,
    /// How many days back to look
    #[arg(long)]
    days_back: Option<u32>,
    /// Continuation link returned by the previous page
    #[arg(long)]
    next_link: Option<String>,
}

#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum Environments {
    #[value(name = "global")]
    Global,
    #[value(name = "usgov")]
    UsGov,
    #[value(name = "china")]
    China,
    #[value(name = "custom")]
    Custom,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ExternalEndpoints {
    /// Custom identity platform root. Required with '--environment custom'.
    #[arg(long)]
    login_endpoint: Option<String>,

    /// Custom Graph root. Required with '--environment custom'.
    #[arg(long)]
    graph_endpoint: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct HttpArgs {
    /// Proxy url, `HTTPS_PROXY`/`HTTP_PROXY` are used when unset
    #[arg(long, global = true)]
    proxy_url: Option<String>,
    /// CA certificate bundle (PEM) trusted for the proxy
    #[arg(long, global = true)]
    proxy_ca_bundle_file: Option<PathBuf>,
    /// Directory of `.pem` CA certificates trusted for the proxy
    #[arg(long, global = true)]
    proxy_ca_bundle_dir: Option<PathBuf>,
    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
}

impl From<PageArgs> for ListOptions {
    fn from(args: PageArgs) -> Self {
        ListOptions {
            top: args.top,
            next_link: args.next_link,
        }
    }
}

impl From<WindowArgs> for SignInQuery {
    fn from(args: WindowArgs) -> Self {
        SignInQuery {
            top: args.top,
            days_back: args.days_back,
            next_link: args.next_link,
        }
    }
}

impl From<CreateUserArgs> for CreateUserInput {
    fn from(args: CreateUserArgs) -> Self {
        CreateUserInput {
            display_name: args.display_name,
            username: args.username,
            password: args.password,
            email: args.email,
            force_change_password: Some(!args.no_force_change_password),
            mobile_phone: args.mobile_phone,
            company_name: args.company_name,
            job_title: args.job_title,
            department: args.department,
        }
    }
}

impl UpdateUserArgs {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn input(&self) -> UpdateUserInput {
        UpdateUserInput {
            display_name: self.display_name.clone(),
            account_enabled: self.account_enabled,
            mobile_phone: nullable(&self.mobile_phone, self.clear_mobile_phone),
            company_name: nullable(&self.company_name, self.clear_company_name),
            job_title: nullable(&self.job_title, self.clear_job_title),
            department: nullable(&self.department, self.clear_department),
        }
    }
}

fn nullable(value: &Option<String>, clear: bool) -> Option<Option<String>> {
    if clear {
        return Some(None);
    }
    value.clone().map(Some)
}

pub fn password_reset_input(
    user_id: String,
    new_password: String,
    no_force_change: bool,
) -> PasswordResetInput {
    PasswordResetInput {
        user_id,
        new_password,
        force_change_on_next_sign_in: Some(!no_force_change),
    }
}

pub fn select_environment(
    environment: Environments,
    endpoints: ExternalEndpoints,
) -> Result<CloudEnvironment, Error> {
    match environment {
        Environments::Global => Ok(CloudEnvironment::Global),
        Environments::UsGov => Ok(CloudEnvironment::UsGovernment),
        Environments::China => Ok(CloudEnvironment::China),
        Environments::Custom => {
            let login_endpoint = parse_endpoint("login", endpoints.login_endpoint)?;
            let graph_endpoint = parse_endpoint("graph", endpoints.graph_endpoint)?;

            Ok(CloudEnvironment::Custom {
                login_endpoint,
                graph_endpoint,
            })
        }
    }
}

fn parse_endpoint(name: &str, value: Option<String>) -> Result<Url, Error> {
    let value = value.unwrap_or_default();
    Url::parse(&value)
        .map_err(|e| Error::raw(ErrorKind::Format, format!("Invalid {name} endpoint: {e}")))
}

/// Builds the HTTP configuration, taking the proxy from the environment when no url is given.
pub fn build_http_config(args: &HttpArgs) -> Result<HttpConfig, Error> {
    http_config_with_env(args, env::var)
}

fn http_config_with_env<F>(args: &HttpArgs, env_var: F) -> Result<HttpConfig, Error>
where
    F: Fn(&'static str) -> Result<String, VarError>,
{
    let proxy = match args.proxy_url.as_deref().filter(|url| !url.trim().is_empty()) {
        Some(url) => Some(ProxyConfig::new(url.trim())?),
        None => ProxyConfig::from_env_with(env_var)?,
    };
    let bundle = (
        args.proxy_ca_bundle_file.clone(),
        args.proxy_ca_bundle_dir.clone(),
    );
    let proxy = match (proxy, bundle) {
        (Some(proxy), (file, dir)) => Some(proxy.with_ca_bundle(file, dir)),
        (None, (None, None)) => None,
        (None, _) => return Err(ProxyError::CaBundleWithoutProxy.into()),
    };

    let config = HttpConfig::default().with_proxy(proxy);
    Ok(match args.timeout_secs {
        Some(secs) => config.with_timeout(Duration::from_secs(secs)),
        None => config,
    })
}
