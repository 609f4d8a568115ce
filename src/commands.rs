//! Dispatch of parsed CLI commands to a [`DirectorySdk`].

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::graph::GraphTransport;
use crate::models::AuthMethodType;
use crate::parameters::{
    Commands, GroupCommands, MfaCommands, SignInCommands, UserCommands, password_reset_input,
};
use crate::result::OperationResult;
use crate::sdk::DirectorySdk;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("rendering result: `{0}`")]
    Render(#[from] serde_json::Error),
}

/// Rendered result of one command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    pub success: bool,
    pub body: Value,
}

impl CommandOutput {
    fn render<T: Serialize>(result: OperationResult<T>) -> Result<Self, CommandError> {
        Ok(Self {
            success: result.success,
            body: serde_json::to_value(&result)?,
        })
    }

    pub fn to_pretty_string(&self) -> Result<String, CommandError> {
        Ok(serde_json::to_string_pretty(&self.body)?)
    }
}

pub fn run<G>(sdk: &DirectorySdk<G>, command: Commands) -> Result<CommandOutput, CommandError>
where
    G: GraphTransport,
{
    match command {
        Commands::Users { action } => run_users(sdk, action),
        Commands::Mfa { action } => run_mfa(sdk, action),
        Commands::Groups { action } => run_groups(sdk, action),
        Commands::SignIns { action } => run_sign_ins(sdk, action),
    }
}

fn run_users<G: GraphTransport>(
    sdk: &DirectorySdk<G>,
    action: UserCommands,
) -> Result<CommandOutput, CommandError> {
    let users = &sdk.users;
    match action {
        UserCommands::Search { query } => CommandOutput::render(users.search(&query)),
        UserCommands::List { page } => CommandOutput::render(users.list(page.into())),
        UserCommands::Get { user_id } => CommandOutput::render(users.get_by_id(&user_id)),
        UserCommands::GetByUsername { username } => {
            CommandOutput::render(users.get_by_username(&username))
        }
        UserCommands::Create(args) => CommandOutput::render(users.create(&args.into())),
        UserCommands::Update(args) => {
            CommandOutput::render(users.update(args.user_id(), &args.input()))
        }
        UserCommands::ResetPassword {
            user_id,
            new_password,
            no_force_change,
        } => {
            let input = password_reset_input(user_id, new_password, no_force_change);
            CommandOutput::render(users.reset_password(&input))
        }
        UserCommands::Enable { user_id } => CommandOutput::render(users.enable(&user_id)),
        UserCommands::Disable { user_id } => CommandOutput::render(users.disable(&user_id)),
        UserCommands::Deactivate { user_id } => CommandOutput::render(users.deactivate(&user_id)),
        UserCommands::Reactivate { user_id } => CommandOutput::render(users.reactivate(&user_id)),
        UserCommands::Delete { user_id } => CommandOutput::render(users.delete(&user_id)),
        UserCommands::Groups { user_id } => CommandOutput::render(users.get_groups(&user_id)),
    }
}

fn run_mfa<G: GraphTransport>(
    sdk: &DirectorySdk<G>,
    action: MfaCommands,
) -> Result<CommandOutput, CommandError> {
    let mfa = &sdk.mfa;
    match action {
        MfaCommands::List { user_id } => CommandOutput::render(mfa.list_methods(&user_id)),
        MfaCommands::Phone { user_id } => CommandOutput::render(mfa.get_phone_methods(&user_id)),
        MfaCommands::Email { user_id } => CommandOutput::render(mfa.get_email_methods(&user_id)),
        MfaCommands::Delete {
            user_id,
            method_type,
            method_id,
        } => {
            let (user, id) = (user_id.as_str(), method_id.as_str());
            let result = match AuthMethodType::from_tag(&method_type) {
                AuthMethodType::Phone => mfa.delete_phone_method(user, id),
                AuthMethodType::Email => mfa.delete_email_method(user, id),
                AuthMethodType::MicrosoftAuthenticator => {
                    mfa.delete_microsoft_authenticator(user, id)
                }
                AuthMethodType::SoftwareOath => mfa.delete_software_oath_method(user, id),
                AuthMethodType::Fido2 => mfa.delete_fido2_method(user, id),
                AuthMethodType::TemporaryAccessPass => mfa.delete_temporary_access_pass(user, id),
                other => mfa.delete_method(user, &other, id),
            };
            CommandOutput::render(result)
        }
        MfaCommands::Reset { user_id } => CommandOutput::render(mfa.reset_all_methods(&user_id)),
    }
}

fn run_groups<G: GraphTransport>(
    sdk: &DirectorySdk<G>,
    action: GroupCommands,
) -> Result<CommandOutput, CommandError> {
    let groups = &sdk.groups;
    match action {
        GroupCommands::Get { group_id } => CommandOutput::render(groups.get_by_id(&group_id)),
        GroupCommands::Search { query, top } => CommandOutput::render(groups.search(&query, top)),
        GroupCommands::Members { group_id, page } => {
            CommandOutput::render(groups.list_members(&group_id, page.into()))
        }
        GroupCommands::AddMember { group_id, user_id } => {
            CommandOutput::render(groups.add_member(&group_id, &user_id))
        }
        GroupCommands::RemoveMember { group_id, user_id } => {
            CommandOutput::render(groups.remove_member(&group_id, &user_id))
        }
        GroupCommands::IsMember { group_id, user_id } => {
            CommandOutput::render(groups.is_member(&group_id, &user_id))
        }
        GroupCommands::CreateSecurityGroup {
            display_name,
            description,
        } => CommandOutput::render(groups.create_security_group(&display_name, &description)),
    }
}

fn run_sign_ins<G: GraphTransport>(
    sdk: &DirectorySdk<G>,
    action: SignInCommands,
) -> Result<CommandOutput, CommandError> {
    let logs = &sdk.sign_in_logs;
    match action {
        SignInCommands::User { user_id, window } => {
            CommandOutput::render(logs.get_by_user(&user_id, window.into()))
        }
        SignInCommands::Failed { window } => {
            CommandOutput::render(logs.get_failed_sign_ins(window.into()))
        }
    }
}
