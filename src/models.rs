//! Directory objects as exchanged with Graph.
pub mod auth_method;
pub mod group;
pub mod sign_in;
pub mod user;

pub use auth_method::{AuthMethod, AuthMethodType, EmailAuthMethod, PhoneAuthMethod, ResetOutcome};
pub use group::{Group, GroupMember};
pub use sign_in::SignInLog;
pub use user::{CreateUserInput, EntraUser, PasswordResetInput, UpdateUserInput};
