//! Authentication method (MFA) management.

use std::sync::Arc;

use tracing::debug;

use crate::graph::error::GraphError;
use crate::graph::request::GraphRequest;
use crate::graph::{GraphTransport, fetch_page, send};
use crate::models::auth_method::RawAuthMethod;
use crate::models::{AuthMethod, AuthMethodType, EmailAuthMethod, PhoneAuthMethod, ResetOutcome};
use crate::result::{OperationError, OperationResult, complete, complete_unit};

const AREA: &str = "mfa";

pub const PARTIAL_FAILURE_CODE: &str = "PartialFailure";
pub const UNSUPPORTED_METHOD_CODE: &str = "UnsupportedMethodType";

pub struct MfaOperations<G> {
    graph: Arc<G>,
}

impl<G> MfaOperations<G>
where
    G: GraphTransport,
{
    pub fn new(graph: Arc<G>) -> Self {
        Self { graph }
    }

    /// Every method registered by the user, whatever its kind.
    pub fn list_methods(&self, user_id: &str) -> OperationResult<Vec<AuthMethod>> {
        complete(AREA, "list_methods", self.fetch_methods(user_id))
    }

    pub fn get_phone_methods(&self, user_id: &str) -> OperationResult<Vec<PhoneAuthMethod>> {
        let request = GraphRequest::get(["users", user_id, "authentication", "phoneMethods"]);
        let result = fetch_page(self.graph.as_ref(), request).map(|page| page.items);
        complete(AREA, "get_phone_methods", result)
    }

    pub fn get_email_methods(&self, user_id: &str) -> OperationResult<Vec<EmailAuthMethod>> {
        let request = GraphRequest::get(["users", user_id, "authentication", "emailMethods"]);
        let result = fetch_page(self.graph.as_ref(), request).map(|page| page.items);
        complete(AREA, "get_email_methods", result)
    }

    pub fn delete_phone_method(&self, user_id: &str, method_id: &str) -> OperationResult<()> {
        self.delete_method(user_id, &AuthMethodType::Phone, method_id)
    }

    pub fn delete_email_method(&self, user_id: &str, method_id: &str) -> OperationResult<()> {
        self.delete_method(user_id, &AuthMethodType::Email, method_id)
    }

    pub fn delete_microsoft_authenticator(
        &self,
        user_id: &str,
        method_id: &str,
    ) -> OperationResult<()> {
        self.delete_method(user_id, &AuthMethodType::MicrosoftAuthenticator, method_id)
    }

    pub fn delete_software_oath_method(
        &self,
        user_id: &str,
        method_id: &str,
    ) -> OperationResult<()> {
        self.delete_method(user_id, &AuthMethodType::SoftwareOath, method_id)
    }

    pub fn delete_fido2_method(&self, user_id: &str, method_id: &str) -> OperationResult<()> {
        self.delete_method(user_id, &AuthMethodType::Fido2, method_id)
    }

    pub fn delete_temporary_access_pass(
        &self,
        user_id: &str,
        method_id: &str,
    ) -> OperationResult<()> {
        self.delete_method(user_id, &AuthMethodType::TemporaryAccessPass, method_id)
    }

    /// Deletes one method through the sub-resource of its kind. Kinds without one, such as the
    /// password, fail without calling the service.
    pub fn delete_method(
        &self,
        user_id: &str,
        method_type: &AuthMethodType,
        method_id: &str,
    ) -> OperationResult<()> {
        match self.remove(user_id, method_type, method_id) {
            Ok(()) => OperationResult::done(),
            Err(DeleteError::Unsupported) => {
                OperationResult::failure(unsupported(method_type))
            }
            Err(DeleteError::Graph(err)) => complete_unit(AREA, "delete_method", Err(err)),
        }
    }

    /// Deletes every method of the user except the password, one after the other.
    ///
    /// A failed delete does not stop the others. The outcome lists every attempted method as
    /// `type:id` under `deleted` or `failed`, and is a `PartialFailure` when anything failed.
    pub fn reset_all_methods(&self, user_id: &str) -> OperationResult<ResetOutcome> {
        let methods = match self.fetch_methods(user_id) {
            Ok(methods) => methods,
            Err(err) => return complete(AREA, "reset_all_methods", Err(err)),
        };

        let mut outcome = ResetOutcome::default();
        for method in methods
            .iter()
            .filter(|m| m.method_type != AuthMethodType::Password)
        {
            match self.remove(user_id, &method.method_type, &method.id) {
                Ok(()) => outcome.deleted.push(method.tag()),
                Err(err) => {
                    debug!(user_id, method = %method.tag(), error = %err, "could not delete method");
                    outcome.failed.push(method.tag());
                }
            }
        }

        if outcome.failed.is_empty() {
            return OperationResult::ok(outcome);
        }
        let error = OperationError::new(
            PARTIAL_FAILURE_CODE,
            format!(
                "Deleted {}, failed {}",
                outcome.deleted.len(),
                outcome.failed.len()
            ),
        );
        OperationResult::partial(outcome, error)
    }

    fn fetch_methods(&self, user_id: &str) -> Result<Vec<AuthMethod>, GraphError> {
        let request = GraphRequest::get(["users", user_id, "authentication", "methods"]);
        fetch_page::<_, RawAuthMethod>(self.graph.as_ref(), request)
            .map(|page| page.items.into_iter().map(AuthMethod::from).collect())
    }

    fn remove(
        &self,
        user_id: &str,
        method_type: &AuthMethodType,
        method_id: &str,
    ) -> Result<(), DeleteError> {
        let segment = method_type
            .resource_segment()
            .ok_or(DeleteError::Unsupported)?;
        let request = GraphRequest::delete(["users", user_id, "authentication", segment, method_id]);
        send(self.graph.as_ref(), request).map_err(DeleteError::Graph)
    }
}

#[derive(Debug, thiserror::Error)]
enum DeleteError {
    #[error("method type cannot be deleted individually")]
    Unsupported,
    #[error(transparent)]
    Graph(GraphError),
}

fn unsupported(method_type: &AuthMethodType) -> OperationError {
    OperationError::new(
        UNSUPPORTED_METHOD_CODE,
        format!("Methods of type `{method_type}` cannot be deleted"),
    )
}
