//! Principal resolution
//!
//! Maps a verified token subject onto a stored user. A token naming a known
//! role is looked up in that role's collection only; a token without one is
//! tried against each collection in `Role::FALLBACK_ORDER`.

use crate::auth::{Role, TokenSubject};
use crate::error::AppError;
use crate::users::{CredentialStore, Principal, UserRecord};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Clone)]
pub struct PrincipalResolver {
    store: Arc<dyn CredentialStore>,
    lookup_timeout: Duration,
}

impl PrincipalResolver {
    pub fn new(store: Arc<dyn CredentialStore>, lookup_timeout: Duration) -> Self {
        Self {
            store,
            lookup_timeout,
        }
    }

    /// Resolve the subject to a principal. `NotFound` when no collection holds it.
    pub async fn resolve(&self, subject: &TokenSubject) -> Result<Principal, AppError> {
        let roles: &[Role] = match &subject.role {
            Some(role) => std::slice::from_ref(role),
            None => &Role::FALLBACK_ORDER,
        };

        for role in roles {
            if let Some(user) = self.find(*role, &subject.subject_id).await? {
                return Ok(Principal::from(user));
            }
        }

        debug!(subject = %subject.subject_id, "no principal for token subject");
        Err(AppError::NotFound("User not found".to_string()))
    }

    async fn find(&self, role: Role, id: &str) -> Result<Option<UserRecord>, AppError> {
        tokio::time::timeout(self.lookup_timeout, self.store.find_by_id(role, id))
            .await
            .map_err(|_| AppError::Internal(format!("{} lookup timed out", role.collection())))?
    }
}
