use std::sync::Arc;

use crate::models::{Role, User, UserChanges};
use crate::services::guard::AuthorizationGuard;
use crate::services::store::IdentityStore;
use crate::services::ServiceError;

/// Profile fields a caller may submit.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

#[derive(Clone)]
pub struct UserService {
    identities: Arc<dyn IdentityStore>,
    guard: AuthorizationGuard,
}

impl UserService {
    pub fn new(identities: Arc<dyn IdentityStore>, guard: AuthorizationGuard) -> Self {
        Self { identities, guard }
    }

    /// Updates `target_id` on behalf of `caller_id`.
    ///
    /// Self or admin only; role changes are admin only; a Google identity keeps
    /// its email. Password and federated flag are never touched here.
    pub async fn update(
        &self,
        caller_id: &str,
        target_id: &str,
        update: ProfileUpdate,
    ) -> Result<User, ServiceError> {
        self.guard.require_admin_or_self(caller_id, target_id).await?;

        let target = self
            .identities
            .find_by_id(target_id)
            .await?
            .ok_or(ServiceError::NotFound("User"))?;

        let mut changes = UserChanges {
            name: update.name,
            ..Default::default()
        };

        if let Some(role) = update.role.filter(|role| *role != target.role) {
            self.guard.require_admin(caller_id).await?;
            changes.role = Some(role);
        }

        if let Some(email) = update.email.filter(|email| *email != target.email) {
            if target.google {
                return Err(ServiceError::FederatedEmailLocked);
            }
            if self.identities.find_by_email(&email).await?.is_some() {
                return Err(ServiceError::EmailAlreadyRegistered);
            }
            changes.email = Some(email);
        }

        let updated = self
            .identities
            .update(target_id, &changes)
            .await?
            .ok_or(ServiceError::NotFound("User"))?;

        tracing::info!(user_id = %target_id, caller_id = %caller_id, "User updated");
        Ok(updated)
    }

    /// Admin-only removal; returns the deleted record.
    pub async fn delete(&self, caller_id: &str, target_id: &str) -> Result<User, ServiceError> {
        self.guard.require_admin(caller_id).await?;

        let deleted = self
            .identities
            .delete(target_id)
            .await?
            .ok_or(ServiceError::NotFound("User"))?;

        tracing::info!(user_id = %target_id, caller_id = %caller_id, "User deleted");
        Ok(deleted)
    }
}
