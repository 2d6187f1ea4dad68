//! Role and ownership checks. Decisions only; nothing here writes.

use std::sync::Arc;

use crate::models::{Role, User};
use crate::services::store::IdentityStore;
use crate::services::ServiceError;

#[derive(Clone)]
pub struct AuthorizationGuard {
    identities: Arc<dyn IdentityStore>,
}

impl AuthorizationGuard {
    pub fn new(identities: Arc<dyn IdentityStore>) -> Self {
        Self { identities }
    }

    async fn caller(&self, caller_id: &str) -> Result<User, ServiceError> {
        self.identities.find_by_id(caller_id).await?.ok_or_else(|| {
            tracing::warn!(user_id = %caller_id, "Token is valid but the identity no longer exists");
            ServiceError::NotFound("User")
        })
    }

    /// Loads the caller and requires the `ADMIN` role.
    pub async fn require_admin(&self, caller_id: &str) -> Result<User, ServiceError> {
        let caller = self.caller(caller_id).await?;
        match caller.role {
            Role::Admin => Ok(caller),
            Role::User => {
                tracing::warn!(user_id = %caller_id, "Admin role required");
                Err(ServiceError::Forbidden)
            }
        }
    }

    /// Callers may act on themselves; anyone else needs the `ADMIN` role.
    pub async fn require_admin_or_self(
        &self,
        caller_id: &str,
        target_id: &str,
    ) -> Result<(), ServiceError> {
        if caller_id == target_id {
            return Ok(());
        }

        self.require_admin(caller_id).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::InMemoryStore;

    async fn setup() -> (AuthorizationGuard, User, User) {
        let store = Arc::new(InMemoryStore::new());

        let user = store
            .insert(User::new("U".into(), "u@x.com".into(), "h".into()))
            .await
            .unwrap();
        let mut admin = User::new("A".into(), "a@x.com".into(), "h".into());
        admin.role = Role::Admin;
        let admin = store.insert(admin).await.unwrap();

        (AuthorizationGuard::new(store), user, admin)
    }

    #[tokio::test]
    async fn require_admin_follows_role() {
        let (guard, user, admin) = setup().await;

        assert_eq!(guard.require_admin(&admin.id).await.unwrap().id, admin.id);
        assert!(matches!(
            guard.require_admin(&user.id).await,
            Err(ServiceError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn require_admin_for_deleted_identity_is_not_found() {
        let (guard, _, _) = setup().await;
        assert!(matches!(
            guard.require_admin("gone").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn self_access_needs_no_role() {
        let (guard, user, admin) = setup().await;

        assert!(guard.require_admin_or_self(&user.id, &user.id).await.is_ok());
        assert!(guard.require_admin_or_self(&admin.id, &user.id).await.is_ok());
        assert!(matches!(
            guard.require_admin_or_self(&user.id, &admin.id).await,
            Err(ServiceError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn ownership_is_exact_id_match() {
        let (guard, user, _) = setup().await;
        let prefix = &user.id[..8];
        assert!(matches!(
            guard.require_admin_or_self(&user.id, prefix).await,
            Err(ServiceError::Forbidden)
        ));
    }
}
