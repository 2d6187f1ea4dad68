use async_trait::async_trait;

use crate::models::{EntityKind, ImageRecord, User, UserChanges};
use crate::services::ServiceError;

/// Persistence of identities, keyed by id with a unique email.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, ServiceError>;

    /// Fails with `EmailAlreadyRegistered` when the email is taken.
    async fn insert(&self, user: User) -> Result<User, ServiceError>;

    /// Applies `changes` and returns the updated record, or `None` if absent.
    async fn update(&self, id: &str, changes: &UserChanges) -> Result<Option<User>, ServiceError>;

    /// Removes the record and returns it, or `None` if absent.
    async fn delete(&self, id: &str) -> Result<Option<User>, ServiceError>;

    async fn health_check(&self) -> Result<(), ServiceError>;
}

/// Image field access for every entity kind that owns an image.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn find_image(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Option<ImageRecord>, ServiceError>;

    /// Single-document write of `img`; `None` if the entity does not exist.
    async fn set_image(
        &self,
        kind: EntityKind,
        id: &str,
        filename: &str,
    ) -> Result<Option<ImageRecord>, ServiceError>;
}
