//! In-process stores used by tests and local runs without MongoDB.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::models::{EntityKind, ImageRecord, User, UserChanges};
use crate::services::store::{EntityStore, IdentityStore};
use crate::services::ServiceError;

/// Identities plus hospital/doctor image records.
///
/// `user` images live on the identity itself, as in the `users` collection.
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<String, User>>,
    entities: RwLock<HashMap<(EntityKind, String), ImageRecord>>,
}

fn poisoned() -> ServiceError {
    ServiceError::StorageFailure(anyhow::anyhow!("in-memory store lock poisoned"))
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a hospital or doctor record (user records go through `insert`).
    pub fn seed_entity(&self, kind: EntityKind, id: &str, img: Option<&str>) {
        if let Ok(mut entities) = self.entities.write() {
            entities.insert(
                (kind, id.to_string()),
                ImageRecord {
                    id: id.to_string(),
                    img: img.map(str::to_string),
                },
            );
        }
    }

    pub fn user_count(&self) -> usize {
        self.users.read().map(|u| u.len()).unwrap_or_default()
    }
}

#[async_trait]
impl IdentityStore for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, ServiceError> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.get(id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, ServiceError> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        if users.values().any(|u| u.email == user.email) {
            return Err(ServiceError::EmailAlreadyRegistered);
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn update(&self, id: &str, changes: &UserChanges) -> Result<Option<User>, ServiceError> {
        let mut users = self.users.write().map_err(|_| poisoned())?;

        if let Some(email) = &changes.email {
            if users.values().any(|u| &u.email == email && u.id != id) {
                return Err(ServiceError::EmailAlreadyRegistered);
            }
        }

        Ok(users.get_mut(id).map(|user| {
            changes.apply(user);
            user.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<Option<User>, ServiceError> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        Ok(users.remove(id))
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn find_image(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Option<ImageRecord>, ServiceError> {
        match kind {
            EntityKind::User => Ok(self.find_by_id(id).await?.map(|u| ImageRecord {
                id: u.id,
                img: u.img,
            })),
            EntityKind::Hospital | EntityKind::Doctor => {
                let entities = self.entities.read().map_err(|_| poisoned())?;
                Ok(entities.get(&(kind, id.to_string())).cloned())
            }
        }
    }

    async fn set_image(
        &self,
        kind: EntityKind,
        id: &str,
        filename: &str,
    ) -> Result<Option<ImageRecord>, ServiceError> {
        match kind {
            EntityKind::User => {
                let changes = UserChanges {
                    img: Some(filename.to_string()),
                    ..Default::default()
                };
                Ok(self.update(id, &changes).await?.map(|u| ImageRecord {
                    id: u.id,
                    img: u.img,
                }))
            }
            EntityKind::Hospital | EntityKind::Doctor => {
                let mut entities = self.entities.write().map_err(|_| poisoned())?;
                Ok(entities.get_mut(&(kind, id.to_string())).map(|record| {
                    record.img = Some(filename.to_string());
                    record.clone()
                }))
            }
        }
    }
}
