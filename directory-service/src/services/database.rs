use async_trait::async_trait;
use mongodb::{
    bson::{doc, to_bson, Document},
    error::{ErrorKind, WriteFailure},
    options::{FindOneAndUpdateOptions, FindOneOptions, IndexOptions, ReturnDocument},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

use crate::models::{EntityKind, ImageRecord, User, UserChanges};
use crate::services::store::{EntityStore, IdentityStore};
use crate::services::ServiceError;

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to MongoDB");
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for directory-service");

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .name("email_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.users()
            .create_index(email_index, None)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to create unique email index on users");
                AppError::from(e)
            })?;
        tracing::info!("Created unique index on users.email");

        Ok(())
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    /// Any entity collection, viewed through its image field only.
    pub fn images(&self, kind: EntityKind) -> Collection<ImageRecord> {
        self.db.collection(kind.collection())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

fn map_write_error(err: mongodb::error::Error) -> ServiceError {
    if is_duplicate_key(&err) {
        ServiceError::EmailAlreadyRegistered
    } else {
        ServiceError::from(err)
    }
}

fn set_document(changes: &UserChanges) -> Result<Document, ServiceError> {
    let mut set = Document::new();
    if let Some(name) = &changes.name {
        set.insert("name", name.as_str());
    }
    if let Some(email) = &changes.email {
        set.insert("email", email.as_str());
    }
    if let Some(role) = changes.role {
        let role = to_bson(&role).map_err(|e| ServiceError::Internal(anyhow::anyhow!(e)))?;
        set.insert("role", role);
    }
    if let Some(img) = &changes.img {
        set.insert("img", img.as_str());
    }
    if let Some(google) = changes.google {
        set.insert("google", google);
    }
    Ok(set)
}

fn return_updated() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

#[async_trait]
impl IdentityStore for MongoDb {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.users().find_one(doc! { "email": email }, None).await?)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.users().find_one(doc! { "_id": id }, None).await?)
    }

    async fn insert(&self, user: User) -> Result<User, ServiceError> {
        self.users()
            .insert_one(&user, None)
            .await
            .map_err(map_write_error)?;
        Ok(user)
    }

    async fn update(&self, id: &str, changes: &UserChanges) -> Result<Option<User>, ServiceError> {
        if changes.is_empty() {
            return self.find_by_id(id).await;
        }

        self.users()
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": set_document(changes)? },
                return_updated(),
            )
            .await
            .map_err(map_write_error)
    }

    async fn delete(&self, id: &str) -> Result<Option<User>, ServiceError> {
        Ok(self
            .users()
            .find_one_and_delete(doc! { "_id": id }, None)
            .await?)
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "MongoDB health check failed");
                ServiceError::from(e)
            })?;
        Ok(())
    }
}

#[async_trait]
impl EntityStore for MongoDb {
    async fn find_image(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Option<ImageRecord>, ServiceError> {
        let options = FindOneOptions::builder()
            .projection(doc! { "_id": 1, "img": 1 })
            .build();

        Ok(self
            .images(kind)
            .find_one(doc! { "_id": id }, options)
            .await?)
    }

    async fn set_image(
        &self,
        kind: EntityKind,
        id: &str,
        filename: &str,
    ) -> Result<Option<ImageRecord>, ServiceError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .projection(doc! { "_id": 1, "img": 1 })
            .build();

        Ok(self
            .images(kind)
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { "img": filename } },
                options,
            )
            .await?)
    }
}
