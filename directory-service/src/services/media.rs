//! Image files and the entity records that point at them.

use std::sync::Arc;
use uuid::Uuid;

use crate::models::media::{content_type_for, image_extension, is_plain_filename};
use crate::models::EntityKind;
use crate::services::metrics::record_image_association;
use crate::services::storage::FileStore;
use crate::services::store::EntityStore;
use crate::services::ServiceError;

/// Served when a requested image does not exist.
pub const PLACEHOLDER_IMAGE: &str = "no-img.jpg";

/// Bytes and content type of a stored image.
#[derive(Debug)]
pub struct StoredImage {
    pub data: Vec<u8>,
    pub content_type: &'static str,
}

#[derive(Clone)]
pub struct MediaService {
    entities: Arc<dyn EntityStore>,
    files: Arc<dyn FileStore>,
}

/// Old image values that name a file we own; URLs (provider avatars) do not.
fn owned_file(old: Option<&str>) -> Option<&str> {
    old.filter(|name| !name.is_empty())
        .filter(|name| !name.starts_with("http://") && !name.starts_with("https://"))
        .filter(|name| is_plain_filename(name))
}

impl MediaService {
    pub fn new(entities: Arc<dyn EntityStore>, files: Arc<dyn FileStore>) -> Self {
        Self { entities, files }
    }

    /// Points the entity's image at `filename`, then removes the file it replaced.
    ///
    /// Returns `false` when the entity does not exist; nothing is changed then.
    /// Removal of the old file is best-effort and happens only after the new
    /// value is stored.
    pub async fn associate_image(
        &self,
        kind: EntityKind,
        entity_id: &str,
        filename: &str,
    ) -> Result<bool, ServiceError> {
        let Some(record) = self.entities.find_image(kind, entity_id).await? else {
            tracing::warn!(kind = %kind, entity_id = %entity_id, "No entity to associate image with");
            record_image_association(kind, "missing");
            return Ok(false);
        };

        if self
            .entities
            .set_image(kind, entity_id, filename)
            .await?
            .is_none()
        {
            tracing::warn!(kind = %kind, entity_id = %entity_id, "Entity removed before image was associated");
            record_image_association(kind, "missing");
            return Ok(false);
        }

        if let Some(old) = owned_file(record.img.as_deref()).filter(|old| *old != filename) {
            self.remove_file(kind, old).await;
        }

        tracing::info!(kind = %kind, entity_id = %entity_id, filename = %filename, "Image associated");
        record_image_association(kind, "associated");
        Ok(true)
    }

    async fn remove_file(&self, kind: EntityKind, old: &str) {
        let key = kind.image_key(old);

        let result = match self.files.exists(&key).await {
            Ok(true) => self.files.delete(&key).await,
            Ok(false) => Ok(()),
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            tracing::warn!(kind = %kind, file = %key, error = %e, "Failed to remove replaced image");
        }
    }

    /// Validates and writes an upload, returning the generated file name.
    pub async fn store_upload(
        &self,
        kind: EntityKind,
        original_name: &str,
        data: Vec<u8>,
    ) -> Result<String, ServiceError> {
        let extension = image_extension(original_name).map_err(ServiceError::Validation)?;
        let filename = format!("{}.{}", Uuid::new_v4(), extension);

        self.files.write(&kind.image_key(&filename), data).await?;
        tracing::debug!(kind = %kind, filename = %filename, "Upload written");

        Ok(filename)
    }

    /// Reads `<kind>/<filename>`, falling back to the placeholder image.
    ///
    /// `None` when neither exists.
    pub async fn read_image(
        &self,
        kind: EntityKind,
        filename: &str,
    ) -> Result<Option<StoredImage>, ServiceError> {
        if !is_plain_filename(filename) {
            return Err(ServiceError::Validation("Invalid file name".to_string()));
        }

        if let Some(data) = self.files.read(&kind.image_key(filename)).await? {
            return Ok(Some(StoredImage {
                data,
                content_type: content_type_for(filename),
            }));
        }

        Ok(self
            .files
            .read(PLACEHOLDER_IMAGE)
            .await?
            .map(|data| StoredImage {
                data,
                content_type: content_type_for(PLACEHOLDER_IMAGE),
            }))
    }
}
