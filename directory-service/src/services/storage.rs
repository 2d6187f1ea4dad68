use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::services::ServiceError;

/// Blob storage addressed by relative keys such as `doctors/<file>`.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool, ServiceError>;
    /// No-op when the key is absent.
    async fn delete(&self, key: &str) -> Result<(), ServiceError>;
    async fn write(&self, key: &str, data: Vec<u8>) -> Result<(), ServiceError>;
    /// `None` when the key is absent.
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, ServiceError>;
}

pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self, ServiceError> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).await?;
        }
        Ok(Self { base_path })
    }

    /// Resolves a key below the base path; keys that could escape it are rejected.
    fn path_for(&self, key: &str) -> Result<PathBuf, ServiceError> {
        let relative = Path::new(key);
        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

        if key.is_empty() || !plain {
            return Err(ServiceError::Validation(format!("Invalid storage key: {}", key)));
        }

        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl FileStore for LocalStorage {
    async fn exists(&self, key: &str) -> Result<bool, ServiceError> {
        Ok(fs::try_exists(self.path_for(key)?).await?)
    }

    async fn delete(&self, key: &str) -> Result<(), ServiceError> {
        match fs::remove_file(self.path_for(key)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, data: Vec<u8>) -> Result<(), ServiceError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, data).await?;
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, ServiceError> {
        match fs::read(self.path_for(key)?).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
