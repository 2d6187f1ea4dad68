//! Entity kinds that own an image, and the projection used to read/write it.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Image extensions accepted on upload (compared case-insensitively).
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Hospital,
    Doctor,
    User,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Hospital => "hospital",
            EntityKind::Doctor => "doctor",
            EntityKind::User => "user",
        }
    }

    /// MongoDB collection holding records of this kind.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Hospital => "hospitals",
            EntityKind::Doctor => "doctors",
            EntityKind::User => "users",
        }
    }

    /// Directory (under the upload root) holding this kind's images.
    pub fn storage_dir(&self) -> &'static str {
        self.collection()
    }

    /// Storage key for an image of this kind.
    pub fn image_key(&self, filename: &str) -> String {
        format!("{}/{}", self.storage_dir(), filename)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    /// Accepts both the singular kind and its plural route segment.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hospital" | "hospitals" => Ok(EntityKind::Hospital),
            "doctor" | "doctors" => Ok(EntityKind::Doctor),
            "user" | "users" => Ok(EntityKind::User),
            _ => Err(format!("The type ({}) is not allowed", s)),
        }
    }
}

/// Any entity document reduced to its id and current image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub img: Option<String>,
}

/// Validates an uploaded file name and returns its lowercase extension.
pub fn image_extension(file_name: &str) -> Result<String, String> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    if ALLOWED_IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(format!("The file extension is not allowed ({})", extension))
    }
}

/// True for names safe to join under a storage directory.
pub fn is_plain_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}

/// Content type served for a stored image.
pub fn content_type_for(filename: &str) -> &'static str {
    match filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
