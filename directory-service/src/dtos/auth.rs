use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{MenuSection, SanitizedUser};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "doc@example.com")]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "secret123")]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GoogleLoginRequest {
    /// Google ID token obtained by the frontend.
    #[validate(length(min = 1, message = "Google token is required"))]
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    #[schema(example = true)]
    pub ok: bool,
    pub token: String,
    pub menu: Vec<MenuSection>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GoogleLoginResponse {
    #[schema(example = true)]
    pub ok: bool,
    pub token: String,
    #[schema(example = "doc@example.com")]
    pub email: String,
    #[schema(example = "Doc Brown")]
    pub name: String,
    pub picture: Option<String>,
    pub menu: Vec<MenuSection>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RenewResponse {
    #[schema(example = true)]
    pub ok: bool,
    pub token: String,
    pub user: SanitizedUser,
    pub menu: Vec<MenuSection>,
}
