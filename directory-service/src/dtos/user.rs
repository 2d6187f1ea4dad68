use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{Role, SanitizedUser};
use crate::services::ProfileUpdate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "Doc Brown")]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "doc@example.com")]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    #[schema(example = "secret123", min_length = 6)]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub role: Option<Role>,
}

impl From<UpdateUserRequest> for ProfileUpdate {
    fn from(req: UpdateUserRequest) -> Self {
        ProfileUpdate {
            name: req.name,
            email: req.email,
            role: req.role,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = true)]
    pub ok: bool,
    pub user: SanitizedUser,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateUserResponse {
    #[schema(example = true)]
    pub ok: bool,
    pub user: SanitizedUser,
    pub token: String,
}
