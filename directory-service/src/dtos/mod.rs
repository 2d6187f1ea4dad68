pub mod auth;
pub mod upload;
pub mod user;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Failure envelope (schema only; rendered by `AppError`).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = false)]
    pub ok: bool,
    #[schema(example = "Invalid email or password")]
    pub msg: String,
}
