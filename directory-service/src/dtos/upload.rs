use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    #[schema(example = true)]
    pub ok: bool,
    #[schema(example = "File uploaded")]
    pub msg: String,
    #[schema(example = "0b6f3c4e-8d0f-4c55-9d7e-2f1f7f0e8a11.png")]
    pub filename: String,
}
