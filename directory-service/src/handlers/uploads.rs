use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::upload::UploadResponse,
    middleware::AuthUser,
    models::EntityKind,
    services::ServiceError,
    AppState,
};

/// Multipart field holding the image.
const IMAGE_FIELD: &str = "image";

fn parse_kind(kind: &str) -> Result<EntityKind, AppError> {
    kind.parse::<EntityKind>()
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!(e)))
}

/// Upload an image for a hospital, doctor or user
///
/// The file is stored first; the entity's image is switched afterwards in a
/// background task, so the response does not wait for it.
#[utoipa::path(
    put,
    path = "/api/uploads/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "hospitals, doctors or users"),
        ("id" = String, Path, description = "Entity id")
    ),
    request_body(content = Vec<u8>, content_type = "multipart/form-data", description = "Field `image`: png, jpg, jpeg or gif"),
    responses(
        (status = 200, description = "File uploaded", body = UploadResponse),
        (status = 400, description = "Invalid kind, missing file or extension not allowed", body = ErrorResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Uploads",
    security(
        ("x_token" = [])
    )
)]
pub async fn upload_image(
    State(state): State<AppState>,
    caller: AuthUser,
    Path((kind, id)): Path<(String, String)>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;

    let field = loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| {
                AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e))
            })?
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("No file was uploaded")))?;

        if field.name() == Some(IMAGE_FIELD) {
            break field;
        }
    };

    let original_name = field.file_name().unwrap_or_default().to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Failed to read file bytes: {}", e)))?
        .to_vec();

    if data.len() > state.config.storage.max_upload_bytes {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "File too large (max {} bytes)",
            state.config.storage.max_upload_bytes
        )));
    }

    let filename = state.media.store_upload(kind, &original_name, data).await?;

    tracing::info!(
        user_id = %caller.0,
        kind = %kind,
        entity_id = %id,
        filename = %filename,
        "Image uploaded"
    );

    let media = state.media.clone();
    let associated = filename.clone();
    tokio::spawn(async move {
        match media.associate_image(kind, &id, &associated).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(kind = %kind, entity_id = %id, filename = %associated, "Uploaded image was not associated")
            }
            Err(e) => {
                tracing::error!(kind = %kind, entity_id = %id, error = %e, "Image association failed")
            }
        }
    });

    Ok(Json(UploadResponse {
        ok: true,
        msg: "File uploaded".to_string(),
        filename,
    }))
}

/// Download an image, or the placeholder when it does not exist
#[utoipa::path(
    get,
    path = "/api/uploads/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "hospitals, doctors or users"),
        ("id" = String, Path, description = "Stored file name")
    ),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 400, description = "Invalid kind or file name", body = ErrorResponse),
        (status = 404, description = "Neither the image nor the placeholder exists", body = ErrorResponse)
    ),
    tag = "Uploads"
)]
pub async fn download_image(
    State(state): State<AppState>,
    Path((kind, file)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;

    let image = state
        .media
        .read_image(kind, &file)
        .await?
        .ok_or(ServiceError::NotFound("Image"))?;

    Ok(([(header::CONTENT_TYPE, image.content_type)], image.data))
}
