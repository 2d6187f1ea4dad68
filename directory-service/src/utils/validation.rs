use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use service_core::error::ErrorEnvelope;
use validator::Validate;

/// JSON body that has passed its `validator` rules.
///
/// Unparseable bodies are rejected with 400, rule violations with 422; both
/// use the `{ok, msg}` envelope.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            let envelope = ErrorEnvelope::new(format!("Invalid request body: {}", e.body_text()));
            (StatusCode::BAD_REQUEST, Json(envelope)).into_response()
        })?;

        value.validate().map_err(|e| {
            let mut envelope = ErrorEnvelope::new("Validation error");
            envelope.errors = serde_json::to_value(&e).ok();
            (StatusCode::UNPROCESSABLE_ENTITY, Json(envelope)).into_response()
        })?;

        Ok(ValidatedJson(value))
    }
}
