use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::{services::ServiceError, AppState};

/// Header carrying the session token.
pub const TOKEN_HEADER: &str = "x-token";

/// Identity id of the verified caller.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser(pub String);

/// Middleware to require a valid session token
pub async fn token_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("There is no token in the request"))
        })?;

    let uid = state.auth.authorize(token)?;

    tracing::Span::current().record("user_id", uid.as_str());
    req.extensions_mut().insert(AuthUser(uid));

    Ok(next.run(req).await)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ServiceError::InvalidToken.into())
    }
}
