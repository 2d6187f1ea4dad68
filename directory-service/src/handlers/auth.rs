use axum::{extract::State, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::auth::{GoogleLoginRequest, GoogleLoginResponse, LoginRequest, LoginResponse, RenewResponse},
    middleware::AuthUser,
    models::frontend_menu,
    utils::{Password, ValidatedJson},
    AppState,
};

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state
        .auth
        .login(&req.email, &Password::new(req.password))
        .await?;

    Ok(Json(LoginResponse {
        ok: true,
        token: session.token,
        menu: frontend_menu(session.user.role),
    }))
}

/// Sign in with a Google ID token
#[utoipa::path(
    post,
    path = "/api/login/google",
    request_body = GoogleLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = GoogleLoginResponse),
        (status = 401, description = "Google token rejected", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn google_sign_in(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<GoogleLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let federated = state.auth.login_federated(&req.token).await?;

    Ok(Json(GoogleLoginResponse {
        ok: true,
        menu: frontend_menu(federated.session.user.role),
        token: federated.session.token,
        email: federated.identity.email,
        name: federated.identity.name,
        picture: federated.identity.picture,
    }))
}

/// Issue a fresh token for the current session
#[utoipa::path(
    get,
    path = "/api/login/renew",
    responses(
        (status = 200, description = "Token renewed", body = RenewResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse),
        (status = 404, description = "Identity no longer exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(
        ("x_token" = [])
    )
)]
pub async fn renew(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let session = state.auth.renew(&caller.0).await?;

    Ok(Json(RenewResponse {
        ok: true,
        token: session.token,
        menu: frontend_menu(session.user.role),
        user: session.user.into(),
    }))
}
