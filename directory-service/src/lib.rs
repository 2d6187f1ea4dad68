pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::{http_span, request_id_middleware},
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::config::DirectoryConfig;
use crate::middleware::TOKEN_HEADER;
use crate::services::{
    AuthService, AuthorizationGuard, EntityStore, FileStore, IdentityStore, IdentityVerifier,
    MediaService, TokenService, UserService,
};

/// Multipart framing allowance on top of the file size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::login,
        handlers::auth::google_sign_in,
        handlers::auth::renew,
        handlers::user::create_user,
        handlers::user::update_user,
        handlers::user::delete_user,
        handlers::uploads::upload_image,
        handlers::uploads::download_image,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::auth::LoginRequest,
            dtos::auth::LoginResponse,
            dtos::auth::GoogleLoginRequest,
            dtos::auth::GoogleLoginResponse,
            dtos::auth::RenewResponse,
            dtos::user::CreateUserRequest,
            dtos::user::CreateUserResponse,
            dtos::user::UpdateUserRequest,
            dtos::user::UserResponse,
            dtos::upload::UploadResponse,
            models::SanitizedUser,
            models::Role,
            models::MenuSection,
            models::MenuEntry,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Password and Google sign-in, token renewal"),
        (name = "Users", description = "Registration and profile management"),
        (name = "Uploads", description = "Images of hospitals, doctors and users"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "x_token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(TOKEN_HEADER))),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: DirectoryConfig,
    pub identities: Arc<dyn IdentityStore>,
    pub auth: AuthService,
    pub users: UserService,
    pub media: MediaService,
    pub login_rate_limiter: IpRateLimiter,
    pub ip_rate_limiter: IpRateLimiter,
}

impl AppState {
    /// Wires the services over the given stores and verifier.
    pub fn new(
        config: DirectoryConfig,
        identities: Arc<dyn IdentityStore>,
        entities: Arc<dyn EntityStore>,
        files: Arc<dyn FileStore>,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> Self {
        let tokens = TokenService::new(&config.jwt);
        let guard = AuthorizationGuard::new(identities.clone());

        let login_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.login_attempts,
            config.rate_limit.login_window_seconds,
        );
        let ip_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.global_ip_limit,
            config.rate_limit.global_ip_window_seconds,
        );

        Self {
            auth: AuthService::new(identities.clone(), tokens, verifier),
            users: UserService::new(identities.clone(), guard),
            media: MediaService::new(entities, files),
            identities,
            config,
            login_rate_limiter,
            ip_rate_limiter,
        }
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed_origins.iter().filter_map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| tracing::error!(origin = %o, error = %e, "Ignoring invalid CORS origin"))
                .ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(TOKEN_HEADER)])
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    // Sign-in routes with their own, stricter rate limit
    let login_routes = Router::new()
        .route("/api/login", post(handlers::auth::login))
        .route("/api/login/google", post(handlers::auth::google_sign_in))
        .route_layer(from_fn_with_state(
            state.login_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let upload_limit = state.config.storage.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    // Routes that need a valid x-token
    let token_routes = Router::new()
        .route("/api/login/renew", get(handlers::auth::renew))
        .route(
            "/api/users/:id",
            put(handlers::user::update_user).delete(handlers::user::delete_user),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::token_middleware,
        ));

    // Download is public; upload needs a token. The last segment is the entity
    // id on upload and the file name on download.
    let uploads = get(handlers::uploads::download_image).merge(
        put(handlers::uploads::upload_image)
            .layer(DefaultBodyLimit::max(upload_limit))
            .route_layer(from_fn_with_state(
                state.clone(),
                middleware::token_middleware,
            )),
    );

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route("/api/users", post(handlers::user::create_user))
        .route("/api/uploads/:kind/:id", uploads)
        .merge(login_routes)
        .merge(token_routes)
        .with_state(state.clone())
        // Global IP rate limiting
        .layer(from_fn_with_state(
            state.ip_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(http_span))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config.security.allowed_origins));

    Ok(app)
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "Service is unhealthy", body = ErrorResponse)
    ),
    tag = "Observability"
)]
pub async fn health_check(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    state.identities.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Store health check failed");
        AppError::from(e)
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "store": "up"
        }
    })))
}
