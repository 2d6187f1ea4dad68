//! Shared setup for directory-service integration tests.
//!
//! The router runs against in-memory stores, a temporary upload directory and
//! a mock Google verifier, so no MongoDB or network access is needed.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use directory_service::{
    build_router,
    config::{
        DirectoryConfig, Environment, GoogleConfig, JwtConfig, MongoConfig, RateLimitConfig,
        SecurityConfig, StorageConfig,
    },
    models::{EntityKind, Role, UserChanges},
    services::{
        GoogleIdentity, IdentityStore, InMemoryStore, LocalStorage, MockIdentityVerifier,
    },
    AppState,
};
use secrecy::Secret;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret-0123456789";
pub const MULTIPART_BOUNDARY: &str = "directory-test-boundary";

pub fn test_config(upload_path: &str) -> DirectoryConfig {
    DirectoryConfig {
        common: service_core::config::Config { port: 8080 },
        environment: Environment::Dev,
        service_name: "directory-service".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        mongodb: MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "directory_test".to_string(),
        },
        jwt: JwtConfig {
            secret: Secret::new(TEST_SECRET.to_string()),
        },
        google: GoogleConfig {
            client_id: "client-123.apps.googleusercontent.com".to_string(),
        },
        storage: StorageConfig {
            upload_path: upload_path.to_string(),
            max_upload_bytes: 64 * 1024,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:4200".to_string()],
        },
        rate_limit: RateLimitConfig {
            login_attempts: 100,
            login_window_seconds: 60,
            global_ip_limit: 1000,
            global_ip_window_seconds: 60,
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    pub verifier: Arc<MockIdentityVerifier>,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(customize: impl FnOnce(&mut DirectoryConfig)) -> Self {
        let upload_dir = TempDir::new().expect("temp upload dir");
        let mut config = test_config(&upload_dir.path().to_string_lossy());
        customize(&mut config);

        let store = Arc::new(InMemoryStore::new());
        let files = LocalStorage::new(upload_dir.path())
            .await
            .expect("local storage");
        let verifier = Arc::new(MockIdentityVerifier::new());

        let state = AppState::new(
            config,
            store.clone(),
            store.clone(),
            Arc::new(files),
            verifier.clone(),
        );
        let router = build_router(state.clone()).await.expect("router");

        Self {
            router,
            state,
            store,
            verifier,
            upload_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("x-token", token);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        self.send(request).await
    }

    /// Registers a user and returns `(uid, token)`.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> (String, String) {
        let (status, body) = self
            .json(
                Method::POST,
                "/api/users",
                None,
                Some(serde_json::json!({ "name": name, "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        (
            body["user"]["uid"].as_str().expect("uid").to_string(),
            body["token"].as_str().expect("token").to_string(),
        )
    }

    /// Registers a user and promotes it to `ADMIN` directly in the store.
    pub async fn register_admin(&self, email: &str) -> (String, String) {
        let (uid, token) = self.register("Admin", email, "secret123").await;
        let changes = UserChanges {
            role: Some(Role::Admin),
            ..Default::default()
        };
        self.store
            .update(&uid, &changes)
            .await
            .expect("update")
            .expect("admin exists");
        (uid, token)
    }

    pub fn google_identity(&self, assertion: &str, email: &str, name: &str) {
        self.verifier.insert(
            assertion,
            GoogleIdentity {
                email: email.to_string(),
                name: name.to_string(),
                picture: Some(format!("https://lh3.googleusercontent.com/a/{}", name)),
            },
        );
    }

    pub async fn upload(
        &self,
        kind: &str,
        id: &str,
        token: Option<&str>,
        file_name: &str,
        data: &[u8],
    ) -> (StatusCode, Value) {
        let mut body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{f}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            b = MULTIPART_BOUNDARY,
            f = file_name
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());

        let mut builder = Request::builder()
            .method(Method::PUT)
            .uri(format!("/api/uploads/{}/{}", kind, id))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
            );
        if let Some(token) = token {
            builder = builder.header("x-token", token);
        }

        self.send(builder.body(Body::from(body)).expect("request"))
            .await
    }

    /// Waits for the background association to set `img` on the entity.
    pub async fn wait_for_image(&self, kind: EntityKind, id: &str, expected: &str) -> bool {
        use directory_service::services::EntityStore;

        for _ in 0..100 {
            let current = self
                .store
                .find_image(kind, id)
                .await
                .ok()
                .flatten()
                .and_then(|record| record.img);
            if current.as_deref() == Some(expected) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}
