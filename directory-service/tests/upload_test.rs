mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::TestApp;
use directory_service::models::EntityKind;
use tower::ServiceExt;

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-image";

#[tokio::test]
async fn upload_requires_token() {
    let app = TestApp::spawn().await;
    app.store.seed_entity(EntityKind::Doctor, "doc-1", None);

    let (status, body) = app.upload("doctors", "doc-1", None, "a.png", PNG_BYTES).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["msg"], "There is no token in the request");
}

#[tokio::test]
async fn unknown_kind_is_rejected() {
    let app = TestApp::spawn().await;
    let (_, token) = app.register("Doc", "doc@x.com", "secret123").await;

    let (status, body) = app
        .upload("patients", "p-1", Some(&token), "a.png", PNG_BYTES)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn disallowed_extension_is_rejected() {
    let app = TestApp::spawn().await;
    let (_, token) = app.register("Doc", "doc@x.com", "secret123").await;
    app.store.seed_entity(EntityKind::Doctor, "doc-1", None);

    let (status, _) = app
        .upload("doctors", "doc-1", Some(&token), "script.exe", b"MZ")
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!app.upload_dir.path().join("doctors").exists()
        || std::fs::read_dir(app.upload_dir.path().join("doctors"))
            .unwrap()
            .next()
            .is_none());
}

#[tokio::test]
async fn upload_stores_file_and_associates_it() {
    let app = TestApp::spawn().await;
    let (_, token) = app.register("Doc", "doc@x.com", "secret123").await;
    app.store.seed_entity(EntityKind::Doctor, "doc-1", None);

    let (status, body) = app
        .upload("doctors", "doc-1", Some(&token), "Photo.PNG", PNG_BYTES)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["msg"], "File uploaded");
    let filename = body["filename"].as_str().unwrap().to_string();
    assert!(filename.ends_with(".png"));

    let stored = std::fs::read(app.upload_dir.path().join("doctors").join(&filename)).unwrap();
    assert_eq!(stored, PNG_BYTES);

    assert!(app.wait_for_image(EntityKind::Doctor, "doc-1", &filename).await);
}

#[tokio::test]
async fn second_upload_replaces_the_first_file() {
    let app = TestApp::spawn().await;
    let (_, token) = app.register("Doc", "doc@x.com", "secret123").await;
    app.store.seed_entity(EntityKind::Hospital, "h-1", None);

    let (_, first) = app
        .upload("hospitals", "h-1", Some(&token), "a.jpg", b"first")
        .await;
    let first = first["filename"].as_str().unwrap().to_string();
    assert!(app.wait_for_image(EntityKind::Hospital, "h-1", &first).await);

    let (_, second) = app
        .upload("hospitals", "h-1", Some(&token), "b.jpg", b"second")
        .await;
    let second = second["filename"].as_str().unwrap().to_string();
    assert!(app.wait_for_image(EntityKind::Hospital, "h-1", &second).await);

    let dir = app.upload_dir.path().join("hospitals");
    assert!(!dir.join(&first).exists());
    assert!(dir.join(&second).exists());
}

#[tokio::test]
async fn user_avatar_upload_updates_the_user() {
    let app = TestApp::spawn().await;
    let (uid, token) = app.register("Doc", "doc@x.com", "secret123").await;

    let (status, body) = app
        .upload("users", &uid, Some(&token), "me.gif", b"GIF89a")
        .await;
    assert_eq!(status, StatusCode::OK);
    let filename = body["filename"].as_str().unwrap().to_string();

    assert!(app.wait_for_image(EntityKind::User, &uid, &filename).await);
}

#[tokio::test]
async fn upload_for_missing_entity_keeps_the_file_unlinked() {
    let app = TestApp::spawn().await;
    let (_, token) = app.register("Doc", "doc@x.com", "secret123").await;

    let (status, body) = app
        .upload("doctors", "ghost", Some(&token), "a.png", PNG_BYTES)
        .await;
    assert_eq!(status, StatusCode::OK);
    let filename = body["filename"].as_str().unwrap().to_string();

    assert!(!app.wait_for_image(EntityKind::Doctor, "ghost", &filename).await);
}

async fn download(app: &TestApp, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    (status, content_type, bytes)
}

#[tokio::test]
async fn download_returns_uploaded_image() {
    let app = TestApp::spawn().await;
    let (_, token) = app.register("Doc", "doc@x.com", "secret123").await;
    app.store.seed_entity(EntityKind::Doctor, "doc-1", None);

    let (_, body) = app
        .upload("doctors", "doc-1", Some(&token), "a.png", PNG_BYTES)
        .await;
    let filename = body["filename"].as_str().unwrap();

    let (status, content_type, bytes) =
        download(&app, &format!("/api/uploads/doctors/{}", filename)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));
    assert_eq!(bytes, PNG_BYTES);
}

#[tokio::test]
async fn missing_image_falls_back_to_placeholder() {
    let app = TestApp::spawn().await;

    let (status, _, _) = download(&app, "/api/uploads/doctors/missing.png").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    std::fs::write(app.upload_dir.path().join("no-img.jpg"), b"placeholder").unwrap();

    let (status, content_type, bytes) = download(&app, "/api/uploads/doctors/missing.png").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(bytes, b"placeholder");
}

#[tokio::test]
async fn download_rejects_path_traversal() {
    let app = TestApp::spawn().await;
    std::fs::write(app.upload_dir.path().join("secret.txt"), b"secret").unwrap();

    let (status, _, bytes) = download(&app, "/api/uploads/doctors/..%2Fsecret.txt").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_ne!(bytes, b"secret");
}
