//! Shared helpers for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use filehost::{
    adapters::{
        database::connect_in_memory,
        repositories::{SqliteMetadataRepository, SqliteUserRepository},
        routes::build_router,
        state::AppState,
    },
    application::{
        repositories::{MetadataRepository, UserRepository},
        services::{StorageService, TokenService},
    },
    domain::config::policy::FilePolicy,
    services::create_storage_service,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

pub const PASSWORD: &str = "test-password";
pub const ADMIN: &str = "admin";
const BOUNDARY: &str = "X-FILEHOST-BOUNDARY";

/// Smallest byte sequence sniffed as `image/jpeg`.
pub const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01];

pub struct TestApp {
    pub router: Router,
    pub metadata: Arc<dyn MetadataRepository>,
    pub storage: Arc<dyn StorageService>,
    pub storage_dir: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is not JSON")
    }

    pub fn error(&self) -> String {
        self.json()["error"].as_str().unwrap_or_default().to_string()
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_policy(FilePolicy::default()).await
}

pub async fn spawn_app_with_policy(policy: FilePolicy) -> TestApp {
    let storage_dir = TempDir::new().unwrap();
    std::fs::write(storage_dir.path().join(".gitignore"), b"*\n").unwrap();

    let pool = connect_in_memory().await.unwrap();
    let metadata = Arc::new(SqliteMetadataRepository::new(pool.clone())) as Arc<dyn MetadataRepository>;
    let users = Arc::new(SqliteUserRepository::new(pool)) as Arc<dyn UserRepository>;
    let storage = create_storage_service(Some(storage_dir.path().to_path_buf()))
        .await
        .unwrap();
    let tokens = TokenService::new(&TokenService::generate_secret_key(), Duration::from_secs(600)).unwrap();

    let state = AppState {
        file_policy: Arc::new(policy),
        token_service: Arc::new(tokens),
        admin_usernames: Arc::new(vec![ADMIN.to_string()]),
        user_repository: users,
        metadata_repository: metadata.clone(),
        storage_service: storage.clone(),
    };

    TestApp {
        router: build_router(state, CorsLayer::permissive()),
        metadata,
        storage,
        storage_dir,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> TestResponse {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn register(&self, username: &str) -> TestResponse {
        self.post_json(
            "/users/register",
            json!({ "username": username, "password": PASSWORD }),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.post_json(
            "/users/login",
            json!({ "username": username, "password": password }),
        )
        .await
    }

    /// Registers `username` and returns a fresh bearer token for it.
    pub async fn token_for(&self, username: &str) -> String {
        assert_eq!(self.register(username).await.status, StatusCode::CREATED);
        let response = self.login(username, PASSWORD).await;
        assert_eq!(response.status, StatusCode::OK);
        response.json()["access_token"].as_str().unwrap().to_string()
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn upload(
        &self,
        token: &str,
        filename: &str,
        content: &[u8],
        lifetime: Option<&str>,
    ) -> TestResponse {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
        if let Some(lifetime) = lifetime {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"lifetime\"\r\n\r\n{}\r\n",
                    BOUNDARY, lifetime
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/files")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    pub fn blob_exists(&self, stored_name: &str) -> bool {
        self.storage_dir.path().join(stored_name).is_file()
    }
}
