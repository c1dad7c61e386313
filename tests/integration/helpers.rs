//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use astral_api::{AppState, build_router};
use astral_auth::{AuthService, MemorySessionStore};
use astral_cache::CacheManager;
use astral_cache::memory::MemoryCacheProvider;
use astral_core::config::AppConfig;
use astral_core::traits::storage::ObjectBackend;
use astral_service::FileService;
use astral_storage::providers::MemoryObjectBackend;

/// Admin token accepted by `/api/register` in tests.
pub const ADMIN_TOKEN: &str = "integration-admin-token";

/// Password satisfying the default credential policy.
pub const PASSWORD: &str = "Secr3t!pass";

const BOUNDARY: &str = "astral-test-boundary";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Application config
    pub config: AppConfig,
}

impl TestApp {
    /// Create a test application backed entirely by in-memory providers.
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a test application, adjusting the config before wiring.
    pub fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "integration-test-secret".to_string();
        config.auth.admin_token = ADMIN_TOKEN.to_string();
        config.auth.password_hash.memory_kib = 1024;
        config.auth.password_hash.iterations = 1;
        config.storage.provider = "memory".to_string();
        adjust(&mut config);

        let cache = Arc::new(CacheManager::from_provider(Arc::new(
            MemoryCacheProvider::new(&config.cache.memory),
        )));
        let storage: Arc<dyn ObjectBackend> = Arc::new(MemoryObjectBackend::new());
        let auth = AuthService::new(&config.auth, Arc::new(MemorySessionStore::new()))
            .expect("Failed to build auth service");
        let file_service = FileService::new(
            Arc::clone(&storage),
            Arc::clone(&cache),
            &config.storage,
            &config.cache,
        );

        let state = AppState {
            config: Arc::new(config.clone()),
            cache,
            storage,
            auth: Arc::new(auth),
            file_service: Arc::new(file_service),
        };

        Self {
            router: build_router(state),
            config,
        }
    }

    /// Register a user through the API.
    pub async fn register(&self, login: &str, password: &str) -> TestResponse {
        let body = serde_json::json!({
            "token": ADMIN_TOKEN,
            "login": login,
            "pswd": password,
        });
        self.request("POST", "/api/register", Some(body), None).await
    }

    /// Login and return the session token
    pub async fn login(&self, login: &str, password: &str) -> String {
        let body = serde_json::json!({ "login": login, "pswd": password });
        let response = self.request("POST", "/api/auth", Some(body), None).await;

        assert_eq!(
            response.status,
            StatusCode::OK,
            "Login failed: {:?}",
            response.body
        );

        response.body["data"]["token"]
            .as_str()
            .expect("No token in login response")
            .to_string()
    }

    /// Register a user with [`PASSWORD`] and return a fresh session token.
    pub async fn user(&self, login: &str) -> String {
        let response = self.register(login, PASSWORD).await;
        assert_eq!(
            response.status,
            StatusCode::OK,
            "Register failed: {:?}",
            response.body
        );
        self.login(login, PASSWORD).await
    }

    /// Make a JSON request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");
        self.send(req).await
    }

    /// Make a request with extra headers and no body.
    pub async fn request_with_headers(
        &self,
        method: &str,
        path: &str,
        token: &str,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Authorization", format!("Bearer {token}"));
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        let req = req.body(Body::empty()).expect("Failed to build request");
        self.send(req).await
    }

    /// Upload a document as multipart form data.
    pub async fn upload(
        &self,
        token: &str,
        meta: Value,
        file: Option<(&str, &[u8])>,
    ) -> TestResponse {
        let mut parts = vec![Part::text("meta", &meta.to_string())];
        if let Some((name, content)) = file {
            parts.push(Part::file(name, content));
        }

        let req = Request::builder()
            .method("POST")
            .uri("/api/docs")
            .header("Authorization", format!("Bearer {token}"))
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(&parts)))
            .expect("Failed to build request");
        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let raw = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body")
            .to_vec();
        let body: Value = serde_json::from_slice(&raw).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
            raw,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Parsed JSON body, `Null` when the body is not JSON
    pub body: Value,
    /// Raw body bytes
    pub raw: Vec<u8>,
}

impl TestResponse {
    /// Header value as a string, if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

struct Part {
    name: &'static str,
    filename: Option<String>,
    content: Vec<u8>,
}

impl Part {
    fn text(name: &'static str, value: &str) -> Self {
        Self {
            name,
            filename: None,
            content: value.as_bytes().to_vec(),
        }
    }

    fn file(filename: &str, content: &[u8]) -> Self {
        Self {
            name: "file",
            filename: Some(filename.to_string()),
            content: content.to_vec(),
        }
    }
}

fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match &part.filename {
            Some(filename) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{filename}\"\r\n",
                        part.name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(&part.content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
