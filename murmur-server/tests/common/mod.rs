#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use murmur_server::{
    api, db::Database, identity::HeaderIdentityProvider, state::AppState, storage::ObjectStore,
};

pub const BASE: &str = "/actions";
pub const BOUNDARY: &str = "murmur-test-boundary";

/// Object store that keeps uploads in memory and fails paths containing `fail`
#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<Vec<(String, usize)>>,
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn upload(&self, bytes: Vec<u8>, path: &str) -> Result<String> {
        if path.contains("fail") {
            anyhow::bail!("bucket unavailable");
        }
        self.objects.lock().unwrap().push((path.to_string(), bytes.len()));
        Ok(format!("https://cdn.example.com/{}", path))
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: Database,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let db = Database::in_memory().expect("Failed to create test database");
        let store = Arc::new(MemoryStore::default());
        let state = AppState::new(db.clone(), Arc::new(HeaderIdentityProvider), store.clone());
        Self {
            router: api::router(state, BASE),
            db,
            store,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    /// JSON request against an API route, optionally as a principal
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        principal: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(format!("{}{}", BASE, path));
        if let Some(principal) = principal {
            builder = builder
                .header("x-principal-id", principal)
                .header("x-principal-first-name", principal)
                .header("x-principal-last-name", "Tester");
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();
        self.request(request).await
    }

    pub async fn get(&self, path: &str, principal: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, path, principal, None).await
    }

    pub async fn post(&self, path: &str, principal: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, path, Some(principal), Some(body)).await
    }

    /// Make sure the principal has a local user and return its id
    pub async fn user_id(&self, principal: &str) -> i64 {
        let (status, body) = self
            .get(&format!("/users/{}", principal), Some(principal))
            .await;
        assert_eq!(status, StatusCode::OK, "profile lookup failed: {}", body);
        body["data"]["user"]["id"].as_i64().unwrap()
    }

    /// Multipart create-post request
    pub async fn create_post(&self, principal: &str, parts: &[Part<'_>]) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("{}/userposts", BASE))
            .header("x-principal-id", principal)
            .header("x-principal-first-name", principal)
            .header("x-principal-last-name", "Tester")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        self.request(request).await
    }

    /// Text-only public post, returning its id
    pub async fn text_post(&self, principal: &str, content: &str) -> i64 {
        let (status, body) = self.create_post(principal, &[Part::Text("content", content)]).await;
        assert_eq!(status, StatusCode::CREATED, "create post failed: {}", body);
        body["data"]["id"].as_i64().unwrap()
    }
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, file_name, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn table_count(db: &Database, table: &str) -> i64 {
    db.table_counts()
        .unwrap()
        .into_iter()
        .find(|(t, _)| *t == table)
        .map(|(_, n)| n)
        .unwrap()
}
