//! Common test helpers for integration tests.
//!
//! Every test drives the full router (layers included) over a fresh
//! in-memory store.
//!
//! # Note
//!
//! The `#![allow(dead_code)]` attribute is necessary because Rust compiles each
//! integration test file as a separate crate, and not every file uses every helper.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use todo_service::api::{AppState, create_router};

/// A due date safely in the past.
pub const PAST: &str = "2000-01-01T00:00:00Z";
/// A due date safely in the future.
pub const FUTURE: &str = "2999-01-01T00:00:00Z";

// =============================================================================
// Test Application
// =============================================================================

/// The router under test.
#[derive(Clone)]
pub struct TestApp {
    router: Router,
}

/// A collected response with its body parsed as JSON (`Null` when empty).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        Self {
            router: create_router(AppState::in_memory()),
        }
    }

    /// Sends one request through the router.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send_request(request).await
    }

    /// Sends a prepared request through the router.
    pub async fn send_request(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.send(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    // -------------------------------------------------------------------------
    // Fixtures
    // -------------------------------------------------------------------------

    /// Registers `username` and returns its token.
    pub async fn register(&self, username: &str) -> String {
        let response = self
            .send(
                Method::POST,
                "/register",
                None,
                Some(json!({"username": username, "password": "pass1234"})),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);

        response.body["token"].as_str().unwrap().to_string()
    }

    /// Creates an item for the token's owner and returns its JSON.
    pub async fn create_todo(&self, token: &str, body: Value) -> Value {
        let response = self.post("/todos", token, body).await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);

        response.body
    }

    /// Creates an item with only a title and returns its id.
    pub async fn create_titled(&self, token: &str, title: &str) -> i64 {
        self.create_todo(token, json!({"title": title})).await["id"]
            .as_i64()
            .unwrap()
    }
}

/// Returns the `field` values of an array response, in order.
pub fn values<'a>(body: &'a Value, field: &str) -> Vec<&'a Value> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|item| &item[field])
        .collect()
}

/// Returns the titles of an array response, in order.
pub fn titles(body: &Value) -> Vec<&str> {
    values(body, "title")
        .into_iter()
        .map(|title| title.as_str().unwrap())
        .collect()
}
