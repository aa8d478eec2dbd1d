//! Shared helpers for router-level tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use serde_json::Value;
use todo_api::{config::Config, route::create_router, AppState};
use tower::ServiceExt;

pub fn test_config() -> Config {
    Config {
        access_token_secret: "test-access-secret".to_string(),
        refresh_token_secret: "test-refresh-secret".to_string(),
        database_url: "sqlite::memory:".to_string(),
        database_max_connections: 1,
        host: "127.0.0.1".to_string(),
        port: 0,
        access_token_ttl: Duration::minutes(15),
        refresh_token_ttl: Duration::days(7),
        // Minimum bcrypt cost keeps the suite fast.
        bcrypt_cost: 4,
        cookie_secure: false,
        cors_origin: None,
    }
}

pub async fn spawn_app() -> (Arc<AppState>, Router) {
    let state = AppState::from_config(test_config())
        .await
        .expect("failed to create app state");
    let router = create_router(state.clone());
    (state, router)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The `name=value` part of the refresh cookie, ready to send back.
    pub fn refresh_cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|cookie| cookie.split(';').next())
            .map(str::to_string)
    }

    pub fn set_cookie(&self) -> Option<&str> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn refresh_request(cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::POST).uri("/api/user/token");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn register(app: &Router, username: &str, password: &str) -> TestResponse {
    send(
        app,
        request(
            Method::POST,
            "/api/user/register",
            None,
            Some(serde_json::json!({ "username": username, "password": password })),
        ),
    )
    .await
}

pub async fn login(app: &Router, username: &str, password: &str) -> TestResponse {
    send(
        app,
        request(
            Method::POST,
            "/api/user/login",
            None,
            Some(serde_json::json!({ "username": username, "password": password })),
        ),
    )
    .await
}

/// A logged-in user: access token plus the refresh cookie pair.
pub struct Session {
    pub user_id: String,
    pub access_token: String,
    pub refresh_cookie: String,
}

pub async fn register_and_login(app: &Router, username: &str, password: &str) -> Session {
    let registered = register(app, username, password).await;
    assert_eq!(registered.status, StatusCode::OK, "{:?}", registered.body);

    let logged_in = login(app, username, password).await;
    assert_eq!(logged_in.status, StatusCode::OK, "{:?}", logged_in.body);

    Session {
        user_id: registered.body["id"].as_str().unwrap().to_string(),
        access_token: logged_in.body["accessToken"].as_str().unwrap().to_string(),
        refresh_cookie: logged_in.refresh_cookie().expect("missing refresh cookie"),
    }
}

pub async fn create_todo(app: &Router, token: &str, content: &str) -> TestResponse {
    send(
        app,
        request(
            Method::POST,
            "/api/todos/createusertodo",
            Some(token),
            Some(serde_json::json!({ "content": content })),
        ),
    )
    .await
}
