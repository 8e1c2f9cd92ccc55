use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use vinculo::auth::provision_user;
use vinculo::server::{AppState, create_router};
use vinculo::store::{SqliteStore, Store};
use vinculo::types::Role;

/// The HTTP surface served in-process over a throwaway database.
pub struct TestApp {
    pub temp_dir: TempDir,
    pub store: Arc<SqliteStore>,
    pub admin_token: String,
    router: Router,
}

pub struct TestUser {
    pub id: String,
    pub token: String,
}

impl TestApp {
    pub fn start() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = Arc::new(
            SqliteStore::new(temp_dir.path().join("vinculo.db")).expect("open store"),
        );
        store.initialize().expect("initialize schema");

        let (_, admin_token) =
            provision_user(store.as_ref(), Role::Admin, "Administrator").expect("create admin");

        let state = Arc::new(AppState::new(store.clone() as Arc<dyn Store>));

        Self {
            temp_dir,
            store,
            admin_token,
            router: create_router(state),
        }
    }

    pub fn user(&self, role: Role, name: &str) -> TestUser {
        let (user, token) = provision_user(self.store.as_ref(), role, name).expect("create user");
        TestUser { id: user.id, token }
    }

    pub fn set_matches_enabled(&self, enabled: bool) {
        self.store
            .set_matches_enabled(enabled)
            .expect("set matches toggle");
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).expect("encode body"))),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        (status, value)
    }

    pub async fn get(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, path, Some(token), None).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, path, Some(token), Some(body)).await
    }

    pub async fn patch(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, path, Some(token), Some(body)).await
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, path, Some(token), Some(body)).await
    }
}
