#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use community_board::config::Config;
use community_board::db;
use community_board::state::{AppState, DbPool};

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-chars";

pub struct TestApp {
    pub router: Router,
    pub pool: DbPool,
    pub state: AppState,
    _dir: TempDir,
}

/// Fresh app on a throwaway database file. bcrypt runs at the minimum cost
/// to keep registration fast.
pub fn test_app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let pool = db::create_pool(&dir.path().join("test.db")).unwrap();
    db::run_migrations(&pool).unwrap();

    let mut config = Config::default();
    config.database.path = Some(dir.path().join("test.db"));
    config.auth.bcrypt_cost = 4;

    let state = AppState::new(pool.clone(), config, TEST_SECRET);
    let router = community_board::routes::app(state.clone());

    TestApp {
        router,
        pool,
        state,
        _dir: dir,
    }
}

impl TestApp {
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    /// Registers a user and returns `(token, user_id)`.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> (String, i64) {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({ "username": username, "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_i64().unwrap(),
        )
    }

    /// Registers a user and promotes them to admin directly in the store.
    /// The returned token is issued after promotion so it carries the role.
    pub async fn register_admin(&self, username: &str, email: &str) -> (String, i64) {
        let (_, id) = self.register(username, email, "adminpass").await;
        {
            let conn = self.pool.get().unwrap();
            conn.execute(
                "UPDATE users SET role = 'admin' WHERE id = ?1",
                rusqlite::params![id],
            )
            .unwrap();
        }
        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": "adminpass" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["role"], "admin");
        (body["token"].as_str().unwrap().to_string(), id)
    }

    pub async fn create_post(&self, token: &str, title: &str, category: &str) -> i64 {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/posts",
                Some(token),
                Some(json!({ "title": title, "content": "...", "category": category })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create post failed: {body}");
        body["id"].as_i64().unwrap()
    }

    pub async fn create_comment(&self, token: &str, post_id: i64, content: &str) -> i64 {
        let (status, body) = self
            .call(
                Method::POST,
                &format!("/api/posts/{}/comments", post_id),
                Some(token),
                Some(json!({ "content": content })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create comment failed: {body}");
        body["id"].as_i64().unwrap()
    }
}
