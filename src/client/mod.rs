//! Typed HTTP client for the board API, plus in-memory mirrors of server
//! state for UI code.
//!
//! The mirrors never patch their lists locally: every successful mutation
//! refetches from the server. A failed refetch is kept in `last_error` and
//! does not turn the completed write into an error. Mirrors held by
//! different clients are not synchronized with each other.

pub mod mirror;

pub use mirror::{
    filter_by_category, search_posts, CommentsMirror, PostsMirror, CATEGORIES,
};

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::handlers::{AuthResponse, LoginRequest, RegisterRequest};
use crate::db::models::{CommentView, PostSummary, PublicUser, Role, UserStats};
use crate::routes::comments::CommentRequest;
use crate::routes::posts::PostRequest;
use crate::routes::MessageResponse;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },
}

impl ClientError {
    /// HTTP status of a server-side rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Credential and user held after a successful login or registration.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: PublicUser,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Admin
    }
}

impl From<AuthResponse> for Session {
    fn from(response: AuthResponse) -> Self {
        Self {
            token: response.token,
            user: response.user,
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Option<Session>,
}

impl ApiClient {
    /// `base_url` is the server root, e.g. `http://localhost:5160`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: None,
        })
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_admin)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// Attaches the bearer header when signed in.
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.session {
            Some(session) => request.bearer_auth(&session.token),
            None => request,
        }
    }

    fn require_session(&self) -> Result<(), ClientError> {
        if self.session.is_some() {
            Ok(())
        } else {
            Err(ClientError::NotSignedIn)
        }
    }

    // ============ AUTH ============

    pub async fn register(&mut self, req: &RegisterRequest) -> Result<&Session, ClientError> {
        let response: AuthResponse = self
            .send(self.client.post(self.url("/auth/register")).json(req))
            .await?;
        Ok(self.session.insert(response.into()))
    }

    pub async fn login(&mut self, req: &LoginRequest) -> Result<&Session, ClientError> {
        let response: AuthResponse = self
            .send(self.client.post(self.url("/auth/login")).json(req))
            .await?;
        Ok(self.session.insert(response.into()))
    }

    /// Forget the credential. Tokens are stateless, so nothing is sent.
    pub fn logout(&mut self) {
        self.session = None;
    }

    // ============ POSTS ============

    pub async fn list_posts(&self) -> Result<Vec<PostSummary>, ClientError> {
        self.send(self.client.get(self.url("/posts"))).await
    }

    pub async fn get_post(&self, id: i64) -> Result<PostSummary, ClientError> {
        self.send(self.client.get(self.url(&format!("/posts/{id}"))))
            .await
    }

    pub async fn create_post(&self, req: &PostRequest) -> Result<PostSummary, ClientError> {
        self.require_session()?;
        self.send_json(self.client.post(self.url("/posts")), req)
            .await
    }

    pub async fn update_post(
        &self,
        id: i64,
        req: &PostRequest,
    ) -> Result<PostSummary, ClientError> {
        self.require_session()?;
        self.send_json(self.client.put(self.url(&format!("/posts/{id}"))), req)
            .await
    }

    pub async fn delete_post(&self, id: i64) -> Result<(), ClientError> {
        self.require_session()?;
        let _: MessageResponse = self
            .send(self.authorized(self.client.delete(self.url(&format!("/posts/{id}")))))
            .await?;
        Ok(())
    }

    // ============ COMMENTS ============

    pub async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentView>, ClientError> {
        self.send(
            self.client
                .get(self.url(&format!("/posts/{post_id}/comments"))),
        )
        .await
    }

    pub async fn create_comment(
        &self,
        post_id: i64,
        req: &CommentRequest,
    ) -> Result<CommentView, ClientError> {
        self.require_session()?;
        self.send_json(
            self.client
                .post(self.url(&format!("/posts/{post_id}/comments"))),
            req,
        )
        .await
    }

    pub async fn delete_comment(&self, id: i64) -> Result<(), ClientError> {
        self.require_session()?;
        let _: MessageResponse = self
            .send(self.authorized(self.client.delete(self.url(&format!("/comments/{id}")))))
            .await?;
        Ok(())
    }

    // ============ USERS ============

    pub async fn user_stats(&self) -> Result<Vec<UserStats>, ClientError> {
        self.send(self.client.get(self.url("/users/stats"))).await
    }

    // -- Transport helpers --

    async fn send_json<B, T>(&self, request: RequestBuilder, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.authorized(request).json(body)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

/// Turns a non-2xx response into `ClientError::Api`, using the server's
/// `{"error": ...}` message when present.
async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| {
            if body.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Something went wrong")
                    .to_string()
            } else {
                body
            }
        });

    tracing::debug!(status = %status, message = %message, "API request failed");
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_ignored() {
        let client = ApiClient::new("http://localhost:5160/").unwrap();
        assert_eq!(client.url("/posts"), "http://localhost:5160/api/posts");
    }

    #[tokio::test]
    async fn mutations_require_a_session() {
        let client = ApiClient::new("http://localhost:1").unwrap();
        let req = PostRequest {
            title: "t".into(),
            content: "c".into(),
            category: "Jobb".into(),
        };
        assert!(matches!(
            client.create_post(&req).await,
            Err(ClientError::NotSignedIn)
        ));
        assert!(matches!(
            client.delete_comment(1).await,
            Err(ClientError::NotSignedIn)
        ));
    }

    #[test]
    fn session_reports_admin_role() {
        let session = Session {
            token: "t".into(),
            user: PublicUser {
                id: 1,
                username: "admin".into(),
                email: "admin@test.com".into(),
                role: Role::Admin,
            },
        };
        assert!(session.is_admin());
    }

    #[test]
    fn api_error_exposes_status() {
        let err = ClientError::Api {
            status: 403,
            message: "Forbidden".into(),
        };
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.to_string(), "Forbidden (HTTP 403)");
    }
}
