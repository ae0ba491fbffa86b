use crate::client::{ApiClient, ClientError};
use crate::db::models::{CommentView, PostSummary};
use crate::routes::comments::CommentRequest;
use crate::routes::posts::PostRequest;

/// Category labels offered to users. The server accepts any label.
pub const CATEGORIES: &[&str] = &[
    "Allmänt",
    "Jobb",
    "Boende",
    "Säljes",
    "Köpes",
    "Evenemang",
    "Övrigt",
];

/// Case-insensitive substring match over title and content. A blank query
/// matches everything.
pub fn search_posts(posts: &[PostSummary], query: &str) -> Vec<PostSummary> {
    let query = query.trim().to_lowercase();
    posts
        .iter()
        .filter(|post| {
            query.is_empty()
                || post.title.to_lowercase().contains(&query)
                || post.content.to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}

/// Exact match on the category label.
pub fn filter_by_category(posts: &[PostSummary], category: &str) -> Vec<PostSummary> {
    posts
        .iter()
        .filter(|post| post.category == category)
        .cloned()
        .collect()
}

/// Client-side copy of the post list.
#[derive(Debug, Default)]
pub struct PostsMirror {
    posts: Vec<PostSummary>,
    last_error: Option<String>,
}

impl PostsMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn record<T>(&mut self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        self.last_error = result.as_ref().err().map(ToString::to_string);
        result
    }

    pub async fn refresh(&mut self, api: &ApiClient) -> Result<(), ClientError> {
        let result = api.list_posts().await;
        let posts = self.record(result)?;
        self.posts = posts;
        Ok(())
    }

    pub async fn create(
        &mut self,
        api: &ApiClient,
        req: &PostRequest,
    ) -> Result<PostSummary, ClientError> {
        let result = api.create_post(req).await;
        let created = self.record(result)?;
        self.refresh_after_write(api).await;
        Ok(created)
    }

    pub async fn update(
        &mut self,
        api: &ApiClient,
        id: i64,
        req: &PostRequest,
    ) -> Result<PostSummary, ClientError> {
        let result = api.update_post(id, req).await;
        let updated = self.record(result)?;
        self.refresh_after_write(api).await;
        Ok(updated)
    }

    pub async fn delete(&mut self, api: &ApiClient, id: i64) -> Result<(), ClientError> {
        let result = api.delete_post(id).await;
        self.record(result)?;
        self.refresh_after_write(api).await;
        Ok(())
    }

    /// A failed refetch after a successful write is kept in `last_error`
    /// but does not fail the write itself.
    async fn refresh_after_write(&mut self, api: &ApiClient) {
        if let Err(e) = self.refresh(api).await {
            tracing::warn!("Post list refresh after write failed: {}", e);
        }
    }

    /// Refetches everything, then keeps only posts matching `query`.
    pub async fn search(&mut self, api: &ApiClient, query: &str) -> Result<(), ClientError> {
        let result = api.list_posts().await;
        let all = self.record(result)?;
        self.posts = search_posts(&all, query);
        Ok(())
    }

    /// Refetches everything, then keeps only posts in `category`.
    pub async fn filter_by_category(
        &mut self,
        api: &ApiClient,
        category: &str,
    ) -> Result<(), ClientError> {
        let result = api.list_posts().await;
        let all = self.record(result)?;
        self.posts = filter_by_category(&all, category);
        Ok(())
    }
}

/// Client-side copy of one post's comments.
#[derive(Debug)]
pub struct CommentsMirror {
    post_id: i64,
    comments: Vec<CommentView>,
    last_error: Option<String>,
}

impl CommentsMirror {
    pub fn new(post_id: i64) -> Self {
        Self {
            post_id,
            comments: Vec::new(),
            last_error: None,
        }
    }

    pub fn post_id(&self) -> i64 {
        self.post_id
    }

    pub fn comments(&self) -> &[CommentView] {
        &self.comments
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn record<T>(&mut self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        self.last_error = result.as_ref().err().map(ToString::to_string);
        result
    }

    pub async fn refresh(&mut self, api: &ApiClient) -> Result<(), ClientError> {
        let result = api.list_comments(self.post_id).await;
        let comments = self.record(result)?;
        self.comments = comments;
        Ok(())
    }

    pub async fn create(
        &mut self,
        api: &ApiClient,
        content: &str,
    ) -> Result<CommentView, ClientError> {
        let req = CommentRequest {
            content: content.to_string(),
        };
        let result = api.create_comment(self.post_id, &req).await;
        let created = self.record(result)?;
        self.refresh_after_write(api).await;
        Ok(created)
    }

    pub async fn delete(&mut self, api: &ApiClient, comment_id: i64) -> Result<(), ClientError> {
        let result = api.delete_comment(comment_id).await;
        self.record(result)?;
        self.refresh_after_write(api).await;
        Ok(())
    }

    async fn refresh_after_write(&mut self, api: &ApiClient) {
        if let Err(e) = self.refresh(api).await {
            tracing::warn!("Comment refresh for post {} failed: {}", self.post_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Session;
    use crate::db::models::{PublicUser, Role};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use chrono::Utc;

    fn post(id: i64, title: &str, content: &str, category: &str) -> PostSummary {
        PostSummary {
            id,
            title: title.into(),
            content: content.into(),
            category: category.into(),
            user_id: 1,
            username: "alice".into(),
            created_at: Utc::now(),
            comment_count: 0,
        }
    }

    fn sample() -> Vec<PostSummary> {
        vec![
            post(1, "Säljer cykel", "Nästan ny", "Säljes"),
            post(2, "Lägenhet", "Uthyres i centrum, cykelavstånd", "Boende"),
            post(3, "Fest", "Välkomna på lördag", "Evenemang"),
        ]
    }

    #[test]
    fn search_matches_title_or_content_case_insensitively() {
        let found = search_posts(&sample(), "CYKEL");
        let ids: Vec<i64> = found.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn blank_search_keeps_everything() {
        assert_eq!(search_posts(&sample(), "   ").len(), 3);
    }

    #[test]
    fn search_without_matches_is_empty() {
        assert!(search_posts(&sample(), "bil").is_empty());
    }

    #[test]
    fn category_filter_is_exact() {
        let found = filter_by_category(&sample(), "Boende");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 2);
        assert!(filter_by_category(&sample(), "boende").is_empty());
    }

    #[test]
    fn categories_list_is_fixed() {
        assert_eq!(CATEGORIES.len(), 7);
        assert!(CATEGORIES.contains(&"Allmänt"));
        assert!(CATEGORIES.contains(&"Övrigt"));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_mirror_and_records_error() {
        // Nothing listens on port 1.
        let api = ApiClient::new("http://127.0.0.1:1").unwrap();
        let mut mirror = PostsMirror::new();
        assert!(mirror.refresh(&api).await.is_err());
        assert!(mirror.posts().is_empty());
        assert!(mirror.last_error().is_some());
    }

    fn comment(id: i64, post_id: i64) -> CommentView {
        CommentView {
            id,
            post_id,
            user_id: 1,
            username: "alice".into(),
            content: "Hej".into(),
            created_at: Utc::now(),
        }
    }

    /// Accepts every write but fails every list read.
    async fn spawn_read_failing_server() -> String {
        let router = Router::new()
            .route(
                "/api/posts",
                get(|| async { StatusCode::INTERNAL_SERVER_ERROR })
                    .post(|| async { Json(post(42, "Hi", "...", "Allmänt")) }),
            )
            .route(
                "/api/posts/{id}/comments",
                get(|| async { StatusCode::INTERNAL_SERVER_ERROR })
                    .post(|| async { Json(comment(7, 42)) }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn signed_in(base_url: &str) -> ApiClient {
        let mut api = ApiClient::new(base_url).unwrap();
        api.session = Some(Session {
            token: "token".into(),
            user: PublicUser {
                id: 1,
                username: "alice".into(),
                email: "alice@x.com".into(),
                role: Role::User,
            },
        });
        api
    }

    #[tokio::test]
    async fn saved_post_is_returned_even_if_refetch_fails() {
        let api = signed_in(&spawn_read_failing_server().await);
        let mut mirror = PostsMirror::new();
        let req = PostRequest {
            title: "Hi".into(),
            content: "...".into(),
            category: "Allmänt".into(),
        };

        let created = mirror.create(&api, &req).await.unwrap();
        assert_eq!(created.id, 42);
        assert!(mirror.last_error().is_some());
        assert!(mirror.posts().is_empty());
    }

    #[tokio::test]
    async fn saved_comment_is_returned_even_if_refetch_fails() {
        let api = signed_in(&spawn_read_failing_server().await);
        let mut thread = CommentsMirror::new(42);

        let created = thread.create(&api, "Hej").await.unwrap();
        assert_eq!(created.id, 7);
        assert!(thread.last_error().is_some());
        assert!(thread.comments().is_empty());
    }
}
