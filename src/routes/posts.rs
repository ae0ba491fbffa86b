use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use rusqlite::TransactionBehavior;
use serde::{Deserialize, Serialize};

use crate::auth::policy::ensure_can_modify;
use crate::db::models::{now_utc, PostSummary};
use crate::db::posts;
use crate::error::{AppError, AppResult};
use crate::extractors::{ApiJson, ApiPath, CurrentUser};
use crate::routes::{required_text, MessageResponse};
use crate::state::AppState;

const MAX_TITLE_LEN: usize = 200;
const MAX_CONTENT_LEN: usize = 10_000;
const MAX_CATEGORY_LEN: usize = 50;

// --- Requests ---

/// Body of both create and update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRequest {
    pub title: String,
    pub content: String,
    pub category: String,
}

struct ValidPost {
    title: String,
    content: String,
    category: String,
}

impl PostRequest {
    fn validate(self) -> AppResult<ValidPost> {
        Ok(ValidPost {
            title: required_text("Title", &self.title, MAX_TITLE_LEN)?,
            content: required_text("Content", &self.content, MAX_CONTENT_LEN)?,
            category: required_text("Category", &self.category, MAX_CATEGORY_LEN)?,
        })
    }
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
}

// --- Handlers ---

async fn list_posts(State(state): State<AppState>) -> AppResult<Json<Vec<PostSummary>>> {
    let conn = state.db.get()?;
    Ok(Json(posts::list_summaries(&conn)?))
}

async fn get_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<PostSummary>> {
    let conn = state.db.get()?;
    let post = posts::find_summary(&conn, id)?.ok_or(AppError::NotFound)?;
    Ok(Json(post))
}

async fn create_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<PostRequest>,
) -> AppResult<Json<PostSummary>> {
    let post = req.validate()?;

    let conn = state.db.get()?;
    let id = posts::insert(
        &conn,
        user.user_id,
        &post.title,
        &post.content,
        &post.category,
        &now_utc(),
    )?;
    tracing::info!("User {} created post {}", user.user_id, id);

    let summary = posts::find_summary(&conn, id)?
        .ok_or_else(|| AppError::Internal(format!("Post {} missing after insert", id)))?;
    Ok(Json(summary))
}

async fn update_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<PostRequest>,
) -> AppResult<Json<PostSummary>> {
    let post = req.validate()?;

    let mut conn = state.db.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let owner_id = posts::owner_of(&tx, id)?.ok_or(AppError::NotFound)?;
    ensure_can_modify(&user, owner_id)?;

    posts::update(&tx, id, &post.title, &post.content, &post.category)?;
    let summary = posts::find_summary(&tx, id)?.ok_or(AppError::NotFound)?;
    tx.commit()?;

    tracing::info!("User {} updated post {}", user.user_id, id);
    Ok(Json(summary))
}

async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<MessageResponse>> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let owner_id = posts::owner_of(&tx, id)?.ok_or(AppError::NotFound)?;
    ensure_can_modify(&user, owner_id)?;

    posts::delete(&tx, id)?;
    tx.commit()?;

    tracing::info!("User {} deleted post {}", user.user_id, id);
    Ok(Json(MessageResponse::new("Post deleted")))
}
