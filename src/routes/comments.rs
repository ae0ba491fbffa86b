use axum::extract::State;
use axum::routing::{delete, get};
use axum::{Json, Router};
use rusqlite::TransactionBehavior;
use serde::{Deserialize, Serialize};

use crate::auth::policy::ensure_can_modify;
use crate::db::models::{now_utc, CommentView};
use crate::db::{comments, posts};
use crate::error::{AppError, AppResult};
use crate::extractors::{ApiJson, ApiPath, CurrentUser};
use crate::routes::{required_text, MessageResponse};
use crate::state::AppState;

const MAX_COMMENT_LEN: usize = 2_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        // Same parameter name as /posts/{id}; the router requires it.
        .route(
            "/posts/{id}/comments",
            get(list_comments).post(create_comment),
        )
        .route("/comments/{id}", delete(delete_comment))
}

/// Oldest first. A post without comments, or one that no longer exists,
/// yields an empty list.
async fn list_comments(
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<i64>,
) -> AppResult<Json<Vec<CommentView>>> {
    let conn = state.db.get()?;
    Ok(Json(comments::list_for_post(&conn, post_id)?))
}

async fn create_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(post_id): ApiPath<i64>,
    ApiJson(req): ApiJson<CommentRequest>,
) -> AppResult<Json<CommentView>> {
    let content = required_text("Comment", &req.content, MAX_COMMENT_LEN)?;

    let mut conn = state.db.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if posts::owner_of(&tx, post_id)?.is_none() {
        return Err(AppError::NotFound);
    }
    let id = comments::insert(&tx, post_id, user.user_id, &content, &now_utc())?;
    let comment = comments::find_view(&tx, id)?
        .ok_or_else(|| AppError::Internal(format!("Comment {} missing after insert", id)))?;
    tx.commit()?;

    tracing::info!("User {} commented on post {}", user.user_id, post_id);
    Ok(Json(comment))
}

async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<MessageResponse>> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let owner_id = comments::owner_of(&tx, id)?.ok_or(AppError::NotFound)?;
    ensure_can_modify(&user, owner_id)?;

    comments::delete(&tx, id)?;
    tx.commit()?;

    tracing::info!("User {} deleted comment {}", user.user_id, id);
    Ok(Json(MessageResponse::new("Comment deleted")))
}
