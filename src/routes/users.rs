use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::db::models::UserStats;
use crate::db::users;
use crate::error::AppResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/users/stats", get(user_stats))
}

/// Read-only activity report for every user; no authentication.
async fn user_stats(State(state): State<AppState>) -> AppResult<Json<Vec<UserStats>>> {
    let conn = state.db.get()?;
    Ok(Json(users::activity_stats(&conn)?))
}
