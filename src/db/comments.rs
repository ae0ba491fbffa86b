use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::{format_timestamp, timestamp_column, CommentView};

const VIEW_SELECT: &str = "SELECT c.id, c.post_id, c.user_id, u.username, c.content, c.created_at
     FROM comments c
     JOIN users u ON u.id = c.user_id";

fn view_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommentView> {
    Ok(CommentView {
        id: row.get(0)?,
        post_id: row.get(1)?,
        user_id: row.get(2)?,
        username: row.get(3)?,
        content: row.get(4)?,
        created_at: timestamp_column(row, 5)?,
    })
}

/// Comments on a post, oldest first. Equal timestamps fall back to
/// insertion order.
pub fn list_for_post(conn: &Connection, post_id: i64) -> rusqlite::Result<Vec<CommentView>> {
    let mut stmt = conn.prepare(&format!(
        "{VIEW_SELECT} WHERE c.post_id = ?1 ORDER BY c.created_at ASC, c.id ASC"
    ))?;
    let comments = stmt
        .query_map(params![post_id], view_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(comments)
}

pub fn find_view(conn: &Connection, id: i64) -> rusqlite::Result<Option<CommentView>> {
    conn.query_row(
        &format!("{VIEW_SELECT} WHERE c.id = ?1"),
        params![id],
        view_from_row,
    )
    .optional()
}

pub fn owner_of(conn: &Connection, id: i64) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT user_id FROM comments WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )
    .optional()
}

pub fn insert(
    conn: &Connection,
    post_id: i64,
    user_id: i64,
    content: &str,
    created_at: &DateTime<Utc>,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO comments (post_id, user_id, content, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![post_id, user_id, content, format_timestamp(created_at)],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}
