use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::{format_timestamp, timestamp_column, PostSummary};

const SUMMARY_COLUMNS: &str =
    "id, title, content, category, user_id, username, created_at, comment_count";

fn summary_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostSummary> {
    Ok(PostSummary {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        category: row.get(3)?,
        user_id: row.get(4)?,
        username: row.get(5)?,
        created_at: timestamp_column(row, 6)?,
        comment_count: row.get(7)?,
    })
}

/// Every post summary in store order.
pub fn list_summaries(conn: &Connection) -> rusqlite::Result<Vec<PostSummary>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SUMMARY_COLUMNS} FROM post_summaries ORDER BY id"
    ))?;
    let posts = stmt
        .query_map([], summary_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

pub fn find_summary(conn: &Connection, id: i64) -> rusqlite::Result<Option<PostSummary>> {
    conn.query_row(
        &format!("SELECT {SUMMARY_COLUMNS} FROM post_summaries WHERE id = ?1"),
        params![id],
        summary_from_row,
    )
    .optional()
}

/// Owning user id of a post, or `None` when the post does not exist.
pub fn owner_of(conn: &Connection, id: i64) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT user_id FROM posts WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )
    .optional()
}

pub fn insert(
    conn: &Connection,
    user_id: i64,
    title: &str,
    content: &str,
    category: &str,
    created_at: &DateTime<Utc>,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO posts (title, content, category, user_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![title, content, category, user_id, format_timestamp(created_at)],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Overwrites the mutable fields; owner and timestamp are left alone.
pub fn update(
    conn: &Connection,
    id: i64,
    title: &str,
    content: &str,
    category: &str,
) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE posts SET title = ?1, content = ?2, category = ?3 WHERE id = ?4",
        params![title, content, category, id],
    )?;
    Ok(rows > 0)
}

/// Deletes a post; its comments go with it through the foreign key cascade.
pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}
