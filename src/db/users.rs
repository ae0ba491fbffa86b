use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::{optional_timestamp_column, Role, User, UserStats};

const USER_COLUMNS: &str = "id, username, email, password_hash, role";

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: row.get(4)?,
    })
}

pub fn email_exists(conn: &Connection, email: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE email = ?1",
        params![email],
        |row| row.get(0),
    )
}

pub fn username_exists(conn: &Connection, username: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE username = ?1",
        params![username],
        |row| row.get(0),
    )
}

/// Insert a user and return the stored row.
pub fn insert(
    conn: &Connection,
    username: &str,
    email: &str,
    password_hash: &str,
    role: Role,
) -> rusqlite::Result<User> {
    conn.execute(
        "INSERT INTO users (username, email, password_hash, role) VALUES (?1, ?2, ?3, ?4)",
        params![username, email, password_hash, role],
    )?;

    Ok(User {
        id: conn.last_insert_rowid(),
        username: username.to_string(),
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        role,
    })
}

pub fn find_by_email(conn: &Connection, email: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
        params![email],
        user_from_row,
    )
    .optional()
}

pub fn count(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
}

/// Activity aggregate for every user, ordered by id.
pub fn activity_stats(conn: &Connection) -> rusqlite::Result<Vec<UserStats>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, username, email, post_count, comment_count, last_activity_date
         FROM user_activity_stats
         ORDER BY user_id",
    )?;

    let stats = stmt
        .query_map([], |row| {
            Ok(UserStats {
                user_id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                post_count: row.get(3)?,
                comment_count: row.get(4)?,
                last_activity_date: optional_timestamp_column(row, 5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(stats)
}
