use chrono::Duration;

use crate::auth::password;
use crate::db::models::{now_utc, Role};
use crate::db::{comments, posts, users};
use crate::state::DbPool;

/// Insert demo accounts and content. Does nothing unless the users table is
/// empty. Returns whether anything was inserted.
pub fn seed_demo_data(pool: &DbPool, bcrypt_cost: u32) -> anyhow::Result<bool> {
    let mut conn = pool.get()?;
    if users::count(&conn)? > 0 {
        tracing::debug!("Database already has users, skipping seed");
        return Ok(false);
    }

    let admin_hash = password::hash("Admin123!", bcrypt_cost)?;
    let user_hash = password::hash("User123!", bcrypt_cost)?;

    let tx = conn.transaction()?;
    let admin = users::insert(&tx, "admin", "admin@test.com", &admin_hash, Role::Admin)?;
    let user1 = users::insert(&tx, "user1", "user@test.com", &user_hash, Role::User)?;

    let now = now_utc();
    let welcome = posts::insert(
        &tx,
        admin.id,
        "Välkommen till Anslagstavlan!",
        "Detta är den första posten på vår community board. Här kan du dela med dig av information, nyheter och meddelanden.",
        "Allmänt",
        &now,
    )?;
    let help = posts::insert(
        &tx,
        user1.id,
        "Sökes: Hjälp med React",
        "Jag behöver hjälp med att förstå React hooks bättre. Finns det någon som kan förklara useEffect?",
        "Hjälp",
        &(now - Duration::days(1)),
    )?;

    comments::insert(&tx, welcome, user1.id, "Tack för att du skapade denna plattform!", &now)?;
    comments::insert(&tx, welcome, admin.id, "Varsågod! Hoppas ni får användning för den.", &now)?;
    comments::insert(
        &tx,
        help,
        admin.id,
        "useEffect körs efter render. Används för side effects som API-calls.",
        &now,
    )?;
    tx.commit()?;

    tracing::info!("Seeded demo data (admin@test.com, user@test.com)");
    Ok(true)
}
