use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::TokenIssuer;
use crate::config::Config;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub tokens: Arc<TokenIssuer>,
}

impl AppState {
    pub fn new(db: DbPool, config: Config, jwt_secret: &str) -> Self {
        let tokens = TokenIssuer::new(jwt_secret, config.auth.issuer.clone(), config.auth.token_days);
        Self {
            db,
            config,
            tokens: Arc::new(tokens),
        }
    }
}
