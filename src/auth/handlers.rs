use axum::extract::State;
use axum::Json;
use rusqlite::ErrorCode;
use serde::{Deserialize, Serialize};

use crate::auth::password;
use crate::db::models::{PublicUser, Role};
use crate::db::users;
use crate::error::{AppError, AppResult};
use crate::extractors::ApiJson;
use crate::state::AppState;

// -- Request/Response types --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

// -- Handlers --

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_string();
    if username.is_empty() {
        return Err(AppError::BadRequest("Username is required".into()));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest("A valid email is required".into()));
    }
    if req.password.is_empty() {
        return Err(AppError::BadRequest("Password is required".into()));
    }

    {
        let conn = state.db.get()?;
        if users::email_exists(&conn, &email)? {
            return Err(AppError::Conflict("Email is already registered".into()));
        }
        if users::username_exists(&conn, &username)? {
            return Err(AppError::Conflict("Username is already taken".into()));
        }
    }

    let plaintext = req.password;
    let cost = state.config.auth.bcrypt_cost;
    let password_hash = tokio::task::spawn_blocking(move || password::hash(&plaintext, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))??;

    let conn = state.db.get()?;
    let user = users::insert(&conn, &username, &email, &password_hash, Role::User)
        .map_err(|e| match e.sqlite_error_code() {
            // Lost a race with a concurrent registration
            Some(ErrorCode::ConstraintViolation) => {
                AppError::Conflict("Email or username is already taken".into())
            }
            _ => AppError::from(e),
        })?;

    tracing::info!("Registered user {} ({})", user.username, user.id);

    let token = state.tokens.issue(&user)?;
    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

/// POST /api/auth/login
///
/// Unknown email and wrong password produce the same error.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = req.email.trim().to_string();
    let user = {
        let conn = state.db.get()?;
        users::find_by_email(&conn, &email)?
    };

    let Some(user) = user else {
        tracing::debug!("Login failed: unknown email");
        return Err(AppError::InvalidCredentials);
    };

    let plaintext = req.password;
    let stored_hash = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || password::verify(&plaintext, &stored_hash))
        .await
        .map_err(|e| AppError::Internal(format!("Verification task failed: {}", e)))?;

    if !verified {
        tracing::debug!("Login failed: wrong password for user {}", user.id);
        return Err(AppError::InvalidCredentials);
    }

    let token = state.tokens.issue(&user)?;
    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}
