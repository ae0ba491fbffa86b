pub mod auth;
pub mod comments;
pub mod posts;
pub mod users;

use axum::http::HeaderValue;
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::CorsConfig;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Confirmation body for deletes.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Trims `value` and rejects it when empty or longer than `max` characters.
pub(crate) fn required_text(field: &str, value: &str, max: usize) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{} cannot be empty", field)));
    }
    if value.chars().count() > max {
        return Err(AppError::BadRequest(format!(
            "{} must be {} characters or less",
            field, max
        )));
    }
    Ok(value.to_string())
}

/// Every API route, relative to `/api`.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(posts::router())
        .merge(comments::router())
        .merge(users::router())
}

/// The complete application: `/api` routes plus CORS and request tracing.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors);
    Router::new()
        .nest("/api", api_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_trims() {
        assert_eq!(required_text("Title", "  Hi  ", 10).unwrap(), "Hi");
    }

    #[test]
    fn required_text_rejects_blank() {
        assert!(matches!(
            required_text("Title", "   ", 10),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn required_text_counts_characters_not_bytes() {
        assert!(required_text("Category", "Allmänt", 7).is_ok());
        assert!(matches!(
            required_text("Category", "Allmänt!", 7),
            Err(AppError::BadRequest(_))
        ));
    }
}
