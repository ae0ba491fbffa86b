use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::db::models::{Role, User};
use crate::error::AppError;

/// Claims embedded in every issued credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Verified identity of a caller, taken from token claims without
/// consulting the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Signs and verifies HS256 bearer tokens.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    validity: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, issuer: impl Into<String>, validity_days: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            validity: Duration::days(validity_days),
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, AppError> {
        self.issue_at(user, Utc::now())
    }

    /// Issue a token as if it had been created at `issued_at`.
    pub fn issue_at(&self, user: &User, issued_at: DateTime<Utc>) -> Result<String, AppError> {
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            iss: self.issuer.clone(),
            aud: self.issuer.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.validity).timestamp(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Check signature, issuer, audience and expiry. Every failure is
    /// reported as `Unauthorized`.
    pub fn verify(&self, token: &str) -> Result<Identity, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.issuer]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            tracing::debug!("Rejected bearer token: {}", e);
            AppError::Unauthorized
        })?;
        let claims = data.claims;

        let user_id = claims.sub.parse::<i64>().map_err(|_| AppError::Unauthorized)?;
        let role = Role::parse(&claims.role).ok_or(AppError::Unauthorized)?;

        Ok(Identity {
            user_id,
            username: claims.username,
            email: claims.email,
            role,
        })
    }
}
