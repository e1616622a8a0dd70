//! Bearer-token authentication for the HTTP surface.
//!
//! Token issuance, user management and role assignment all live in the
//! identity service; this module only verifies the JWT it minted and exposes
//! the caller's identity and permissions to handlers. Ownership checks
//! (does this caller own the enrollment) stay in the settlement service.

use axum::{async_trait, extract::FromRequestParts, http::header, http::request::Parts};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::AppState;

/// Permission names used by the payment endpoints.
pub mod consts {
    pub const PAYMENTS_READ: &str = "payments:read";
    pub const PAYMENTS_WRITE: &str = "payments:write";
    pub const PAYMENTS_ADMIN: &str = "payments:admin";
}

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,              // Subject (user ID)
    pub roles: Vec<String>,       // User's roles
    pub permissions: Vec<String>, // User's explicit permissions
    pub iat: i64,                 // Issued at time
    pub exp: i64,                 // Expiration time
}

/// Authenticated user data extracted from the JWT token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

impl AuthenticatedUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.is_admin() || self.permissions.iter().any(|p| p == permission || p == "*")
    }

    pub fn is_admin(&self) -> bool {
        self.has_role("admin")
    }
}

/// Decodes and verifies a bearer token against the configured secret.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, ServiceError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| ServiceError::Unauthorized(format!("invalid token: {}", e)))
}

impl TryFrom<Claims> for AuthenticatedUser {
    type Error = ServiceError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized("token subject is not a user id".into()))?;

        Ok(AuthenticatedUser {
            user_id,
            roles: claims.roles,
            permissions: claims.permissions,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ServiceError::Unauthorized("missing Authorization header".into()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ServiceError::Unauthorized("expected a bearer token".into()))?
            .trim();

        let claims = decode_token(token, &state.config.jwt_secret)?;
        claims.try_into()
    }
}
