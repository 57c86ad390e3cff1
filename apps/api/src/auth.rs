//! JWT authentication module.
//!
//! Handles token generation and validation, and credential hashing.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use shopdesk_core::Role;

use crate::error::ApiError;

const ACCESS: &str = "access";
const REFRESH: &str = "refresh";

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (credential / profile id)
    pub sub: String,

    /// Role at issue time. `None` until the profile is completed.
    ///
    /// Informational only: guards always re-read the profile.
    pub role: Option<Role>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,

    /// Token type ("access" or "refresh")
    pub token_type: String,
}

/// Access and refresh token issued together at sign-in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// JWT token manager.
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_lifetime_secs: i64,
    refresh_lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: &str, access_lifetime_secs: i64, refresh_lifetime_secs: i64) -> Self {
        JwtManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_lifetime_secs,
            refresh_lifetime_secs,
        }
    }

    fn generate(&self, sub: &str, role: Option<Role>, token_type: &str, lifetime_secs: i64) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(lifetime_secs);

        let claims = Claims {
            sub: sub.to_string(),
            role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: token_type.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding).map_err(|e| {
            error!(error = %e, token_type, "Failed to sign token");
            ApiError::internal("Failed to generate token")
        })
    }

    /// Generate an access token.
    pub fn generate_access_token(&self, sub: &str, role: Option<Role>) -> Result<String, ApiError> {
        self.generate(sub, role, ACCESS, self.access_lifetime_secs)
    }

    /// Generate a refresh token.
    pub fn generate_refresh_token(&self, sub: &str, role: Option<Role>) -> Result<String, ApiError> {
        self.generate(sub, role, REFRESH, self.refresh_lifetime_secs)
    }

    /// Generate both tokens for a sign-in.
    pub fn issue_pair(&self, sub: &str, role: Option<Role>) -> Result<TokenPair, ApiError> {
        Ok(TokenPair {
            access_token: self.generate_access_token(sub, role)?,
            refresh_token: self.generate_refresh_token(sub, role)?,
        })
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let token_data: TokenData<Claims> = decode(token, &self.decoding, &Validation::default())
            .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }

    /// Validate that a token is an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, ApiError> {
        let claims = self.validate_token(token)?;

        if claims.token_type != ACCESS {
            return Err(ApiError::unauthorized("Expected access token"));
        }

        Ok(claims)
    }

    /// Validate that a token is a refresh token.
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, ApiError> {
        let claims = self.validate_token(token)?;

        if claims.token_type != REFRESH {
            return Err(ApiError::unauthorized("Expected refresh token"));
        }

        Ok(claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// =============================================================================
// Passwords
// =============================================================================

/// Argon2id hashing of sign-in passwords.
///
/// Hashing is CPU bound, so both operations run on the blocking pool.
#[derive(Clone, Default)]
pub struct Passwords {
    params: Params,
}

impl Passwords {
    pub fn new(params: Params) -> Self {
        Passwords { params }
    }

    /// Minimal argon2 cost. Only for tests.
    pub fn low_cost() -> Self {
        let params = Params::new(Params::MIN_M_COST, Params::MIN_T_COST, Params::MIN_P_COST, None)
            .unwrap_or_default();
        Passwords { params }
    }

    fn hasher(params: Params) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    }

    /// Hashes a password into a PHC string.
    pub async fn hash(&self, password: &str) -> Result<String, ApiError> {
        let params = self.params.clone();
        let password = password.to_string();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Self::hasher(params)
                .hash_password(password.as_bytes(), &salt)
                .map(|h| h.to_string())
        })
        .await
        .map_err(|e| {
            error!(error = %e, "Password hashing task failed");
            ApiError::internal("Failed to hash password")
        })?
        .map_err(|e| {
            error!(error = %e, "Password hashing failed");
            ApiError::internal("Failed to hash password")
        })
    }

    /// Checks a password against a stored PHC string.
    ///
    /// An unparseable stored hash never matches.
    pub async fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, ApiError> {
        let params = self.params.clone();
        let password = password.to_string();
        let stored_hash = stored_hash.to_string();

        tokio::task::spawn_blocking(move || match PasswordHash::new(&stored_hash) {
            Ok(parsed) => Self::hasher(params)
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        })
        .await
        .map_err(|e| {
            error!(error = %e, "Password verification task failed");
            ApiError::internal("Failed to verify password")
        })
    }
}
