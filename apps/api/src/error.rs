//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in ShopDesk                               │
//! │                                                                         │
//! │  Handler ── Result<T, ApiError>                                         │
//! │     │                                                                   │
//! │     ├── DbError ──────────┐                                             │
//! │     ├── CoreError ────────┤                                             │
//! │     ├── ValidationError ──┼──► ApiError { code, message, redirect }     │
//! │     ├── AccessError ──────┤            │                                │
//! │     └── ImageError ───────┘            ▼                                │
//! │                                 IntoResponse: status + JSON body        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! ```json
//! { "code": "INSUFFICIENT_STOCK", "message": "Insufficient stock for Cola: available 2, requested 3" }
//! { "code": "FORBIDDEN", "message": "Access denied", "redirect": "/" }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use shopdesk_core::{AccessError, CoreError, Route, ValidationError};
use shopdesk_db::DbError;

use crate::images::ImageError;

pub type ApiResult<T> = Result<T, ApiError>;

/// API error returned from handlers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Where the dashboard should send the user instead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Route>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Missing or invalid token (401)
    Unauthorized,

    /// Wrong email/username or password (401)
    InvalidCredentials,

    /// Principal may not open this dashboard (403)
    Forbidden,

    /// Account is inactive (403)
    AccountDeactivated,

    /// Non-salesperson on the salesperson login (403)
    WrongLoginSurface,

    /// Signed in but no profile record (403)
    ProfileMissing,

    /// Duplicate email or existing profile (409)
    Conflict,

    /// Stock ran out between cart and checkout (409)
    InsufficientStock,

    /// Cart or sale rule violated (422)
    BusinessLogic,

    /// Image host rejected or failed the upload (502)
    UploadFailed,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized | ErrorCode::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden
            | ErrorCode::AccountDeactivated
            | ErrorCode::WrongLoginSurface
            | ErrorCode::ProfileMissing => StatusCode::FORBIDDEN,
            ErrorCode::Conflict | ErrorCode::InsufficientStock => StatusCode::CONFLICT,
            ErrorCode::BusinessLogic => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::UploadFailed => StatusCode::BAD_GATEWAY,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            redirect: None,
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    /// Same message for unknown account and wrong password.
    pub fn invalid_credentials() -> Self {
        ApiError::new(ErrorCode::InvalidCredentials, "Invalid email or password")
    }

    /// Page-guard denial, sending the user to `to`.
    pub fn redirect(to: Route) -> Self {
        ApiError {
            code: ErrorCode::Forbidden,
            message: "Access denied".to_string(),
            redirect: Some(to),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Conflict, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        if err.is_unique_violation_on("email") {
            return ApiError::conflict("An account with this email already exists");
        }

        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                ApiError::conflict(format!("{} '{}' already exists", field, value))
            }
            DbError::Domain(core) => core.into(),
            DbError::ConnectionFailed(e) => {
                error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::ForeignKeyViolation { message } => {
                error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ItemNotFound(id) => ApiError::not_found("Item", &id),
            CoreError::NotInCart(id) => ApiError::not_found("Cart line", &id),
            e @ CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, e.to_string())
            }
            e @ (CoreError::OutOfStock { .. }
            | CoreError::EmptyCart
            | CoreError::CartTooLarge { .. }
            | CoreError::AmountOverflow
            | CoreError::InvalidSeller { .. }) => ApiError::new(ErrorCode::BusinessLogic, e.to_string()),
            CoreError::TotalMismatch { recorded, computed } => {
                error!(recorded, computed, "Sale total mismatch");
                ApiError::internal("Sale total does not match its lines")
            }
            CoreError::MalformedRecord { entity, id, reason } => {
                error!(entity, id = %id, reason = %reason, "Malformed record");
                ApiError::new(ErrorCode::DatabaseError, format!("Stored {} is malformed", entity))
            }
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        let code = match err {
            AccessError::ProfileMissing => ErrorCode::ProfileMissing,
            AccessError::WrongSurface => ErrorCode::WrongLoginSurface,
            AccessError::Deactivated => ErrorCode::AccountDeactivated,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::NotConfigured => ApiError::new(ErrorCode::UploadFailed, err.to_string()),
            other => {
                error!(error = %other, "Image upload failed");
                ApiError::new(ErrorCode::UploadFailed, "Image upload failed")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_maps_to_conflict() {
        let err: ApiError = DbError::Domain(CoreError::InsufficientStock {
            item_id: "i1".to_string(),
            name: "Cola".to_string(),
            available: 2,
            requested: 3,
        })
        .into();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert!(err.message.contains("Cola"));
    }

    #[test]
    fn test_duplicate_email_is_conflict() {
        let err: ApiError = DbError::duplicate("credentials.email", "a@b.com").into();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.message, "An account with this email already exists");
    }

    #[test]
    fn test_access_errors_are_distinguishable() {
        let deactivated: ApiError = AccessError::Deactivated.into();
        let surface: ApiError = AccessError::WrongSurface.into();

        assert_eq!(deactivated.code, ErrorCode::AccountDeactivated);
        assert_eq!(surface.code, ErrorCode::WrongLoginSurface);
        assert_eq!(deactivated.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_internal_details_not_leaked() {
        let err: ApiError = DbError::QueryFailed("no such table: items".to_string()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("items"));
    }

    #[test]
    fn test_redirect_serializes_path() {
        let json = serde_json::to_value(ApiError::redirect(Route::Login)).unwrap();
        assert_eq!(json["code"], "FORBIDDEN");
        assert_eq!(json["redirect"], "/");
    }
}
