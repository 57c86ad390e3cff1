//! # Error Types
//!
//! Domain-specific error types for shopdesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shopdesk-core errors (this file)                                      │
//! │  ├── CoreError        - Cart, checkout and record rules                │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  shopdesk-core::access                                                 │
//! │  └── AccessError      - Login surface rejections                       │
//! │                                                                         │
//! │  shopdesk-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  HTTP errors (in apps/api)                                             │
//! │  └── ApiError         - What the dashboard sees (JSON)                 │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They are translated to user-facing messages at the HTTP edge.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Item cannot be found in the tenant's catalog.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// The item has no cart line to operate on.
    #[error("Item {0} is not in the cart")]
    NotInCart(String),

    /// A new cart line was requested for an item with zero stock.
    #[error("{name} is out of stock")]
    OutOfStock { item_id: String, name: String },

    /// Stock is lower than the quantity being sold.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart built while stock=5 (qty: 5)
    ///      │
    ///      ▼
    /// Another salesperson sells 3
    ///      │
    ///      ▼
    /// Checkout: conditional decrement finds stock=2
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Soap", available: 2, requested: 5 }
    ///      │
    ///      ▼
    /// Whole checkout rolled back, nothing persisted
    /// ```
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Checkout was attempted with no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// A line or cart total does not fit in the money range.
    #[error("Amount exceeds the supported range")]
    AmountOverflow,

    /// A sale's stored total disagrees with its lines.
    #[error("Sale total {recorded} does not match line sum {computed}")]
    TotalMismatch { recorded: i64, computed: i64 },

    /// The acting profile may not record sales.
    #[error("Profile {profile_id} cannot sell: {reason}")]
    InvalidSeller { profile_id: String, reason: String },

    /// A stored record failed typed decoding.
    #[error("Malformed {entity} record {id}: {reason}")]
    MalformedRecord {
        entity: &'static str,
        id: String,
        reason: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a MalformedRecord error.
    pub fn malformed(entity: &'static str, id: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::MalformedRecord {
            entity,
            id: id.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            item_id: "item-1".to_string(),
            name: "Soap".to_string(),
            available: 2,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Soap: available 2, requested 5"
        );

        let err = CoreError::malformed("item", "item-9", "negative quantity");
        assert_eq!(err.to_string(), "Malformed item record item-9: negative quantity");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        };
        assert_eq!(err.to_string(), "password must be at least 6 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "price".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
