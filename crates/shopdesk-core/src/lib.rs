//! # shopdesk-core: Pure Business Logic for ShopDesk
//!
//! This crate holds every rule of the store: money arithmetic, the cart
//! engine, sale drafting, the access gate, report aggregation and the
//! code generators. It has zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ShopDesk Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Dashboards (super-admin / admin / salesperson)     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP + JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    shopdesk-api (axum)                          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shopdesk-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │  types   │ │  money   │ │   cart   │ │ checkout │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │  access  │ │  report  │ │  codes   │ │ catalog  │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  shopdesk-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Typed records (Profile, Item, Category, PaymentOption, Sale)
//! - [`money`] - Money type with integer arithmetic
//! - [`cart`] - Cart engine with stock-bounded quantities
//! - [`checkout`] - Turns a cart into a sale draft
//! - [`access`] - Role router and login checks
//! - [`report`] - Daily buckets, totals, recent sales
//! - [`codes`] - Item code and username generation
//! - [`catalog`] - Item picker filter
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use shopdesk_core::money::Money;
//!
//! let price = Money::from_cents(1099);
//! assert_eq!(price.to_string(), "$10.99");
//! assert_eq!(price.multiply_quantity(3).cents(), 3297);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod access;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod codes;
pub mod error;
pub mod money;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use access::{AccessDecision, AccessError, LoginSurface, Route};
pub use cart::{Cart, CartLine, CartView};
pub use catalog::CatalogFilter;
pub use checkout::{SaleDraft, Seller};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Highest item price accepted, in cents ($1,000,000.00).
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Highest stock level accepted for one item.
pub const MAX_STOCK_QUANTITY: i64 = 1_000_000;

/// Number of sales shown in the "recent sales" table.
pub const RECENT_SALES_LIMIT: usize = 10;

/// Items below this quantity count as low stock on the admin dashboard.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

/// Category prefix used when an item has no category.
pub const FALLBACK_CODE_PREFIX: &str = "GEN";
