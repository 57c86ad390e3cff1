//! # shopdesk-db: Database Layer for ShopDesk
//!
//! SQLite persistence for every tenant collection, with sqlx for async
//! access. Rows are decoded into the typed records of `shopdesk-core`;
//! anything that does not decode is rejected at this boundary.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ShopDesk Data Flow                               │
//! │                                                                         │
//! │  HTTP handler (POST /api/salesperson/checkout)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   shopdesk-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │   │   │
//! │  │   │               │    │ ProfileRepo    │   │              │   │   │
//! │  │   │ SqlitePool    │◄───│ ItemRepo       │   │ 001_initial  │   │   │
//! │  │   │               │    │ SaleRepo ...   │   │              │   │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL)                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopdesk_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./shopdesk.db")).await?;
//! let items = db.items().list(&admin_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::category::{CategoryRepository, NewCategory};
pub use repository::credential::{Credential, CredentialRepository};
pub use repository::item::{ItemRepository, NewItem};
pub use repository::payment_option::{NewPaymentOption, PaymentOptionRepository};
pub use repository::profile::{NewAccount, ProfileRepository};
pub use repository::sale::SaleRepository;
