//! # ShopDesk API
//!
//! HTTP server for the super admin, admin and salesperson dashboards.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         ShopDesk API                                    │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  auth          │  │  super_admin   │  │  admin                     ││
//! │  │                │  │                │  │                            ││
//! │  │ • login        │  │ • list admins  │  │ • categories, items        ││
//! │  │ • salesperson  │  │ • provision    │  │ • payment options          ││
//! │  │   login        │  │ • toggle       │  │ • salespersons             ││
//! │  │ • refresh, me  │  │   (cascade)    │  │ • reports, dashboard       ││
//! │  │ • page guard   │  │ • delete       │  │ • image upload             ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐                                                     │
//! │  │  salesperson   │   extract: Authenticated / Principal / RequireRole  │
//! │  │                │   state:   Database, JwtManager, Passwords,          │
//! │  │ • catalog      │            ImageHost, CartStore                     │
//! │  │ • cart         │                                                     │
//! │  │ • checkout     │                                                     │
//! │  │ • today        │                                                     │
//! │  └────────────────┘                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (see [`config::ServerConfig::load`]):
//! - `SHOPDESK_BIND` - listen address (default: 0.0.0.0:8080)
//! - `DATABASE_PATH` - SQLite file (default: ./shopdesk.db)
//! - `JWT_SECRET` - Secret for JWT signing
//! - `JWT_ACCESS_LIFETIME_SECS` / `JWT_REFRESH_LIFETIME_SECS`
//! - `IMAGE_CLOUD_NAME`, `IMAGE_UPLOAD_PRESET`, `IMAGE_FOLDER`, `IMAGE_UPLOAD_URL`
//! - `REPORT_UTC_OFFSET_MINUTES`, `LOW_STOCK_THRESHOLD`, `MAX_UPLOAD_BYTES`

pub mod accounts;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod forms;
pub mod images;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

// Re-exports
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

/// Multipart overhead allowed on top of one file.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Builds the full HTTP router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + FORM_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(routes::health))
        .nest("/api/auth", routes::auth::router())
        .route("/api/access", get(routes::auth::access))
        .route("/api/profile/complete", post(routes::auth::complete_profile))
        .nest("/api/super-admin", routes::super_admin::router())
        .nest("/api/admin", routes::admin::router())
        .nest("/api/salesperson", routes::salesperson::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
