//! HTTP routes, one module per dashboard.
//!
//! ```text
//! /health                         liveness + database check
//! /api/auth/*                     sign-in, refresh, current principal
//! /api/access?route=..            page guard
//! /api/profile/complete           create a missing profile
//! /api/super-admin/*              store owners
//! /api/admin/*                    catalog, payment options, staff, reports
//! /api/salesperson/*              item picker, cart, checkout, today
//! ```

pub mod admin;
pub mod auth;
pub mod salesperson;
pub mod super_admin;

use axum::extract::State;
use axum::http::StatusCode;

use crate::state::AppState;

/// GET /health
pub async fn health(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if state.db.health_check().await {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "DATABASE UNAVAILABLE")
    }
}
