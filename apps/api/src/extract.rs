//! # Request Extractors
//!
//! Authentication and role guards for handlers.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Authorization: Bearer <access token>                                   │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  Authenticated ── token valid ─────────────────► Claims                 │
//! │        │                                                                │
//! │        ▼  profile read from the database on every request               │
//! │  Principal ────── profile exists and is active ─► Profile               │
//! │  RequireRole<R> ─ authorize(R::ROUTE, lookup) ──► Profile               │
//! │                   otherwise 403 { redirect: "/" }                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Role and status are never trusted from the token: deactivating or
//! deleting an account takes effect on its next request.

use std::marker::PhantomData;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::warn;

use shopdesk_core::access::authorize;
use shopdesk_core::{AccessDecision, AccessError, Profile, Route};

use crate::auth::{extract_bearer_token, Claims};
use crate::error::ApiError;
use crate::state::AppState;

fn bearer_claims(parts: &Parts, state: &AppState) -> Result<Claims, ApiError> {
    let token = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token)
        .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

    state.jwt.validate_access_token(token)
}

/// A valid access token. The account may not have a profile yet.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Claims);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        bearer_claims(parts, state).map(Authenticated)
    }
}

/// A signed-in, active principal of any role.
#[derive(Debug, Clone)]
pub struct Principal {
    pub claims: Claims,
    pub profile: Profile,
}

impl FromRequestParts<AppState> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;

        let profile = state
            .db
            .profiles()
            .get(&claims.sub)
            .await?
            .ok_or(AccessError::ProfileMissing)?;

        if !profile.is_active() {
            return Err(AccessError::Deactivated.into());
        }

        Ok(Principal { claims, profile })
    }
}

// =============================================================================
// Role Guards
// =============================================================================

/// The dashboard a guarded handler belongs to.
pub trait Dashboard: Send + Sync + 'static {
    const ROUTE: Route;
}

#[derive(Debug)]
pub struct SuperAdminArea;

#[derive(Debug)]
pub struct AdminArea;

#[derive(Debug)]
pub struct SalespersonArea;

impl Dashboard for SuperAdminArea {
    const ROUTE: Route = Route::SuperAdmin;
}

impl Dashboard for AdminArea {
    const ROUTE: Route = Route::Admin;
}

impl Dashboard for SalespersonArea {
    const ROUTE: Route = Route::Salesperson;
}

/// An active principal whose role matches dashboard `D`.
#[derive(Debug)]
pub struct RequireRole<D> {
    pub profile: Profile,
    _dashboard: PhantomData<D>,
}

pub type SuperAdminUser = RequireRole<SuperAdminArea>;
pub type AdminUser = RequireRole<AdminArea>;
pub type SalespersonUser = RequireRole<SalespersonArea>;

impl<D> RequireRole<D> {
    /// Tenant whose data this principal works on.
    pub fn tenant_id(&self) -> Result<&str, ApiError> {
        self.profile
            .tenant_id()
            .ok_or_else(|| ApiError::redirect(Route::Login))
    }
}

impl<D: Dashboard> FromRequestParts<AppState> for RequireRole<D> {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;

        let lookup = state.db.profiles().get(&claims.sub).await;
        if let Err(e) = &lookup {
            warn!(sub = %claims.sub, error = %e, "Profile lookup failed, denying access");
        }

        match authorize(D::ROUTE, lookup.as_ref().map(Option::as_ref)) {
            AccessDecision::Authorized => match lookup {
                Ok(Some(profile)) => Ok(RequireRole {
                    profile,
                    _dashboard: PhantomData,
                }),
                _ => Err(ApiError::redirect(Route::Login)),
            },
            AccessDecision::Redirect(to) => {
                warn!(sub = %claims.sub, route = %D::ROUTE, "Access denied");
                Err(ApiError::redirect(to))
            }
        }
    }
}
