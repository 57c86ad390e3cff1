//! # Access Gate
//!
//! Maps a principal's profile to the dashboard it may open, and decides
//! whether a sign-in on a given login surface is accepted.
//!
//! ## Page Guard
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       authorize(route, lookup)                          │
//! │                                                                         │
//! │   lookup failed ─────────────────────────────► Redirect("/")           │
//! │   no profile ────────────────────────────────► Redirect("/")           │
//! │   profile.role != route.required_role ───────► Redirect("/")           │
//! │   profile.status == inactive ────────────────► Redirect("/")           │
//! │   otherwise ─────────────────────────────────► Authorized              │
//! │                                                                         │
//! │   "/" and "/salesperson-login" are always Authorized.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Denial is only ever a redirect. A failed profile read is treated exactly
//! like a missing profile (fail closed).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::error::ValidationError;
use crate::types::{Profile, Role};

// =============================================================================
// Routes
// =============================================================================

/// Dashboard entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Route {
    /// `/` - main login
    Login,
    /// `/salesperson-login`
    SalespersonLogin,
    /// `/admin`
    Admin,
    /// `/salesperson`
    Salesperson,
    /// `/super-admin`
    SuperAdmin,
}

impl Route {
    pub const fn path(&self) -> &'static str {
        match self {
            Route::Login => "/",
            Route::SalespersonLogin => "/salesperson-login",
            Route::Admin => "/admin",
            Route::Salesperson => "/salesperson",
            Route::SuperAdmin => "/super-admin",
        }
    }

    /// Role a principal needs to open this route. `None` for login pages.
    pub const fn required_role(&self) -> Option<Role> {
        match self {
            Route::Login | Route::SalespersonLogin => None,
            Route::Admin => Some(Role::Admin),
            Route::Salesperson => Some(Role::Salesperson),
            Route::SuperAdmin => Some(Role::SuperAdmin),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Route {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "/" => Ok(Route::Login),
            "/salesperson-login" => Ok(Route::SalespersonLogin),
            "/admin" => Ok(Route::Admin),
            "/salesperson" => Ok(Route::Salesperson),
            "/super-admin" => Ok(Route::SuperAdmin),
            _ => Err(ValidationError::InvalidFormat {
                field: "route".to_string(),
                reason: format!("unknown route {}", s),
            }),
        }
    }
}

impl From<Route> for String {
    fn from(route: Route) -> Self {
        route.path().to_string()
    }
}

impl TryFrom<String> for Route {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The dashboard a role lands on after sign-in.
pub const fn landing_route(role: Role) -> Route {
    match role {
        Role::SuperAdmin => Route::SuperAdmin,
        Role::Admin => Route::Admin,
        Role::Salesperson => Route::Salesperson,
    }
}

// =============================================================================
// Page Guard
// =============================================================================

/// Outcome of a page guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "to", rename_all = "snake_case")]
pub enum AccessDecision {
    Authorized,
    Redirect(Route),
}

/// Decides whether the principal may open `route`.
///
/// ## Arguments
/// * `route` - Requested dashboard
/// * `lookup` - Result of reading the principal's profile
pub fn authorize<E>(route: Route, lookup: Result<Option<&Profile>, E>) -> AccessDecision {
    let Some(required) = route.required_role() else {
        return AccessDecision::Authorized;
    };

    match lookup {
        Ok(Some(profile)) if profile.role == required && profile.is_active() => {
            AccessDecision::Authorized
        }
        _ => AccessDecision::Redirect(Route::Login),
    }
}

// =============================================================================
// Login Checks
// =============================================================================

/// Which login form the credentials were submitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginSurface {
    /// `/` - any role, routed by role
    Main,
    /// `/salesperson-login` - salespersons only
    Salesperson,
}

/// Reasons a correctly authenticated principal is still refused a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("User profile not found")]
    ProfileMissing,

    #[error("This login is only for salespersons")]
    WrongSurface,

    #[error("Your account has been deactivated")]
    Deactivated,
}

/// Checks a sign-in after the password has been verified.
///
/// ## Returns
/// The route the principal should be sent to.
pub fn check_login(surface: LoginSurface, profile: Option<&Profile>) -> Result<Route, AccessError> {
    let profile = profile.ok_or(AccessError::ProfileMissing)?;

    if surface == LoginSurface::Salesperson && profile.role != Role::Salesperson {
        return Err(AccessError::WrongSurface);
    }

    if !profile.is_active() {
        return Err(AccessError::Deactivated);
    }

    Ok(landing_route(profile.role))
}
