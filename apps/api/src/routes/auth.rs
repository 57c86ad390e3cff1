//! Sign-in, token refresh, page guard and profile completion.

use axum::extract::{Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use shopdesk_core::access::{authorize, check_login};
use shopdesk_core::validation::validate_name;
use shopdesk_core::{AccessDecision, AccessError, AccountStatus, LoginSurface, Profile, Role, Route};
use shopdesk_db::Credential;

use crate::auth::{extract_bearer_token, TokenPair};
use crate::error::{ApiError, ApiResult};
use crate::extract::{Authenticated, Principal};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/salesperson-login", post(salesperson_login))
        .route("/refresh", post(refresh))
        .route("/me", get(me))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SalespersonLoginRequest {
    /// Email, or the generated username when it has no `@`.
    #[serde(alias = "email", alias = "username")]
    pub login: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    /// Dashboard to open. `None` while the profile is missing.
    pub route: Option<Route>,
    pub profile: Option<Profile>,
    pub profile_required: bool,
}

/// Verifies a password against a looked-up credential.
async fn verify(state: &AppState, credential: Option<Credential>, password: &str) -> ApiResult<Credential> {
    let Some(credential) = credential else {
        return Err(ApiError::invalid_credentials());
    };

    if !state.passwords.verify(password, &credential.password_hash).await? {
        return Err(ApiError::invalid_credentials());
    }

    Ok(credential)
}

/// Opens a session on the main login, which any role may use.
///
/// A verified credential without a profile still gets tokens so the user can
/// complete the profile.
async fn open_main_session(state: &AppState, id: &str) -> ApiResult<SessionResponse> {
    let profile = state.db.profiles().get(id).await?;

    match check_login(LoginSurface::Main, profile.as_ref()) {
        Ok(route) => {
            let role = profile.as_ref().map(|p| p.role);
            Ok(SessionResponse {
                tokens: state.jwt.issue_pair(id, role)?,
                route: Some(route),
                profile,
                profile_required: false,
            })
        }
        Err(AccessError::ProfileMissing) => {
            info!(id = %id, "Signed in without profile");
            Ok(SessionResponse {
                tokens: state.jwt.issue_pair(id, None)?,
                route: None,
                profile: None,
                profile_required: true,
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /api/auth/login
async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> ApiResult<Json<SessionResponse>> {
    debug!(email = %req.email, "Login attempt");

    let credential = state.db.credentials().find_by_email(&req.email).await?;
    let credential = verify(&state, credential, &req.password).await?;

    let session = open_main_session(&state, &credential.id).await?;
    info!(id = %credential.id, route = ?session.route, "Login succeeded");
    Ok(Json(session))
}

/// POST /api/auth/salesperson-login
async fn salesperson_login(
    State(state): State<AppState>,
    Json(req): Json<SalespersonLoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let login = req.login.trim();
    debug!(login = %login, "Salesperson login attempt");

    let credential = if login.contains('@') {
        state.db.credentials().find_by_email(login).await?
    } else {
        state.db.credentials().find_by_username(login).await?
    };
    let credential = verify(&state, credential, &req.password).await?;

    let profile = state.db.profiles().get(&credential.id).await?;
    let route = check_login(LoginSurface::Salesperson, profile.as_ref()).map_err(|e| {
        warn!(id = %credential.id, reason = %e, "Salesperson login refused");
        ApiError::from(e)
    })?;

    info!(id = %credential.id, "Salesperson login succeeded");
    Ok(Json(SessionResponse {
        tokens: state.jwt.issue_pair(&credential.id, Some(Role::Salesperson))?,
        route: Some(route),
        profile,
        profile_required: false,
    }))
}

/// POST /api/auth/refresh
///
/// Re-runs the main login checks, so a deactivated account cannot refresh.
async fn refresh(State(state): State<AppState>, Json(req): Json<RefreshRequest>) -> ApiResult<Json<SessionResponse>> {
    let claims = state.jwt.validate_refresh_token(&req.refresh_token)?;

    if state.db.credentials().get(&claims.sub).await?.is_none() {
        return Err(ApiError::unauthorized("Account no longer exists"));
    }

    Ok(Json(open_main_session(&state, &claims.sub).await?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub profile: Profile,
    pub route: Route,
}

/// GET /api/auth/me
async fn me(principal: Principal) -> Json<MeResponse> {
    let route = shopdesk_core::access::landing_route(principal.profile.role);
    Json(MeResponse {
        profile: principal.profile,
        route,
    })
}

#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    pub route: String,
}

/// GET /api/access?route=/admin
///
/// The page guard. Missing or bad tokens, missing profiles and failed
/// lookups all redirect to `/`.
pub async fn access(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AccessQuery>,
) -> ApiResult<Json<AccessDecision>> {
    let route: Route = query.route.parse()?;

    let sub = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token)
        .and_then(|token| state.jwt.validate_access_token(token).ok())
        .map(|claims| claims.sub);

    let lookup = match sub {
        Some(sub) => state.db.profiles().get(&sub).await,
        None => Ok(None),
    };
    if let Err(e) = &lookup {
        warn!(route = %route, error = %e, "Profile lookup failed in page guard");
    }

    Ok(Json(authorize(route, lookup.as_ref().map(Option::as_ref))))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteProfileRequest {
    pub name: String,
    pub role: Role,
    pub store_name: Option<String>,
}

/// POST /api/profile/complete
///
/// Creates the missing profile of a signed-in credential. Only the admin
/// role may be self-assigned, plus super_admin while none exists.
pub async fn complete_profile(
    State(state): State<AppState>,
    Authenticated(claims): Authenticated,
    Json(req): Json<CompleteProfileRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    validate_name("name", &req.name)?;

    if state.db.profiles().get(&claims.sub).await?.is_some() {
        return Err(ApiError::conflict("Profile already exists"));
    }

    let credential = state
        .db
        .credentials()
        .get(&claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Account no longer exists"))?;

    let store_name = match req.role {
        Role::Admin => {
            let store_name = req.store_name.as_deref().map(str::trim).unwrap_or_default();
            validate_name("storeName", store_name)?;
            Some(store_name.to_string())
        }
        Role::SuperAdmin => {
            if state.db.profiles().super_admin_exists().await? {
                return Err(ApiError::forbidden("A super admin already exists"));
            }
            None
        }
        Role::Salesperson => {
            return Err(ApiError::forbidden("Salesperson accounts are created by an admin"));
        }
    };

    let profile = Profile {
        id: credential.id.clone(),
        name: req.name.trim().to_string(),
        email: credential.email.clone(),
        role: req.role,
        status: AccountStatus::Active,
        admin_id: None,
        store_name,
        username: None,
        phone: None,
        picture_url: None,
        created_by: None,
        created_at: Utc::now(),
    };
    state.db.profiles().insert(&profile).await?;

    info!(id = %profile.id, role = %profile.role, "Profile completed");

    let session = open_main_session(&state, &profile.id).await?;
    Ok((StatusCode::CREATED, Json(session)))
}
