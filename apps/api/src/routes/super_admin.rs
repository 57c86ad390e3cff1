//! Super admin dashboard: store owners.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use shopdesk_core::{AccountStatus, Profile, Role};

use crate::accounts::{self, NewAdmin};
use crate::error::{ApiError, ApiResult};
use crate::extract::SuperAdminUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admins", get(list_admins).post(create_admin))
        .route("/admins/{id}/toggle-status", post(toggle_admin_status))
        .route("/admins/{id}", delete(delete_admin))
}

async fn list_admins(_user: SuperAdminUser, State(state): State<AppState>) -> ApiResult<Json<Vec<Profile>>> {
    Ok(Json(state.db.profiles().list_admins().await?))
}

async fn create_admin(
    user: SuperAdminUser,
    State(state): State<AppState>,
    Json(req): Json<NewAdmin>,
) -> ApiResult<(StatusCode, Json<Profile>)> {
    let profile = accounts::provision_admin(&state, &user.profile, req).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusChange {
    id: String,
    status: AccountStatus,
    salespersons_updated: u64,
}

/// Flips an admin between active and inactive, with its salespersons.
async fn toggle_admin_status(
    user: SuperAdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusChange>> {
    let admin = state
        .db
        .profiles()
        .get(&id)
        .await?
        .filter(|p| p.role == Role::Admin)
        .ok_or_else(|| ApiError::not_found("Admin", &id))?;

    let status = admin.status.toggled();
    let salespersons_updated = state.db.profiles().set_admin_status_cascade(&id, status).await?;

    if status == AccountStatus::Inactive {
        discard_carts(&state, &id).await?;
    }

    info!(admin = %id, status = status.as_str(), by = %user.profile.id, "Admin status toggled");
    Ok(Json(StatusChange {
        id,
        status,
        salespersons_updated,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Deleted {
    id: String,
    salespersons_removed: u64,
}

/// Deletes an admin, its salespersons and its store data.
async fn delete_admin(
    user: SuperAdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Deleted>> {
    discard_carts(&state, &id).await?;
    let salespersons_removed = state.db.profiles().delete_admin_cascade(&id).await?;

    info!(admin = %id, salespersons_removed, by = %user.profile.id, "Admin deleted");
    Ok(Json(Deleted {
        id,
        salespersons_removed,
    }))
}

async fn discard_carts(state: &AppState, admin_id: &str) -> ApiResult<()> {
    let ids: Vec<String> = state
        .db
        .profiles()
        .list_salespersons(admin_id)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();
    state.carts.discard(&ids);
    Ok(())
}
