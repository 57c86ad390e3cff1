//! # Account Provisioning
//!
//! Creates sign-in identities on behalf of another principal.
//!
//! ```text
//! super_admin ── provision_admin ───────► admin        (own tenant)
//! admin ──────── provision_salesperson ─► salesperson  (admin_id = admin)
//! ```
//!
//! Provisioning runs entirely on the server: the acting principal keeps its
//! own session and nothing is written unless both the credential and the
//! profile are stored.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use shopdesk_core::codes::{generate_username, legacy_password};
use shopdesk_core::validation::{validate_email, validate_name, validate_password};
use shopdesk_core::{Profile, Role};
use shopdesk_db::NewAccount;

use crate::error::{ApiError, ApiResult};
use crate::images::Upload;
use crate::state::AppState;

/// Super admin form for a new store owner.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
    pub store_name: String,
}

/// Admin form for a new register account.
#[derive(Debug, Clone)]
pub struct NewSalesperson {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub picture: Option<Upload>,
}

/// Sign-in details handed to the admin once, right after creation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedLogin {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedSalesperson {
    pub profile: Profile,
    pub login: IssuedLogin,
    /// Another salesperson already had this username.
    pub username_collision: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_warning: Option<String>,
}

pub async fn provision_admin(state: &AppState, actor: &Profile, req: NewAdmin) -> ApiResult<Profile> {
    validate_name("name", &req.name)?;
    validate_email(&req.email)?;
    validate_password(&req.password)?;
    validate_name("storeName", &req.store_name)?;

    let password_hash = state.passwords.hash(&req.password).await?;

    let profile = state
        .db
        .profiles()
        .provision(&NewAccount {
            email: req.email.trim().to_lowercase(),
            password_hash,
            name: req.name,
            role: Role::Admin,
            admin_id: None,
            store_name: Some(req.store_name.trim().to_string()),
            username: None,
            phone: None,
            picture_url: None,
            created_by: Some(actor.id.clone()),
        })
        .await?;

    info!(admin = %profile.id, by = %actor.id, "Admin provisioned");
    Ok(profile)
}

/// Creates a salesperson with a generated username and password.
///
/// The password follows the store's legacy scheme (`username` + `123`), so
/// it is not held to the minimum length of chosen passwords.
pub async fn provision_salesperson(
    state: &AppState,
    admin: &Profile,
    req: NewSalesperson,
) -> ApiResult<ProvisionedSalesperson> {
    validate_name("name", &req.name)?;
    validate_email(&req.email)?;
    let email = req.email.trim().to_lowercase();

    // Checked before the picture is uploaded so a duplicate leaves no orphan image.
    if state.db.credentials().find_by_email(&email).await?.is_some() {
        return Err(ApiError::conflict("An account with this email already exists"));
    }

    let username = generate_username(&req.name);
    if username.is_empty() {
        return Err(ApiError::validation("name must contain at least one letter or digit"));
    }

    let username_collision = state.db.profiles().username_exists(&username).await?;
    if username_collision {
        warn!(username = %username, admin = %admin.id, "Generated username already taken");
    }

    let password = legacy_password(&username);
    let password_hash = state.passwords.hash(&password).await?;

    let image = state.images.upload_optional(req.picture).await;

    let profile = state
        .db
        .profiles()
        .provision(&NewAccount {
            email: email.clone(),
            password_hash,
            name: req.name,
            role: Role::Salesperson,
            admin_id: Some(admin.id.clone()),
            store_name: None,
            username: Some(username.clone()),
            phone: req.phone,
            picture_url: image.url,
            created_by: Some(admin.id.clone()),
        })
        .await?;

    info!(salesperson = %profile.id, admin = %admin.id, "Salesperson provisioned");

    Ok(ProvisionedSalesperson {
        profile,
        login: IssuedLogin {
            email,
            username,
            password,
        },
        username_collision,
        image_warning: image.warning,
    })
}
