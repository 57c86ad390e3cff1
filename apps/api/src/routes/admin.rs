//! Admin dashboard: catalog, payment options, staff and reports.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use shopdesk_core::codes::generate_item_code;
use shopdesk_core::report::{build_report, DashboardStats, ReportWindow, SalesReport};
use shopdesk_core::validation::{
    validate_account_number, validate_name, validate_price_cents, validate_stock_quantity,
};
use shopdesk_core::{AccountStatus, Category, Item, Money, PaymentOption, Profile, Role};
use shopdesk_db::{NewCategory, NewItem, NewPaymentOption};

use crate::accounts::{self, NewSalesperson, ProvisionedSalesperson};
use crate::error::{ApiError, ApiResult};
use crate::extract::AdminUser;
use crate::forms::FormData;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/categories", get(list_categories).post(create_category))
        .route("/items", get(list_items).post(create_item))
        .route("/items/{id}/image", post(replace_item_image))
        .route("/payment-options", get(list_payment_options).post(create_payment_option))
        .route("/payment-options/{id}", delete(delete_payment_option))
        .route("/salespersons", get(list_salespersons).post(create_salesperson))
        .route("/salespersons/{id}/toggle-status", post(toggle_salesperson_status))
        .route("/salespersons/{id}", delete(delete_salesperson))
        .route("/reports", get(reports))
        .route("/images", post(upload_image))
}

/// GET /api/admin/dashboard
async fn dashboard(user: AdminUser, State(state): State<AppState>) -> ApiResult<Json<DashboardStats>> {
    let tenant = user.tenant_id()?;

    Ok(Json(DashboardStats {
        total_items: state.db.items().count(tenant).await?,
        low_stock_items: state
            .db
            .items()
            .count_low_stock(tenant, state.config.low_stock_threshold)
            .await?,
        salespersons: state.db.profiles().count_salespersons(tenant).await?,
        categories: state.db.categories().count(tenant).await?,
    }))
}

// =============================================================================
// Categories
// =============================================================================

#[derive(Debug, Deserialize)]
struct CategoryRequest {
    name: String,
}

async fn list_categories(user: AdminUser, State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.db.categories().list(user.tenant_id()?).await?))
}

async fn create_category(
    user: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<CategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    validate_name("name", &req.name)?;

    let category = state
        .db
        .categories()
        .insert(&NewCategory {
            admin_id: user.tenant_id()?.to_string(),
            name: req.name.trim().to_string(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(category)))
}

// =============================================================================
// Items
// =============================================================================

async fn list_items(user: AdminUser, State(state): State<AppState>) -> ApiResult<Json<Vec<Item>>> {
    Ok(Json(state.db.items().list(user.tenant_id()?).await?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatedItem {
    item: Item,
    /// Another item in this store already had the generated code.
    code_collision: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_warning: Option<String>,
}

/// POST /api/admin/items (multipart)
///
/// Fields: `name`, `price` (decimal), `quantity`, optional `categoryId`,
/// optional `image` file. The code is generated from the category and item
/// names. A failed image upload does not fail the item.
async fn create_item(
    user: AdminUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<CreatedItem>)> {
    let tenant = user.tenant_id()?.to_string();
    let mut form = FormData::read(multipart, state.config.max_upload_bytes).await?;

    let name = form.required("name")?.to_string();
    validate_name("name", &name)?;

    let price_cents = Money::parse_decimal(form.required("price")?)?.cents();
    validate_price_cents(price_cents)?;

    let quantity: i64 = form
        .required("quantity")?
        .parse()
        .map_err(|_| ApiError::validation("quantity must be a whole number"))?;
    validate_stock_quantity(quantity)?;

    let category = match form.text("categoryId") {
        Some(id) => Some(
            state
                .db
                .categories()
                .get(&tenant, id)
                .await?
                .ok_or_else(|| ApiError::not_found("Category", id))?,
        ),
        None => None,
    };

    let code = generate_item_code(category.as_ref().map(|c| c.name.as_str()), &name, &mut rand::thread_rng());
    let code_collision = state.db.items().code_exists(&tenant, &code).await?;
    if code_collision {
        warn!(code = %code, admin = %tenant, "Generated item code already in use");
    }

    let image = state.images.upload_optional(form.take_file("image")).await;

    let item = state
        .db
        .items()
        .insert(&NewItem {
            admin_id: tenant,
            name,
            price_cents,
            quantity,
            category_id: category.as_ref().map(|c| c.id.clone()),
            category_name: category.map(|c| c.name).unwrap_or_default(),
            code,
            image_url: image.url,
        })
        .await?;

    info!(item = %item.id, code = %item.code, "Item created");
    Ok((
        StatusCode::CREATED,
        Json(CreatedItem {
            item,
            code_collision,
            image_warning: image.warning,
        }),
    ))
}

/// POST /api/admin/items/{id}/image (multipart, `image`)
///
/// Unlike creation, a failed upload fails the request and the old image stays.
async fn replace_item_image(
    user: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<Item>> {
    let tenant = user.tenant_id()?.to_string();
    let mut form = FormData::read(multipart, state.config.max_upload_bytes).await?;
    let file = form
        .take_file("image")
        .ok_or_else(|| ApiError::validation("image is required"))?;

    // Nothing is uploaded for an item this tenant cannot see.
    if state.db.items().get(&tenant, &id).await?.is_none() {
        return Err(ApiError::not_found("Item", &id));
    }

    let url = state.images.upload(file).await?;
    state.db.items().update_image(&tenant, &id, &url).await?;

    let item = state
        .db
        .items()
        .get(&tenant, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Item", &id))?;

    info!(item = %item.id, "Item image replaced");
    Ok(Json(item))
}

// =============================================================================
// Payment Options
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentOptionRequest {
    bank_name: String,
    account_name: String,
    account_number: String,
}

async fn list_payment_options(
    user: AdminUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PaymentOption>>> {
    Ok(Json(state.db.payment_options().list(user.tenant_id()?).await?))
}

async fn create_payment_option(
    user: AdminUser,
    State(state): State<AppState>,
    Json(req): Json<PaymentOptionRequest>,
) -> ApiResult<(StatusCode, Json<PaymentOption>)> {
    validate_name("bankName", &req.bank_name)?;
    validate_name("accountName", &req.account_name)?;
    validate_account_number(&req.account_number)?;

    let option = state
        .db
        .payment_options()
        .insert(&NewPaymentOption {
            admin_id: user.tenant_id()?.to_string(),
            bank_name: req.bank_name.trim().to_string(),
            account_name: req.account_name.trim().to_string(),
            account_number: req.account_number.trim().to_string(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(option)))
}

async fn delete_payment_option(
    user: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.payment_options().delete(user.tenant_id()?, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Salespersons
// =============================================================================

async fn list_salespersons(user: AdminUser, State(state): State<AppState>) -> ApiResult<Json<Vec<Profile>>> {
    Ok(Json(state.db.profiles().list_salespersons(user.tenant_id()?).await?))
}

/// POST /api/admin/salespersons (multipart)
///
/// Fields: `name`, `email`, optional `phone`, optional `picture` file.
async fn create_salesperson(
    user: AdminUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ProvisionedSalesperson>)> {
    let mut form = FormData::read(multipart, state.config.max_upload_bytes).await?;

    let req = NewSalesperson {
        name: form.required("name")?.to_string(),
        email: form.required("email")?.to_string(),
        phone: form.text("phone").map(str::to_string),
        picture: form.take_file("picture"),
    };

    let created = accounts::provision_salesperson(&state, &user.profile, req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SalespersonStatus {
    id: String,
    status: AccountStatus,
}

async fn toggle_salesperson_status(
    user: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SalespersonStatus>> {
    let tenant = user.tenant_id()?;

    let salesperson = state
        .db
        .profiles()
        .get(&id)
        .await?
        .filter(|p| p.role == Role::Salesperson && p.admin_id.as_deref() == Some(tenant))
        .ok_or_else(|| ApiError::not_found("Salesperson", &id))?;

    let status = salesperson.status.toggled();
    state.db.profiles().set_salesperson_status(tenant, &id, status).await?;
    if status == AccountStatus::Inactive {
        state.carts.discard(std::slice::from_ref(&id));
    }

    info!(salesperson = %id, status = status.as_str(), "Salesperson status toggled");
    Ok(Json(SalespersonStatus { id, status }))
}

async fn delete_salesperson(
    user: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.profiles().delete_salesperson(user.tenant_id()?, &id).await?;
    state.carts.discard(std::slice::from_ref(&id));

    info!(salesperson = %id, "Salesperson deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Reports & Images
// =============================================================================

#[derive(Debug, Deserialize)]
struct ReportQuery {
    days: Option<u32>,
}

/// GET /api/admin/reports?days=7|30|90
async fn reports(
    user: AdminUser,
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<SalesReport>> {
    let window = match query.days {
        Some(days) => ReportWindow::from_days(days)?,
        None => ReportWindow::default(),
    };

    let sales = state.db.sales().list_for_admin(user.tenant_id()?).await?;
    Ok(Json(build_report(&sales, window, Utc::now(), state.report_offset)))
}

#[derive(Debug, Serialize)]
struct UploadedImage {
    url: String,
}

/// POST /api/admin/images (multipart, `file`)
async fn upload_image(
    _user: AdminUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadedImage>)> {
    let mut form = FormData::read(multipart, state.config.max_upload_bytes).await?;
    let file = form
        .take_file("file")
        .ok_or_else(|| ApiError::validation("file is required"))?;

    let url = state.images.upload(file).await?;
    Ok((StatusCode::CREATED, Json(UploadedImage { url })))
}
