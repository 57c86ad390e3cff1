//! Salesperson dashboard: item picker, cart, checkout and today's sales.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use shopdesk_core::report::{daily_summary, local_midnight_utc, DailySummary};
use shopdesk_core::{
    CartView, CatalogFilter, Category, CoreError, Item, PaymentMethod, PaymentOption, Sale, SaleDraft, Seller,
};
use shopdesk_db::DbError;

use crate::error::ApiResult;
use crate::extract::SalespersonUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/catalog", get(catalog))
        .route("/categories", get(categories))
        .route("/payment-options", get(payment_options))
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/items", post(add_to_cart))
        .route("/cart/items/{item_id}", patch(update_quantity).delete(remove_from_cart))
        .route("/checkout", post(checkout))
        .route("/today", get(today))
}

/// GET /api/salesperson/catalog?search=&categoryId=
///
/// In-stock items of the salesperson's store.
async fn catalog(
    user: SalespersonUser,
    State(state): State<AppState>,
    Query(filter): Query<CatalogFilter>,
) -> ApiResult<Json<Vec<Item>>> {
    let items = state.db.items().list(user.tenant_id()?).await?;
    Ok(Json(filter.apply(items)))
}

async fn categories(user: SalespersonUser, State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.db.categories().list(user.tenant_id()?).await?))
}

async fn payment_options(
    user: SalespersonUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PaymentOption>>> {
    Ok(Json(state.db.payment_options().list(user.tenant_id()?).await?))
}

// =============================================================================
// Cart
// =============================================================================

async fn get_cart(user: SalespersonUser, State(state): State<AppState>) -> Json<CartView> {
    Json(state.carts.with_cart(&user.profile.id, |cart| CartView::from(cart)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddToCart {
    item_id: String,
}

/// Adds one unit, bounded by the item's current stock.
async fn add_to_cart(
    user: SalespersonUser,
    State(state): State<AppState>,
    Json(req): Json<AddToCart>,
) -> ApiResult<Json<CartView>> {
    let item = state
        .db
        .items()
        .get(user.tenant_id()?, &req.item_id)
        .await?
        .ok_or_else(|| CoreError::ItemNotFound(req.item_id.clone()))?;

    let view = state.carts.with_cart_mut(&user.profile.id, |cart| {
        cart.add_to_cart(&item).map(|_| CartView::from(&*cart))
    })?;

    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
struct QuantityChange {
    delta: i64,
}

/// Changes a line by `delta`. Reaching zero removes the line.
async fn update_quantity(
    user: SalespersonUser,
    State(state): State<AppState>,
    Path(item_id): Path<String>,
    Json(req): Json<QuantityChange>,
) -> ApiResult<Json<CartView>> {
    // Clamp against live stock, not the stock seen when the line was added.
    let stock = state
        .db
        .items()
        .get(user.tenant_id()?, &item_id)
        .await?
        .map(|item| item.quantity)
        .unwrap_or(0);

    let view = state.carts.with_cart_mut(&user.profile.id, |cart| {
        if cart.line(&item_id).is_none() {
            return Err(CoreError::NotInCart(item_id.clone()));
        }
        // A sold-out item drops out of the cart here.
        cart.refresh_stock(&item_id, stock);
        if cart.line(&item_id).is_some() {
            cart.update_quantity(&item_id, req.delta)?;
        }
        Ok(CartView::from(&*cart))
    })?;

    Ok(Json(view))
}

async fn remove_from_cart(
    user: SalespersonUser,
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> ApiResult<Json<CartView>> {
    let view = state.carts.with_cart_mut(&user.profile.id, |cart| {
        if !cart.remove_from_cart(&item_id) {
            return Err(CoreError::NotInCart(item_id.clone()));
        }
        Ok(CartView::from(&*cart))
    })?;

    Ok(Json(view))
}

async fn clear_cart(user: SalespersonUser, State(state): State<AppState>) -> Json<CartView> {
    Json(state.carts.with_cart_mut(&user.profile.id, |cart| {
        cart.clear();
        CartView::from(&*cart)
    }))
}

// =============================================================================
// Checkout
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutRequest {
    payment_method: PaymentMethod,
}

/// POST /api/salesperson/checkout
///
/// Records the cart as one sale and decrements stock atomically. The cart
/// leaves the store for the duration, so a repeated submit finds it empty.
async fn checkout(
    user: SalespersonUser,
    State(state): State<AppState>,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<Sale>)> {
    let seller = Seller::from_profile(&user.profile)?;
    let cart = state.carts.take(&user.profile.id);

    let draft = match SaleDraft::from_cart(Uuid::new_v4().to_string(), &cart, &seller, req.payment_method, Utc::now()) {
        Ok(draft) => draft,
        Err(e) => {
            state.carts.restore(&user.profile.id, cart);
            return Err(e.into());
        }
    };

    match state.db.sales().checkout(&draft).await {
        Ok(sale) => {
            info!(
                sale = %sale.id,
                salesperson = %sale.salesperson_id,
                total_cents = sale.total_cents,
                "Sale recorded"
            );
            Ok((StatusCode::CREATED, Json(sale)))
        }
        Err(e) => {
            let mut cart = cart;
            match &e {
                DbError::Domain(CoreError::InsufficientStock { item_id, available, .. }) => {
                    warn!(item = %item_id, available, "Checkout hit stale stock");
                    cart.refresh_stock(item_id, *available);
                }
                DbError::Domain(CoreError::ItemNotFound(item_id)) => {
                    warn!(item = %item_id, "Checkout hit a deleted item");
                    cart.refresh_stock(item_id, 0);
                }
                _ => {}
            }
            state.carts.restore(&user.profile.id, cart);
            Err(e.into())
        }
    }
}

/// GET /api/salesperson/today
async fn today(user: SalespersonUser, State(state): State<AppState>) -> ApiResult<Json<DailySummary>> {
    let now = Utc::now();
    let since = local_midnight_utc(now, state.report_offset);

    let sales = state
        .db
        .sales()
        .list_for_salesperson_since(&user.profile.id, since)
        .await?;

    Ok(Json(daily_summary(&sales, &user.profile.id, now, state.report_offset)))
}
