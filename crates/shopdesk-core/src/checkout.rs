//! # Sale Drafting
//!
//! Turns a cart into the sale record that the checkout transaction persists.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Checkout                                        │
//! │                                                                         │
//! │  1. DRAFT (this module, pure)                                          │
//! │     └── SaleDraft::from_cart() → snapshot lines, compute total         │
//! │                                                                         │
//! │  2. PERSIST + DECREMENT (shopdesk-db, one transaction)                 │
//! │     ├── INSERT sale, INSERT lines                                      │
//! │     ├── UPDATE items SET quantity = quantity - q                       │
//! │     │        WHERE id = ? AND quantity >= q   (per line)               │
//! │     └── any line short → ROLLBACK, nothing persisted                   │
//! │                                                                         │
//! │  3. CLEAR CART (api layer, only after COMMIT)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PaymentMethod, Profile, Role, Sale, SaleLine};

/// The salesperson a sale is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seller {
    pub salesperson_id: String,
    pub salesperson_name: String,
    /// Tenant the sale belongs to.
    pub admin_id: String,
}

impl Seller {
    /// Derives the seller from a profile.
    ///
    /// Only active salespersons with an owning admin may sell.
    pub fn from_profile(profile: &Profile) -> CoreResult<Self> {
        let reject = |reason: &str| CoreError::InvalidSeller {
            profile_id: profile.id.clone(),
            reason: reason.to_string(),
        };

        if profile.role != Role::Salesperson {
            return Err(reject("only salespersons record sales"));
        }
        if !profile.is_active() {
            return Err(reject("account is deactivated"));
        }

        let admin_id = profile
            .admin_id
            .clone()
            .ok_or_else(|| reject("no owning admin"))?;

        Ok(Seller {
            salesperson_id: profile.id.clone(),
            salesperson_name: profile.name.clone(),
            admin_id,
        })
    }
}

/// A sale ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleDraft {
    pub sale: Sale,
}

impl SaleDraft {
    /// Snapshots the cart into a sale.
    ///
    /// ## Arguments
    /// * `id` - New sale id (generated by the caller)
    /// * `cart` - Non-empty cart
    /// * `seller` - Salesperson and tenant stamp
    /// * `payment_method` - Cash or a bank option
    /// * `now` - Creation timestamp
    ///
    /// ## Errors
    /// `EmptyCart` when the cart has no lines, `AmountOverflow` when the
    /// total does not fit.
    pub fn from_cart(
        id: impl Into<String>,
        cart: &Cart,
        seller: &Seller,
        payment_method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        if cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let lines: Vec<SaleLine> = cart
            .lines()
            .iter()
            .map(|l| {
                Ok(SaleLine {
                    item_id: l.item_id.clone(),
                    name: l.name.clone(),
                    unit_price_cents: l.unit_price_cents,
                    quantity: l.quantity,
                    line_total_cents: l.checked_line_total()?.cents(),
                })
            })
            .collect::<CoreResult<_>>()?;

        let total = Money::checked_sum(lines.iter().map(|l| Money::from_cents(l.line_total_cents)))
            .ok_or(CoreError::AmountOverflow)?;

        let sale = Sale {
            id: id.into(),
            admin_id: seller.admin_id.clone(),
            salesperson_id: seller.salesperson_id.clone(),
            salesperson_name: seller.salesperson_name.clone(),
            payment_method,
            total_cents: total.cents(),
            lines,
            created_at: now,
        };

        sale.verify_total()?;

        Ok(SaleDraft { sale })
    }
}
