//! # Domain Types
//!
//! Typed records for every collection the store keeps.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Profile      │   │      Item       │   │      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  role, status   │   │  admin_id (FK)  │   │  admin_id (FK)  │       │
//! │  │  admin_id (FK)  │   │  price_cents    │   │  salesperson_id │       │
//! │  │  store_name     │   │  quantity       │   │  lines[]        │       │
//! │  └─────────────────┘   │  code           │   │  total_cents    │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │   │  PaymentOption  │   │  PaymentMethod  │       │
//! │  │  admin_id (FK)  │   │  admin_id (FK)  │   │  "cash"         │       │
//! │  │  name           │   │  bank, account  │   │  "bank_<id>"    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tenancy
//! A tenant is one store, identified by its owning admin's id. Every
//! tenant-scoped record carries that id as `admin_id`, and every query
//! for tenant data filters on it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::{MAX_PRICE_CENTS, MAX_STOCK_QUANTITY};

// =============================================================================
// Role
// =============================================================================

/// The role of an authenticated principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform operator; manages admins.
    SuperAdmin,
    /// Store owner; the tenant.
    Admin,
    /// Works the register for one admin.
    Salesperson,
}

impl Role {
    /// Wire/storage name of the role.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Salesperson => "salesperson",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Role::SuperAdmin),
            "admin" => Ok(Role::Admin),
            "salesperson" => Ok(Role::Salesperson),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec![
                    "super_admin".to_string(),
                    "admin".to_string(),
                    "salesperson".to_string(),
                ],
            }),
        }
    }
}

// =============================================================================
// Account Status
// =============================================================================

/// Whether a principal may sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl AccountStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
        }
    }

    /// The opposite status (used by the status toggle buttons).
    pub const fn toggled(&self) -> Self {
        match self {
            AccountStatus::Active => AccountStatus::Inactive,
            AccountStatus::Inactive => AccountStatus::Active,
        }
    }
}

impl FromStr for AccountStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "inactive" => Ok(AccountStatus::Inactive),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec!["active".to_string(), "inactive".to_string()],
            }),
        }
    }
}

// =============================================================================
// Profile
// =============================================================================

/// One profile per identity. Holds role, status and tenant linkage.
///
/// ## Tenant Linkage
/// ```text
/// super_admin ── admin_id: None
/// admin       ── admin_id: None        (the admin IS the tenant)
/// salesperson ── admin_id: Some(owner) (the admin who provisioned them)
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Identity id (shared with the credential record).
    pub id: String,

    pub name: String,

    pub email: String,

    pub role: Role,

    pub status: AccountStatus,

    /// Owning admin, salespersons only.
    pub admin_id: Option<String>,

    /// Store display name, admins only.
    pub store_name: Option<String>,

    /// Generated login name, salespersons only.
    pub username: Option<String>,

    pub phone: Option<String>,

    pub picture_url: Option<String>,

    /// Profile id of the principal that provisioned this one.
    pub created_by: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Checks if the account may sign in.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// The tenant this profile operates in.
    ///
    /// ## Returns
    /// * Admin: its own id
    /// * Salesperson: its owning admin
    /// * Super admin: `None` (not tenant-scoped)
    pub fn tenant_id(&self) -> Option<&str> {
        match self.role {
            Role::Admin => Some(self.id.as_str()),
            Role::Salesperson => self.admin_id.as_deref(),
            Role::SuperAdmin => None,
        }
    }

    /// Checks the role/linkage invariants of a decoded profile.
    pub fn check(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::malformed("profile", &self.id, "empty name"));
        }

        match (self.role, self.admin_id.as_deref()) {
            (Role::Salesperson, None) => Err(CoreError::malformed(
                "profile",
                &self.id,
                "salesperson without owning admin",
            )),
            (Role::Admin | Role::SuperAdmin, Some(_)) => Err(CoreError::malformed(
                "profile",
                &self.id,
                "only salespersons carry an owning admin",
            )),
            _ => Ok(()),
        }
    }
}

// =============================================================================
// Item
// =============================================================================

/// A sellable item in one tenant's catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,

    /// Owning tenant.
    pub admin_id: String,

    pub name: String,

    /// Unit price in cents; always > 0.
    pub price_cents: i64,

    /// Authoritative stock count; never negative.
    pub quantity: i64,

    pub category_id: Option<String>,

    /// Cached category name at creation time. Not refreshed on rename.
    pub category_name: String,

    /// Generated short code, e.g. `BEVCOL042`.
    pub code: String,

    pub image_url: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks if at least one unit can be put in a cart.
    #[inline]
    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }

    /// Checks the stock/price invariants of a decoded item.
    pub fn check(&self) -> CoreResult<()> {
        if self.price_cents <= 0 {
            return Err(CoreError::malformed("item", &self.id, "price must be positive"));
        }
        if self.price_cents > MAX_PRICE_CENTS {
            return Err(CoreError::malformed("item", &self.id, "price above the accepted maximum"));
        }
        if self.quantity < 0 {
            return Err(CoreError::malformed("item", &self.id, "negative quantity"));
        }
        if self.quantity > MAX_STOCK_QUANTITY {
            return Err(CoreError::malformed("item", &self.id, "stock above the accepted maximum"));
        }
        Ok(())
    }
}

// =============================================================================
// Category
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub admin_id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Payment Option
// =============================================================================

/// A bank transfer target offered at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOption {
    pub id: String,
    pub admin_id: String,
    pub bank_name: String,
    pub account_name: String,
    pub account_number: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was paid.
///
/// ## Wire Format
/// ```text
/// Cash                 ←→ "cash"
/// Bank("opt-123")      ←→ "bank_opt-123"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum PaymentMethod {
    Cash,
    /// Transfer to the payment option with this id.
    Bank(String),
}

const BANK_PREFIX: &str = "bank_";

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => f.write_str("cash"),
            PaymentMethod::Bank(id) => write!(f, "{}{}", BANK_PREFIX, id),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "cash" {
            return Ok(PaymentMethod::Cash);
        }

        match s.strip_prefix(BANK_PREFIX) {
            Some(id) if !id.is_empty() => Ok(PaymentMethod::Bank(id.to_string())),
            _ => Err(ValidationError::InvalidFormat {
                field: "paymentMethod".to_string(),
                reason: "expected \"cash\" or \"bank_<paymentOptionId>\"".to_string(),
            }),
        }
    }
}

impl From<PaymentMethod> for String {
    fn from(method: PaymentMethod) -> Self {
        method.to_string()
    }
}

impl TryFrom<String> for PaymentMethod {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A line snapshot inside a sale.
///
/// ## Snapshot Pattern
/// Name and price are copied at sale time. The sale stays correct even if
/// the item is renamed, repriced or deleted later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub item_id: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub line_total_cents: i64,
}

/// An immutable record of a completed checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,

    /// Owning tenant.
    pub admin_id: String,

    pub salesperson_id: String,

    pub salesperson_name: String,

    #[ts(as = "String")]
    pub payment_method: PaymentMethod,

    /// Always the sum of `lines[].line_total_cents`.
    pub total_cents: i64,

    pub lines: Vec<SaleLine>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Number of units across all lines.
    pub fn items_sold(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Checks that the recorded total equals the line sum and every line
    /// total equals unit price × quantity.
    pub fn verify_total(&self) -> CoreResult<()> {
        for line in &self.lines {
            let expected = Money::from_cents(line.unit_price_cents)
                .checked_multiply_quantity(line.quantity)
                .ok_or(CoreError::AmountOverflow)?;
            if expected.cents() != line.line_total_cents {
                return Err(CoreError::TotalMismatch {
                    recorded: line.line_total_cents,
                    computed: expected.cents(),
                });
            }
        }

        let computed = Money::checked_sum(self.lines.iter().map(|l| Money::from_cents(l.line_total_cents)))
            .ok_or(CoreError::AmountOverflow)?
            .cents();
        if computed != self.total_cents {
            return Err(CoreError::TotalMismatch {
                recorded: self.total_cents,
                computed,
            });
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(role: Role, admin_id: Option<&str>) -> Profile {
        Profile {
            id: "p-1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role,
            status: AccountStatus::Active,
            admin_id: admin_id.map(str::to_string),
            store_name: None,
            username: None,
            phone: None,
            picture_url: None,
            created_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!("super_admin".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert_eq!(Role::Salesperson.to_string(), "salesperson");
        assert!("manager".parse::<Role>().is_err());

        let json = serde_json::to_string(&Role::SuperAdmin).unwrap();
        assert_eq!(json, "\"super_admin\"");
    }

    #[test]
    fn test_status_toggle() {
        assert_eq!(AccountStatus::Active.toggled(), AccountStatus::Inactive);
        assert_eq!(AccountStatus::Inactive.toggled(), AccountStatus::Active);
        assert!("disabled".parse::<AccountStatus>().is_err());
    }

    #[test]
    fn test_profile_tenant_linkage() {
        let admin = profile(Role::Admin, None);
        assert_eq!(admin.tenant_id(), Some("p-1"));
        assert!(admin.check().is_ok());

        let seller = profile(Role::Salesperson, Some("admin-1"));
        assert_eq!(seller.tenant_id(), Some("admin-1"));
        assert!(seller.check().is_ok());

        assert!(profile(Role::Salesperson, None).check().is_err());
        assert!(profile(Role::Admin, Some("admin-1")).check().is_err());
        assert_eq!(profile(Role::SuperAdmin, None).tenant_id(), None);
    }

    #[test]
    fn test_payment_method_tags() {
        assert_eq!(PaymentMethod::Cash.to_string(), "cash");
        assert_eq!(PaymentMethod::Bank("opt-7".into()).to_string(), "bank_opt-7");

        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!(
            "bank_opt-7".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::Bank("opt-7".into())
        );
        assert!("bank_".parse::<PaymentMethod>().is_err());
        assert!("card".parse::<PaymentMethod>().is_err());

        let json = serde_json::to_string(&PaymentMethod::Bank("x".into())).unwrap();
        assert_eq!(json, "\"bank_x\"");
        let back: PaymentMethod = serde_json::from_str("\"cash\"").unwrap();
        assert_eq!(back, PaymentMethod::Cash);
    }

    #[test]
    fn test_sale_verify_total() {
        let mut sale = Sale {
            id: "s-1".to_string(),
            admin_id: "admin-1".to_string(),
            salesperson_id: "sp-1".to_string(),
            salesperson_name: "Sam".to_string(),
            payment_method: PaymentMethod::Cash,
            total_cents: 1700,
            lines: vec![
                SaleLine {
                    item_id: "a".to_string(),
                    name: "Soap".to_string(),
                    unit_price_cents: 250,
                    quantity: 2,
                    line_total_cents: 500,
                },
                SaleLine {
                    item_id: "b".to_string(),
                    name: "Rice".to_string(),
                    unit_price_cents: 1200,
                    quantity: 1,
                    line_total_cents: 1200,
                },
            ],
            created_at: Utc::now(),
        };

        assert!(sale.verify_total().is_ok());
        assert_eq!(sale.items_sold(), 3);

        sale.total_cents = 1600;
        assert!(matches!(
            sale.verify_total(),
            Err(CoreError::TotalMismatch { recorded: 1600, computed: 1700 })
        ));

        sale.lines[0].unit_price_cents = i64::MAX;
        assert!(matches!(sale.verify_total(), Err(CoreError::AmountOverflow)));
    }

    #[test]
    fn test_item_bounds() {
        let mut item = Item {
            id: "i-1".to_string(),
            admin_id: "admin-1".to_string(),
            name: "Cola".to_string(),
            price_cents: MAX_PRICE_CENTS,
            quantity: MAX_STOCK_QUANTITY,
            category_id: None,
            category_name: String::new(),
            code: "GENCOL001".to_string(),
            image_url: None,
            created_at: Utc::now(),
        };
        assert!(item.check().is_ok());

        item.price_cents = MAX_PRICE_CENTS + 1;
        assert!(matches!(item.check(), Err(CoreError::MalformedRecord { .. })));

        item.price_cents = 150;
        item.quantity = i64::MAX;
        assert!(matches!(item.check(), Err(CoreError::MalformedRecord { .. })));
    }
}
