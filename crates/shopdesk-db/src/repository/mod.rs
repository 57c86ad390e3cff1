//! # Repository Module
//!
//! One repository per collection. Each holds a pool handle, runs plain SQL
//! and decodes rows into `shopdesk-core` records.
//!
//! ## Decoding at the Boundary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SELECT ... ──► ItemRow (raw columns, sqlx::FromRow)                    │
//! │                    │                                                    │
//! │                    │ TryFrom<ItemRow> for Item                          │
//! │                    │   parse enums / tags, Item::check()                │
//! │                    ▼                                                    │
//! │               Ok(Item)  or  Err(CoreError::MalformedRecord)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`profile::ProfileRepository`] - Profiles, account provisioning, cascades
//! - [`credential::CredentialRepository`] - Sign-in identities
//! - [`category::CategoryRepository`] - Categories
//! - [`item::ItemRepository`] - Catalog items
//! - [`payment_option::PaymentOptionRepository`] - Bank transfer targets
//! - [`sale::SaleRepository`] - Sales and the checkout transaction

pub mod category;
pub mod credential;
pub mod item;
pub mod payment_option;
pub mod profile;
pub mod sale;

use shopdesk_core::CoreError;
use tracing::warn;

/// Decodes a batch of rows for a listing.
///
/// Malformed rows are quarantined: logged and left out of the result, so
/// one bad record does not blank a whole dashboard table. Single-record
/// reads propagate the error instead.
pub(crate) fn decode_rows<R, T>(rows: Vec<R>) -> Vec<T>
where
    T: TryFrom<R, Error = CoreError>,
{
    rows.into_iter()
        .filter_map(|row| match T::try_from(row) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "Skipping malformed record");
                None
            }
        })
        .collect()
}
