//! # Cart Store
//!
//! One server-side cart per salesperson, keyed by profile id.
//!
//! ## Checkout Hand-off
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  take(id) ──► cart leaves the store (a second checkout sees it empty)   │
//! │      │                                                                  │
//! │      ├── sale committed ──► cart dropped                                │
//! │      └── sale failed ─────► restore(id, cart)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use shopdesk_core::Cart;

/// Carts of all signed-in salespersons.
///
/// Uses `Arc<Mutex<..>>` so every handler sees the same carts. Closures run
/// under the lock and must not await.
#[derive(Debug, Clone, Default)]
pub struct CartStore {
    carts: Arc<Mutex<HashMap<String, Cart>>>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Cart>> {
        // A panic inside a closure leaves the map itself consistent.
        self.carts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Executes a function with read access to one salesperson's cart.
    pub fn with_cart<F, R>(&self, salesperson_id: &str, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let carts = self.lock();
        match carts.get(salesperson_id) {
            Some(cart) => f(cart),
            None => f(&Cart::new()),
        }
    }

    /// Executes a function with write access to one salesperson's cart.
    pub fn with_cart_mut<F, R>(&self, salesperson_id: &str, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut carts = self.lock();
        let cart = carts.entry(salesperson_id.to_string()).or_default();
        let result = f(cart);
        if cart.is_empty() {
            carts.remove(salesperson_id);
        }
        result
    }

    /// Removes the cart for checkout.
    pub fn take(&self, salesperson_id: &str) -> Cart {
        self.lock().remove(salesperson_id).unwrap_or_default()
    }

    /// Puts a cart back after a failed checkout.
    ///
    /// Lines added meanwhile win over the restored cart.
    pub fn restore(&self, salesperson_id: &str, cart: Cart) {
        if cart.is_empty() {
            return;
        }
        let mut carts = self.lock();
        carts.entry(salesperson_id.to_string()).or_insert(cart);
    }

    /// Drops carts of accounts that can no longer sign in.
    pub fn discard(&self, salesperson_ids: &[String]) {
        let mut carts = self.lock();
        for id in salesperson_ids {
            carts.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shopdesk_core::Item;

    fn item(id: &str, quantity: i64) -> Item {
        Item {
            id: id.to_string(),
            admin_id: "admin-1".to_string(),
            name: format!("Item {}", id),
            price_cents: 250,
            quantity,
            category_id: None,
            category_name: String::new(),
            code: format!("GEN-ITE-{}", id),
            image_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_carts_are_per_salesperson() {
        let store = CartStore::new();
        store.with_cart_mut("sp-1", |c| c.add_to_cart(&item("a", 5))).unwrap();

        assert_eq!(store.with_cart("sp-1", |c| c.line_count()), 1);
        assert!(store.with_cart("sp-2", |c| c.is_empty()));
    }

    #[test]
    fn test_take_empties_and_restore_puts_back() {
        let store = CartStore::new();
        store.with_cart_mut("sp-1", |c| c.add_to_cart(&item("a", 5))).unwrap();

        let cart = store.take("sp-1");
        assert_eq!(cart.unit_count(), 1);
        assert!(store.take("sp-1").is_empty());

        store.restore("sp-1", cart);
        assert_eq!(store.with_cart("sp-1", |c| c.unit_count()), 1);
    }

    #[test]
    fn test_restore_does_not_clobber_new_cart() {
        let store = CartStore::new();
        store.with_cart_mut("sp-1", |c| c.add_to_cart(&item("a", 5))).unwrap();
        let taken = store.take("sp-1");

        store.with_cart_mut("sp-1", |c| c.add_to_cart(&item("b", 5))).unwrap();
        store.restore("sp-1", taken);

        assert!(store.with_cart("sp-1", |c| c.line("b").is_some()));
        assert!(store.with_cart("sp-1", |c| c.line("a").is_none()));
    }

    #[test]
    fn test_discard() {
        let store = CartStore::new();
        store.with_cart_mut("sp-1", |c| c.add_to_cart(&item("a", 5))).unwrap();
        store.discard(&["sp-1".to_string()]);
        assert!(store.with_cart("sp-1", |c| c.is_empty()));
    }
}
