//! # Cart Engine
//!
//! Holds the candidate lines of one salesperson's sale, bounded by the
//! stock that was read from the catalog.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Salesperson Action       Operation                Line Change          │
//! │  ──────────────────       ─────────                ───────────          │
//! │                                                                         │
//! │  Click item ─────────────► add_to_cart(item) ────► qty + 1, ≤ stock    │
//! │                                                    or new line (qty 1) │
//! │                                                                         │
//! │  Click + / − ────────────► update_quantity(id, Δ) ► qty + Δ            │
//! │                                                    ≤ 0 → line removed  │
//! │                                                    > stock → stock     │
//! │                                                                         │
//! │  Click remove ───────────► remove_from_cart(id) ──► line removed       │
//! │                                                                         │
//! │  Catalog re-read ────────► refresh_stock(id, n) ──► ceiling = n        │
//! │                                                                         │
//! │  Render total ───────────► total() ──────────────► Σ price × qty       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `item_id`
//! - Every line has `1 <= quantity <= stock`
//! - Going over the ceiling is clamped silently, never an error
//! - `total()` is recomputed from the lines on every call
//! - The exact total always fits in `i64`; a change that would overflow it
//!   is refused with `AmountOverflow` and leaves the cart untouched

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Item;
use crate::MAX_CART_LINES;

/// A line in the shopping cart.
///
/// Name, code and price are frozen when the line is created. The stock
/// ceiling is refreshed whenever the catalog is re-read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub item_id: String,

    pub name: String,

    pub code: String,

    /// Price in cents at the time the line was created.
    pub unit_price_cents: i64,

    /// Requested quantity, always within `1..=stock`.
    pub quantity: i64,

    /// Stock ceiling as last read from the catalog.
    pub stock: i64,
}

impl CartLine {
    fn from_item(item: &Item) -> Self {
        CartLine {
            item_id: item.id.clone(),
            name: item.name.clone(),
            code: item.code.clone(),
            unit_price_cents: item.price_cents,
            quantity: 1,
            stock: item.quantity,
        }
    }

    /// Unit price × quantity (saturating).
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }

    /// Unit price × quantity, or `AmountOverflow`.
    pub fn checked_line_total(&self) -> CoreResult<Money> {
        Money::from_cents(self.unit_price_cents)
            .checked_multiply_quantity(self.quantity)
            .ok_or(CoreError::AmountOverflow)
    }
}

/// The shopping cart of one salesperson session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds one unit of an item.
    ///
    /// ## Behavior
    /// - Existing line: quantity + 1, clamped to the item's current stock
    /// - No line: new line with quantity 1
    ///
    /// ## Returns
    /// The line's quantity after the call.
    ///
    /// ## Errors
    /// - `OutOfStock` if the item has no stock (an existing line is dropped)
    /// - `CartTooLarge` if a new line would exceed [`MAX_CART_LINES`]
    /// - `AmountOverflow` if the cart total would no longer fit
    pub fn add_to_cart(&mut self, item: &Item) -> CoreResult<i64> {
        if !item.in_stock() {
            self.lines.retain(|l| l.item_id != item.id);
            return Err(CoreError::OutOfStock {
                item_id: item.id.clone(),
                name: item.name.clone(),
            });
        }

        if let Some(index) = self.lines.iter().position(|l| l.item_id == item.id) {
            let previous = self.lines[index].clone();
            let line = &mut self.lines[index];
            line.stock = item.quantity;
            line.quantity = line.quantity.saturating_add(1).min(line.stock);
            let quantity = line.quantity;

            if let Err(e) = self.checked_total() {
                self.lines[index] = previous;
                return Err(e);
            }
            return Ok(quantity);
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        self.lines.push(CartLine::from_item(item));
        if let Err(e) = self.checked_total() {
            self.lines.pop();
            return Err(e);
        }
        Ok(1)
    }

    /// Adjusts a line's quantity by `delta`.
    ///
    /// ## Returns
    /// * `Ok(Some(qty))` - the line's new quantity (clamped to stock)
    /// * `Ok(None)` - the result was ≤ 0 and the line was removed
    pub fn update_quantity(&mut self, item_id: &str, delta: i64) -> CoreResult<Option<i64>> {
        let index = self
            .lines
            .iter()
            .position(|l| l.item_id == item_id)
            .ok_or_else(|| CoreError::NotInCart(item_id.to_string()))?;

        let line = &mut self.lines[index];
        let requested = line.quantity.saturating_add(delta);

        if requested <= 0 {
            self.lines.remove(index);
            return Ok(None);
        }

        let previous = line.quantity;
        line.quantity = requested.min(line.stock);
        let quantity = line.quantity;

        if let Err(e) = self.checked_total() {
            self.lines[index].quantity = previous;
            return Err(e);
        }
        Ok(Some(quantity))
    }

    /// Applies a freshly read stock level to a line.
    ///
    /// The line is clamped down to the new ceiling, or removed when the
    /// item is out of stock. Unknown ids are ignored.
    pub fn refresh_stock(&mut self, item_id: &str, stock: i64) {
        if stock <= 0 {
            self.lines.retain(|l| l.item_id != item_id);
            return;
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.item_id == item_id) {
            line.stock = stock;
            line.quantity = line.quantity.min(stock);
        }
    }

    /// Removes a line.
    ///
    /// ## Returns
    /// `true` if a line was removed.
    pub fn remove_from_cart(&mut self, item_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.item_id != item_id);
        self.lines.len() != before
    }

    /// Sum of unit price × quantity over the current lines.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Exact total, or `AmountOverflow`.
    pub fn checked_total(&self) -> CoreResult<Money> {
        self.lines.iter().try_fold(Money::zero(), |acc, line| {
            acc.checked_add(line.checked_line_total()?)
                .ok_or(CoreError::AmountOverflow)
        })
    }

    /// Clears all lines.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, item_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.item_id == item_id)
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Number of units over all lines.
    pub fn unit_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Cart summary for API responses.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub line_count: usize,
    pub unit_count: i64,
    pub total_cents: i64,
    /// Total with two fraction digits, e.g. `"59.97"`.
    pub total_display: String,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        let total = cart.total();
        CartView {
            lines: cart.lines.clone(),
            line_count: cart.line_count(),
            unit_count: cart.unit_count(),
            total_cents: total.cents(),
            total_display: total.to_decimal_string(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn test_item(id: &str, price_cents: i64, quantity: i64) -> Item {
        Item {
            id: id.to_string(),
            admin_id: "admin-1".to_string(),
            name: format!("Item {}", id),
            price_cents,
            quantity,
            category_id: None,
            category_name: "General".to_string(),
            code: format!("GENITE{:0>3}", id),
            image_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_creates_line_then_increments() {
        let mut cart = Cart::new();
        let item = test_item("1", 999, 5);

        assert_eq!(cart.add_to_cart(&item).unwrap(), 1);
        assert_eq!(cart.add_to_cart(&item).unwrap(), 2);

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.unit_count(), 2);
        assert_eq!(cart.total().cents(), 1998);
    }

    #[test]
    fn test_add_clamps_to_stock() {
        let mut cart = Cart::new();
        let item = test_item("1", 100, 2);

        cart.add_to_cart(&item).unwrap();
        cart.add_to_cart(&item).unwrap();
        // Silently stays at the ceiling
        assert_eq!(cart.add_to_cart(&item).unwrap(), 2);
        assert_eq!(cart.line("1").unwrap().quantity, 2);
    }

    #[test]
    fn test_add_out_of_stock() {
        let mut cart = Cart::new();
        let item = test_item("1", 100, 0);

        assert!(matches!(
            cart.add_to_cart(&item),
            Err(CoreError::OutOfStock { .. })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_with_sold_out_item_drops_existing_line() {
        let mut cart = Cart::new();
        cart.add_to_cart(&test_item("1", 100, 3)).unwrap();

        let sold_out = test_item("1", 100, 0);
        assert!(cart.add_to_cart(&sold_out).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity() {
        let mut cart = Cart::new();
        let item = test_item("1", 250, 4);
        cart.add_to_cart(&item).unwrap();

        assert_eq!(cart.update_quantity("1", 2).unwrap(), Some(3));
        // Clamped to stock of 4
        assert_eq!(cart.update_quantity("1", 10).unwrap(), Some(4));
        assert_eq!(cart.update_quantity("1", -1).unwrap(), Some(3));
        // Going to zero or below removes the line
        assert_eq!(cart.update_quantity("1", -3).unwrap(), None);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_unknown_line() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.update_quantity("missing", 1),
            Err(CoreError::NotInCart(_))
        ));
    }

    #[test]
    fn test_refresh_stock() {
        let mut cart = Cart::new();
        let item = test_item("1", 100, 5);
        for _ in 0..5 {
            cart.add_to_cart(&item).unwrap();
        }

        cart.refresh_stock("1", 3);
        assert_eq!(cart.line("1").unwrap().quantity, 3);
        assert_eq!(cart.line("1").unwrap().stock, 3);

        cart.refresh_stock("1", 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add_to_cart(&test_item("1", 100, 5)).unwrap();
        cart.add_to_cart(&test_item("2", 200, 5)).unwrap();

        assert!(cart.remove_from_cart("1"));
        assert!(!cart.remove_from_cart("1"));
        assert_eq!(cart.line_count(), 1);

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Money::zero());
    }

    #[test]
    fn test_cart_line_limit() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_LINES {
            cart.add_to_cart(&test_item(&i.to_string(), 100, 1)).unwrap();
        }

        let result = cart.add_to_cart(&test_item("overflow", 100, 1));
        assert!(matches!(result, Err(CoreError::CartTooLarge { .. })));
    }

    #[test]
    fn test_cart_view() {
        let mut cart = Cart::new();
        let item = test_item("1", 1999, 5);
        for _ in 0..3 {
            cart.add_to_cart(&item).unwrap();
        }

        let view = CartView::from(&cart);
        assert_eq!(view.total_cents, 5997);
        assert_eq!(view.total_display, "59.97");
        assert_eq!(view.unit_count, 3);
    }

    #[test]
    fn test_overflowing_price_is_refused() {
        let mut cart = Cart::new();
        let price = Money::parse_decimal("50000000000000000.00").unwrap().cents();
        let item = test_item("1", price, 5);

        // One unit fits, a second would not
        assert_eq!(cart.add_to_cart(&item).unwrap(), 1);
        assert!(matches!(cart.add_to_cart(&item), Err(CoreError::AmountOverflow)));
        assert_eq!(cart.line("1").unwrap().quantity, 1);
        assert!(matches!(cart.update_quantity("1", 3), Err(CoreError::AmountOverflow)));
        assert_eq!(cart.line("1").unwrap().quantity, 1);

        // A second expensive line is rejected and not kept
        assert!(matches!(
            cart.add_to_cart(&test_item("2", price, 5)),
            Err(CoreError::AmountOverflow)
        ));
        assert_eq!(cart.line_count(), 1);

        assert_eq!(cart.total().cents(), price);
        assert_eq!(cart.checked_total().unwrap().cents(), price);
        assert_eq!(CartView::from(&cart).total_cents, price);
    }

    #[test]
    fn test_largest_accepted_cart_fits() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_LINES {
            let item = test_item(&i.to_string(), crate::MAX_PRICE_CENTS, crate::MAX_STOCK_QUANTITY);
            cart.add_to_cart(&item).unwrap();
            cart.update_quantity(&item.id, crate::MAX_STOCK_QUANTITY).unwrap();
        }

        let expected = crate::MAX_PRICE_CENTS * crate::MAX_STOCK_QUANTITY * MAX_CART_LINES as i64;
        assert_eq!(cart.checked_total().unwrap().cents(), expected);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(usize),
        Update(usize, i64),
        Remove(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..4).prop_map(Op::Add),
            (0usize..4, -6i64..6).prop_map(|(i, d)| Op::Update(i, d)),
            (0usize..4).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn prop_lines_stay_within_stock_and_total_matches(
            stocks in proptest::collection::vec(0i64..6, 4),
            ops in proptest::collection::vec(op_strategy(), 0..60),
        ) {
            let items: Vec<Item> = stocks
                .iter()
                .enumerate()
                .map(|(i, s)| test_item(&i.to_string(), 100 + i as i64 * 37, *s))
                .collect();

            let mut cart = Cart::new();
            for op in ops {
                match op {
                    Op::Add(i) => { let _ = cart.add_to_cart(&items[i]); }
                    Op::Update(i, d) => { let _ = cart.update_quantity(&items[i].id, d); }
                    Op::Remove(i) => { cart.remove_from_cart(&items[i].id); }
                }

                for line in cart.lines() {
                    let item = items.iter().find(|it| it.id == line.item_id).unwrap();
                    prop_assert!(line.quantity >= 1);
                    prop_assert!(line.quantity <= item.quantity);
                }

                let expected: i64 = cart
                    .lines()
                    .iter()
                    .map(|l| l.unit_price_cents * l.quantity)
                    .sum();
                prop_assert_eq!(cart.total().cents(), expected);
            }
        }
    }
}
