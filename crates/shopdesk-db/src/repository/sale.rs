//! # Sale Repository
//!
//! Sales are immutable fact records. The only write is [`SaleRepository::checkout`].
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   ├── INSERT sales                                                      │
//! │   ├── INSERT sale_lines (one per cart line, in cart order)              │
//! │   ├── bank_<id>? ── payment option must belong to the tenant            │
//! │   └── per line:                                                         │
//! │         UPDATE items SET quantity = quantity - :qty                     │
//! │         WHERE id = :item AND admin_id = :tenant AND quantity >= :qty    │
//! │              │                                                          │
//! │              ├── 1 row  → next line                                     │
//! │              └── 0 rows → ROLLBACK, InsufficientStock / ItemNotFound    │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! SQLite serializes writers, so two checkouts racing for the same item see
//! each other's decrement: the second one fails the `quantity >= :qty` guard
//! instead of driving stock negative. The first statement is a write so the
//! transaction takes the write lock up front rather than upgrading later.

use chrono::{DateTime, Utc};
use shopdesk_core::{CoreError, PaymentMethod, Sale, SaleDraft, SaleLine};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::decode_rows;
use crate::error::{DbError, DbResult};

const SALE_COLUMNS: &str =
    "id, admin_id, salesperson_id, salesperson_name, payment_method, total_cents, created_at";

/// Sale ids per `IN (...)` lookup when attaching lines.
const LINE_FETCH_CHUNK: usize = 500;

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    admin_id: String,
    salesperson_id: String,
    salesperson_name: String,
    payment_method: String,
    total_cents: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct SaleLineRow {
    sale_id: String,
    item_id: String,
    name: String,
    unit_price_cents: i64,
    quantity: i64,
    line_total_cents: i64,
}

impl From<SaleLineRow> for SaleLine {
    fn from(row: SaleLineRow) -> Self {
        SaleLine {
            item_id: row.item_id,
            name: row.name,
            unit_price_cents: row.unit_price_cents,
            quantity: row.quantity,
            line_total_cents: row.line_total_cents,
        }
    }
}

/// A sale row with its lines attached, ready for decoding.
#[derive(Debug)]
struct StoredSale {
    row: SaleRow,
    lines: Vec<SaleLine>,
}

impl TryFrom<StoredSale> for Sale {
    type Error = CoreError;

    fn try_from(StoredSale { row, lines }: StoredSale) -> Result<Self, Self::Error> {
        let payment_method = row
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(|e| CoreError::malformed("sale", &row.id, e.to_string()))?;

        let sale = Sale {
            id: row.id,
            admin_id: row.admin_id,
            salesperson_id: row.salesperson_id,
            salesperson_name: row.salesperson_name,
            payment_method,
            total_cents: row.total_cents,
            lines,
            created_at: row.created_at,
        };

        if sale.lines.is_empty() {
            return Err(CoreError::malformed("sale", &sale.id, "no lines"));
        }
        sale.verify_total()
            .map_err(|e| CoreError::malformed("sale", &sale.id, e.to_string()))?;

        Ok(sale)
    }
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Persists a drafted sale and decrements stock, atomically.
    ///
    /// ## Errors
    /// * `CoreError::InsufficientStock` - a line asks for more than is left
    /// * `CoreError::ItemNotFound` - a line's item is gone or belongs to another tenant
    /// * `DbError::NotFound` - `bank_<id>` names no payment option of this tenant
    ///
    /// Nothing is written when any of these occur.
    pub async fn checkout(&self, draft: &SaleDraft) -> DbResult<Sale> {
        let sale = &draft.sale;
        sale.verify_total()?;

        debug!(
            id = %sale.id,
            admin_id = %sale.admin_id,
            lines = sale.lines.len(),
            total_cents = sale.total_cents,
            "Checking out"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, admin_id, salesperson_id, salesperson_name,
                payment_method, total_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.admin_id)
        .bind(&sale.salesperson_id)
        .bind(&sale.salesperson_name)
        .bind(sale.payment_method.to_string())
        .bind(sale.total_cents)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        for (position, line) in sale.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_lines (
                    sale_id, position, item_id, name,
                    unit_price_cents, quantity, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&sale.id)
            .bind(position as i64)
            .bind(&line.item_id)
            .bind(&line.name)
            .bind(line.unit_price_cents)
            .bind(line.quantity)
            .bind(line.line_total_cents)
            .execute(&mut *tx)
            .await?;
        }

        if let PaymentMethod::Bank(option_id) = &sale.payment_method {
            let known: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM payment_options WHERE id = ?1 AND admin_id = ?2)",
            )
            .bind(option_id)
            .bind(&sale.admin_id)
            .fetch_one(&mut *tx)
            .await?;

            if !known {
                tx.rollback().await?;
                return Err(DbError::not_found("PaymentOption", option_id.as_str()));
            }
        }

        for line in &sale.lines {
            let decremented = sqlx::query(
                "UPDATE items SET quantity = quantity - ?1 \
                 WHERE id = ?2 AND admin_id = ?3 AND quantity >= ?1",
            )
            .bind(line.quantity)
            .bind(&line.item_id)
            .bind(&sale.admin_id)
            .execute(&mut *tx)
            .await?;

            if decremented.rows_affected() == 1 {
                continue;
            }

            let available: Option<i64> =
                sqlx::query_scalar("SELECT quantity FROM items WHERE id = ?1 AND admin_id = ?2")
                    .bind(&line.item_id)
                    .bind(&sale.admin_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            tx.rollback().await?;

            let err = match available {
                Some(available) => CoreError::InsufficientStock {
                    item_id: line.item_id.clone(),
                    name: line.name.clone(),
                    available,
                    requested: line.quantity,
                },
                None => CoreError::ItemNotFound(line.item_id.clone()),
            };
            warn!(sale_id = %sale.id, error = %err, "Checkout rolled back");
            return Err(err.into());
        }

        tx.commit().await?;

        info!(
            id = %sale.id,
            salesperson_id = %sale.salesperson_id,
            total_cents = sale.total_cents,
            "Sale recorded"
        );
        Ok(sale.clone())
    }

    pub async fn get(&self, admin_id: &str, id: &str) -> DbResult<Option<Sale>> {
        let row = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {} FROM sales WHERE id = ?1 AND admin_id = ?2",
            SALE_COLUMNS
        ))
        .bind(id)
        .bind(admin_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut lines = self.lines_for(&[row.id.clone()]).await?;
        let lines = lines.remove(&row.id).unwrap_or_default();

        Ok(Some(Sale::try_from(StoredSale { row, lines })?))
    }

    /// Every sale of the tenant, newest first.
    pub async fn list_for_admin(&self, admin_id: &str) -> DbResult<Vec<Sale>> {
        let rows = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {} FROM sales WHERE admin_id = ?1 ORDER BY created_at DESC",
            SALE_COLUMNS
        ))
        .bind(admin_id)
        .fetch_all(&self.pool)
        .await?;

        self.with_lines(rows).await
    }

    /// The `limit` newest sales of the tenant.
    pub async fn recent_for_admin(&self, admin_id: &str, limit: i64) -> DbResult<Vec<Sale>> {
        let rows = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {} FROM sales WHERE admin_id = ?1 ORDER BY created_at DESC LIMIT ?2",
            SALE_COLUMNS
        ))
        .bind(admin_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        self.with_lines(rows).await
    }

    /// One salesperson's sales at or after `since`, newest first.
    pub async fn list_for_salesperson_since(
        &self,
        salesperson_id: &str,
        since: DateTime<Utc>,
    ) -> DbResult<Vec<Sale>> {
        let rows = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {} FROM sales WHERE salesperson_id = ?1 AND created_at >= ?2 \
             ORDER BY created_at DESC",
            SALE_COLUMNS
        ))
        .bind(salesperson_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        self.with_lines(rows).await
    }

    async fn with_lines(&self, rows: Vec<SaleRow>) -> DbResult<Vec<Sale>> {
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let mut lines = self.lines_for(&ids).await?;

        let assembled: Vec<StoredSale> = rows
            .into_iter()
            .map(|row| {
                let own = lines.remove(&row.id).unwrap_or_default();
                StoredSale { row, lines: own }
            })
            .collect();

        Ok(decode_rows(assembled))
    }

    /// Lines of the given sales, grouped by sale id, in position order.
    async fn lines_for(&self, sale_ids: &[String]) -> DbResult<HashMap<String, Vec<SaleLine>>> {
        let mut grouped: HashMap<String, Vec<SaleLine>> = HashMap::new();

        for chunk in sale_ids.chunks(LINE_FETCH_CHUNK) {
            let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
                "SELECT sale_id, item_id, name, unit_price_cents, quantity, line_total_cents \
                 FROM sale_lines WHERE sale_id IN (",
            );
            let mut ids = query.separated(", ");
            for id in chunk {
                ids.push_bind(id);
            }
            ids.push_unseparated(") ORDER BY sale_id, position");

            let rows: Vec<SaleLineRow> = query.build_query_as().fetch_all(&self.pool).await?;
            for row in rows {
                grouped.entry(row.sale_id.clone()).or_default().push(row.into());
            }
        }

        Ok(grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use crate::{Database, DbConfig};
    use chrono::Duration;
    use shopdesk_core::{Cart, Seller};
    use uuid::Uuid;

    fn draft(cart: &Cart, seller: &Seller, method: PaymentMethod) -> SaleDraft {
        SaleDraft::from_cart(Uuid::new_v4().to_string(), cart, seller, method, Utc::now()).unwrap()
    }

    fn cart_with(item: &shopdesk_core::Item, quantity: i64) -> Cart {
        let mut cart = Cart::new();
        cart.add_to_cart(item).unwrap();
        cart.update_quantity(&item.id, quantity - 1).unwrap();
        cart
    }

    #[tokio::test]
    async fn test_checkout_sells_out_item() {
        let db = testing::db().await;
        let admin = testing::admin(&db, "Alice").await;
        let sam = testing::salesperson(&db, &admin, "Sam").await;
        let soap = testing::item(&db, &admin, "Soap", 250, 5).await;
        let seller = Seller::from_profile(&sam).unwrap();

        let sale = db
            .sales()
            .checkout(&draft(&cart_with(&soap, 5), &seller, PaymentMethod::Cash))
            .await
            .unwrap();
        assert_eq!(sale.total_cents, 5 * 250);

        let soap = db.items().get(&admin.id, &soap.id).await.unwrap().unwrap();
        assert_eq!(soap.quantity, 0);

        let stored = db.sales().get(&admin.id, &sale.id).await.unwrap().unwrap();
        assert_eq!(stored, sale);
    }

    #[tokio::test]
    async fn test_competing_checkouts_cannot_oversell() {
        let db = testing::db().await;
        let admin = testing::admin(&db, "Alice").await;
        let sam = testing::salesperson(&db, &admin, "Sam").await;
        let sue = testing::salesperson(&db, &admin, "Sue").await;
        let soap = testing::item(&db, &admin, "Soap", 250, 5).await;

        // Both carts were built while stock read 5.
        let first = draft(&cart_with(&soap, 3), &Seller::from_profile(&sam).unwrap(), PaymentMethod::Cash);
        let second = draft(&cart_with(&soap, 3), &Seller::from_profile(&sue).unwrap(), PaymentMethod::Cash);

        let (first_repo, second_repo) = (db.sales(), db.sales());
        let (a, b) = tokio::join!(first_repo.checkout(&first), second_repo.checkout(&second));
        let outcomes = [a, b];

        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        let rejected = outcomes.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert!(matches!(
            rejected,
            DbError::Domain(CoreError::InsufficientStock { available: 2, requested: 3, .. })
        ));

        let soap = db.items().get(&admin.id, &soap.id).await.unwrap().unwrap();
        assert_eq!(soap.quantity, 2);
        assert_eq!(db.sales().list_for_admin(&admin.id).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_checkouts_on_pooled_file_db() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("shop.db")).max_connections(4))
            .await
            .unwrap();
        let admin = testing::admin(&db, "Alice").await;
        let sam = testing::salesperson(&db, &admin, "Sam").await;
        let soap = testing::item(&db, &admin, "Soap", 250, 5).await;
        let seller = Seller::from_profile(&sam).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let db = db.clone();
                let sale = draft(&cart_with(&soap, 3), &seller, PaymentMethod::Cash);
                tokio::spawn(async move { db.sales().checkout(&sale).await })
            })
            .collect();

        let mut sold = 0;
        let mut short = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => sold += 1,
                Err(DbError::Domain(CoreError::InsufficientStock { requested: 3, .. })) => short += 1,
                Err(other) => panic!("unexpected checkout error: {other}"),
            }
        }
        assert_eq!((sold, short), (1, 7));

        let soap = db.items().get(&admin.id, &soap.id).await.unwrap().unwrap();
        assert_eq!(soap.quantity, 2);
        assert_eq!(db.sales().list_for_admin(&admin.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_line_rolls_back_whole_sale() {
        let db = testing::db().await;
        let admin = testing::admin(&db, "Alice").await;
        let sam = testing::salesperson(&db, &admin, "Sam").await;
        let soap = testing::item(&db, &admin, "Soap", 250, 5).await;
        let rice = testing::item(&db, &admin, "Rice", 1200, 1).await;

        let mut cart = cart_with(&soap, 2);
        cart.add_to_cart(&rice).unwrap();
        let pending = draft(&cart, &Seller::from_profile(&sam).unwrap(), PaymentMethod::Cash);

        // Rice sells out elsewhere before this checkout lands.
        sqlx::query("UPDATE items SET quantity = 0 WHERE id = ?1")
            .bind(&rice.id)
            .execute(db.pool())
            .await
            .unwrap();

        let err = db.sales().checkout(&pending).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));

        let soap = db.items().get(&admin.id, &soap.id).await.unwrap().unwrap();
        assert_eq!(soap.quantity, 5, "earlier line's decrement must be undone");
        assert!(db.sales().list_for_admin(&admin.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cross_tenant_item_is_not_found() {
        let db = testing::db().await;
        let a = testing::admin(&db, "Alice").await;
        let b = testing::admin(&db, "Bob").await;
        let sam = testing::salesperson(&db, &a, "Sam").await;
        let hammer = testing::item(&db, &b, "Hammer", 900, 3).await;

        let pending = draft(&cart_with(&hammer, 1), &Seller::from_profile(&sam).unwrap(), PaymentMethod::Cash);
        let err = db.sales().checkout(&pending).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ItemNotFound(_))));

        let hammer = db.items().get(&b.id, &hammer.id).await.unwrap().unwrap();
        assert_eq!(hammer.quantity, 3);
    }

    #[tokio::test]
    async fn test_bank_payment_must_be_tenant_option() {
        let db = testing::db().await;
        let a = testing::admin(&db, "Alice").await;
        let b = testing::admin(&db, "Bob").await;
        let sam = testing::salesperson(&db, &a, "Sam").await;
        let soap = testing::item(&db, &a, "Soap", 250, 5).await;
        let own = testing::payment_option(&db, &a, "First Bank").await;
        let foreign = testing::payment_option(&db, &b, "Other Bank").await;
        let seller = Seller::from_profile(&sam).unwrap();

        let err = db
            .sales()
            .checkout(&draft(&cart_with(&soap, 1), &seller, PaymentMethod::Bank(foreign.id)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let sale = db
            .sales()
            .checkout(&draft(&cart_with(&soap, 1), &seller, PaymentMethod::Bank(own.id.clone())))
            .await
            .unwrap();
        assert_eq!(sale.payment_method.to_string(), format!("bank_{}", own.id));
    }

    #[tokio::test]
    async fn test_listings() {
        let db = testing::db().await;
        let admin = testing::admin(&db, "Alice").await;
        let sam = testing::salesperson(&db, &admin, "Sam").await;
        let sue = testing::salesperson(&db, &admin, "Sue").await;
        let soap = testing::item(&db, &admin, "Soap", 250, 50).await;

        let mut old = draft(&cart_with(&soap, 1), &Seller::from_profile(&sam).unwrap(), PaymentMethod::Cash);
        old.sale.created_at = Utc::now() - Duration::days(2);
        db.sales().checkout(&old).await.unwrap();

        for _ in 0..3 {
            let d = draft(&cart_with(&soap, 2), &Seller::from_profile(&sam).unwrap(), PaymentMethod::Cash);
            db.sales().checkout(&d).await.unwrap();
        }
        let d = draft(&cart_with(&soap, 1), &Seller::from_profile(&sue).unwrap(), PaymentMethod::Cash);
        db.sales().checkout(&d).await.unwrap();

        let all = db.sales().list_for_admin(&admin.id).await.unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.windows(2).all(|w| w[0].created_at >= w[1].created_at));
        assert!(all.iter().all(|s| !s.lines.is_empty()));

        assert_eq!(db.sales().recent_for_admin(&admin.id, 2).await.unwrap().len(), 2);

        let since = Utc::now() - Duration::hours(1);
        let sams = db.sales().list_for_salesperson_since(&sam.id, since).await.unwrap();
        assert_eq!(sams.len(), 3);
        assert!(sams.iter().all(|s| s.salesperson_id == sam.id));
    }

    #[tokio::test]
    async fn test_sale_survives_item_and_salesperson_removal() {
        let db = testing::db().await;
        let admin = testing::admin(&db, "Alice").await;
        let sam = testing::salesperson(&db, &admin, "Sam").await;
        let soap = testing::item(&db, &admin, "Soap", 250, 5).await;

        let d = draft(&cart_with(&soap, 1), &Seller::from_profile(&sam).unwrap(), PaymentMethod::Cash);
        let sale = db.sales().checkout(&d).await.unwrap();

        db.profiles().delete_salesperson(&admin.id, &sam.id).await.unwrap();
        sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(&soap.id)
            .execute(db.pool())
            .await
            .unwrap();

        let stored = db.sales().get(&admin.id, &sale.id).await.unwrap().unwrap();
        assert_eq!(stored.salesperson_name, "Sam");
        assert_eq!(stored.lines[0].name, "Soap");
    }

    #[tokio::test]
    async fn test_tampered_total_is_quarantined() {
        let db = testing::db().await;
        let admin = testing::admin(&db, "Alice").await;
        let sam = testing::salesperson(&db, &admin, "Sam").await;
        let soap = testing::item(&db, &admin, "Soap", 250, 5).await;

        let d = draft(&cart_with(&soap, 1), &Seller::from_profile(&sam).unwrap(), PaymentMethod::Cash);
        let sale = db.sales().checkout(&d).await.unwrap();

        sqlx::query("UPDATE sales SET total_cents = 1 WHERE id = ?1")
            .bind(&sale.id)
            .execute(db.pool())
            .await
            .unwrap();

        assert!(db.sales().list_for_admin(&admin.id).await.unwrap().is_empty());
        assert!(matches!(
            db.sales().get(&admin.id, &sale.id).await.unwrap_err(),
            DbError::Domain(CoreError::MalformedRecord { .. })
        ));
    }
}
