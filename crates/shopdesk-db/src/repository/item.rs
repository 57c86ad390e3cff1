//! # Item Repository
//!
//! Catalog items. `quantity` is the authoritative stock count and is only
//! ever lowered by the checkout transaction in
//! [`SaleRepository::checkout`](crate::SaleRepository::checkout).

use chrono::{DateTime, Utc};
use shopdesk_core::{CoreError, Item};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::decode_rows;
use crate::error::{DbError, DbResult};

const ITEM_COLUMNS: &str =
    "id, admin_id, name, price_cents, quantity, category_id, category_name, code, image_url, created_at";

/// Raw `items` row before validation.
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: String,
    admin_id: String,
    name: String,
    price_cents: i64,
    quantity: i64,
    category_id: Option<String>,
    category_name: String,
    code: String,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for Item {
    type Error = CoreError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let item = Item {
            id: row.id,
            admin_id: row.admin_id,
            name: row.name,
            price_cents: row.price_cents,
            quantity: row.quantity,
            category_id: row.category_id,
            category_name: row.category_name,
            code: row.code,
            image_url: row.image_url,
            created_at: row.created_at,
        };
        item.check()?;
        Ok(item)
    }
}

/// Input for [`ItemRepository::insert`]. The code is generated by the caller.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub admin_id: String,
    pub name: String,
    pub price_cents: i64,
    pub quantity: i64,
    pub category_id: Option<String>,
    pub category_name: String,
    pub code: String,
    pub image_url: Option<String>,
}

/// Repository for item database operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    pub async fn insert(&self, new: &NewItem) -> DbResult<Item> {
        let item = Item {
            id: Uuid::new_v4().to_string(),
            admin_id: new.admin_id.clone(),
            name: new.name.trim().to_string(),
            price_cents: new.price_cents,
            quantity: new.quantity,
            category_id: new.category_id.clone(),
            category_name: new.category_name.clone(),
            code: new.code.clone(),
            image_url: new.image_url.clone(),
            created_at: Utc::now(),
        };
        item.check()?;

        debug!(id = %item.id, code = %item.code, "Inserting item");

        sqlx::query(
            r#"
            INSERT INTO items (
                id, admin_id, name, price_cents, quantity,
                category_id, category_name, code, image_url, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&item.id)
        .bind(&item.admin_id)
        .bind(&item.name)
        .bind(item.price_cents)
        .bind(item.quantity)
        .bind(&item.category_id)
        .bind(&item.category_name)
        .bind(&item.code)
        .bind(&item.image_url)
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    pub async fn get(&self, admin_id: &str, id: &str) -> DbResult<Option<Item>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM items WHERE id = ?1 AND admin_id = ?2",
            ITEM_COLUMNS
        ))
        .bind(id)
        .bind(admin_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Item::try_from).transpose()?)
    }

    /// The tenant's catalog, alphabetical.
    pub async fn list(&self, admin_id: &str) -> DbResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM items WHERE admin_id = ?1 ORDER BY name COLLATE NOCASE",
            ITEM_COLUMNS
        ))
        .bind(admin_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_rows(rows))
    }

    /// Checks if the tenant already has an item with this code.
    pub async fn code_exists(&self, admin_id: &str, code: &str) -> DbResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM items WHERE admin_id = ?1 AND code = ?2)",
        )
        .bind(admin_id)
        .bind(code)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn count(&self, admin_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE admin_id = ?1")
            .bind(admin_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Items with fewer than `threshold` units left.
    pub async fn count_low_stock(&self, admin_id: &str, threshold: i64) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE admin_id = ?1 AND quantity < ?2")
                .bind(admin_id)
                .bind(threshold)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    pub async fn update_image(&self, admin_id: &str, id: &str, image_url: &str) -> DbResult<()> {
        debug!(id = %id, "Updating item image");

        let result = sqlx::query("UPDATE items SET image_url = ?1 WHERE id = ?2 AND admin_id = ?3")
            .bind(image_url)
            .bind(id)
            .bind(admin_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = testing::db().await;
        let admin = testing::admin(&db, "Alice").await;
        let bev = testing::category(&db, &admin, "Beverages").await;

        let item = db
            .items()
            .insert(&NewItem {
                admin_id: admin.id.clone(),
                name: " Cola ".to_string(),
                price_cents: 150,
                quantity: 24,
                category_id: Some(bev.id.clone()),
                category_name: bev.name.clone(),
                code: "BEVCOL001".to_string(),
                image_url: None,
            })
            .await
            .unwrap();
        assert_eq!(item.name, "Cola");

        let loaded = db.items().get(&admin.id, &item.id).await.unwrap().unwrap();
        assert_eq!(loaded, item);
    }

    #[tokio::test]
    async fn test_insert_rejects_bad_price() {
        let db = testing::db().await;
        let admin = testing::admin(&db, "Alice").await;

        let err = db
            .items()
            .insert(&NewItem {
                admin_id: admin.id.clone(),
                name: "Free".to_string(),
                price_cents: 0,
                quantity: 1,
                category_id: None,
                category_name: String::new(),
                code: "GENFRE000".to_string(),
                image_url: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::MalformedRecord { .. })));
    }

    #[tokio::test]
    async fn test_tenant_isolation() {
        let db = testing::db().await;
        let a = testing::admin(&db, "Alice").await;
        let b = testing::admin(&db, "Bob").await;
        let cola = testing::item(&db, &a, "Cola", 150, 10).await;
        testing::item(&db, &b, "Hammer", 900, 3).await;

        assert_eq!(db.items().list(&a.id).await.unwrap().len(), 1);
        assert!(db.items().get(&b.id, &cola.id).await.unwrap().is_none());
        assert!(db.items().update_image(&b.id, &cola.id, "https://x/y.png").await.is_err());
    }

    #[tokio::test]
    async fn test_code_exists_and_counts() {
        let db = testing::db().await;
        let admin = testing::admin(&db, "Alice").await;
        let cola = testing::item(&db, &admin, "Cola", 150, 10).await;
        testing::item(&db, &admin, "Chips", 200, 3).await;

        assert!(db.items().code_exists(&admin.id, &cola.code).await.unwrap());
        assert!(!db.items().code_exists(&admin.id, "NOPE000").await.unwrap());
        assert_eq!(db.items().count(&admin.id).await.unwrap(), 2);
        assert_eq!(db.items().count_low_stock(&admin.id, 10).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_image() {
        let db = testing::db().await;
        let admin = testing::admin(&db, "Alice").await;
        let cola = testing::item(&db, &admin, "Cola", 150, 10).await;

        db.items()
            .update_image(&admin.id, &cola.id, "https://img.example/cola.png")
            .await
            .unwrap();
        let loaded = db.items().get(&admin.id, &cola.id).await.unwrap().unwrap();
        assert_eq!(loaded.image_url.as_deref(), Some("https://img.example/cola.png"));
    }
}
