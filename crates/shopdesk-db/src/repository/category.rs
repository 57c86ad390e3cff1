//! # Category Repository

use chrono::Utc;
use shopdesk_core::Category;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub admin_id: String,
    pub name: String,
}

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    pub async fn insert(&self, new: &NewCategory) -> DbResult<Category> {
        let category = Category {
            id: Uuid::new_v4().to_string(),
            admin_id: new.admin_id.clone(),
            name: new.name.trim().to_string(),
            created_at: Utc::now(),
        };

        debug!(id = %category.id, admin_id = %category.admin_id, "Inserting category");

        sqlx::query("INSERT INTO categories (id, admin_id, name, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&category.id)
            .bind(&category.admin_id)
            .bind(&category.name)
            .bind(category.created_at)
            .execute(&self.pool)
            .await?;

        Ok(category)
    }

    /// The tenant's categories, alphabetical.
    pub async fn list(&self, admin_id: &str) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, admin_id, name, created_at FROM categories \
             WHERE admin_id = ?1 ORDER BY name COLLATE NOCASE",
        )
        .bind(admin_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn get(&self, admin_id: &str, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, admin_id, name, created_at FROM categories WHERE id = ?1 AND admin_id = ?2",
        )
        .bind(id)
        .bind(admin_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn count(&self, admin_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE admin_id = ?1")
            .bind(admin_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
