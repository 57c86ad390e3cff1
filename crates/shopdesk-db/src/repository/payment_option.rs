//! # Payment Option Repository
//!
//! Bank transfer targets a tenant offers at checkout.

use chrono::Utc;
use shopdesk_core::PaymentOption;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct NewPaymentOption {
    pub admin_id: String,
    pub bank_name: String,
    pub account_name: String,
    pub account_number: String,
}

/// Repository for payment option database operations.
#[derive(Debug, Clone)]
pub struct PaymentOptionRepository {
    pool: SqlitePool,
}

impl PaymentOptionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PaymentOptionRepository { pool }
    }

    pub async fn insert(&self, new: &NewPaymentOption) -> DbResult<PaymentOption> {
        let option = PaymentOption {
            id: Uuid::new_v4().to_string(),
            admin_id: new.admin_id.clone(),
            bank_name: new.bank_name.trim().to_string(),
            account_name: new.account_name.trim().to_string(),
            account_number: new.account_number.trim().to_string(),
            created_at: Utc::now(),
        };

        debug!(id = %option.id, admin_id = %option.admin_id, "Inserting payment option");

        sqlx::query(
            r#"
            INSERT INTO payment_options (id, admin_id, bank_name, account_name, account_number, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&option.id)
        .bind(&option.admin_id)
        .bind(&option.bank_name)
        .bind(&option.account_name)
        .bind(&option.account_number)
        .bind(option.created_at)
        .execute(&self.pool)
        .await?;

        Ok(option)
    }

    /// The tenant's payment options, oldest first.
    pub async fn list(&self, admin_id: &str) -> DbResult<Vec<PaymentOption>> {
        let options = sqlx::query_as::<_, PaymentOption>(
            "SELECT id, admin_id, bank_name, account_name, account_number, created_at \
             FROM payment_options WHERE admin_id = ?1 ORDER BY created_at",
        )
        .bind(admin_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(options)
    }

    pub async fn get(&self, admin_id: &str, id: &str) -> DbResult<Option<PaymentOption>> {
        let option = sqlx::query_as::<_, PaymentOption>(
            "SELECT id, admin_id, bank_name, account_name, account_number, created_at \
             FROM payment_options WHERE id = ?1 AND admin_id = ?2",
        )
        .bind(id)
        .bind(admin_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(option)
    }

    /// Deletes a payment option. Past sales keep their `bank_<id>` tag.
    pub async fn delete(&self, admin_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting payment option");

        let result = sqlx::query("DELETE FROM payment_options WHERE id = ?1 AND admin_id = ?2")
            .bind(id)
            .bind(admin_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PaymentOption", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::testing;

    #[tokio::test]
    async fn test_crud_is_tenant_scoped() {
        let db = testing::db().await;
        let a = testing::admin(&db, "Alice").await;
        let b = testing::admin(&db, "Bob").await;
        let opt = testing::payment_option(&db, &a, "First Bank").await;

        assert_eq!(db.payment_options().list(&a.id).await.unwrap().len(), 1);
        assert!(db.payment_options().list(&b.id).await.unwrap().is_empty());
        assert!(db.payment_options().get(&b.id, &opt.id).await.unwrap().is_none());

        assert!(db.payment_options().delete(&b.id, &opt.id).await.is_err());
        db.payment_options().delete(&a.id, &opt.id).await.unwrap();
        assert!(db.payment_options().list(&a.id).await.unwrap().is_empty());
    }
}
