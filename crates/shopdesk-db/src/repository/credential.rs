//! # Credential Repository
//!
//! Sign-in identities: an email and an argon2 password hash. The hash is
//! produced and verified by the API layer; this repository only stores it.
//!
//! A credential and its profile share the same id. A credential without a
//! profile is a signed-in principal that still has to complete its profile.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::DbResult;

/// A stored sign-in identity.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Credential {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Repository for credential database operations.
#[derive(Debug, Clone)]
pub struct CredentialRepository {
    pool: SqlitePool,
}

impl CredentialRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CredentialRepository { pool }
    }

    /// Inserts a credential without a profile.
    ///
    /// Account provisioning goes through
    /// [`ProfileRepository::provision`](crate::ProfileRepository::provision),
    /// which writes both rows in one transaction.
    pub async fn insert(&self, credential: &Credential) -> DbResult<()> {
        debug!(id = %credential.id, "Inserting credential");

        sqlx::query(
            "INSERT INTO credentials (id, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&credential.id)
        .bind(&credential.email)
        .bind(&credential.password_hash)
        .bind(credential.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Credential>> {
        let credential = sqlx::query_as::<_, Credential>(
            "SELECT id, email, password_hash, created_at FROM credentials WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credential)
    }

    /// Looks up a credential by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<Credential>> {
        let email = email.trim();
        debug!(email = %email, "Looking up credential by email");

        let credential = sqlx::query_as::<_, Credential>(
            "SELECT id, email, password_hash, created_at FROM credentials WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credential)
    }

    /// Looks up a salesperson credential by generated username.
    ///
    /// Usernames are not unique. When two salespersons share one, the
    /// lookup is ambiguous and returns `None`; those salespersons have to
    /// sign in with their email.
    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<Credential>> {
        let username = username.trim().to_lowercase();
        debug!(username = %username, "Looking up credential by username");

        let mut matches = sqlx::query_as::<_, Credential>(
            r#"
            SELECT c.id, c.email, c.password_hash, c.created_at
            FROM credentials c
            INNER JOIN profiles p ON p.id = c.id
            WHERE p.username = ?1 AND p.role = 'salesperson'
            LIMIT 2
            "#,
        )
        .bind(&username)
        .fetch_all(&self.pool)
        .await?;

        if matches.len() > 1 {
            warn!(username = %username, "Ambiguous username, sign-in by username refused");
            return Ok(None);
        }

        Ok(matches.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn test_find_by_email_is_case_insensitive() {
        let db = testing::db().await;
        let admin = testing::admin(&db, "Olive Owner").await;

        let found = db
            .credentials()
            .find_by_email(&admin.email.to_uppercase())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, admin.id);
        assert!(db.credentials().find_by_email("nobody@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_username() {
        let db = testing::db().await;
        let admin = testing::admin(&db, "Olive Owner").await;
        let seller = testing::salesperson(&db, &admin, "Sam Seller").await;

        let found = db.credentials().find_by_username("samse").await.unwrap().unwrap();
        assert_eq!(found.id, seller.id);
    }

    #[tokio::test]
    async fn test_ambiguous_username_is_refused() {
        let db = testing::db().await;
        let admin = testing::admin(&db, "Olive Owner").await;
        testing::salesperson(&db, &admin, "Sam Seller").await;
        testing::salesperson(&db, &admin, "Sam Selby").await;

        assert!(db.credentials().find_by_username("samse").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_credential_without_profile() {
        let db = testing::db().await;
        let credential = Credential {
            id: "cred-1".to_string(),
            email: "lone@shop.com".to_string(),
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
        };
        db.credentials().insert(&credential).await.unwrap();

        assert!(db.credentials().get("cred-1").await.unwrap().is_some());
        assert!(db.profiles().get("cred-1").await.unwrap().is_none());
    }
}
