//! # Profile Repository
//!
//! Profiles carry role, status and tenant linkage. This repository also
//! owns the two multi-row operations on them:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  provision(NewAccount)          one transaction                         │
//! │     INSERT credentials ──► INSERT profiles                              │
//! │                                                                         │
//! │  set_admin_status_cascade       one transaction                         │
//! │     UPDATE admin ──► UPDATE every salesperson WHERE admin_id = admin    │
//! │                                                                         │
//! │  delete_admin_cascade           one transaction                         │
//! │     DELETE salesperson credentials ──► DELETE admin credential          │
//! │     (FK cascades remove the profiles and the tenant's data)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use shopdesk_core::{AccountStatus, CoreError, Profile, Role};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use super::decode_rows;
use crate::error::{DbError, DbResult};

const PROFILE_COLUMNS: &str = "id, name, email, role, status, admin_id, store_name, username, \
                               phone, picture_url, created_by, created_at";

/// Raw `profiles` row before validation.
#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: String,
    name: String,
    email: String,
    role: String,
    status: String,
    admin_id: Option<String>,
    store_name: Option<String>,
    username: Option<String>,
    phone: Option<String>,
    picture_url: Option<String>,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = CoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| CoreError::malformed("profile", &row.id, e.to_string()))?;
        let status = row
            .status
            .parse::<AccountStatus>()
            .map_err(|e| CoreError::malformed("profile", &row.id, e.to_string()))?;

        let profile = Profile {
            id: row.id,
            name: row.name,
            email: row.email,
            role,
            status,
            admin_id: row.admin_id,
            store_name: row.store_name,
            username: row.username,
            phone: row.phone,
            picture_url: row.picture_url,
            created_by: row.created_by,
            created_at: row.created_at,
        };
        profile.check()?;
        Ok(profile)
    }
}

/// Input for [`ProfileRepository::provision`]: a credential and its profile.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    /// Already hashed by the caller.
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub admin_id: Option<String>,
    pub store_name: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub picture_url: Option<String>,
    pub created_by: Option<String>,
}

/// Repository for profile database operations.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    pool: SqlitePool,
}

impl ProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProfileRepository { pool }
    }

    /// Creates a sign-in identity and its profile atomically.
    ///
    /// This is the server-side "provision account" operation: the acting
    /// principal's own session is never touched.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - the email is already registered
    /// * `DbError::Domain(MalformedRecord)` - role/linkage invariants broken
    pub async fn provision(&self, account: &NewAccount) -> DbResult<Profile> {
        let profile = Profile {
            id: Uuid::new_v4().to_string(),
            name: account.name.trim().to_string(),
            email: account.email.trim().to_string(),
            role: account.role,
            status: AccountStatus::Active,
            admin_id: account.admin_id.clone(),
            store_name: account.store_name.clone(),
            username: account.username.clone(),
            phone: account.phone.clone(),
            picture_url: account.picture_url.clone(),
            created_by: account.created_by.clone(),
            created_at: Utc::now(),
        };
        profile.check()?;

        debug!(id = %profile.id, role = %profile.role, "Provisioning account");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO credentials (id, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&profile.id)
        .bind(&profile.email)
        .bind(&account.password_hash)
        .bind(profile.created_at)
        .execute(&mut *tx)
        .await?;

        insert_profile(&mut tx, &profile).await?;

        tx.commit().await?;

        info!(id = %profile.id, role = %profile.role, "Account provisioned");
        Ok(profile)
    }

    /// Inserts a profile for an existing credential (profile completion).
    pub async fn insert(&self, profile: &Profile) -> DbResult<()> {
        profile.check()?;
        debug!(id = %profile.id, role = %profile.role, "Inserting profile");

        let mut conn = self.pool.acquire().await?;
        insert_profile(&mut conn, profile).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {} FROM profiles WHERE id = ?1",
            PROFILE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Profile::try_from).transpose()?)
    }

    /// All admins, newest first.
    pub async fn list_admins(&self) -> DbResult<Vec<Profile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {} FROM profiles WHERE role = 'admin' ORDER BY created_at DESC",
            PROFILE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_rows(rows))
    }

    /// Salespersons of one tenant, newest first.
    pub async fn list_salespersons(&self, admin_id: &str) -> DbResult<Vec<Profile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {} FROM profiles WHERE role = 'salesperson' AND admin_id = ?1 \
             ORDER BY created_at DESC",
            PROFILE_COLUMNS
        ))
        .bind(admin_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_rows(rows))
    }

    pub async fn count_salespersons(&self, admin_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM profiles WHERE role = 'salesperson' AND admin_id = ?1",
        )
        .bind(admin_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Sets the status of one of the tenant's salespersons.
    pub async fn set_salesperson_status(
        &self,
        admin_id: &str,
        salesperson_id: &str,
        status: AccountStatus,
    ) -> DbResult<()> {
        debug!(id = %salesperson_id, status = status.as_str(), "Setting salesperson status");

        let result = sqlx::query(
            "UPDATE profiles SET status = ?1 \
             WHERE id = ?2 AND role = 'salesperson' AND admin_id = ?3",
        )
        .bind(status)
        .bind(salesperson_id)
        .bind(admin_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Salesperson", salesperson_id));
        }

        Ok(())
    }

    /// Sets an admin's status and the same status on all of its salespersons.
    ///
    /// ## Returns
    /// Number of salesperson profiles updated.
    pub async fn set_admin_status_cascade(
        &self,
        admin_id: &str,
        status: AccountStatus,
    ) -> DbResult<u64> {
        debug!(id = %admin_id, status = status.as_str(), "Setting admin status with cascade");

        let mut tx = self.pool.begin().await?;

        let admin = sqlx::query("UPDATE profiles SET status = ?1 WHERE id = ?2 AND role = 'admin'")
            .bind(status)
            .bind(admin_id)
            .execute(&mut *tx)
            .await?;

        if admin.rows_affected() == 0 {
            return Err(DbError::not_found("Admin", admin_id));
        }

        let salespersons = sqlx::query(
            "UPDATE profiles SET status = ?1 WHERE role = 'salesperson' AND admin_id = ?2",
        )
        .bind(status)
        .bind(admin_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            id = %admin_id,
            status = status.as_str(),
            salespersons = salespersons.rows_affected(),
            "Admin status changed"
        );
        Ok(salespersons.rows_affected())
    }

    /// Deletes one of the tenant's salespersons (credential and profile).
    pub async fn delete_salesperson(&self, admin_id: &str, salesperson_id: &str) -> DbResult<()> {
        debug!(id = %salesperson_id, "Deleting salesperson");

        let result = sqlx::query(
            "DELETE FROM credentials WHERE id = ( \
                 SELECT id FROM profiles \
                 WHERE id = ?1 AND role = 'salesperson' AND admin_id = ?2)",
        )
        .bind(salesperson_id)
        .bind(admin_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Salesperson", salesperson_id));
        }

        Ok(())
    }

    /// Deletes an admin and every salesperson linked to it.
    ///
    /// Tenant data (items, categories, payment options, sales) goes with the
    /// admin through foreign-key cascades.
    ///
    /// ## Returns
    /// Number of salesperson accounts removed.
    pub async fn delete_admin_cascade(&self, admin_id: &str) -> DbResult<u64> {
        debug!(id = %admin_id, "Deleting admin with cascade");

        let mut tx = self.pool.begin().await?;

        let salespersons = sqlx::query(
            "DELETE FROM credentials WHERE id IN ( \
                 SELECT id FROM profiles WHERE role = 'salesperson' AND admin_id = ?1)",
        )
        .bind(admin_id)
        .execute(&mut *tx)
        .await?;

        let admin = sqlx::query(
            "DELETE FROM credentials WHERE id = ( \
                 SELECT id FROM profiles WHERE id = ?1 AND role = 'admin')",
        )
        .bind(admin_id)
        .execute(&mut *tx)
        .await?;

        if admin.rows_affected() == 0 {
            // Dropping `tx` rolls back the salesperson deletes.
            return Err(DbError::not_found("Admin", admin_id));
        }

        tx.commit().await?;

        info!(
            id = %admin_id,
            salespersons = salespersons.rows_affected(),
            "Admin deleted"
        );
        Ok(salespersons.rows_affected())
    }

    /// Checks if any profile already uses this username.
    pub async fn username_exists(&self, username: &str) -> DbResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM profiles WHERE username = ?1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    pub async fn super_admin_exists(&self) -> DbResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM profiles WHERE role = 'super_admin')")
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }
}

async fn insert_profile(conn: &mut sqlx::SqliteConnection, profile: &Profile) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO profiles (
            id, name, email, role, status, admin_id, store_name,
            username, phone, picture_url, created_by, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&profile.id)
    .bind(&profile.name)
    .bind(&profile.email)
    .bind(profile.role)
    .bind(profile.status)
    .bind(&profile.admin_id)
    .bind(&profile.store_name)
    .bind(&profile.username)
    .bind(&profile.phone)
    .bind(&profile.picture_url)
    .bind(&profile.created_by)
    .bind(profile.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn test_provision_and_get() {
        let db = testing::db().await;
        let admin = testing::admin(&db, "Olive Owner").await;

        let loaded = db.profiles().get(&admin.id).await.unwrap().unwrap();
        assert_eq!(loaded.role, Role::Admin);
        assert_eq!(loaded.store_name.as_deref(), Some("Olive Owner's Store"));
        assert!(loaded.is_active());
        assert!(db.credentials().get(&admin.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_provision_duplicate_email() {
        let db = testing::db().await;
        let admin = testing::admin(&db, "Olive Owner").await;

        let err = db
            .profiles()
            .provision(&NewAccount {
                email: admin.email.clone(),
                password_hash: "x".to_string(),
                name: "Copy".to_string(),
                role: Role::Admin,
                admin_id: None,
                store_name: Some("Copy".to_string()),
                username: None,
                phone: None,
                picture_url: None,
                created_by: None,
            })
            .await
            .unwrap_err();
        assert!(err.is_unique_violation_on("email"));

        // Neither row of the failed provision survived.
        assert_eq!(db.profiles().list_admins().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_provision_rejects_orphan_salesperson() {
        let db = testing::db().await;
        let err = db
            .profiles()
            .provision(&NewAccount {
                email: "orphan@shop.com".to_string(),
                password_hash: "x".to_string(),
                name: "Orphan".to_string(),
                role: Role::Salesperson,
                admin_id: None,
                store_name: None,
                username: None,
                phone: None,
                picture_url: None,
                created_by: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::MalformedRecord { .. })));
    }

    #[tokio::test]
    async fn test_list_salespersons_is_tenant_scoped() {
        let db = testing::db().await;
        let a = testing::admin(&db, "Alice").await;
        let b = testing::admin(&db, "Bob").await;
        testing::salesperson(&db, &a, "Sam").await;
        testing::salesperson(&db, &a, "Sue").await;
        testing::salesperson(&db, &b, "Tim").await;

        assert_eq!(db.profiles().list_salespersons(&a.id).await.unwrap().len(), 2);
        assert_eq!(db.profiles().count_salespersons(&b.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_salesperson_status_requires_owner() {
        let db = testing::db().await;
        let a = testing::admin(&db, "Alice").await;
        let b = testing::admin(&db, "Bob").await;
        let sam = testing::salesperson(&db, &a, "Sam").await;

        let err = db
            .profiles()
            .set_salesperson_status(&b.id, &sam.id, AccountStatus::Inactive)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        db.profiles()
            .set_salesperson_status(&a.id, &sam.id, AccountStatus::Inactive)
            .await
            .unwrap();
        let sam = db.profiles().get(&sam.id).await.unwrap().unwrap();
        assert_eq!(sam.status, AccountStatus::Inactive);
    }

    #[tokio::test]
    async fn test_admin_status_cascades() {
        let db = testing::db().await;
        let admin = testing::admin(&db, "Alice").await;
        let sam = testing::salesperson(&db, &admin, "Sam").await;
        let sue = testing::salesperson(&db, &admin, "Sue").await;

        let updated = db
            .profiles()
            .set_admin_status_cascade(&admin.id, AccountStatus::Inactive)
            .await
            .unwrap();
        assert_eq!(updated, 2);

        for id in [&admin.id, &sam.id, &sue.id] {
            let p = db.profiles().get(id).await.unwrap().unwrap();
            assert_eq!(p.status, AccountStatus::Inactive);
        }
    }

    #[tokio::test]
    async fn test_delete_admin_cascades_to_salespersons() {
        let db = testing::db().await;
        let admin = testing::admin(&db, "Alice").await;
        let other = testing::admin(&db, "Bob").await;
        let sam = testing::salesperson(&db, &admin, "Sam").await;
        let sue = testing::salesperson(&db, &admin, "Sue").await;
        let tim = testing::salesperson(&db, &other, "Tim").await;

        let removed = db.profiles().delete_admin_cascade(&admin.id).await.unwrap();
        assert_eq!(removed, 2);

        for id in [&admin.id, &sam.id, &sue.id] {
            assert!(db.profiles().get(id).await.unwrap().is_none());
            assert!(db.credentials().get(id).await.unwrap().is_none());
        }
        assert!(db.profiles().get(&tim.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_unknown_admin() {
        let db = testing::db().await;
        let admin = testing::admin(&db, "Alice").await;
        let sam = testing::salesperson(&db, &admin, "Sam").await;

        // A salesperson id is not an admin id.
        let err = db.profiles().delete_admin_cascade(&sam.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert!(db.profiles().get(&sam.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_salesperson() {
        let db = testing::db().await;
        let admin = testing::admin(&db, "Alice").await;
        let sam = testing::salesperson(&db, &admin, "Sam").await;

        db.profiles().delete_salesperson(&admin.id, &sam.id).await.unwrap();
        assert!(db.profiles().get(&sam.id).await.unwrap().is_none());
        assert!(db.profiles().delete_salesperson(&admin.id, &sam.id).await.is_err());
    }

    #[tokio::test]
    async fn test_username_exists() {
        let db = testing::db().await;
        let admin = testing::admin(&db, "Alice").await;
        testing::salesperson(&db, &admin, "Sam Seller").await;

        assert!(db.profiles().username_exists("samse").await.unwrap());
        assert!(!db.profiles().username_exists("other").await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_row_is_rejected_on_get_and_skipped_in_lists() {
        let db = testing::db().await;
        testing::admin(&db, "Alice").await;

        sqlx::query(
            "INSERT INTO credentials (id, email, password_hash, created_at) \
             VALUES ('bad', 'bad@x.com', 'x', '2024-01-01T00:00:00+00:00')",
        )
        .execute(db.pool())
        .await
        .unwrap();
        // Admin carrying an owning admin breaks the linkage invariant.
        sqlx::query(
            "INSERT INTO profiles (id, name, email, role, status, admin_id, created_at) \
             VALUES ('bad', 'Bad', 'bad@x.com', 'admin', 'active', 'bad', '2024-01-01T00:00:00+00:00')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let err = db.profiles().get("bad").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::MalformedRecord { .. })));
        assert_eq!(db.profiles().list_admins().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_super_admin_exists() {
        let db = testing::db().await;
        assert!(!db.profiles().super_admin_exists().await.unwrap());
        testing::account(&db, "root@shop.com", "Root", Role::SuperAdmin, None).await;
        assert!(db.profiles().super_admin_exists().await.unwrap());
    }
}
