/// Account manager
///
/// Uses sqlx runtime query building instead of compile-time macros to avoid
/// needing DATABASE_URL during compilation.

use crate::{
    auth,
    config::ServerConfig,
    db::models::{Account, Role},
    error::{ApiError, ApiResult},
};
use chrono::Utc;
use pbkdf2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::Pbkdf2;
use rand_core::OsRng;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// Account manager service
pub struct AccountManager {
    db: SqlitePool,
    config: Arc<ServerConfig>,
}

impl AccountManager {
    /// Create a new account manager
    pub fn new(db: SqlitePool, config: Arc<ServerConfig>) -> Self {
        Self { db, config }
    }

    /// Hash a password for storage
    pub fn hash_password(password: &str) -> ApiResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Pbkdf2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Verify a password against a stored hash
    pub fn verify_password(password: &str, stored: &str) -> ApiResult<bool> {
        let hash = PasswordHash::new(stored)
            .map_err(|e| ApiError::Internal(format!("Corrupt password hash: {}", e)))?;
        Ok(Pbkdf2.verify_password(password.as_bytes(), &hash).is_ok())
    }

    /// Authenticate an account and issue a bearer token
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<(Account, String)> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, email, password_hash, role, is_active, locked_until, created_at
             FROM accounts WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ApiError::Authentication("Invalid credentials".to_string()))?;

        if !account.is_active {
            return Err(ApiError::Authorization("Account is deactivated".to_string()));
        }

        if let Some(locked_until) = account.locked_until {
            if locked_until > Utc::now() {
                return Err(ApiError::Authorization("Account is locked".to_string()));
            }
        }

        let valid = Self::verify_password(password, &account.password_hash)?;
        if !valid {
            return Err(ApiError::Authentication("Invalid credentials".to_string()));
        }

        let token = auth::issue_token(&account, &self.config.auth)?;

        Ok((account, token))
    }

    /// Fetch an account by id
    pub async fn get_account(&self, id: &str) -> ApiResult<Account> {
        sqlx::query_as::<_, Account>(
            "SELECT id, email, password_hash, role, is_active, locked_until, created_at
             FROM accounts WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ApiError::Authentication("Account not found".to_string()))
    }

    /// Insert an account inside an existing transaction
    ///
    /// Used by student creation so the account and the student record commit
    /// or roll back together.
    pub async fn create_in_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        email: &str,
        password: &str,
        role: Role,
    ) -> ApiResult<Account> {
        let existing: Option<(String,)> =
            sqlx::query_as("SELECT id FROM accounts WHERE email = ?1")
                .bind(email)
                .fetch_optional(&mut **tx)
                .await?;
        if existing.is_some() {
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }

        let account = Account {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            password_hash: Self::hash_password(password)?,
            role,
            is_active: true,
            locked_until: None,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO accounts (id, email, password_hash, role, is_active, locked_until, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&account.id)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role)
        .bind(account.is_active)
        .bind(account.locked_until)
        .bind(account.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(account)
    }

    /// Create the initial admin account if no admin exists yet
    pub async fn bootstrap_admin(&self) -> ApiResult<()> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM accounts WHERE role = 'admin'")
                .fetch_one(&self.db)
                .await?;

        if count > 0 {
            return Ok(());
        }

        let mut tx = self.db.begin().await?;
        let account = self
            .create_in_tx(
                &mut tx,
                &self.config.auth.admin_email,
                &self.config.auth.admin_password,
                Role::Admin,
            )
            .await?;
        tx.commit().await?;

        tracing::info!("bootstrapped admin account {}", account.email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AuthConfig, DatabaseConfig, LoggingConfig, RateLimitSettings, ServiceConfig,
    };

    fn test_config() -> Arc<ServerConfig> {
        Arc::new(ServerConfig {
            service: ServiceConfig {
                hostname: "localhost".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                path: ":memory:".into(),
                max_connections: 1,
                connect_attempts: 1,
            },
            auth: AuthConfig {
                jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
                token_ttl_hours: 24,
                admin_email: "admin@example.edu".to_string(),
                admin_password: "admin-password".to_string(),
            },
            rate_limit: RateLimitSettings {
                enabled: false,
                authenticated_rps: 100,
                unauthenticated_rps: 10,
                burst_size: 50,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        })
    }

    async fn setup() -> AccountManager {
        let db = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        crate::db::run_migrations(&db).await.unwrap();
        AccountManager::new(db, test_config())
    }

    #[tokio::test]
    async fn test_bootstrap_admin_and_login() {
        let manager = setup().await;
        manager.bootstrap_admin().await.unwrap();
        // Second call is a no-op
        manager.bootstrap_admin().await.unwrap();

        let (account, token) = manager
            .login("admin@example.edu", "admin-password")
            .await
            .unwrap();
        assert_eq!(account.role, Role::Admin);
        assert!(!token.is_empty());
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let manager = setup().await;
        manager.bootstrap_admin().await.unwrap();

        let err = manager
            .login("admin@example.edu", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let manager = setup().await;
        let err = manager.login("nobody@example.edu", "pw").await.unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_login_deactivated_account() {
        let manager = setup().await;
        manager.bootstrap_admin().await.unwrap();

        sqlx::query("UPDATE accounts SET is_active = FALSE WHERE email = ?1")
            .bind("admin@example.edu")
            .execute(&manager.db)
            .await
            .unwrap();

        let err = manager
            .login("admin@example.edu", "admin-password")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_login_locked_account() {
        let manager = setup().await;
        manager.bootstrap_admin().await.unwrap();

        let until = Utc::now() + chrono::Duration::hours(1);
        sqlx::query("UPDATE accounts SET locked_until = ?1 WHERE email = ?2")
            .bind(until)
            .bind("admin@example.edu")
            .execute(&manager.db)
            .await
            .unwrap();

        let err = manager
            .login("admin@example.edu", "admin-password")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_expired_lock_allows_login() {
        let manager = setup().await;
        manager.bootstrap_admin().await.unwrap();

        let until = Utc::now() - chrono::Duration::hours(1);
        sqlx::query("UPDATE accounts SET locked_until = ?1 WHERE email = ?2")
            .bind(until)
            .bind("admin@example.edu")
            .execute(&manager.db)
            .await
            .unwrap();

        assert!(manager
            .login("admin@example.edu", "admin-password")
            .await
            .is_ok());
    }
}
