/// Application context and dependency injection
use crate::{
    account::AccountManager,
    config::ServerConfig,
    courses::CourseManager,
    db,
    enrollment::EnrollmentEngine,
    error::ApiResult,
    rate_limit::RateLimiter,
    students::StudentManager,
};
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub accounts: Arc<AccountManager>,
    pub students: Arc<StudentManager>,
    pub courses: Arc<CourseManager>,
    pub enrollment: Arc<EnrollmentEngine>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> ApiResult<Self> {
        config.validate()?;

        let config = Arc::new(config);

        // Connection establishment is the only retried persistence step
        let db = db::create_pool_with_retry(
            &config.database.path,
            db::DatabaseOptions {
                max_connections: config.database.max_connections,
                enable_wal: true,
            },
            config.database.connect_attempts,
        )
        .await?;

        db::run_migrations(&db).await?;
        db::test_connection(&db).await?;

        let accounts = Arc::new(AccountManager::new(db.clone(), Arc::clone(&config)));
        let students = Arc::new(StudentManager::new(db.clone(), Arc::clone(&accounts)));
        let courses = Arc::new(CourseManager::new(db.clone()));
        let enrollment = Arc::new(EnrollmentEngine::new(db.clone()));
        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limit));

        // Initial admin account
        accounts.bootstrap_admin().await?;

        Ok(Self {
            config,
            accounts,
            students,
            courses,
            enrollment,
            rate_limiter,
        })
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
