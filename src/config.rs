/// Configuration management for the registrar service
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitSettings,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    /// Connection attempts before giving up at startup
    pub connect_attempts: u32,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    /// Bootstrap admin account, created at startup when absent
    pub admin_email: String,
    pub admin_password: String,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub enabled: bool,
    pub authenticated_rps: u32,
    pub unauthenticated_rps: u32,
    pub burst_size: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ApiResult<Self> {
        dotenv::dotenv().ok();

        let hostname =
            env::var("REGISTRAR_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("REGISTRAR_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ApiError::Validation("Invalid port number".to_string()))?;
        let database_path: PathBuf = env::var("REGISTRAR_DB_PATH")
            .unwrap_or_else(|_| "./data/registrar.sqlite".to_string())
            .into();
        let max_connections = env::var("REGISTRAR_DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);
        let connect_attempts = env::var("REGISTRAR_DB_CONNECT_ATTEMPTS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .unwrap_or(5);

        // Secrets are mandatory, no literal fallbacks
        let jwt_secret = env::var("REGISTRAR_JWT_SECRET")
            .map_err(|_| ApiError::Validation("JWT secret required".to_string()))?;
        let admin_email = env::var("REGISTRAR_ADMIN_EMAIL")
            .map_err(|_| ApiError::Validation("Admin email required".to_string()))?;
        let admin_password = env::var("REGISTRAR_ADMIN_PASSWORD")
            .map_err(|_| ApiError::Validation("Admin password required".to_string()))?;
        let token_ttl_hours = env::var("REGISTRAR_TOKEN_TTL_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .unwrap_or(24);

        let rate_limit_enabled = env::var("REGISTRAR_RATE_LIMITS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);
        let authenticated_rps = env::var("REGISTRAR_RATE_LIMIT_AUTHENTICATED_RPS")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .unwrap_or(100);
        let unauthenticated_rps = env::var("REGISTRAR_RATE_LIMIT_UNAUTHENTICATED_RPS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);
        let burst_size = env::var("REGISTRAR_RATE_LIMIT_BURST")
            .unwrap_or_else(|_| "50".to_string())
            .parse()
            .unwrap_or(50);

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig { hostname, port },
            database: DatabaseConfig {
                path: database_path,
                max_connections,
                connect_attempts,
            },
            auth: AuthConfig {
                jwt_secret,
                token_ttl_hours,
                admin_email,
                admin_password,
            },
            rate_limit: RateLimitSettings {
                enabled: rate_limit_enabled,
                authenticated_rps,
                unauthenticated_rps,
                burst_size,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.service.hostname.is_empty() {
            return Err(ApiError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.auth.jwt_secret.len() < 32 {
            return Err(ApiError::Validation(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        if self.auth.admin_password.len() < 8 {
            return Err(ApiError::Validation(
                "Admin password must be at least 8 characters".to_string(),
            ));
        }

        if self.auth.token_ttl_hours <= 0 {
            return Err(ApiError::Validation(
                "Token TTL must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn test_config() -> ServerConfig {
        ServerConfig {
            service: ServiceConfig {
                hostname: "localhost".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                path: "./data/test.sqlite".into(),
                max_connections: 5,
                connect_attempts: 3,
            },
            auth: AuthConfig {
                jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
                token_ttl_hours: 24,
                admin_email: "admin@example.edu".to_string(),
                admin_password: "correct-horse".to_string(),
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
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let mut config = test_config();
        config.auth.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_short_admin_password_rejected() {
        let mut config = test_config();
        config.auth.admin_password = "pw".to_string();
        assert!(config.validate().is_err());
    }
}
