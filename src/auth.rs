/// Authentication extractors and utilities
use crate::{
    api::middleware::extract_bearer_token,
    config::AuthConfig,
    context::AppContext,
    db::models::{Account, Role},
    error::{ApiError, ApiResult},
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

/// JWT claims carried by a bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Issue a signed bearer token for an account
pub fn issue_token(account: &Account, auth: &AuthConfig) -> ApiResult<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = Utc::now();
    let claims = Claims {
        sub: account.id.clone(),
        email: account.email.clone(),
        role: account.role,
        iat: now.timestamp(),
        exp: (now + Duration::hours(auth.token_ttl_hours)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Token signing failed: {}", e)))
}

/// Verify a bearer token with full validation
///
/// This performs:
/// 1. JWT signature verification
/// 2. Expiration checking
/// 3. Claims decoding
pub fn verify_token(token: &str, jwt_secret: &str) -> ApiResult<Claims> {
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    let decoding_key = DecodingKey::from_secret(jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    // Allow some clock skew (5 minutes)
    validation.leeway = 300;

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::warn!("token verification failed: {}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ApiError::Authentication("Token has expired".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    ApiError::Authentication("Invalid token signature".to_string())
                }
                _ => ApiError::Authentication(format!("Invalid token: {}", e)),
            }
        })
}

/// Authenticated context - extracts and validates the bearer token, then
/// loads the backing account so deactivated and locked accounts are
/// rejected even while their tokens are still unexpired.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub account_id: String,
    pub email: String,
    pub role: Role,
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Authentication("Missing authorization header".to_string()))?;

        let claims = verify_token(&token, &state.config.auth.jwt_secret)?;

        let account = state.accounts.get_account(&claims.sub).await?;

        if !account.is_active {
            return Err(ApiError::Authorization("Account is deactivated".to_string()));
        }

        if let Some(locked_until) = account.locked_until {
            if locked_until > Utc::now() {
                return Err(ApiError::Authorization("Account is locked".to_string()));
            }
        }

        Ok(AuthContext {
            account_id: account.id,
            email: account.email,
            role: account.role,
        })
    }
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Admin authentication context - requires the admin role
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub auth: AuthContext,
}

#[async_trait]
impl FromRequestParts<AppContext> for AdminContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthContext::from_request_parts(parts, state).await?;

        if !auth.is_admin() {
            return Err(ApiError::Authorization("Admin role required".to_string()));
        }

        Ok(AdminContext { auth })
    }
}
