/// Rate limiting
use crate::{config::RateLimitSettings, error::ApiResult};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorLimiter,
};
use std::{num::NonZeroU32, sync::Arc};

/// Rate limiter manager, one quota per tier
#[derive(Clone)]
pub struct RateLimiter {
    enabled: bool,
    authenticated: Arc<GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    unauthenticated: Arc<GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl RateLimiter {
    pub fn new(settings: &RateLimitSettings) -> Self {
        let auth_quota = Quota::per_second(
            NonZeroU32::new(settings.authenticated_rps).unwrap_or(NonZeroU32::new(100).unwrap()),
        )
        .allow_burst(NonZeroU32::new(settings.burst_size).unwrap_or(NonZeroU32::new(50).unwrap()));

        let unauth_quota = Quota::per_second(
            NonZeroU32::new(settings.unauthenticated_rps).unwrap_or(NonZeroU32::new(10).unwrap()),
        )
        .allow_burst(
            NonZeroU32::new(settings.burst_size / 5).unwrap_or(NonZeroU32::new(10).unwrap()),
        );

        Self {
            enabled: settings.enabled,
            authenticated: Arc::new(GovernorLimiter::direct(auth_quota)),
            unauthenticated: Arc::new(GovernorLimiter::direct(unauth_quota)),
        }
    }

    /// Check rate limit for a request carrying a bearer credential
    pub fn check_authenticated(&self) -> ApiResult<()> {
        if !self.enabled {
            return Ok(());
        }
        self.authenticated.check().map_err(|_| {
            crate::error::ApiError::RateLimitExceeded {
                retry_after: std::time::Duration::from_secs(1),
            }
        })
    }

    /// Check rate limit for an anonymous request
    pub fn check_unauthenticated(&self) -> ApiResult<()> {
        if !self.enabled {
            return Ok(());
        }
        self.unauthenticated.check().map_err(|_| {
            crate::error::ApiError::RateLimitExceeded {
                retry_after: std::time::Duration::from_secs(1),
            }
        })
    }
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(ctx): State<crate::context::AppContext>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let has_auth_header = request.headers().get("authorization").is_some();

    let result = if has_auth_header {
        ctx.rate_limiter.check_authenticated()
    } else {
        ctx.rate_limiter.check_unauthenticated()
    };

    match result {
        Ok(()) => Ok(next.run(request).await),
        Err(_) => Err(StatusCode::TOO_MANY_REQUESTS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(enabled: bool, burst: u32) -> RateLimitSettings {
        RateLimitSettings {
            enabled,
            authenticated_rps: 10,
            unauthenticated_rps: 5,
            burst_size: burst,
        }
    }

    #[test]
    fn test_first_requests_allowed() {
        let limiter = RateLimiter::new(&settings(true, 50));
        assert!(limiter.check_authenticated().is_ok());
        assert!(limiter.check_unauthenticated().is_ok());
    }

    #[test]
    fn test_burst_eventually_limited() {
        let limiter = RateLimiter::new(&settings(true, 5));

        let mut limited = false;
        for _ in 0..100 {
            if limiter.check_unauthenticated().is_err() {
                limited = true;
                break;
            }
        }
        assert!(limited);
    }

    #[test]
    fn test_disabled_limiter_never_rejects() {
        let limiter = RateLimiter::new(&settings(false, 1));
        for _ in 0..1000 {
            assert!(limiter.check_unauthenticated().is_ok());
        }
    }
}
