/// /api/auth/* endpoints
use crate::{
    account::{AccountView, LoginRequest, LoginResponse},
    auth::AuthContext,
    context::AppContext,
    error::ApiResult,
};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

/// Build auth routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/verify", get(verify))
}

/// Login endpoint: issues a bearer token
async fn login(
    State(ctx): State<AppContext>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let (account, token) = ctx.accounts.login(&req.email, &req.password).await?;
    tracing::info!("login for {} ({})", account.email, account.role.as_str());

    Ok(Json(LoginResponse {
        token,
        account: AccountView {
            id: account.id,
            email: account.email,
            role: account.role,
        },
    }))
}

/// Validate the presented credential and echo the account
async fn verify(auth: AuthContext) -> Json<AccountView> {
    Json(AccountView {
        id: auth.account_id,
        email: auth.email,
        role: auth.role,
    })
}
