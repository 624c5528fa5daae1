/// /api/registrations/* endpoints
use crate::{
    auth::{AdminContext, AuthContext},
    context::AppContext,
    db::models::{Registration, RegistrationStatus},
    enrollment::{EnrollRequest, RegistrationFilter, UpdateRegistrationRequest},
    error::{ApiError, ApiResult},
    pagination::{Paginated, Pagination},
};
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

/// Build registration routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/registrations", post(enroll))
        .route("/api/registrations", get(list_registrations))
        .route("/api/registrations/:id", delete(drop_registration))
        .route("/api/registrations/:id", put(update_registration))
}

/// Enroll the caller's own student record in a course
async fn enroll(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(req): Json<EnrollRequest>,
) -> ApiResult<Json<Registration>> {
    req.validate()?;

    let student = ctx.students.get_by_account(&auth.account_id).await?;
    let registration = ctx.enrollment.enroll(&student.id, &req.course_id).await?;

    Ok(Json(registration))
}

/// Drop a registration: the owning student soft-drops, an admin deletes the
/// row entirely
async fn drop_registration(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    if auth.is_admin() {
        ctx.enrollment.delete(&id).await?;
        return Ok(Json(json!({ "message": "Registration deleted" })));
    }

    let student = ctx.students.get_by_account(&auth.account_id).await?;
    let registration = ctx.enrollment.drop_own(&id, &student.id).await?;
    Ok(Json(json!({
        "message": "Registration dropped",
        "registration": registration,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListRegistrationsQuery {
    page: Option<String>,
    limit: Option<String>,
    status: Option<String>,
    course_id: Option<String>,
    student_id: Option<String>,
}

/// Paginated registration list (admin)
async fn list_registrations(
    State(ctx): State<AppContext>,
    _admin: AdminContext,
    Query(query): Query<ListRegistrationsQuery>,
) -> ApiResult<Json<Paginated<Registration>>> {
    let pagination = Pagination::from_params(query.page.as_deref(), query.limit.as_deref())?;

    let status = match query.status.as_deref() {
        None => None,
        Some(raw) => Some(RegistrationStatus::parse(raw).ok_or_else(|| {
            ApiError::Validation(format!("Unknown registration status: {}", raw))
        })?),
    };

    let filter = RegistrationFilter {
        status,
        course_id: query.course_id,
        student_id: query.student_id,
    };

    let page = ctx.enrollment.list(&filter, pagination).await?;
    Ok(Json(page))
}

/// Update a registration's status or grade (admin)
async fn update_registration(
    State(ctx): State<AppContext>,
    _admin: AdminContext,
    Path(id): Path<String>,
    Json(req): Json<UpdateRegistrationRequest>,
) -> ApiResult<Json<Registration>> {
    let registration = ctx.enrollment.update(&id, req).await?;
    Ok(Json(registration))
}
