/// /api/students/* endpoints
use crate::{
    auth::{AdminContext, AuthContext},
    context::AppContext,
    db::models::Student,
    enrollment::{BulkEnrollRequest, BulkOutcome, BulkUnenrollRequest},
    error::{ApiError, ApiResult},
    pagination::{Paginated, Pagination},
    students::{CreateStudentRequest, SelfUpdateRequest, StudentFilter, UpdateStudentRequest},
};
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

/// Build student routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/students", get(list_students))
        .route("/api/students", post(create_student))
        .route("/api/students/me", get(get_own_student))
        .route("/api/students/:id", get(get_student))
        .route("/api/students/:id", put(update_student))
        .route("/api/students/:id", delete(delete_student))
        .route("/api/students/:id/enroll", post(bulk_enroll))
        .route("/api/students/:id/unenroll", post(bulk_unenroll))
}

#[derive(Debug, Deserialize)]
struct ListStudentsQuery {
    page: Option<String>,
    limit: Option<String>,
    search: Option<String>,
    course: Option<String>,
}

/// Paginated student list (admin)
async fn list_students(
    State(ctx): State<AppContext>,
    _admin: AdminContext,
    Query(query): Query<ListStudentsQuery>,
) -> ApiResult<Json<Paginated<Student>>> {
    let pagination = Pagination::from_params(query.page.as_deref(), query.limit.as_deref())?;
    let filter = StudentFilter {
        search: query.search,
        course: query.course,
    };

    let page = ctx.students.list(&filter, pagination).await?;
    Ok(Json(page))
}

/// Create a student record (admin)
async fn create_student(
    State(ctx): State<AppContext>,
    _admin: AdminContext,
    Json(req): Json<CreateStudentRequest>,
) -> ApiResult<Json<Student>> {
    req.validate()?;
    let student = ctx.students.create(req).await?;
    Ok(Json(student))
}

/// Caller's own student record
async fn get_own_student(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> ApiResult<Json<Student>> {
    let student = ctx.students.get_by_account(&auth.account_id).await?;
    Ok(Json(student))
}

/// Fetch one student (admin or the owning student)
async fn get_student(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<Student>> {
    let student = ctx.students.get(&id).await?;

    if !auth.is_admin() && student.account_id.as_deref() != Some(auth.account_id.as_str()) {
        return Err(ApiError::Authorization(
            "Not your student record".to_string(),
        ));
    }

    Ok(Json(student))
}

/// Update a student: admins touch any field, the owning student only
/// contact fields
async fn update_student(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<Json<Student>> {
    if auth.is_admin() {
        let req: UpdateStudentRequest = serde_json::from_value(body)
            .map_err(|e| ApiError::Validation(format!("Invalid request body: {}", e)))?;
        req.validate()?;
        let student = ctx.students.update(&id, req).await?;
        return Ok(Json(student));
    }

    let own = ctx.students.get_by_account(&auth.account_id).await?;
    if own.id != id {
        return Err(ApiError::Authorization(
            "Not your student record".to_string(),
        ));
    }

    let req: SelfUpdateRequest = serde_json::from_value(body)
        .map_err(|e| ApiError::Validation(format!("Invalid request body: {}", e)))?;
    let student = ctx.students.update_self(&id, req).await?;
    Ok(Json(student))
}

/// Delete a student and, via the schema, their registrations (admin)
async fn delete_student(
    State(ctx): State<AppContext>,
    _admin: AdminContext,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    ctx.students.delete(&id).await?;
    Ok(Json(json!({ "message": "Student deleted" })))
}

/// Bulk enroll a student into many courses (admin)
async fn bulk_enroll(
    State(ctx): State<AppContext>,
    _admin: AdminContext,
    Path(id): Path<String>,
    Json(req): Json<BulkEnrollRequest>,
) -> ApiResult<Json<BulkOutcome>> {
    req.validate()?;
    let outcome = ctx.enrollment.bulk_enroll(&id, &req.course_ids).await?;
    Ok(Json(outcome))
}

/// Bulk remove registrations from a student (admin)
async fn bulk_unenroll(
    State(ctx): State<AppContext>,
    _admin: AdminContext,
    Path(id): Path<String>,
    Json(req): Json<BulkUnenrollRequest>,
) -> ApiResult<Json<BulkOutcome>> {
    req.validate()?;
    let outcome = ctx
        .enrollment
        .bulk_unenroll(&id, &req.registration_ids)
        .await?;
    Ok(Json(outcome))
}
