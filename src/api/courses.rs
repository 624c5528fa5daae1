/// /api/courses/* endpoints
use crate::{
    auth::{AdminContext, AuthContext},
    context::AppContext,
    courses::{CourseFilter, CreateCourseRequest, UpdateCourseRequest},
    db::models::Course,
    enrollment::RosterEntry,
    error::ApiResult,
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

/// Build course routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/courses", get(list_courses))
        .route("/api/courses", post(create_course))
        .route("/api/courses/:id", get(get_course))
        .route("/api/courses/:id", put(update_course))
        .route("/api/courses/:id", delete(delete_course))
        .route("/api/courses/:id/registrations", get(course_roster))
}

#[derive(Debug, Deserialize)]
struct ListCoursesQuery {
    page: Option<String>,
    limit: Option<String>,
    search: Option<String>,
    department: Option<String>,
    semester: Option<String>,
}

/// Paginated course list, open to any authenticated account
async fn list_courses(
    State(ctx): State<AppContext>,
    _auth: AuthContext,
    Query(query): Query<ListCoursesQuery>,
) -> ApiResult<Json<Paginated<Course>>> {
    let pagination = Pagination::from_params(query.page.as_deref(), query.limit.as_deref())?;
    let filter = CourseFilter {
        search: query.search,
        department: query.department,
        semester: query.semester,
    };

    let page = ctx.courses.list(&filter, pagination).await?;
    Ok(Json(page))
}

/// Create a course (admin)
async fn create_course(
    State(ctx): State<AppContext>,
    _admin: AdminContext,
    Json(req): Json<CreateCourseRequest>,
) -> ApiResult<Json<Course>> {
    req.validate()?;
    let course = ctx.courses.create(req).await?;
    Ok(Json(course))
}

/// Fetch one course
async fn get_course(
    State(ctx): State<AppContext>,
    _auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<Course>> {
    let course = ctx.courses.get(&id).await?;
    Ok(Json(course))
}

/// Partial course update (admin)
async fn update_course(
    State(ctx): State<AppContext>,
    _admin: AdminContext,
    Path(id): Path<String>,
    Json(req): Json<UpdateCourseRequest>,
) -> ApiResult<Json<Course>> {
    req.validate()?;
    let course = ctx.courses.update(&id, req).await?;
    Ok(Json(course))
}

/// Delete a course, refused while it has enrolled registrations (admin)
async fn delete_course(
    State(ctx): State<AppContext>,
    _admin: AdminContext,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    ctx.courses.delete(&id).await?;
    Ok(Json(json!({ "message": "Course deleted" })))
}

/// Course roster (admin)
async fn course_roster(
    State(ctx): State<AppContext>,
    _admin: AdminContext,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<RosterEntry>>> {
    let roster = ctx.enrollment.roster(&id).await?;
    Ok(Json(roster))
}
