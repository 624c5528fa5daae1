/// Course offering administration
///
/// CRUD over course offerings plus the deletion guard that keeps a course
/// alive while it still has enrolled registrations.

mod manager;

pub use manager::CourseManager;

use crate::db::models::CourseStatus;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Course creation request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 32, message = "must be 1-32 characters"))]
    pub course_code: String,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 1, message = "must be at least 1 week"))]
    pub duration_weeks: Option<i64>,
    pub instructor: Option<String>,
    pub department: Option<String>,
    pub semester: Option<String>,
    #[validate(range(min = 1900, max = 2200, message = "must be a plausible year"))]
    pub year: Option<i64>,
    #[validate(range(min = 0, max = 20, message = "must be 0-20"))]
    pub credits: Option<i64>,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub max_students: Option<i64>,
    pub status: Option<CourseStatus>,
}

/// Partial course update request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 1, message = "must be at least 1 week"))]
    pub duration_weeks: Option<i64>,
    pub instructor: Option<String>,
    pub department: Option<String>,
    pub semester: Option<String>,
    #[validate(range(min = 1900, max = 2200, message = "must be a plausible year"))]
    pub year: Option<i64>,
    #[validate(range(min = 0, max = 20, message = "must be 0-20"))]
    pub credits: Option<i64>,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub max_students: Option<i64>,
    pub status: Option<CourseStatus>,
}

/// Optional list filters; each present filter contributes one ANDed predicate
#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    /// Matches course code or name
    pub search: Option<String>,
    pub department: Option<String>,
    pub semester: Option<String>,
}
