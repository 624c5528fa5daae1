/// Student record administration
///
/// CRUD over student records. Creation runs inside a transaction so the
/// student-code and email uniqueness checks (and the optional login account)
/// commit atomically.

mod manager;

pub use manager::StudentManager;

use crate::db::models::StudentStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Student creation request
///
/// When `password` is present a login account is created in the same
/// transaction and linked via `account_id`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentRequest {
    #[validate(length(min = 1, max = 32, message = "must be 1-32 characters"))]
    pub student_code: String,
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub last_name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub status: Option<StudentStatus>,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: Option<String>,
}

/// Admin update request, all fields optional
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentRequest {
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub status: Option<StudentStatus>,
}

/// Student self-service update, contact fields only
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SelfUpdateRequest {
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Optional list filters
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    /// Matches student code, name, or email
    pub search: Option<String>,
    /// Matches students enrolled in a course with this name
    pub course: Option<String>,
}
