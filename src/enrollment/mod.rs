/// Enrollment engine
///
/// Admits students into courses, enforcing the capacity and
/// duplicate-registration invariants inside a single transaction per
/// attempt. Bulk operations apply the same single-item logic per course
/// with no transaction spanning the batch.

mod engine;

pub use engine::EnrollmentEngine;

use crate::db::models::RegistrationStatus;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Self-service enroll request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub course_id: String,
}

/// Bulk enroll request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BulkEnrollRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub course_ids: Vec<String>,
}

/// Bulk unenroll request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BulkUnenrollRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub registration_ids: Vec<String>,
}

/// Admin registration update request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRegistrationRequest {
    pub status: Option<RegistrationStatus>,
    pub grade: Option<String>,
}

/// One successful item of a bulk operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSuccess {
    pub id: String,
    pub registration_id: Option<String>,
}

/// One failed item of a bulk operation, with a human-readable reason
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkFailure {
    pub id: String,
    pub reason: String,
}

/// Bulk operation outcome; always returned in full, never a single failure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome {
    pub message: String,
    pub successful: Vec<BulkSuccess>,
    pub errors: Vec<BulkFailure>,
    pub success_count: usize,
    pub error_count: usize,
}

impl BulkOutcome {
    pub fn new(message: &str, successful: Vec<BulkSuccess>, errors: Vec<BulkFailure>) -> Self {
        Self {
            message: message.to_string(),
            success_count: successful.len(),
            error_count: errors.len(),
            successful,
            errors,
        }
    }
}

/// Optional registration list filters
#[derive(Debug, Clone, Default)]
pub struct RegistrationFilter {
    pub status: Option<RegistrationStatus>,
    pub course_id: Option<String>,
    pub student_id: Option<String>,
}

/// Roster entry: a registration joined with its student's identity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub registration_id: String,
    pub student_id: String,
    pub student_code: String,
    pub first_name: String,
    pub last_name: String,
    pub status: RegistrationStatus,
    pub grade: Option<String>,
    pub registered_at: chrono::DateTime<chrono::Utc>,
}
