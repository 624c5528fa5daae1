/// Database models and status enums
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Student => "student",
        }
    }
}

/// Student record lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum StudentStatus {
    Active,
    Inactive,
    Suspended,
    Graduated,
}

/// Course offering status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum CourseStatus {
    Active,
    Inactive,
    Archived,
}

/// Registration status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Enrolled,
    Dropped,
    Completed,
}

impl RegistrationStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "enrolled" => Some(RegistrationStatus::Enrolled),
            "dropped" => Some(RegistrationStatus::Dropped),
            "completed" => Some(RegistrationStatus::Completed),
            _ => None,
        }
    }
}

/// Login account record
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Student record
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub account_id: Option<String>,
    pub student_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub enrolled_at: DateTime<Utc>,
    pub status: StudentStatus,
}

/// Course offering record
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub course_code: String,
    pub name: String,
    pub description: Option<String>,
    pub duration_weeks: Option<i64>,
    pub instructor: Option<String>,
    pub department: Option<String>,
    pub semester: Option<String>,
    pub year: Option<i64>,
    pub credits: i64,
    pub max_students: i64,
    pub status: CourseStatus,
    pub created_at: DateTime<Utc>,
}

/// Registration record joining a student to a course
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: String,
    pub student_id: String,
    pub course_id: String,
    pub registered_at: DateTime<Utc>,
    pub status: RegistrationStatus,
    pub grade: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::Student.as_str(), "student");
    }

    #[test]
    fn test_registration_status_parse() {
        assert_eq!(
            RegistrationStatus::parse("enrolled"),
            Some(RegistrationStatus::Enrolled)
        );
        assert_eq!(RegistrationStatus::parse("deleted"), None);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let account = Account {
            id: "a1".to_string(),
            email: "student@example.edu".to_string(),
            password_hash: "secret-hash".to_string(),
            role: Role::Student,
            is_active: true,
            locked_until: None,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&account).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("student@example.edu"));
    }
}
