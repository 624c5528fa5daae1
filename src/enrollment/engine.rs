use crate::{
    db::models::{Registration, RegistrationStatus},
    enrollment::{
        BulkFailure, BulkOutcome, BulkSuccess, RegistrationFilter, RosterEntry,
        UpdateRegistrationRequest,
    },
    error::{ApiError, ApiResult},
    pagination::{Paginated, Pagination},
};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

const REGISTRATION_COLUMNS: &str =
    "id, student_id, course_id, registered_at, status, grade";

/// Enrollment engine
///
/// Every enroll attempt runs its precondition checks and the insert inside
/// one transaction, so the capacity count read and the row write cannot be
/// split by a concurrent writer. The UNIQUE(student_id, course_id) index
/// backs the duplicate check for writers racing past it.
pub struct EnrollmentEngine {
    db: SqlitePool,
}

impl EnrollmentEngine {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Admit a student into a course
    ///
    /// Precondition order: student exists, course exists, course active, no
    /// prior registration for the pair in any status, enrolled count below
    /// capacity. Each failure rolls the transaction back with no side
    /// effects.
    pub async fn enroll(&self, student_id: &str, course_id: &str) -> ApiResult<Registration> {
        let mut tx = self.db.begin().await?;

        match Self::enroll_in_tx(&mut tx, student_id, course_id).await {
            Ok(registration) => {
                tx.commit().await?;
                tracing::info!(
                    "enrolled student {} in course {} ({})",
                    student_id,
                    course_id,
                    registration.id
                );
                Ok(registration)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    async fn enroll_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        student_id: &str,
        course_id: &str,
    ) -> ApiResult<Registration> {
        let student: Option<(String,)> =
            sqlx::query_as("SELECT id FROM students WHERE id = ?1")
                .bind(student_id)
                .fetch_optional(&mut **tx)
                .await?;
        if student.is_none() {
            return Err(ApiError::NotFound("Student not found".to_string()));
        }

        let course: Option<(String, i64)> =
            sqlx::query_as("SELECT status, max_students FROM courses WHERE id = ?1")
                .bind(course_id)
                .fetch_optional(&mut **tx)
                .await?;
        let (status, max_students) = match course {
            Some(row) => row,
            None => return Err(ApiError::NotFound("Course not found".to_string())),
        };

        if status != "active" {
            return Err(ApiError::InvalidState(
                "Course is not available for registration".to_string(),
            ));
        }

        // Any prior registration blocks re-creation, dropped ones included
        let existing: Option<(String,)> = sqlx::query_as(
            "SELECT id FROM registrations WHERE student_id = ?1 AND course_id = ?2",
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_optional(&mut **tx)
        .await?;
        if existing.is_some() {
            return Err(ApiError::Conflict(
                "Student is already registered for this course".to_string(),
            ));
        }

        let (enrolled,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM registrations WHERE course_id = ?1 AND status = 'enrolled'",
        )
        .bind(course_id)
        .fetch_one(&mut **tx)
        .await?;
        if enrolled >= max_students {
            return Err(ApiError::CapacityExceeded("Course is full".to_string()));
        }

        let registration = Registration {
            id: Uuid::new_v4().to_string(),
            student_id: student_id.to_string(),
            course_id: course_id.to_string(),
            registered_at: Utc::now(),
            status: RegistrationStatus::Enrolled,
            grade: None,
        };

        sqlx::query(
            "INSERT INTO registrations (id, student_id, course_id, registered_at, status, grade)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&registration.id)
        .bind(&registration.student_id)
        .bind(&registration.course_id)
        .bind(registration.registered_at)
        .bind(registration.status)
        .bind(&registration.grade)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            // A racing writer that slipped past the duplicate check trips the
            // unique index instead
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                ApiError::Conflict("Student is already registered for this course".to_string())
            } else {
                ApiError::Database(e)
            }
        })?;

        Ok(registration)
    }

    /// Fetch a registration by id
    pub async fn get(&self, id: &str) -> ApiResult<Registration> {
        sqlx::query_as::<_, Registration>(&format!(
            "SELECT {} FROM registrations WHERE id = ?1",
            REGISTRATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Registration not found".to_string()))
    }

    /// Student drop: marks the registration dropped, keeping the row so the
    /// pair can never be re-registered
    pub async fn drop_own(
        &self,
        registration_id: &str,
        student_id: &str,
    ) -> ApiResult<Registration> {
        let registration = self.get(registration_id).await?;

        if registration.student_id != student_id {
            return Err(ApiError::Authorization(
                "Registration belongs to another student".to_string(),
            ));
        }

        sqlx::query("UPDATE registrations SET status = 'dropped' WHERE id = ?1")
            .bind(registration_id)
            .execute(&self.db)
            .await?;

        tracing::info!("student {} dropped registration {}", student_id, registration_id);
        Ok(Registration {
            status: RegistrationStatus::Dropped,
            ..registration
        })
    }

    /// Admin delete: removes the row entirely, bypassing drop semantics
    pub async fn delete(&self, registration_id: &str) -> ApiResult<()> {
        let result = sqlx::query("DELETE FROM registrations WHERE id = ?1")
            .bind(registration_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Registration not found".to_string()));
        }

        tracing::info!("deleted registration {}", registration_id);
        Ok(())
    }

    /// Admin update of status and grade
    ///
    /// Moving a registration back to `enrolled` re-checks capacity in the
    /// same transaction, so the capacity invariant survives admin edits.
    pub async fn update(
        &self,
        registration_id: &str,
        req: UpdateRegistrationRequest,
    ) -> ApiResult<Registration> {
        let mut tx = self.db.begin().await?;

        let result = Self::update_in_tx(&mut tx, registration_id, req).await;
        match result {
            Ok(registration) => {
                tx.commit().await?;
                Ok(registration)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    async fn update_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        registration_id: &str,
        req: UpdateRegistrationRequest,
    ) -> ApiResult<Registration> {
        let current: Option<Registration> = sqlx::query_as(&format!(
            "SELECT {} FROM registrations WHERE id = ?1",
            REGISTRATION_COLUMNS
        ))
        .bind(registration_id)
        .fetch_optional(&mut **tx)
        .await?;
        let current =
            current.ok_or_else(|| ApiError::NotFound("Registration not found".to_string()))?;

        let new_status = req.status.unwrap_or(current.status);
        let new_grade = req.grade.or(current.grade.clone());

        if new_status == RegistrationStatus::Enrolled
            && current.status != RegistrationStatus::Enrolled
        {
            let (max_students,): (i64,) =
                sqlx::query_as("SELECT max_students FROM courses WHERE id = ?1")
                    .bind(&current.course_id)
                    .fetch_one(&mut **tx)
                    .await?;
            let (enrolled,): (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM registrations WHERE course_id = ?1 AND status = 'enrolled'",
            )
            .bind(&current.course_id)
            .fetch_one(&mut **tx)
            .await?;
            if enrolled >= max_students {
                return Err(ApiError::CapacityExceeded("Course is full".to_string()));
            }
        }

        sqlx::query("UPDATE registrations SET status = ?1, grade = ?2 WHERE id = ?3")
            .bind(new_status)
            .bind(&new_grade)
            .bind(registration_id)
            .execute(&mut **tx)
            .await?;

        Ok(Registration {
            status: new_status,
            grade: new_grade,
            ..current
        })
    }

    /// Bulk enroll: each course evaluated independently in its own
    /// transaction; one failure never rolls back the others
    pub async fn bulk_enroll(
        &self,
        student_id: &str,
        course_ids: &[String],
    ) -> ApiResult<BulkOutcome> {
        // Missing student fails the whole call, not per item
        let student: Option<(String,)> =
            sqlx::query_as("SELECT id FROM students WHERE id = ?1")
                .bind(student_id)
                .fetch_optional(&self.db)
                .await?;
        if student.is_none() {
            return Err(ApiError::NotFound("Student not found".to_string()));
        }

        let mut successful = Vec::new();
        let mut errors = Vec::new();

        for course_id in course_ids {
            match self.enroll(student_id, course_id).await {
                Ok(registration) => successful.push(BulkSuccess {
                    id: course_id.clone(),
                    registration_id: Some(registration.id),
                }),
                Err(e) => errors.push(BulkFailure {
                    id: course_id.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        Ok(BulkOutcome::new(
            "Bulk enrollment processed",
            successful,
            errors,
        ))
    }

    /// Bulk unenroll: the admin path, removing each named registration if it
    /// belongs to the student; per-item accumulation as bulk_enroll
    pub async fn bulk_unenroll(
        &self,
        student_id: &str,
        registration_ids: &[String],
    ) -> ApiResult<BulkOutcome> {
        let student: Option<(String,)> =
            sqlx::query_as("SELECT id FROM students WHERE id = ?1")
                .bind(student_id)
                .fetch_optional(&self.db)
                .await?;
        if student.is_none() {
            return Err(ApiError::NotFound("Student not found".to_string()));
        }

        let mut successful = Vec::new();
        let mut errors = Vec::new();

        for registration_id in registration_ids {
            let outcome = match self.get(registration_id).await {
                Ok(registration) if registration.student_id != student_id => Err(
                    ApiError::Authorization("Registration belongs to another student".to_string()),
                ),
                Ok(_) => self.delete(registration_id).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => successful.push(BulkSuccess {
                    id: registration_id.clone(),
                    registration_id: None,
                }),
                Err(e) => errors.push(BulkFailure {
                    id: registration_id.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        Ok(BulkOutcome::new(
            "Bulk unenrollment processed",
            successful,
            errors,
        ))
    }

    /// Paginated, filtered registration list
    pub async fn list(
        &self,
        filter: &RegistrationFilter,
        pagination: Pagination,
    ) -> ApiResult<Paginated<Registration>> {
        let mut count_query =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM registrations WHERE 1=1");
        Self::apply_filters(&mut count_query, filter);
        let (total_count,): (i64,) = count_query
            .build_query_as()
            .fetch_one(&self.db)
            .await?;

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM registrations WHERE 1=1",
            REGISTRATION_COLUMNS
        ));
        Self::apply_filters(&mut query, filter);
        query.push(" ORDER BY registered_at DESC LIMIT ");
        query.push_bind(pagination.limit);
        query.push(" OFFSET ");
        query.push_bind(pagination.offset());

        let registrations = query
            .build_query_as::<Registration>()
            .fetch_all(&self.db)
            .await?;

        Ok(Paginated::new(registrations, pagination, total_count))
    }

    fn apply_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &RegistrationFilter) {
        if let Some(status) = filter.status {
            query.push(" AND status = ");
            query.push_bind(status);
        }
        if let Some(course_id) = &filter.course_id {
            query.push(" AND course_id = ");
            query.push_bind(course_id.clone());
        }
        if let Some(student_id) = &filter.student_id {
            query.push(" AND student_id = ");
            query.push_bind(student_id.clone());
        }
    }

    /// Course roster: registrations joined with student identity
    pub async fn roster(&self, course_id: &str) -> ApiResult<Vec<RosterEntry>> {
        let course: Option<(String,)> =
            sqlx::query_as("SELECT id FROM courses WHERE id = ?1")
                .bind(course_id)
                .fetch_optional(&self.db)
                .await?;
        if course.is_none() {
            return Err(ApiError::NotFound("Course not found".to_string()));
        }

        let entries = sqlx::query_as::<_, RosterEntry>(
            "SELECT r.id AS registration_id, s.id AS student_id, s.student_code,
                    s.first_name, s.last_name, r.status, r.grade, r.registered_at
             FROM registrations r
             JOIN students s ON s.id = r.student_id
             WHERE r.course_id = ?1
             ORDER BY s.last_name, s.first_name",
        )
        .bind(course_id)
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }
}
