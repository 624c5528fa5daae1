use crate::{
    courses::{CourseFilter, CreateCourseRequest, UpdateCourseRequest},
    db::models::{Course, CourseStatus},
    error::{ApiError, ApiResult},
    pagination::{Paginated, Pagination},
};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

const COURSE_COLUMNS: &str = "id, course_code, name, description, duration_weeks, instructor, \
     department, semester, year, credits, max_students, status, created_at";

/// Course offering manager
pub struct CourseManager {
    db: SqlitePool,
}

impl CourseManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create a course offering
    pub async fn create(&self, req: CreateCourseRequest) -> ApiResult<Course> {
        let existing: Option<(String,)> =
            sqlx::query_as("SELECT id FROM courses WHERE course_code = ?1")
                .bind(&req.course_code)
                .fetch_optional(&self.db)
                .await?;
        if existing.is_some() {
            return Err(ApiError::Conflict(format!(
                "Course code {} already exists",
                req.course_code
            )));
        }

        let course = Course {
            id: Uuid::new_v4().to_string(),
            course_code: req.course_code,
            name: req.name,
            description: req.description,
            duration_weeks: req.duration_weeks,
            instructor: req.instructor,
            department: req.department,
            semester: req.semester,
            year: req.year,
            credits: req.credits.unwrap_or(3),
            max_students: req.max_students.unwrap_or(30),
            status: req.status.unwrap_or(CourseStatus::Active),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO courses (id, course_code, name, description, duration_weeks, instructor,
                                  department, semester, year, credits, max_students, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )
        .bind(&course.id)
        .bind(&course.course_code)
        .bind(&course.name)
        .bind(&course.description)
        .bind(course.duration_weeks)
        .bind(&course.instructor)
        .bind(&course.department)
        .bind(&course.semester)
        .bind(course.year)
        .bind(course.credits)
        .bind(course.max_students)
        .bind(course.status)
        .bind(course.created_at)
        .execute(&self.db)
        .await?;

        tracing::info!("created course {} ({})", course.course_code, course.id);
        Ok(course)
    }

    /// Fetch a course by id
    pub async fn get(&self, id: &str) -> ApiResult<Course> {
        sqlx::query_as::<_, Course>(&format!(
            "SELECT {} FROM courses WHERE id = ?1",
            COURSE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))
    }

    /// Apply a partial update
    pub async fn update(&self, id: &str, req: UpdateCourseRequest) -> ApiResult<Course> {
        let current = self.get(id).await?;

        let updated = Course {
            id: current.id,
            course_code: current.course_code,
            name: req.name.unwrap_or(current.name),
            description: req.description.or(current.description),
            duration_weeks: req.duration_weeks.or(current.duration_weeks),
            instructor: req.instructor.or(current.instructor),
            department: req.department.or(current.department),
            semester: req.semester.or(current.semester),
            year: req.year.or(current.year),
            credits: req.credits.unwrap_or(current.credits),
            max_students: req.max_students.unwrap_or(current.max_students),
            status: req.status.unwrap_or(current.status),
            created_at: current.created_at,
        };

        sqlx::query(
            "UPDATE courses SET name = ?1, description = ?2, duration_weeks = ?3, instructor = ?4,
                                department = ?5, semester = ?6, year = ?7, credits = ?8,
                                max_students = ?9, status = ?10
             WHERE id = ?11",
        )
        .bind(&updated.name)
        .bind(&updated.description)
        .bind(updated.duration_weeks)
        .bind(&updated.instructor)
        .bind(&updated.department)
        .bind(&updated.semester)
        .bind(updated.year)
        .bind(updated.credits)
        .bind(updated.max_students)
        .bind(updated.status)
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(updated)
    }

    /// Delete a course, refused while enrolled registrations reference it
    ///
    /// The enrolled count is re-queried here rather than taken from any
    /// earlier read.
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        // Existence check first so a missing course is NotFound, not InvalidState
        self.get(id).await?;

        let (enrolled,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM registrations WHERE course_id = ?1 AND status = 'enrolled'",
        )
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        if enrolled > 0 {
            return Err(ApiError::InvalidState(format!(
                "Course has {} active enrollments",
                enrolled
            )));
        }

        sqlx::query("DELETE FROM courses WHERE id = ?1")
            .bind(id)
            .execute(&self.db)
            .await?;

        tracing::info!("deleted course {}", id);
        Ok(())
    }

    /// Paginated, filtered course list
    pub async fn list(
        &self,
        filter: &CourseFilter,
        pagination: Pagination,
    ) -> ApiResult<Paginated<Course>> {
        let mut count_query =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM courses WHERE 1=1");
        Self::apply_filters(&mut count_query, filter);
        let (total_count,): (i64,) = count_query
            .build_query_as()
            .fetch_one(&self.db)
            .await?;

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM courses WHERE 1=1",
            COURSE_COLUMNS
        ));
        Self::apply_filters(&mut query, filter);
        query.push(" ORDER BY course_code LIMIT ");
        query.push_bind(pagination.limit);
        query.push(" OFFSET ");
        query.push_bind(pagination.offset());

        let courses = query
            .build_query_as::<Course>()
            .fetch_all(&self.db)
            .await?;

        Ok(Paginated::new(courses, pagination, total_count))
    }

    /// Each present filter contributes one ANDed predicate with bound
    /// parameters; filter text never reaches the SQL string itself.
    fn apply_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &CourseFilter) {
        if let Some(search) = &filter.search {
            let pattern = format!("%{}%", search);
            query.push(" AND (course_code LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR name LIKE ");
            query.push_bind(pattern);
            query.push(")");
        }
        if let Some(department) = &filter.department {
            query.push(" AND department = ");
            query.push_bind(department.clone());
        }
        if let Some(semester) = &filter.semester {
            query.push(" AND semester = ");
            query.push_bind(semester.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> CourseManager {
        let db = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        crate::db::run_migrations(&db).await.unwrap();
        CourseManager::new(db)
    }

    fn course_request(code: &str) -> CreateCourseRequest {
        CreateCourseRequest {
            course_code: code.to_string(),
            name: format!("Course {}", code),
            description: None,
            duration_weeks: None,
            instructor: None,
            department: None,
            semester: None,
            year: None,
            credits: None,
            max_students: None,
            status: None,
        }
    }

    async fn insert_registration(db: &SqlitePool, course_id: &str, status: &str) {
        sqlx::query(
            "INSERT INTO students (id, student_code, first_name, last_name, email, enrolled_at, status)
             VALUES (?1, ?2, 'Ada', 'Lovelace', ?3, ?4, 'active')",
        )
        .bind(format!("s-{}", status))
        .bind(format!("STU-{}", status))
        .bind(format!("{}@example.edu", status))
        .bind(Utc::now())
        .execute(db)
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO registrations (id, student_id, course_id, registered_at, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(format!("s-{}", status))
        .bind(course_id)
        .bind(Utc::now())
        .bind(status)
        .execute(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_create_applies_defaults() {
        let manager = setup().await;
        let course = manager.create(course_request("CS101")).await.unwrap();

        assert_eq!(course.credits, 3);
        assert_eq!(course.max_students, 30);
        assert_eq!(course.status, CourseStatus::Active);
    }

    #[tokio::test]
    async fn test_duplicate_course_code_conflict() {
        let manager = setup().await;
        manager.create(course_request("CS101")).await.unwrap();

        let err = manager.create(course_request("CS101")).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_partial_update_preserves_fields() {
        let manager = setup().await;
        let course = manager.create(course_request("CS101")).await.unwrap();

        let updated = manager
            .update(
                &course.id,
                UpdateCourseRequest {
                    name: Some("Systems Programming".to_string()),
                    description: None,
                    duration_weeks: None,
                    instructor: None,
                    department: None,
                    semester: None,
                    year: None,
                    credits: None,
                    max_students: Some(5),
                    status: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Systems Programming");
        assert_eq!(updated.max_students, 5);
        assert_eq!(updated.course_code, "CS101");
        assert_eq!(updated.credits, 3);
    }

    #[tokio::test]
    async fn test_delete_refused_with_enrolled_registration() {
        let manager = setup().await;
        let course = manager.create(course_request("CS101")).await.unwrap();
        insert_registration(&manager.db, &course.id, "enrolled").await;

        let err = manager.delete(&course.id).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_delete_allowed_with_only_dropped_registrations() {
        let manager = setup().await;
        let course = manager.create(course_request("CS101")).await.unwrap();
        insert_registration(&manager.db, &course.id, "dropped").await;

        manager.delete(&course.id).await.unwrap();
        assert!(matches!(
            manager.get(&course.id).await.unwrap_err(),
            ApiError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_course_not_found() {
        let manager = setup().await;
        let err = manager.delete("nope").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_filters_and_pagination() {
        let manager = setup().await;
        for i in 0..15 {
            let mut req = course_request(&format!("CS{:03}", i));
            req.department = Some(if i % 2 == 0 { "CS" } else { "MATH" }.to_string());
            manager.create(req).await.unwrap();
        }

        let filter = CourseFilter {
            department: Some("CS".to_string()),
            ..Default::default()
        };
        let page = manager
            .list(&filter, Pagination { page: 1, limit: 5 })
            .await
            .unwrap();

        assert_eq!(page.total_count, 8);
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.total_pages, 2);
        assert!(page.has_next);
        assert!(!page.has_prev);

        let page2 = manager
            .list(&filter, Pagination { page: 2, limit: 5 })
            .await
            .unwrap();
        assert_eq!(page2.items.len(), 3);
        assert!(!page2.has_next);
        assert!(page2.has_prev);
    }

    #[tokio::test]
    async fn test_list_free_text_search() {
        let manager = setup().await;
        let mut req = course_request("CS101");
        req.name = "Intro to Databases".to_string();
        manager.create(req).await.unwrap();
        manager.create(course_request("MA200")).await.unwrap();

        let filter = CourseFilter {
            search: Some("Databases".to_string()),
            ..Default::default()
        };
        let page = manager
            .list(&filter, Pagination { page: 1, limit: 10 })
            .await
            .unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0].course_code, "CS101");
    }
}
