use crate::{
    account::AccountManager,
    db::models::{Role, Student, StudentStatus},
    error::{ApiError, ApiResult},
    pagination::{Paginated, Pagination},
    students::{CreateStudentRequest, SelfUpdateRequest, StudentFilter, UpdateStudentRequest},
};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

const STUDENT_COLUMNS: &str = "id, account_id, student_code, first_name, last_name, email, phone, \
     date_of_birth, gender, address, enrolled_at, status";

/// Student record manager
pub struct StudentManager {
    db: SqlitePool,
    accounts: Arc<AccountManager>,
}

impl StudentManager {
    pub fn new(db: SqlitePool, accounts: Arc<AccountManager>) -> Self {
        Self { db, accounts }
    }

    /// Create a student record
    ///
    /// The student-code and email uniqueness checks, the optional login
    /// account, and the insert run in one transaction so two concurrent
    /// creates cannot both pass the checks and both commit.
    pub async fn create(&self, req: CreateStudentRequest) -> ApiResult<Student> {
        let mut tx = self.db.begin().await?;

        let result = self.create_in_tx(&mut tx, req).await;
        match result {
            Ok(student) => {
                tx.commit().await?;
                tracing::info!("created student {} ({})", student.student_code, student.id);
                Ok(student)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    async fn create_in_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        req: CreateStudentRequest,
    ) -> ApiResult<Student> {
        let code_taken: Option<(String,)> =
            sqlx::query_as("SELECT id FROM students WHERE student_code = ?1")
                .bind(&req.student_code)
                .fetch_optional(&mut **tx)
                .await?;
        if code_taken.is_some() {
            return Err(ApiError::Conflict(format!(
                "Student code {} already exists",
                req.student_code
            )));
        }

        let email_taken: Option<(String,)> =
            sqlx::query_as("SELECT id FROM students WHERE email = ?1")
                .bind(&req.email)
                .fetch_optional(&mut **tx)
                .await?;
        if email_taken.is_some() {
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }

        // Optional unified account creation, same transaction
        let account_id = match &req.password {
            Some(password) => {
                let account = self
                    .accounts
                    .create_in_tx(tx, &req.email, password, Role::Student)
                    .await?;
                Some(account.id)
            }
            None => None,
        };

        let student = Student {
            id: Uuid::new_v4().to_string(),
            account_id,
            student_code: req.student_code,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            phone: req.phone,
            date_of_birth: req.date_of_birth,
            gender: req.gender,
            address: req.address,
            enrolled_at: Utc::now(),
            status: req.status.unwrap_or(StudentStatus::Active),
        };

        sqlx::query(
            "INSERT INTO students (id, account_id, student_code, first_name, last_name, email,
                                   phone, date_of_birth, gender, address, enrolled_at, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&student.id)
        .bind(&student.account_id)
        .bind(&student.student_code)
        .bind(&student.first_name)
        .bind(&student.last_name)
        .bind(&student.email)
        .bind(&student.phone)
        .bind(student.date_of_birth)
        .bind(&student.gender)
        .bind(&student.address)
        .bind(student.enrolled_at)
        .bind(student.status)
        .execute(&mut **tx)
        .await?;

        Ok(student)
    }

    /// Fetch a student by id
    pub async fn get(&self, id: &str) -> ApiResult<Student> {
        sqlx::query_as::<_, Student>(&format!(
            "SELECT {} FROM students WHERE id = ?1",
            STUDENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))
    }

    /// Fetch the student record owned by an account (self-service lookup)
    pub async fn get_by_account(&self, account_id: &str) -> ApiResult<Student> {
        sqlx::query_as::<_, Student>(&format!(
            "SELECT {} FROM students WHERE account_id = ?1",
            STUDENT_COLUMNS
        ))
        .bind(account_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("No student record linked to this account".to_string())
        })
    }

    /// Admin update, any field
    pub async fn update(&self, id: &str, req: UpdateStudentRequest) -> ApiResult<Student> {
        let current = self.get(id).await?;

        let updated = Student {
            id: current.id,
            account_id: current.account_id,
            student_code: current.student_code,
            first_name: req.first_name.unwrap_or(current.first_name),
            last_name: req.last_name.unwrap_or(current.last_name),
            email: current.email,
            phone: req.phone.or(current.phone),
            date_of_birth: req.date_of_birth.or(current.date_of_birth),
            gender: req.gender.or(current.gender),
            address: req.address.or(current.address),
            enrolled_at: current.enrolled_at,
            status: req.status.unwrap_or(current.status),
        };

        self.persist(&updated).await?;
        Ok(updated)
    }

    /// Student self-service update, contact fields only
    pub async fn update_self(&self, id: &str, req: SelfUpdateRequest) -> ApiResult<Student> {
        let current = self.get(id).await?;

        let updated = Student {
            phone: req.phone.or(current.phone.clone()),
            address: req.address.or(current.address.clone()),
            ..current
        };

        self.persist(&updated).await?;
        Ok(updated)
    }

    async fn persist(&self, student: &Student) -> ApiResult<()> {
        sqlx::query(
            "UPDATE students SET first_name = ?1, last_name = ?2, phone = ?3, date_of_birth = ?4,
                                 gender = ?5, address = ?6, status = ?7
             WHERE id = ?8",
        )
        .bind(&student.first_name)
        .bind(&student.last_name)
        .bind(&student.phone)
        .bind(student.date_of_birth)
        .bind(&student.gender)
        .bind(&student.address)
        .bind(student.status)
        .bind(&student.id)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    /// Delete a student; registrations cascade via the schema
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        let result = sqlx::query("DELETE FROM students WHERE id = ?1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Student not found".to_string()));
        }

        tracing::info!("deleted student {}", id);
        Ok(())
    }

    /// Paginated, filtered student list
    pub async fn list(
        &self,
        filter: &StudentFilter,
        pagination: Pagination,
    ) -> ApiResult<Paginated<Student>> {
        let mut count_query =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM students WHERE 1=1");
        Self::apply_filters(&mut count_query, filter);
        let (total_count,): (i64,) = count_query
            .build_query_as()
            .fetch_one(&self.db)
            .await?;

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM students WHERE 1=1",
            STUDENT_COLUMNS
        ));
        Self::apply_filters(&mut query, filter);
        query.push(" ORDER BY student_code LIMIT ");
        query.push_bind(pagination.limit);
        query.push(" OFFSET ");
        query.push_bind(pagination.offset());

        let students = query
            .build_query_as::<Student>()
            .fetch_all(&self.db)
            .await?;

        Ok(Paginated::new(students, pagination, total_count))
    }

    fn apply_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &StudentFilter) {
        if let Some(search) = &filter.search {
            let pattern = format!("%{}%", search);
            query.push(" AND (student_code LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR first_name LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR last_name LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR email LIKE ");
            query.push_bind(pattern);
            query.push(")");
        }
        if let Some(course) = &filter.course {
            query.push(
                " AND EXISTS (SELECT 1 FROM registrations r JOIN courses c ON c.id = r.course_id \
                 WHERE r.student_id = students.id AND c.name LIKE ",
            );
            query.push_bind(format!("%{}%", course));
            query.push(")");
        }
    }
}
