//! PostgreSQL-backed student, faculty, department and account directories.

use async_trait::async_trait;
use sqlx::PgPool;

use clearslip_application::{
    AccountRecord, AccountRepository, DepartmentRepository, FacultyRepository, StudentRepository,
};
use clearslip_core::{AppError, AppResult, PortalRole};
use clearslip_domain::{
    AccountId, Department, DepartmentId, FacultyId, FacultyMember, Student, StudentId,
};

/// PostgreSQL implementation of the directory repository ports.
///
/// Student and faculty aggregates round-trip whole as JSONB profiles, with
/// the lookup keys (email, roll number, name) mirrored into columns.
#[derive(Clone)]
pub struct PostgresDirectoryRepository {
    pool: PgPool,
}

impl PostgresDirectoryRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    profile: serde_json::Value,
}

impl ProfileRow {
    fn into_student(self) -> AppResult<Student> {
        serde_json::from_value(self.profile).map_err(|error| {
            AppError::Internal(format!("failed to decode student profile: {error}"))
        })
    }

    fn into_faculty(self) -> AppResult<FacultyMember> {
        serde_json::from_value(self.profile).map_err(|error| {
            AppError::Internal(format!("failed to decode faculty profile: {error}"))
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DepartmentRow {
    dept_id: String,
    dept_name: String,
    hod_id: Option<uuid::Uuid>,
}

impl DepartmentRow {
    fn into_department(self) -> AppResult<Department> {
        let mut department =
            Department::new(DepartmentId::new(self.dept_id)?, self.dept_name)?;
        if let Some(hod_id) = self.hod_id {
            department.appoint_hod(FacultyId::from_uuid(hod_id));
        }

        Ok(department)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: uuid::Uuid,
    email: String,
    display_name: String,
    role: String,
    password_hash: String,
    failed_login_count: i32,
    locked_until: Option<chrono::DateTime<chrono::Utc>>,
}

impl AccountRow {
    fn into_account(self) -> AppResult<AccountRecord> {
        Ok(AccountRecord {
            id: AccountId::from_uuid(self.id),
            email: self.email,
            display_name: self.display_name,
            role: self.role.parse::<PortalRole>()?,
            password_hash: self.password_hash,
            failed_login_count: self.failed_login_count,
            locked_until: self.locked_until,
        })
    }
}

mod accounts;
mod departments;
mod faculty;
mod students;

#[async_trait]
impl StudentRepository for PostgresDirectoryRepository {
    async fn create(&self, student: Student) -> AppResult<()> {
        self.create_student_impl(student).await
    }

    async fn find(&self, student_id: StudentId) -> AppResult<Option<Student>> {
        self.find_student_impl(student_id).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Student>> {
        self.find_student_by_email_impl(email).await
    }

    async fn list(&self) -> AppResult<Vec<Student>> {
        self.list_students_impl().await
    }

    async fn save(&self, student: Student) -> AppResult<()> {
        self.save_student_impl(student).await
    }
}

#[async_trait]
impl FacultyRepository for PostgresDirectoryRepository {
    async fn create(&self, member: FacultyMember) -> AppResult<()> {
        self.create_faculty_impl(member).await
    }

    async fn find(&self, faculty_id: FacultyId) -> AppResult<Option<FacultyMember>> {
        self.find_faculty_impl(faculty_id).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<FacultyMember>> {
        self.find_faculty_by_email_impl(email).await
    }

    async fn list(&self) -> AppResult<Vec<FacultyMember>> {
        self.list_faculty_impl().await
    }

    async fn save(&self, member: FacultyMember) -> AppResult<()> {
        self.save_faculty_impl(member).await
    }
}

#[async_trait]
impl DepartmentRepository for PostgresDirectoryRepository {
    async fn create(&self, department: Department) -> AppResult<()> {
        self.create_department_impl(department).await
    }

    async fn find(&self, dept_id: &DepartmentId) -> AppResult<Option<Department>> {
        self.find_department_impl(dept_id).await
    }

    async fn list(&self) -> AppResult<Vec<Department>> {
        self.list_departments_impl().await
    }

    async fn replace_hod(
        &self,
        dept_id: &DepartmentId,
        new_hod: FacultyId,
    ) -> AppResult<Option<FacultyId>> {
        self.replace_hod_impl(dept_id, new_hod).await
    }
}

#[async_trait]
impl AccountRepository for PostgresDirectoryRepository {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<AccountRecord>> {
        self.find_account_by_email_impl(email).await
    }

    async fn create(&self, account: AccountRecord) -> AppResult<()> {
        self.create_account_impl(account).await
    }

    async fn record_failed_login(&self, account_id: AccountId) -> AppResult<()> {
        self.record_failed_login_impl(account_id).await
    }

    async fn reset_failed_logins(&self, account_id: AccountId) -> AppResult<()> {
        self.reset_failed_logins_impl(account_id).await
    }
}

fn email_conflict_or_internal(error: sqlx::Error, operation: &str) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict("an entry with this email already exists".to_owned());
    }

    AppError::Internal(format!("failed to {operation}: {error}"))
}
