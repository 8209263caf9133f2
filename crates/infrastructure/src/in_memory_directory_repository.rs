use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use clearslip_application::{
    AccountRecord, AccountRepository, DepartmentRepository, FacultyRepository, StudentRepository,
};
use clearslip_core::{AppError, AppResult};
use clearslip_domain::{
    AccountId, Department, DepartmentId, FacultyId, FacultyMember, FacultyRole, Student,
    StudentId,
};
use tokio::sync::RwLock;

/// In-memory backing store for the student, faculty, department and portal
/// account directories, standing in for the reference system's
/// startup-loaded data set.
///
/// `replace_hod` takes the department and faculty locks together (always in
/// that order) so the demote/promote/repoint sequence is atomic.
#[derive(Debug, Default)]
pub struct InMemoryDirectoryRepository {
    students: RwLock<HashMap<StudentId, Student>>,
    faculty: RwLock<HashMap<FacultyId, FacultyMember>>,
    departments: RwLock<HashMap<DepartmentId, Department>>,
    accounts: RwLock<HashMap<AccountId, AccountRecord>>,
}

impl InMemoryDirectoryRepository {
    /// Creates an empty in-memory directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            students: RwLock::new(HashMap::new()),
            faculty: RwLock::new(HashMap::new()),
            departments: RwLock::new(HashMap::new()),
            accounts: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl StudentRepository for InMemoryDirectoryRepository {
    async fn create(&self, student: Student) -> AppResult<()> {
        let mut students = self.students.write().await;

        if students.contains_key(&student.id()) {
            return Err(AppError::Conflict(format!(
                "student '{}' already exists",
                student.id()
            )));
        }

        if students
            .values()
            .any(|existing| existing.email() == student.email())
        {
            return Err(AppError::Conflict(format!(
                "a student with email '{}' already exists",
                student.email().as_str()
            )));
        }

        students.insert(student.id(), student);
        Ok(())
    }

    async fn find(&self, student_id: StudentId) -> AppResult<Option<Student>> {
        Ok(self.students.read().await.get(&student_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Student>> {
        Ok(self
            .students
            .read()
            .await
            .values()
            .find(|student| student.email().as_str() == email.to_lowercase())
            .cloned())
    }

    async fn list(&self) -> AppResult<Vec<Student>> {
        let students = self.students.read().await;

        let mut values: Vec<Student> = students.values().cloned().collect();
        values.sort_by(|left, right| left.roll_no().as_str().cmp(right.roll_no().as_str()));

        Ok(values)
    }

    async fn save(&self, student: Student) -> AppResult<()> {
        let mut students = self.students.write().await;

        if !students.contains_key(&student.id()) {
            return Err(AppError::NotFound(format!(
                "student '{}' does not exist",
                student.id()
            )));
        }

        students.insert(student.id(), student);
        Ok(())
    }
}

#[async_trait]
impl FacultyRepository for InMemoryDirectoryRepository {
    async fn create(&self, member: FacultyMember) -> AppResult<()> {
        let mut faculty = self.faculty.write().await;

        if faculty.contains_key(&member.id()) {
            return Err(AppError::Conflict(format!(
                "faculty '{}' already exists",
                member.id()
            )));
        }

        if faculty
            .values()
            .any(|existing| existing.email() == member.email())
        {
            return Err(AppError::Conflict(format!(
                "a faculty member with email '{}' already exists",
                member.email().as_str()
            )));
        }

        faculty.insert(member.id(), member);
        Ok(())
    }

    async fn find(&self, faculty_id: FacultyId) -> AppResult<Option<FacultyMember>> {
        Ok(self.faculty.read().await.get(&faculty_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<FacultyMember>> {
        Ok(self
            .faculty
            .read()
            .await
            .values()
            .find(|member| member.email().as_str() == email.to_lowercase())
            .cloned())
    }

    async fn list(&self) -> AppResult<Vec<FacultyMember>> {
        let faculty = self.faculty.read().await;

        let mut values: Vec<FacultyMember> = faculty.values().cloned().collect();
        values.sort_by(|left, right| left.name().as_str().cmp(right.name().as_str()));

        Ok(values)
    }

    async fn save(&self, member: FacultyMember) -> AppResult<()> {
        let mut faculty = self.faculty.write().await;

        if !faculty.contains_key(&member.id()) {
            return Err(AppError::NotFound(format!(
                "faculty '{}' does not exist",
                member.id()
            )));
        }

        faculty.insert(member.id(), member);
        Ok(())
    }
}

#[async_trait]
impl DepartmentRepository for InMemoryDirectoryRepository {
    async fn create(&self, department: Department) -> AppResult<()> {
        let mut departments = self.departments.write().await;

        if departments.contains_key(department.dept_id()) {
            return Err(AppError::Conflict(format!(
                "department '{}' already exists",
                department.dept_id()
            )));
        }

        departments.insert(department.dept_id().clone(), department);
        Ok(())
    }

    async fn find(&self, dept_id: &DepartmentId) -> AppResult<Option<Department>> {
        Ok(self.departments.read().await.get(dept_id).cloned())
    }

    async fn list(&self) -> AppResult<Vec<Department>> {
        let departments = self.departments.read().await;

        let mut values: Vec<Department> = departments.values().cloned().collect();
        values.sort_by(|left, right| left.dept_id().as_str().cmp(right.dept_id().as_str()));

        Ok(values)
    }

    async fn replace_hod(
        &self,
        dept_id: &DepartmentId,
        new_hod: FacultyId,
    ) -> AppResult<Option<FacultyId>> {
        let mut departments = self.departments.write().await;
        let mut faculty = self.faculty.write().await;

        let department = departments.get_mut(dept_id).ok_or_else(|| {
            AppError::NotFound(format!("department '{dept_id}' does not exist"))
        })?;

        if !faculty.contains_key(&new_hod) {
            return Err(AppError::NotFound(format!(
                "faculty '{new_hod}' does not exist"
            )));
        }

        let prior = department.appoint_hod(new_hod);

        if let Some(prior_id) = prior
            && prior_id != new_hod
            && let Some(prior_member) = faculty.get_mut(&prior_id)
        {
            prior_member.revoke_role(FacultyRole::Hod);
        }

        if let Some(new_member) = faculty.get_mut(&new_hod) {
            new_member.grant_role(FacultyRole::Hod);
        }

        Ok(prior)
    }
}

#[async_trait]
impl AccountRepository for InMemoryDirectoryRepository {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<AccountRecord>> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|account| account.email == email.to_lowercase())
            .cloned())
    }

    async fn create(&self, account: AccountRecord) -> AppResult<()> {
        let mut accounts = self.accounts.write().await;

        if accounts
            .values()
            .any(|existing| existing.email == account.email)
        {
            return Err(AppError::Conflict(
                "an account with this email already exists".to_owned(),
            ));
        }

        accounts.insert(account.id, account);
        Ok(())
    }

    async fn record_failed_login(&self, account_id: AccountId) -> AppResult<()> {
        let mut accounts = self.accounts.write().await;

        let Some(account) = accounts.get_mut(&account_id) else {
            return Ok(());
        };

        account.failed_login_count += 1;
        account.locked_until = lockout_until(account.failed_login_count);

        Ok(())
    }

    async fn reset_failed_logins(&self, account_id: AccountId) -> AppResult<()> {
        let mut accounts = self.accounts.write().await;

        if let Some(account) = accounts.get_mut(&account_id) {
            account.failed_login_count = 0;
            account.locked_until = None;
        }

        Ok(())
    }
}

/// Exponential lockout: 2^(n-3) seconds from the 3rd consecutive failure,
/// 24 hours from the 10th. Matches the PostgreSQL adapter.
fn lockout_until(failed_login_count: i32) -> Option<chrono::DateTime<Utc>> {
    if failed_login_count >= 10 {
        Some(Utc::now() + Duration::hours(24))
    } else if failed_login_count >= 3 {
        let exponent = (failed_login_count - 3).min(10) as u32;
        Some(Utc::now() + Duration::seconds(2_i64.pow(exponent)))
    } else {
        None
    }
}
