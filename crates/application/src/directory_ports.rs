//! Repository ports for the student, faculty and department directories.

use async_trait::async_trait;
use clearslip_core::AppResult;
use clearslip_domain::{
    Department, DepartmentId, FacultyId, FacultyMember, Student, StudentId,
};

/// Repository port for student directory entries.
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Inserts a new student. Conflict on duplicate id or email.
    async fn create(&self, student: Student) -> AppResult<()>;

    /// Returns one student by identifier.
    async fn find(&self, student_id: StudentId) -> AppResult<Option<Student>>;

    /// Returns one student by login email.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Student>>;

    /// Lists every student, ordered by roll number.
    async fn list(&self) -> AppResult<Vec<Student>>;

    /// Persists roster mutations to an existing student.
    async fn save(&self, student: Student) -> AppResult<()>;
}

/// Repository port for faculty directory entries.
#[async_trait]
pub trait FacultyRepository: Send + Sync {
    /// Inserts a new faculty member. Conflict on duplicate id or email.
    async fn create(&self, member: FacultyMember) -> AppResult<()>;

    /// Returns one member by identifier.
    async fn find(&self, faculty_id: FacultyId) -> AppResult<Option<FacultyMember>>;

    /// Returns one member by login email.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<FacultyMember>>;

    /// Lists every member, ordered by name.
    async fn list(&self) -> AppResult<Vec<FacultyMember>>;

    /// Persists role or assignment mutations to an existing member.
    async fn save(&self, member: FacultyMember) -> AppResult<()>;
}

/// Repository port for departments.
///
/// `replace_hod` is the one cross-aggregate operation: it must demote the
/// prior holder, promote the new one and repoint the department in a single
/// transaction (or under a single lock), so two concurrent replacements can
/// never leave a department with zero or two active HODs.
#[async_trait]
pub trait DepartmentRepository: Send + Sync {
    /// Inserts a new department. Conflict on duplicate code.
    async fn create(&self, department: Department) -> AppResult<()>;

    /// Returns one department by code.
    async fn find(&self, dept_id: &DepartmentId) -> AppResult<Option<Department>>;

    /// Lists every department, ordered by code.
    async fn list(&self) -> AppResult<Vec<Department>>;

    /// Atomically moves the HOD post to `new_hod`, returning the prior
    /// holder.
    async fn replace_hod(
        &self,
        dept_id: &DepartmentId,
        new_hod: FacultyId,
    ) -> AppResult<Option<FacultyId>>;
}
