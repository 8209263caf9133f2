//! Application service for directory administration.

use std::collections::BTreeSet;
use std::sync::Arc;

use clearslip_core::{AppError, AppResult, PortalRole, UserIdentity};
use clearslip_domain::{
    AuditAction, Department, DepartmentId, EnrolledSubject, FacultyId, FacultyMember,
    FacultyMemberInput, FacultyRole, Student, StudentId, StudentInput, TaughtSubject,
};

use crate::audit_ports::{AuditEvent, AuditRepository};
use crate::directory_ports::{DepartmentRepository, FacultyRepository, StudentRepository};
use crate::role_gate::require_portal_role;

/// Input payload for student roster mutations.
///
/// `None` fields are left untouched; identity fields are not editable here.
#[derive(Debug, Clone, Default)]
pub struct UpdateRosterInput {
    /// Replacement enrolled subject list.
    pub enrolled_subjects: Option<Vec<EnrolledSubject>>,
    /// Replacement batch code.
    pub batch: Option<String>,
    /// Replacement mentor assignment.
    pub mentor_id: Option<FacultyId>,
    /// Replacement counsellor assignment.
    pub counsellor_id: Option<FacultyId>,
}

/// Input payload for faculty role and assignment mutations.
#[derive(Debug, Clone, Default)]
pub struct UpdateFacultyAssignmentsInput {
    /// Replacement role set.
    pub roles: Option<BTreeSet<FacultyRole>>,
    /// Replacement taught subject list.
    pub taught_subjects: Option<Vec<TaughtSubject>>,
    /// Replacement mentee list.
    pub mentee_ids: Option<BTreeSet<StudentId>>,
}

/// Admin-gated registry management behind the directory screens.
#[derive(Clone)]
pub struct DirectoryService {
    student_repository: Arc<dyn StudentRepository>,
    faculty_repository: Arc<dyn FacultyRepository>,
    department_repository: Arc<dyn DepartmentRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl DirectoryService {
    /// Creates the service from repository implementations.
    #[must_use]
    pub fn new(
        student_repository: Arc<dyn StudentRepository>,
        faculty_repository: Arc<dyn FacultyRepository>,
        department_repository: Arc<dyn DepartmentRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            student_repository,
            faculty_repository,
            department_repository,
            audit_repository,
        }
    }

    /// Registers a new student.
    pub async fn register_student(
        &self,
        actor: &UserIdentity,
        input: StudentInput,
    ) -> AppResult<Student> {
        require_portal_role(actor, PortalRole::Admin)?;

        self.require_department(&input.dept_id).await?;
        self.require_faculty(input.mentor_id).await?;
        self.require_faculty(input.counsellor_id).await?;

        let student = Student::new(input)?;
        self.student_repository.create(student.clone()).await?;

        self.append_event(
            actor,
            AuditAction::StudentRegistered,
            "student",
            student.id().to_string(),
            None,
        )
        .await?;

        Ok(student)
    }

    /// Lists every student.
    pub async fn list_students(&self, actor: &UserIdentity) -> AppResult<Vec<Student>> {
        require_portal_role(actor, PortalRole::Admin)?;
        self.student_repository.list().await
    }

    /// Returns one student.
    pub async fn get_student(
        &self,
        actor: &UserIdentity,
        student_id: StudentId,
    ) -> AppResult<Student> {
        require_portal_role(actor, PortalRole::Admin)?;
        self.student_repository
            .find(student_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("student '{student_id}'")))
    }

    /// Applies roster mutations to one student.
    pub async fn update_roster(
        &self,
        actor: &UserIdentity,
        student_id: StudentId,
        input: UpdateRosterInput,
    ) -> AppResult<Student> {
        require_portal_role(actor, PortalRole::Admin)?;

        let mut student = self
            .student_repository
            .find(student_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("student '{student_id}'")))?;

        if let Some(enrolled_subjects) = input.enrolled_subjects {
            student.set_enrolled_subjects(enrolled_subjects)?;
        }

        if let Some(batch) = input.batch {
            student.set_batch(batch)?;
        }

        if let Some(mentor_id) = input.mentor_id {
            self.require_faculty(mentor_id).await?;
            student.assign_mentor(mentor_id);
        }

        if let Some(counsellor_id) = input.counsellor_id {
            self.require_faculty(counsellor_id).await?;
            student.assign_counsellor(counsellor_id);
        }

        self.student_repository.save(student.clone()).await?;

        self.append_event(
            actor,
            AuditAction::RosterUpdated,
            "student",
            student_id.to_string(),
            None,
        )
        .await?;

        Ok(student)
    }

    /// Registers a new faculty member.
    pub async fn register_faculty(
        &self,
        actor: &UserIdentity,
        input: FacultyMemberInput,
    ) -> AppResult<FacultyMember> {
        require_portal_role(actor, PortalRole::Admin)?;

        let member = FacultyMember::new(input)?;
        self.faculty_repository.create(member.clone()).await?;

        self.append_event(
            actor,
            AuditAction::FacultyRegistered,
            "faculty",
            member.id().to_string(),
            None,
        )
        .await?;

        Ok(member)
    }

    /// Lists every faculty member.
    pub async fn list_faculty(&self, actor: &UserIdentity) -> AppResult<Vec<FacultyMember>> {
        require_portal_role(actor, PortalRole::Admin)?;
        self.faculty_repository.list().await
    }

    /// Applies role and assignment mutations to one faculty member.
    pub async fn update_faculty_assignments(
        &self,
        actor: &UserIdentity,
        faculty_id: FacultyId,
        input: UpdateFacultyAssignmentsInput,
    ) -> AppResult<FacultyMember> {
        require_portal_role(actor, PortalRole::Admin)?;

        let mut member = self
            .faculty_repository
            .find(faculty_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("faculty '{faculty_id}'")))?;

        if let Some(roles) = input.roles {
            for role in FacultyRole::all() {
                if roles.contains(role) {
                    member.grant_role(*role);
                } else {
                    member.revoke_role(*role);
                }
            }
        }

        if let Some(taught_subjects) = input.taught_subjects {
            member.set_taught_subjects(taught_subjects)?;
        }

        if let Some(mentee_ids) = input.mentee_ids {
            member.set_mentees(mentee_ids);
        }

        self.faculty_repository.save(member.clone()).await?;

        self.append_event(
            actor,
            AuditAction::FacultyAssignmentsUpdated,
            "faculty",
            faculty_id.to_string(),
            None,
        )
        .await?;

        Ok(member)
    }

    /// Registers a new department.
    pub async fn register_department(
        &self,
        actor: &UserIdentity,
        dept_id: DepartmentId,
        dept_name: String,
    ) -> AppResult<Department> {
        require_portal_role(actor, PortalRole::Admin)?;

        let department = Department::new(dept_id, dept_name)?;
        self.department_repository.create(department.clone()).await?;
        Ok(department)
    }

    /// Lists every department.
    pub async fn list_departments(&self, actor: &UserIdentity) -> AppResult<Vec<Department>> {
        require_portal_role(actor, PortalRole::Admin)?;
        self.department_repository.list().await
    }

    /// Moves a department's HOD post to another faculty member.
    ///
    /// The repository performs the demote/promote/repoint sequence
    /// atomically; afterwards exactly one member holds the post.
    pub async fn replace_department_hod(
        &self,
        actor: &UserIdentity,
        dept_id: DepartmentId,
        faculty_id: FacultyId,
    ) -> AppResult<Department> {
        require_portal_role(actor, PortalRole::Admin)?;

        self.require_department(&dept_id).await?;
        self.require_faculty(faculty_id).await?;

        let prior = self
            .department_repository
            .replace_hod(&dept_id, faculty_id)
            .await?;

        self.append_event(
            actor,
            AuditAction::HodReplaced,
            "department",
            dept_id.to_string(),
            Some(match prior {
                Some(prior) => format!("'{prior}' replaced by '{faculty_id}'"),
                None => format!("'{faculty_id}' appointed"),
            }),
        )
        .await?;

        self.department_repository
            .find(&dept_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("department '{dept_id}'")))
    }

    async fn require_department(&self, dept_id: &DepartmentId) -> AppResult<()> {
        self.department_repository
            .find(dept_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("department '{dept_id}'")))
    }

    async fn require_faculty(&self, faculty_id: FacultyId) -> AppResult<()> {
        self.faculty_repository
            .find(faculty_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("faculty '{faculty_id}'")))
    }

    async fn append_event(
        &self,
        actor: &UserIdentity,
        action: AuditAction,
        resource_type: &str,
        resource_id: String,
        detail: Option<String>,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                subject: Some(actor.subject().to_owned()),
                action,
                resource_type: resource_type.to_owned(),
                resource_id,
                detail,
            })
            .await
    }
}

#[cfg(test)]
mod tests;
