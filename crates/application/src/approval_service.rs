//! Application service for chain stage decisions and record queries.

use std::sync::Arc;

use chrono::Utc;
use clearslip_core::{AppError, AppResult, PortalRole, UserIdentity};
use clearslip_domain::{
    ApprovalRecord, AuditAction, FacultyRole, OpenCycleInput, Stage, StageAction, StageKind,
    Student, StudentId, SubjectSignoff,
};

use crate::approval_ports::{ApprovalRepository, DecideStageInput, VerifySubjectInput};
use crate::audit_ports::{AuditEvent, AuditRepository};
use crate::directory_ports::{FacultyRepository, StudentRepository};
use crate::role_gate::{RoleGate, require_portal_role};

/// Upper bound on optimistic-concurrency retries for one decision.
///
/// Each retry reloads the record and re-runs the gate and prerequisite
/// checks against the fresh snapshot.
const MAX_SAVE_ATTEMPTS: usize = 4;

/// Application service driving the approval chain.
#[derive(Clone)]
pub struct ApprovalService {
    approval_repository: Arc<dyn ApprovalRepository>,
    student_repository: Arc<dyn StudentRepository>,
    faculty_repository: Arc<dyn FacultyRepository>,
    role_gate: RoleGate,
    audit_repository: Arc<dyn AuditRepository>,
}

impl ApprovalService {
    /// Creates the service from repository implementations.
    #[must_use]
    pub fn new(
        approval_repository: Arc<dyn ApprovalRepository>,
        student_repository: Arc<dyn StudentRepository>,
        faculty_repository: Arc<dyn FacultyRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        let role_gate = RoleGate::new(faculty_repository.clone(), student_repository.clone());
        Self {
            approval_repository,
            student_repository,
            faculty_repository,
            role_gate,
            audit_repository,
        }
    }

    /// Applies one stage decision for an acting faculty member.
    ///
    /// The load, gate, transition and save run as one optimistic
    /// read-modify-write; a concurrent commit to the same record surfaces as
    /// a version conflict and the whole sequence is retried on the fresh
    /// snapshot.
    pub async fn decide_stage(
        &self,
        actor: &UserIdentity,
        input: DecideStageInput,
    ) -> AppResult<ApprovalRecord> {
        for _ in 0..MAX_SAVE_ATTEMPTS {
            let mut record = self.require_record(input.student_id).await?;
            let expected_version = record.version();

            self.role_gate
                .require_stage_access(actor, &record, &input.stage)
                .await?;

            record.decide(&input.stage, input.action, Utc::now())?;

            match self
                .approval_repository
                .save(record.clone(), expected_version)
                .await
            {
                Ok(()) => {
                    let action = match input.action {
                        StageAction::Approve => AuditAction::StageApproved,
                        StageAction::Reject => AuditAction::StageRejected,
                    };
                    self.append_record_event(
                        actor,
                        action,
                        input.student_id,
                        Some(format!("stage '{}'", input.stage)),
                    )
                    .await?;

                    return Ok(record);
                }
                Err(AppError::Conflict(_)) => continue,
                Err(error) => return Err(error),
            }
        }

        Err(AppError::Conflict(format!(
            "record for student '{}' kept changing concurrently; retry the decision",
            input.student_id
        )))
    }

    /// Sets the per-subject requirement verification flag.
    ///
    /// Gated like the subject decision itself: only a teacher owning the
    /// subject may flip the flag, and only while the entry is pending.
    pub async fn verify_subject_requirement(
        &self,
        actor: &UserIdentity,
        input: VerifySubjectInput,
    ) -> AppResult<ApprovalRecord> {
        let stage = Stage::Subject {
            subject_id: input.subject_id.clone(),
        };

        for _ in 0..MAX_SAVE_ATTEMPTS {
            let mut record = self.require_record(input.student_id).await?;
            let expected_version = record.version();

            self.role_gate
                .require_stage_access(actor, &record, &stage)
                .await?;

            record.set_subject_verification(&input.subject_id, input.verified)?;

            match self
                .approval_repository
                .save(record.clone(), expected_version)
                .await
            {
                Ok(()) => {
                    self.append_record_event(
                        actor,
                        AuditAction::SubjectVerificationSet,
                        input.student_id,
                        Some(format!(
                            "subject '{}' verified={}",
                            input.subject_id, input.verified
                        )),
                    )
                    .await?;

                    return Ok(record);
                }
                Err(AppError::Conflict(_)) => continue,
                Err(error) => return Err(error),
            }
        }

        Err(AppError::Conflict(format!(
            "record for student '{}' kept changing concurrently; retry the update",
            input.student_id
        )))
    }

    /// Opens a clearance cycle for one student, every stage pending.
    ///
    /// Approver display names are denormalized from the directory at open
    /// time, the way the reference records carry them.
    pub async fn open_cycle(
        &self,
        actor: &UserIdentity,
        student_id: StudentId,
    ) -> AppResult<ApprovalRecord> {
        require_portal_role(actor, PortalRole::Admin)?;

        let student = self
            .student_repository
            .find(student_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("student '{student_id}'")))?;

        let faculty = self.faculty_repository.list().await?;

        let subjects = student
            .enrolled_subjects()
            .iter()
            .map(|enrolled| {
                let teacher_name = faculty
                    .iter()
                    .find(|member| {
                        member.has_role(FacultyRole::SubjectTeacher)
                            && member
                                .taught_subjects()
                                .iter()
                                .any(|taught| taught.subject_id == enrolled.subject_id)
                    })
                    .map(|member| member.name().as_str().to_owned())
                    .unwrap_or_else(|| "Unassigned".to_owned());

                SubjectSignoff {
                    subject_id: enrolled.subject_id.clone(),
                    subject_name: enrolled.subject_name.clone(),
                    teacher_name,
                }
            })
            .collect();

        let mentor_name = self
            .faculty_name(&faculty, student.mentor_id())
            .unwrap_or_else(|| "Unassigned".to_owned());
        let counsellor_name = self
            .faculty_name(&faculty, student.counsellor_id())
            .unwrap_or_else(|| "Unassigned".to_owned());

        let record = ApprovalRecord::open(OpenCycleInput {
            student_id,
            subjects,
            supervisor_name: student.mini_project().supervisor_name.clone(),
            mentor_name,
            counsellor_name,
        })?;

        self.approval_repository.create(record.clone()).await?;

        self.append_record_event(actor, AuditAction::CycleOpened, student_id, None)
            .await?;

        Ok(record)
    }

    /// Lists records with a pending stage of the given family that the
    /// acting faculty member is authorized to decide.
    pub async fn pending_queue(
        &self,
        actor: &UserIdentity,
        stage_kind: StageKind,
    ) -> AppResult<Vec<ApprovalRecord>> {
        let capabilities = self.role_gate.capabilities_for(actor).await?;
        let candidates = self.approval_repository.list_pending(stage_kind).await?;

        Ok(candidates
            .into_iter()
            .filter(|record| {
                pending_stages_of_kind(record, stage_kind).iter().any(|stage| {
                    capabilities
                        .iter()
                        .any(|capability| capability.authorizes(record, stage))
                })
            })
            .collect())
    }

    /// Returns one student's record.
    ///
    /// Students read their own record only; faculty, office and admin
    /// accounts read any.
    pub async fn record_for_student(
        &self,
        actor: &UserIdentity,
        student_id: StudentId,
    ) -> AppResult<ApprovalRecord> {
        if actor.has_role(PortalRole::Student) {
            let own = self.own_student(actor).await?;
            if own.id() != student_id {
                return Err(AppError::Forbidden(
                    "students may only read their own clearance record".to_owned(),
                ));
            }
        }

        self.require_record(student_id).await
    }

    /// Returns the acting student's own record.
    pub async fn my_record(&self, actor: &UserIdentity) -> AppResult<ApprovalRecord> {
        require_portal_role(actor, PortalRole::Student)?;
        let student = self.own_student(actor).await?;
        self.require_record(student.id()).await
    }

    /// Full history projection: every open record, for HOD review.
    ///
    /// Reachable by admin accounts and faculty members holding the Hod role.
    pub async fn approval_history(&self, actor: &UserIdentity) -> AppResult<Vec<ApprovalRecord>> {
        if !actor.has_role(PortalRole::Admin) {
            let member = self.role_gate.resolve_faculty(actor).await?;
            if !member.has_role(FacultyRole::Hod) {
                return Err(AppError::Forbidden(
                    "approval history requires the HOD role".to_owned(),
                ));
            }
        }

        self.approval_repository.list().await
    }

    async fn require_record(&self, student_id: StudentId) -> AppResult<ApprovalRecord> {
        self.approval_repository
            .find(student_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("no open clearance cycle for student '{student_id}'"))
            })
    }

    async fn own_student(&self, actor: &UserIdentity) -> AppResult<Student> {
        self.student_repository
            .find_by_email(actor.email())
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "no student directory entry for '{}'",
                    actor.email()
                ))
            })
    }

    fn faculty_name(
        &self,
        faculty: &[clearslip_domain::FacultyMember],
        id: clearslip_domain::FacultyId,
    ) -> Option<String> {
        faculty
            .iter()
            .find(|member| member.id() == id)
            .map(|member| member.name().as_str().to_owned())
    }

    async fn append_record_event(
        &self,
        actor: &UserIdentity,
        action: AuditAction,
        student_id: StudentId,
        detail: Option<String>,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                subject: Some(actor.subject().to_owned()),
                action,
                resource_type: "approval_record".to_owned(),
                resource_id: student_id.to_string(),
                detail,
            })
            .await
    }
}

/// Enumerates a record's pending stages belonging to one family.
fn pending_stages_of_kind(record: &ApprovalRecord, stage_kind: StageKind) -> Vec<Stage> {
    match stage_kind {
        StageKind::Subject => record
            .subject_approvals()
            .iter()
            .filter(|entry| entry.decision().status().is_pending())
            .map(|entry| Stage::Subject {
                subject_id: entry.subject_id().clone(),
            })
            .collect(),
        StageKind::MiniProject => pending_singleton(record, Stage::MiniProject),
        StageKind::Mentor => pending_singleton(record, Stage::Mentor),
        StageKind::Counsellor => pending_singleton(record, Stage::Counsellor),
        StageKind::Hod => pending_singleton(record, Stage::Hod),
    }
}

fn pending_singleton(record: &ApprovalRecord, stage: Stage) -> Vec<Stage> {
    let pending = record
        .stage_status(&stage)
        .map(|status| status.is_pending())
        .unwrap_or(false);
    if pending { vec![stage] } else { Vec::new() }
}

#[cfg(test)]
mod tests;
