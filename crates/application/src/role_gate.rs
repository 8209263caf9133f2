//! Maps an authenticated actor to the chain stages they may act on.

use std::collections::BTreeSet;
use std::sync::Arc;

use clearslip_core::{AppError, AppResult, PortalRole, UserIdentity};
use clearslip_domain::{ApprovalRecord, FacultyMember, Stage, StageCapability, StudentId};

use crate::directory_ports::{FacultyRepository, StudentRepository};

/// Capability-based gate over `(record, stage)` pairs.
///
/// Chain authority is never derived from the portal role alone: the acting
/// account must resolve, by email, to a faculty directory entry, and that
/// entry's roles and assignments decide which stages are reachable.
#[derive(Clone)]
pub struct RoleGate {
    faculty_repository: Arc<dyn FacultyRepository>,
    student_repository: Arc<dyn StudentRepository>,
}

impl RoleGate {
    /// Creates a gate over the faculty and student directories.
    #[must_use]
    pub fn new(
        faculty_repository: Arc<dyn FacultyRepository>,
        student_repository: Arc<dyn StudentRepository>,
    ) -> Self {
        Self {
            faculty_repository,
            student_repository,
        }
    }

    /// Resolves the faculty directory entry behind an acting identity.
    pub async fn resolve_faculty(&self, actor: &UserIdentity) -> AppResult<FacultyMember> {
        if !actor.has_role(PortalRole::Faculty) {
            return Err(AppError::Forbidden(
                "only faculty accounts act on approval stages".to_owned(),
            ));
        }

        self.faculty_repository
            .find_by_email(actor.email())
            .await?
            .ok_or_else(|| {
                AppError::Forbidden(format!(
                    "no faculty directory entry for '{}'",
                    actor.email()
                ))
            })
    }

    /// Resolves the stage capabilities granted to an acting identity.
    ///
    /// Role-derived capabilities come from the faculty entry itself. The
    /// mini-project supervision capability is derived here instead: the
    /// student directory names supervisors denormalized by display name, so
    /// the gate collects the students whose assignment points at this member.
    pub async fn capabilities_for(&self, actor: &UserIdentity) -> AppResult<Vec<StageCapability>> {
        let member = self.resolve_faculty(actor).await?;
        let mut capabilities = member.capabilities();

        let supervised_student_ids: BTreeSet<StudentId> = self
            .student_repository
            .list()
            .await?
            .into_iter()
            .filter(|student| {
                student.mini_project().supervisor_name == member.name().as_str()
            })
            .map(|student| student.id())
            .collect();

        if !supervised_student_ids.is_empty() {
            capabilities.push(StageCapability::MiniProjectSupervisor {
                supervised_student_ids,
            });
        }

        Ok(capabilities)
    }

    /// Ensures the actor may act on one `(record, stage)` pair.
    pub async fn require_stage_access(
        &self,
        actor: &UserIdentity,
        record: &ApprovalRecord,
        stage: &Stage,
    ) -> AppResult<()> {
        let capabilities = self.capabilities_for(actor).await?;
        if capabilities
            .iter()
            .any(|capability| capability.authorizes(record, stage))
        {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "'{}' is not authorized for stage '{stage}' of student '{}'",
            actor.email(),
            record.student_id()
        )))
    }
}

/// Ensures the actor holds the exact portal role.
pub fn require_portal_role(actor: &UserIdentity, role: PortalRole) -> AppResult<()> {
    if actor.has_role(role) {
        return Ok(());
    }

    Err(AppError::Forbidden(format!(
        "requires the {} portal role",
        role.as_str()
    )))
}

/// Ensures the actor holds one of the listed portal roles.
pub fn require_any_portal_role(actor: &UserIdentity, roles: &[PortalRole]) -> AppResult<()> {
    if roles.iter().any(|role| actor.has_role(*role)) {
        return Ok(());
    }

    let expected: Vec<&str> = roles.iter().map(PortalRole::as_str).collect();
    Err(AppError::Forbidden(format!(
        "requires one of the portal roles: {}",
        expected.join(", ")
    )))
}
