use std::str::FromStr;

use clearslip_core::AppError;
use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a chain stage is approved.
    StageApproved,
    /// Emitted when a chain stage is rejected.
    StageRejected,
    /// Emitted when a subject's requirement verification flag changes.
    SubjectVerificationSet,
    /// Emitted when a hall ticket is handed out.
    TicketIssued,
    /// Emitted when a clearance cycle record is opened.
    CycleOpened,
    /// Emitted when a student is registered.
    StudentRegistered,
    /// Emitted when a student's roster fields change.
    RosterUpdated,
    /// Emitted when a faculty member is registered.
    FacultyRegistered,
    /// Emitted when a faculty member's roles or assignments change.
    FacultyAssignmentsUpdated,
    /// Emitted when a department's HOD post moves.
    HodReplaced,
    /// Emitted on a successful login.
    LoginSucceeded,
    /// Emitted on a failed login attempt.
    LoginFailed,
    /// Emitted on logout.
    LoggedOut,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StageApproved => "approval.stage.approved",
            Self::StageRejected => "approval.stage.rejected",
            Self::SubjectVerificationSet => "approval.subject.verification_set",
            Self::TicketIssued => "issuance.ticket.issued",
            Self::CycleOpened => "approval.cycle.opened",
            Self::StudentRegistered => "directory.student.registered",
            Self::RosterUpdated => "directory.student.roster_updated",
            Self::FacultyRegistered => "directory.faculty.registered",
            Self::FacultyAssignmentsUpdated => "directory.faculty.assignments_updated",
            Self::HodReplaced => "directory.department.hod_replaced",
            Self::LoginSucceeded => "auth.login.succeeded",
            Self::LoginFailed => "auth.login.failed",
            Self::LoggedOut => "auth.logged_out",
        }
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "approval.stage.approved" => Ok(Self::StageApproved),
            "approval.stage.rejected" => Ok(Self::StageRejected),
            "approval.subject.verification_set" => Ok(Self::SubjectVerificationSet),
            "issuance.ticket.issued" => Ok(Self::TicketIssued),
            "approval.cycle.opened" => Ok(Self::CycleOpened),
            "directory.student.registered" => Ok(Self::StudentRegistered),
            "directory.student.roster_updated" => Ok(Self::RosterUpdated),
            "directory.faculty.registered" => Ok(Self::FacultyRegistered),
            "directory.faculty.assignments_updated" => Ok(Self::FacultyAssignmentsUpdated),
            "directory.department.hod_replaced" => Ok(Self::HodReplaced),
            "auth.login.succeeded" => Ok(Self::LoginSucceeded),
            "auth.login.failed" => Ok(Self::LoginFailed),
            "auth.logged_out" => Ok(Self::LoggedOut),
            _ => Err(AppError::Validation(format!(
                "unknown audit action '{value}'"
            ))),
        }
    }
}
