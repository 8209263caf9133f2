//! Domain entities and invariants for the clearance workflow.

#![forbid(unsafe_code)]

mod account;
mod approval;
mod audit;
mod capability;
mod catalog;
mod faculty;
mod slip;
mod student;

pub use account::{
    AccountId, EmailAddress, PASSWORD_MAX_LENGTH, PASSWORD_MIN_LENGTH, validate_password,
};
pub use approval::{
    ApprovalRecord, ChainError, CounsellorApproval, HodApproval, MentorApproval,
    MiniProjectApproval, OpenCycleInput, Stage, StageAction, StageDecision, StageKind,
    StageStatus, SubjectApproval, SubjectSignoff,
};
pub use audit::AuditAction;
pub use capability::StageCapability;
pub use catalog::{Department, DepartmentId, Subject, SubjectId};
pub use faculty::{FacultyId, FacultyMember, FacultyMemberInput, FacultyRole, TaughtSubject};
pub use slip::{ClearanceSlip, SlipLine};
pub use student::{EnrolledSubject, MiniProjectAssignment, Student, StudentId, StudentInput};
