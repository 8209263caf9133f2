//! Application services and ports for the clearance workflow.

#![forbid(unsafe_code)]

mod approval_ports;
mod approval_service;
mod audit_ports;
mod auth_service;
mod directory_ports;
mod directory_service;
mod issuance_service;
mod role_gate;

pub use approval_ports::{ApprovalRepository, DecideStageInput, VerifySubjectInput};
pub use approval_service::ApprovalService;
pub use audit_ports::{AuditEvent, AuditRepository};
pub use auth_service::{
    AccountRecord, AccountRepository, AuthOutcome, AuthService, PasswordHasher,
    RegisterAccountInput,
};
pub use directory_ports::{DepartmentRepository, FacultyRepository, StudentRepository};
pub use directory_service::{
    DirectoryService, UpdateFacultyAssignmentsInput, UpdateRosterInput,
};
pub use issuance_service::{DistributionStats, IssuanceService, TicketQueueEntry};
pub use role_gate::RoleGate;
