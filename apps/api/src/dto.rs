//! Transport types for the HTTP API, exported for the TypeScript client.

mod approvals;
mod audit;
mod auth;
mod directory;
mod issuance;

pub use approvals::{ApprovalRecordResponse, DecideStageRequest, VerifySubjectRequest};
pub use audit::AuditEventResponse;
pub use auth::{
    AccountCreatedResponse, LoginRequest, RegisterAccountRequest, UserIdentityResponse,
};
pub use directory::{
    CreateDepartmentRequest, DepartmentResponse, FacultyResponse, RegisterFacultyRequest,
    RegisterStudentRequest, ReplaceHodRequest, StudentResponse,
    UpdateFacultyAssignmentsRequest, UpdateRosterRequest, parse_faculty_id, parse_student_id,
};
pub use issuance::{DistributionStatsResponse, SlipResponse, TicketQueueEntryResponse};
