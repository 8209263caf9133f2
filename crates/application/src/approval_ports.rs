//! Ports for approval record persistence and stage-decision inputs.

use async_trait::async_trait;
use clearslip_core::AppResult;
use clearslip_domain::{ApprovalRecord, Stage, StageAction, StageKind, StudentId, SubjectId};

/// Repository port for approval records.
///
/// `save` is the compare-and-swap half of the per-record atomicity contract:
/// implementations must reject the write with a conflict when the stored
/// version differs from `expected_version`, so a decision taken against a
/// stale prerequisite snapshot can never commit. Services reload and retry on
/// that conflict.
#[async_trait]
pub trait ApprovalRepository: Send + Sync {
    /// Inserts a freshly opened cycle record. Conflict if one exists for the
    /// student.
    async fn create(&self, record: ApprovalRecord) -> AppResult<()>;

    /// Returns the record for one student, if a cycle is open.
    async fn find(&self, student_id: StudentId) -> AppResult<Option<ApprovalRecord>>;

    /// Lists every open record.
    async fn list(&self) -> AppResult<Vec<ApprovalRecord>>;

    /// Lists records with at least one pending stage of the given family.
    async fn list_pending(&self, stage_kind: StageKind) -> AppResult<Vec<ApprovalRecord>>;

    /// Persists a mutated record if the stored version still equals
    /// `expected_version`; conflict otherwise.
    async fn save(&self, record: ApprovalRecord, expected_version: u64) -> AppResult<()>;
}

/// Input payload for one stage decision.
#[derive(Debug, Clone)]
pub struct DecideStageInput {
    /// The record's owning student.
    pub student_id: StudentId,
    /// The targeted stage.
    pub stage: Stage,
    /// Approve or reject.
    pub action: StageAction,
}

/// Input payload for the per-subject requirement verification flag.
#[derive(Debug, Clone)]
pub struct VerifySubjectInput {
    /// The record's owning student.
    pub student_id: StudentId,
    /// The targeted subject entry.
    pub subject_id: SubjectId,
    /// The new flag value.
    pub verified: bool,
}
