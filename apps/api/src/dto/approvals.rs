use chrono::{DateTime, Utc};
use clearslip_application::DecideStageInput;
use clearslip_core::{AppError, AppResult};
use clearslip_domain::{
    ApprovalRecord, Stage, StageDecision, StudentId, SubjectApproval, SubjectId,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Transport reference to one chain stage.
///
/// `subject_id` is required for the `subject` kind and ignored otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/stage-ref.ts"
)]
pub struct StageRef {
    pub kind: String,
    pub subject_id: Option<String>,
}

impl StageRef {
    pub fn into_stage(self) -> AppResult<Stage> {
        match self.kind.as_str() {
            "subject" => {
                let subject_id = self.subject_id.ok_or_else(|| {
                    AppError::Validation(
                        "subject stages require a subject_id".to_owned(),
                    )
                })?;
                Ok(Stage::Subject {
                    subject_id: SubjectId::new(subject_id)?,
                })
            }
            "mini_project" => Ok(Stage::MiniProject),
            "mentor" => Ok(Stage::Mentor),
            "counsellor" => Ok(Stage::Counsellor),
            "hod" => Ok(Stage::Hod),
            other => Err(AppError::Validation(format!("unknown stage kind '{other}'"))),
        }
    }

    fn from_stage(stage: &Stage) -> Self {
        match stage {
            Stage::Subject { subject_id } => Self {
                kind: "subject".to_owned(),
                subject_id: Some(subject_id.as_str().to_owned()),
            },
            Stage::MiniProject => Self {
                kind: "mini_project".to_owned(),
                subject_id: None,
            },
            Stage::Mentor => Self {
                kind: "mentor".to_owned(),
                subject_id: None,
            },
            Stage::Counsellor => Self {
                kind: "counsellor".to_owned(),
                subject_id: None,
            },
            Stage::Hod => Self {
                kind: "hod".to_owned(),
                subject_id: None,
            },
        }
    }
}

/// Incoming payload for one stage decision.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/decide-stage-request.ts"
)]
pub struct DecideStageRequest {
    pub stage: StageRef,
    /// `approve` or `reject`.
    pub action: String,
}

impl DecideStageRequest {
    pub fn into_input(self, student_id: StudentId) -> AppResult<DecideStageInput> {
        Ok(DecideStageInput {
            student_id,
            stage: self.stage.into_stage()?,
            action: self.action.parse()?,
        })
    }
}

/// Incoming payload for the per-subject requirement verification flag.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/verify-subject-request.ts"
)]
pub struct VerifySubjectRequest {
    pub verified: bool,
}

/// One subject sign-off entry of a record.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/subject-approval-response.ts"
)]
pub struct SubjectApprovalResponse {
    pub subject_id: String,
    pub subject_name: String,
    pub teacher_name: String,
    pub status: String,
    pub decided_at: Option<String>,
    pub requirements_verified: bool,
}

impl From<&SubjectApproval> for SubjectApprovalResponse {
    fn from(entry: &SubjectApproval) -> Self {
        Self {
            subject_id: entry.subject_id().as_str().to_owned(),
            subject_name: entry.subject_name().to_owned(),
            teacher_name: entry.teacher_name().to_owned(),
            status: entry.decision().status().as_str().to_owned(),
            decided_at: timestamp(entry.decision().decided_at()),
            requirements_verified: entry.requirements_verified(),
        }
    }
}

/// A singleton stage with the approver's display name.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/named-stage-response.ts"
)]
pub struct NamedStageResponse {
    pub approver_name: String,
    pub status: String,
    pub decided_at: Option<String>,
}

impl NamedStageResponse {
    fn new(approver_name: &str, decision: &StageDecision) -> Self {
        Self {
            approver_name: approver_name.to_owned(),
            status: decision.status().as_str().to_owned(),
            decided_at: timestamp(decision.decided_at()),
        }
    }
}

/// The HOD stage, which carries no denormalized approver name.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/hod-stage-response.ts"
)]
pub struct HodStageResponse {
    pub status: String,
    pub decided_at: Option<String>,
}

/// API representation of a full approval record.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/approval-record-response.ts"
)]
pub struct ApprovalRecordResponse {
    pub student_id: String,
    pub subject_approvals: Vec<SubjectApprovalResponse>,
    pub mini_project_approval: NamedStageResponse,
    pub mentor_approval: NamedStageResponse,
    pub counsellor_approval: NamedStageResponse,
    pub hod_approval: HodStageResponse,
    pub hall_ticket_distributed: bool,
    pub ticket_distributed_at: Option<String>,
    /// Stages currently pending with prerequisites met, in chain order.
    pub actionable_stages: Vec<StageRef>,
    pub slip_eligible: bool,
    pub ticket_issuable: bool,
    pub version: u64,
}

impl From<&ApprovalRecord> for ApprovalRecordResponse {
    fn from(record: &ApprovalRecord) -> Self {
        Self {
            student_id: record.student_id().to_string(),
            subject_approvals: record
                .subject_approvals()
                .iter()
                .map(SubjectApprovalResponse::from)
                .collect(),
            mini_project_approval: NamedStageResponse::new(
                record.mini_project_approval().supervisor_name(),
                record.mini_project_approval().decision(),
            ),
            mentor_approval: NamedStageResponse::new(
                record.mentor_approval().mentor_name(),
                record.mentor_approval().decision(),
            ),
            counsellor_approval: NamedStageResponse::new(
                record.counsellor_approval().counsellor_name(),
                record.counsellor_approval().decision(),
            ),
            hod_approval: HodStageResponse {
                status: record.hod_approval().decision().status().as_str().to_owned(),
                decided_at: timestamp(record.hod_approval().decision().decided_at()),
            },
            hall_ticket_distributed: record.hall_ticket_distributed(),
            ticket_distributed_at: timestamp(record.ticket_distributed_at()),
            actionable_stages: record
                .actionable_stages()
                .iter()
                .map(StageRef::from_stage)
                .collect(),
            slip_eligible: record.is_slip_eligible(),
            ticket_issuable: record.is_ticket_issuable(),
            version: record.version(),
        }
    }
}

pub(super) fn timestamp(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(|decided_at| decided_at.to_rfc3339())
}
