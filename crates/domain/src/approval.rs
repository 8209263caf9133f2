//! The per-student approval record and its chain transition rules.
//!
//! The record is the single aggregate of the clearance workflow: one entry
//! per enrolled subject plus the mini-project, mentor, counsellor and HOD
//! stages, each an independent pending/approved/rejected cell. All transition
//! logic lives here as pure functions; timestamps enter as arguments so the
//! engine never reads a clock.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use clearslip_core::AppError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::SubjectId;
use crate::student::StudentId;

/// Decision state of one chain stage.
///
/// Pending is initial; Approved and Rejected are both terminal. A rejection
/// blocks downstream stages but does not cascade into them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Awaiting a decision.
    Pending,
    /// Signed off.
    Approved,
    /// Declined; the record stays blocked at this stage.
    Rejected,
}

impl StageStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Returns whether the stage has been signed off.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }

    /// Returns whether the stage still awaits a decision.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl FromStr for StageStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(AppError::Validation(format!(
                "unknown stage status '{value}'"
            ))),
        }
    }
}

/// Action requested on a pending stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageAction {
    /// Sign the stage off.
    Approve,
    /// Decline the stage.
    Reject,
}

impl StageAction {
    /// Returns the terminal status this action resolves a stage to.
    #[must_use]
    pub fn decided_status(&self) -> StageStatus {
        match self {
            Self::Approve => StageStatus::Approved,
            Self::Reject => StageStatus::Rejected,
        }
    }

    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

impl FromStr for StageAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            _ => Err(AppError::Validation(format!(
                "unknown stage action '{value}'"
            ))),
        }
    }
}

/// Identifier of one stage within a record's chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Stage {
    /// One enrolled subject's sign-off.
    Subject {
        /// Subject code of the targeted entry.
        subject_id: SubjectId,
    },
    /// Mini-project supervisor sign-off.
    MiniProject,
    /// Mentor sign-off.
    Mentor,
    /// Class counsellor sign-off.
    Counsellor,
    /// Final HOD sign-off.
    Hod,
}

impl Stage {
    /// Returns the stage family, dropping any subject scoping.
    #[must_use]
    pub fn kind(&self) -> StageKind {
        match self {
            Self::Subject { .. } => StageKind::Subject,
            Self::MiniProject => StageKind::MiniProject,
            Self::Mentor => StageKind::Mentor,
            Self::Counsellor => StageKind::Counsellor,
            Self::Hod => StageKind::Hod,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Subject { subject_id } => write!(formatter, "subject {subject_id}"),
            Self::MiniProject => write!(formatter, "mini-project"),
            Self::Mentor => write!(formatter, "mentor"),
            Self::Counsellor => write!(formatter, "counsellor"),
            Self::Hod => write!(formatter, "hod"),
        }
    }
}

/// Stage family without per-subject scoping, used for queue filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Subject sign-off entries.
    Subject,
    /// Mini-project supervisor stage.
    MiniProject,
    /// Mentor stage.
    Mentor,
    /// Class counsellor stage.
    Counsellor,
    /// HOD stage.
    Hod,
}

impl StageKind {
    /// Returns a stable transport value for this stage family.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::MiniProject => "mini_project",
            Self::Mentor => "mentor",
            Self::Counsellor => "counsellor",
            Self::Hod => "hod",
        }
    }
}

impl FromStr for StageKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "subject" => Ok(Self::Subject),
            "mini_project" => Ok(Self::MiniProject),
            "mentor" => Ok(Self::Mentor),
            "counsellor" => Ok(Self::Counsellor),
            "hod" => Ok(Self::Hod),
            _ => Err(AppError::Validation(format!(
                "unknown stage kind '{value}'"
            ))),
        }
    }
}

/// Chain transition failures.
///
/// All kinds are caller sequencing errors; none is retryable and none
/// mutates the record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The targeted stage already carries a terminal decision.
    #[error("stage '{stage}' is already decided")]
    AlreadyDecided {
        /// The stage that was targeted.
        stage: Stage,
    },

    /// One or more prerequisite stages are not yet approved.
    #[error("prerequisites not met for stage '{stage}'")]
    PrerequisitesNotMet {
        /// The stage that was targeted.
        stage: Stage,
    },

    /// Subject approval attempted before its requirements were verified.
    #[error("requirements not verified for subject '{subject_id}'")]
    VerificationRequired {
        /// The subject whose verification flag is unset.
        subject_id: SubjectId,
    },

    /// Hall ticket issuance attempted after it was already issued.
    #[error("hall ticket already issued")]
    AlreadyIssued,

    /// The record carries no entry for the referenced subject.
    #[error("record has no subject entry '{subject_id}'")]
    UnknownSubject {
        /// The unrecognized subject code.
        subject_id: SubjectId,
    },
}

impl From<ChainError> for AppError {
    fn from(value: ChainError) -> Self {
        match value {
            ChainError::AlreadyDecided { .. }
            | ChainError::PrerequisitesNotMet { .. }
            | ChainError::AlreadyIssued => AppError::Conflict(value.to_string()),
            ChainError::VerificationRequired { .. } => AppError::Validation(value.to_string()),
            ChainError::UnknownSubject { .. } => AppError::NotFound(value.to_string()),
        }
    }
}

/// One stage's decision cell: status plus the moment it left pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDecision {
    status: StageStatus,
    decided_at: Option<DateTime<Utc>>,
}

impl StageDecision {
    fn pending() -> Self {
        Self {
            status: StageStatus::Pending,
            decided_at: None,
        }
    }

    fn resolve(&mut self, action: StageAction, decided_at: DateTime<Utc>) {
        self.status = action.decided_status();
        self.decided_at = Some(decided_at);
    }

    /// Returns the decision state.
    #[must_use]
    pub fn status(&self) -> StageStatus {
        self.status
    }

    /// Returns when the stage left pending, once decided.
    #[must_use]
    pub fn decided_at(&self) -> Option<DateTime<Utc>> {
        self.decided_at
    }
}

/// Sign-off entry for one enrolled subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectApproval {
    subject_id: SubjectId,
    subject_name: String,
    teacher_name: String,
    decision: StageDecision,
    requirements_verified: bool,
}

impl SubjectApproval {
    /// Returns the subject code.
    #[must_use]
    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    /// Returns the subject display name.
    #[must_use]
    pub fn subject_name(&self) -> &str {
        self.subject_name.as_str()
    }

    /// Returns the signing teacher's display name.
    #[must_use]
    pub fn teacher_name(&self) -> &str {
        self.teacher_name.as_str()
    }

    /// Returns the decision cell.
    #[must_use]
    pub fn decision(&self) -> &StageDecision {
        &self.decision
    }

    /// Returns whether the out-of-band requirement check has been confirmed.
    #[must_use]
    pub fn requirements_verified(&self) -> bool {
        self.requirements_verified
    }
}

/// Mini-project supervisor sign-off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiniProjectApproval {
    supervisor_name: String,
    decision: StageDecision,
}

impl MiniProjectApproval {
    /// Returns the supervising faculty display name.
    #[must_use]
    pub fn supervisor_name(&self) -> &str {
        self.supervisor_name.as_str()
    }

    /// Returns the decision cell.
    #[must_use]
    pub fn decision(&self) -> &StageDecision {
        &self.decision
    }
}

/// Mentor sign-off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentorApproval {
    mentor_name: String,
    decision: StageDecision,
}

impl MentorApproval {
    /// Returns the mentor display name.
    #[must_use]
    pub fn mentor_name(&self) -> &str {
        self.mentor_name.as_str()
    }

    /// Returns the decision cell.
    #[must_use]
    pub fn decision(&self) -> &StageDecision {
        &self.decision
    }
}

/// Class counsellor sign-off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounsellorApproval {
    counsellor_name: String,
    decision: StageDecision,
}

impl CounsellorApproval {
    /// Returns the counsellor display name.
    #[must_use]
    pub fn counsellor_name(&self) -> &str {
        self.counsellor_name.as_str()
    }

    /// Returns the decision cell.
    #[must_use]
    pub fn decision(&self) -> &StageDecision {
        &self.decision
    }
}

/// Final HOD sign-off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HodApproval {
    decision: StageDecision,
}

impl HodApproval {
    /// Returns the decision cell.
    #[must_use]
    pub fn decision(&self) -> &StageDecision {
        &self.decision
    }
}

/// One subject row for opening a clearance cycle.
#[derive(Debug, Clone)]
pub struct SubjectSignoff {
    /// Subject code.
    pub subject_id: SubjectId,
    /// Subject display name.
    pub subject_name: String,
    /// Signing teacher's display name.
    pub teacher_name: String,
}

/// Input payload for opening a clearance cycle record.
#[derive(Debug, Clone)]
pub struct OpenCycleInput {
    /// The student the record belongs to.
    pub student_id: StudentId,
    /// One row per enrolled subject; non-empty, unique subject ids.
    pub subjects: Vec<SubjectSignoff>,
    /// Mini-project supervisor display name.
    pub supervisor_name: String,
    /// Mentor display name.
    pub mentor_name: String,
    /// Class counsellor display name.
    pub counsellor_name: String,
}

/// The per-student, per-cycle approval record.
///
/// `version` is a monotone counter bumped on every successful mutation; the
/// repository save contract compares it so concurrent approvers can never
/// commit a decision taken against a stale prerequisite snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    student_id: StudentId,
    subject_approvals: Vec<SubjectApproval>,
    mini_project_approval: MiniProjectApproval,
    mentor_approval: MentorApproval,
    counsellor_approval: CounsellorApproval,
    hod_approval: HodApproval,
    hall_ticket_distributed: bool,
    ticket_distributed_at: Option<DateTime<Utc>>,
    version: u64,
}

impl ApprovalRecord {
    /// Opens a clearance cycle with every stage pending.
    pub fn open(input: OpenCycleInput) -> Result<Self, AppError> {
        let OpenCycleInput {
            student_id,
            subjects,
            supervisor_name,
            mentor_name,
            counsellor_name,
        } = input;

        if subjects.is_empty() {
            return Err(AppError::Validation(
                "clearance cycle requires at least one subject entry".to_owned(),
            ));
        }

        let mut seen = BTreeSet::new();
        for subject in &subjects {
            if !seen.insert(subject.subject_id.clone()) {
                return Err(AppError::Validation(format!(
                    "duplicate subject entry '{}'",
                    subject.subject_id
                )));
            }
        }

        Ok(Self {
            student_id,
            subject_approvals: subjects
                .into_iter()
                .map(|subject| SubjectApproval {
                    subject_id: subject.subject_id,
                    subject_name: subject.subject_name,
                    teacher_name: subject.teacher_name,
                    decision: StageDecision::pending(),
                    requirements_verified: false,
                })
                .collect(),
            mini_project_approval: MiniProjectApproval {
                supervisor_name,
                decision: StageDecision::pending(),
            },
            mentor_approval: MentorApproval {
                mentor_name,
                decision: StageDecision::pending(),
            },
            counsellor_approval: CounsellorApproval {
                counsellor_name,
                decision: StageDecision::pending(),
            },
            hod_approval: HodApproval {
                decision: StageDecision::pending(),
            },
            hall_ticket_distributed: false,
            ticket_distributed_at: None,
            version: 0,
        })
    }

    /// Returns the owning student.
    #[must_use]
    pub fn student_id(&self) -> StudentId {
        self.student_id
    }

    /// Returns the per-subject sign-off entries.
    #[must_use]
    pub fn subject_approvals(&self) -> &[SubjectApproval] {
        &self.subject_approvals
    }

    /// Returns the mini-project sign-off.
    #[must_use]
    pub fn mini_project_approval(&self) -> &MiniProjectApproval {
        &self.mini_project_approval
    }

    /// Returns the mentor sign-off.
    #[must_use]
    pub fn mentor_approval(&self) -> &MentorApproval {
        &self.mentor_approval
    }

    /// Returns the counsellor sign-off.
    #[must_use]
    pub fn counsellor_approval(&self) -> &CounsellorApproval {
        &self.counsellor_approval
    }

    /// Returns the HOD sign-off.
    #[must_use]
    pub fn hod_approval(&self) -> &HodApproval {
        &self.hod_approval
    }

    /// Returns whether the hall ticket has been handed out.
    #[must_use]
    pub fn hall_ticket_distributed(&self) -> bool {
        self.hall_ticket_distributed
    }

    /// Returns when the hall ticket was handed out.
    #[must_use]
    pub fn ticket_distributed_at(&self) -> Option<DateTime<Utc>> {
        self.ticket_distributed_at
    }

    /// Returns the optimistic-concurrency version counter.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the decision state of one stage.
    pub fn stage_status(&self, stage: &Stage) -> Result<StageStatus, ChainError> {
        match stage {
            Stage::Subject { subject_id } => self
                .find_subject(subject_id)
                .map(|entry| entry.decision.status()),
            Stage::MiniProject => Ok(self.mini_project_approval.decision.status()),
            Stage::Mentor => Ok(self.mentor_approval.decision.status()),
            Stage::Counsellor => Ok(self.counsellor_approval.decision.status()),
            Stage::Hod => Ok(self.hod_approval.decision.status()),
        }
    }

    /// Returns whether every enrolled subject is approved.
    #[must_use]
    pub fn all_subjects_approved(&self) -> bool {
        self.subject_approvals
            .iter()
            .all(|entry| entry.decision.status().is_approved())
    }

    /// Returns whether any stage of the given family is still pending.
    #[must_use]
    pub fn has_pending_stage(&self, stage_kind: StageKind) -> bool {
        match stage_kind {
            StageKind::Subject => self
                .subject_approvals
                .iter()
                .any(|entry| entry.decision.status().is_pending()),
            StageKind::MiniProject => self.mini_project_approval.decision.status().is_pending(),
            StageKind::Mentor => self.mentor_approval.decision.status().is_pending(),
            StageKind::Counsellor => self.counsellor_approval.decision.status().is_pending(),
            StageKind::Hod => self.hod_approval.decision.status().is_pending(),
        }
    }

    /// Returns whether every prerequisite of a stage is approved.
    ///
    /// Evaluated against the record as it is now; callers must re-check after
    /// any reload since prerequisite cells may change concurrently.
    #[must_use]
    pub fn prerequisites_met(&self, stage: &Stage) -> bool {
        match stage {
            Stage::Subject { .. } | Stage::MiniProject => true,
            Stage::Mentor => {
                self.all_subjects_approved()
                    && self.mini_project_approval.decision.status().is_approved()
            }
            Stage::Counsellor => self.mentor_approval.decision.status().is_approved(),
            Stage::Hod => {
                self.counsellor_approval.decision.status().is_approved()
                    && self.all_subjects_approved()
                    && self.mini_project_approval.decision.status().is_approved()
                    && self.mentor_approval.decision.status().is_approved()
            }
        }
    }

    /// Applies one stage decision.
    ///
    /// The stage must be pending and all its prerequisites approved, for
    /// both actions. Subject approval additionally requires the entry's
    /// verification flag; rejection bypasses the flag.
    pub fn decide(
        &mut self,
        stage: &Stage,
        action: StageAction,
        decided_at: DateTime<Utc>,
    ) -> Result<(), ChainError> {
        let status = self.stage_status(stage)?;
        if !status.is_pending() {
            return Err(ChainError::AlreadyDecided {
                stage: stage.clone(),
            });
        }

        if !self.prerequisites_met(stage) {
            return Err(ChainError::PrerequisitesNotMet {
                stage: stage.clone(),
            });
        }

        match stage {
            Stage::Subject { subject_id } => {
                let entry = self.find_subject_mut(subject_id)?;
                if action == StageAction::Approve && !entry.requirements_verified {
                    return Err(ChainError::VerificationRequired {
                        subject_id: subject_id.clone(),
                    });
                }
                entry.decision.resolve(action, decided_at);
            }
            Stage::MiniProject => self.mini_project_approval.decision.resolve(action, decided_at),
            Stage::Mentor => self.mentor_approval.decision.resolve(action, decided_at),
            Stage::Counsellor => self.counsellor_approval.decision.resolve(action, decided_at),
            Stage::Hod => self.hod_approval.decision.resolve(action, decided_at),
        }

        self.version += 1;
        Ok(())
    }

    /// Records the out-of-band requirement check for one subject entry.
    ///
    /// Legal only while the entry is pending; the flag gates the approve
    /// action, never reject.
    pub fn set_subject_verification(
        &mut self,
        subject_id: &SubjectId,
        verified: bool,
    ) -> Result<(), ChainError> {
        let entry = self.find_subject_mut(subject_id)?;
        if !entry.decision.status().is_pending() {
            return Err(ChainError::AlreadyDecided {
                stage: Stage::Subject {
                    subject_id: subject_id.clone(),
                },
            });
        }

        entry.requirements_verified = verified;
        self.version += 1;
        Ok(())
    }

    /// Returns every stage that is pending with prerequisites met, in chain
    /// order.
    ///
    /// The subject verification flag is not considered here; it gates only
    /// the approve action, not actionability.
    #[must_use]
    pub fn actionable_stages(&self) -> Vec<Stage> {
        let mut stages: Vec<Stage> = self
            .subject_approvals
            .iter()
            .filter(|entry| entry.decision.status().is_pending())
            .map(|entry| Stage::Subject {
                subject_id: entry.subject_id.clone(),
            })
            .collect();

        for stage in [Stage::MiniProject, Stage::Mentor, Stage::Counsellor, Stage::Hod] {
            let pending = self
                .stage_status(&stage)
                .map(|status| status.is_pending())
                .unwrap_or(false);
            if pending && self.prerequisites_met(&stage) {
                stages.push(stage);
            }
        }

        stages
    }

    /// Returns whether the clearance slip may be produced.
    ///
    /// Restates the full chain rather than trusting the HOD cell alone.
    #[must_use]
    pub fn is_slip_eligible(&self) -> bool {
        self.hod_approval.decision.status().is_approved()
            && self.all_subjects_approved()
            && self.mini_project_approval.decision.status().is_approved()
            && self.mentor_approval.decision.status().is_approved()
            && self.counsellor_approval.decision.status().is_approved()
    }

    /// Returns whether the hall ticket may be handed out.
    #[must_use]
    pub fn is_ticket_issuable(&self) -> bool {
        self.is_slip_eligible() && !self.hall_ticket_distributed
    }

    /// Hands out the hall ticket.
    ///
    /// Fails with `AlreadyIssued` on a second call, leaving the original
    /// distribution timestamp untouched.
    pub fn issue_ticket(&mut self, issued_at: DateTime<Utc>) -> Result<(), ChainError> {
        if self.hall_ticket_distributed {
            return Err(ChainError::AlreadyIssued);
        }

        if !self.is_slip_eligible() {
            return Err(ChainError::PrerequisitesNotMet { stage: Stage::Hod });
        }

        self.hall_ticket_distributed = true;
        self.ticket_distributed_at = Some(issued_at);
        self.version += 1;
        Ok(())
    }

    fn find_subject(&self, subject_id: &SubjectId) -> Result<&SubjectApproval, ChainError> {
        self.subject_approvals
            .iter()
            .find(|entry| &entry.subject_id == subject_id)
            .ok_or_else(|| ChainError::UnknownSubject {
                subject_id: subject_id.clone(),
            })
    }

    fn find_subject_mut(
        &mut self,
        subject_id: &SubjectId,
    ) -> Result<&mut SubjectApproval, ChainError> {
        self.subject_approvals
            .iter_mut()
            .find(|entry| &entry.subject_id == subject_id)
            .ok_or_else(|| ChainError::UnknownSubject {
                subject_id: subject_id.clone(),
            })
    }
}
