//! Application service for slip composition and hall-ticket issuance.

use std::sync::Arc;

use chrono::Utc;
use clearslip_core::{AppError, AppResult, PortalRole, UserIdentity};
use clearslip_domain::{
    ApprovalRecord, AuditAction, ClearanceSlip, Student, StudentId,
};

use crate::approval_ports::ApprovalRepository;
use crate::audit_ports::{AuditEvent, AuditRepository};
use crate::directory_ports::StudentRepository;
use crate::role_gate::require_any_portal_role;

const MAX_SAVE_ATTEMPTS: usize = 4;

/// One row in the office issuance queue.
#[derive(Debug, Clone)]
pub struct TicketQueueEntry {
    /// The student awaiting (or holding) a hall ticket.
    pub student: Student,
    /// Their completed approval record.
    pub record: ApprovalRecord,
}

/// Office dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistributionStats {
    /// Open clearance records in total.
    pub total_records: u64,
    /// Records with the full chain approved.
    pub approved_slips: u64,
    /// Hall tickets already handed out.
    pub tickets_distributed: u64,
    /// Approved slips still awaiting distribution.
    pub pending_distribution: u64,
}

/// Application service behind the office screens and the student slip view.
#[derive(Clone)]
pub struct IssuanceService {
    approval_repository: Arc<dyn ApprovalRepository>,
    student_repository: Arc<dyn StudentRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl IssuanceService {
    /// Creates the service from repository implementations.
    #[must_use]
    pub fn new(
        approval_repository: Arc<dyn ApprovalRepository>,
        student_repository: Arc<dyn StudentRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            approval_repository,
            student_repository,
            audit_repository,
        }
    }

    /// Lists slip-eligible records joined with student identity,
    /// undistributed tickets first.
    pub async fn issuance_queue(&self, actor: &UserIdentity) -> AppResult<Vec<TicketQueueEntry>> {
        require_any_portal_role(actor, &[PortalRole::Office, PortalRole::Admin])?;

        let mut entries = Vec::new();
        for record in self.approval_repository.list().await? {
            if !record.is_slip_eligible() {
                continue;
            }

            let Some(student) = self.student_repository.find(record.student_id()).await? else {
                // A record without a directory entry is surfaced nowhere
                // else; skip rather than fail the whole queue.
                continue;
            };

            entries.push(TicketQueueEntry { student, record });
        }

        entries.sort_by_key(|entry| {
            (
                entry.record.hall_ticket_distributed(),
                entry.student.roll_no().as_str().to_owned(),
            )
        });

        Ok(entries)
    }

    /// Hands out the hall ticket for one student.
    pub async fn issue_ticket(
        &self,
        actor: &UserIdentity,
        student_id: StudentId,
    ) -> AppResult<ApprovalRecord> {
        require_any_portal_role(actor, &[PortalRole::Office, PortalRole::Admin])?;

        for _ in 0..MAX_SAVE_ATTEMPTS {
            let mut record = self.require_record(student_id).await?;
            let expected_version = record.version();

            record.issue_ticket(Utc::now())?;

            match self
                .approval_repository
                .save(record.clone(), expected_version)
                .await
            {
                Ok(()) => {
                    self.audit_repository
                        .append_event(AuditEvent {
                            subject: Some(actor.subject().to_owned()),
                            action: AuditAction::TicketIssued,
                            resource_type: "approval_record".to_owned(),
                            resource_id: student_id.to_string(),
                            detail: None,
                        })
                        .await?;

                    return Ok(record);
                }
                Err(AppError::Conflict(_)) => continue,
                Err(error) => return Err(error),
            }
        }

        Err(AppError::Conflict(format!(
            "record for student '{student_id}' kept changing concurrently; retry the issuance"
        )))
    }

    /// Computes the office dashboard counters.
    pub async fn distribution_stats(&self, actor: &UserIdentity) -> AppResult<DistributionStats> {
        require_any_portal_role(actor, &[PortalRole::Office, PortalRole::Admin])?;

        let records = self.approval_repository.list().await?;
        let total_records = records.len() as u64;
        let approved_slips = records
            .iter()
            .filter(|record| record.is_slip_eligible())
            .count() as u64;
        let tickets_distributed = records
            .iter()
            .filter(|record| record.hall_ticket_distributed())
            .count() as u64;

        Ok(DistributionStats {
            total_records,
            approved_slips,
            tickets_distributed,
            pending_distribution: approved_slips.saturating_sub(tickets_distributed),
        })
    }

    /// Composes the printable clearance slip for one student.
    ///
    /// Students fetch their own slip; office and admin accounts fetch any.
    pub async fn slip(
        &self,
        actor: &UserIdentity,
        student_id: StudentId,
    ) -> AppResult<ClearanceSlip> {
        let student = self
            .student_repository
            .find(student_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("student '{student_id}'")))?;

        if actor.has_role(PortalRole::Student) {
            if student.email().as_str() != actor.email() {
                return Err(AppError::Forbidden(
                    "students may only read their own slip".to_owned(),
                ));
            }
        } else {
            require_any_portal_role(actor, &[PortalRole::Office, PortalRole::Admin])?;
        }

        let record = self.require_record(student_id).await?;
        Ok(ClearanceSlip::compose(&student, &record)?)
    }

    async fn require_record(&self, student_id: StudentId) -> AppResult<ApprovalRecord> {
        self.approval_repository
            .find(student_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("no open clearance cycle for student '{student_id}'"))
            })
    }
}
