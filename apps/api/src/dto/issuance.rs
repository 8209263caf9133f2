use clearslip_application::{DistributionStats, TicketQueueEntry};
use clearslip_domain::{ClearanceSlip, SlipLine};
use serde::Serialize;
use ts_rs::TS;

use super::approvals::{ApprovalRecordResponse, timestamp};
use super::directory::StudentResponse;

/// One row in the office issuance queue.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/ticket-queue-entry-response.ts"
)]
pub struct TicketQueueEntryResponse {
    pub student: StudentResponse,
    pub record: ApprovalRecordResponse,
}

impl From<&TicketQueueEntry> for TicketQueueEntryResponse {
    fn from(entry: &TicketQueueEntry) -> Self {
        Self {
            student: StudentResponse::from(&entry.student),
            record: ApprovalRecordResponse::from(&entry.record),
        }
    }
}

/// Office dashboard counters.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/distribution-stats-response.ts"
)]
pub struct DistributionStatsResponse {
    pub total_records: u64,
    pub approved_slips: u64,
    pub tickets_distributed: u64,
    pub pending_distribution: u64,
}

impl From<DistributionStats> for DistributionStatsResponse {
    fn from(stats: DistributionStats) -> Self {
        Self {
            total_records: stats.total_records,
            approved_slips: stats.approved_slips,
            tickets_distributed: stats.tickets_distributed,
            pending_distribution: stats.pending_distribution,
        }
    }
}

/// One sign-off line on the printable slip.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/slip-line-response.ts"
)]
pub struct SlipLineResponse {
    pub stage_label: String,
    pub approver: String,
    pub status: String,
    pub decided_at: Option<String>,
}

impl From<&SlipLine> for SlipLineResponse {
    fn from(line: &SlipLine) -> Self {
        Self {
            stage_label: line.stage_label.clone(),
            approver: line.approver.clone(),
            status: line.status.as_str().to_owned(),
            decided_at: timestamp(line.decided_at),
        }
    }
}

/// The composed clearance slip.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/slip-response.ts"
)]
pub struct SlipResponse {
    pub student_name: String,
    pub roll_no: String,
    pub usn: String,
    pub dept_id: String,
    pub semester: u8,
    pub hod_decided_at: Option<String>,
    pub lines: Vec<SlipLineResponse>,
}

impl From<&ClearanceSlip> for SlipResponse {
    fn from(slip: &ClearanceSlip) -> Self {
        Self {
            student_name: slip.student_name().to_owned(),
            roll_no: slip.roll_no().to_owned(),
            usn: slip.usn().to_owned(),
            dept_id: slip.dept_id().to_owned(),
            semester: slip.semester(),
            hod_decided_at: timestamp(slip.hod_decided_at()),
            lines: slip.lines().iter().map(SlipLineResponse::from).collect(),
        }
    }
}
