//! The printable clearance slip projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::approval::{ApprovalRecord, ChainError, Stage, StageStatus};
use crate::student::Student;

/// One sign-off line on the slip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlipLine {
    /// Human-readable stage label, e.g. `Subject: Operating Systems`.
    pub stage_label: String,
    /// Display name of the approver.
    pub approver: String,
    /// Decision state at composition time.
    pub status: StageStatus,
    /// When the stage was decided.
    pub decided_at: Option<DateTime<Utc>>,
}

/// The composed clearance slip for one student.
///
/// Composition requires full-chain completion; the caller surfaces the
/// resulting error to a student whose record is still in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearanceSlip {
    student_name: String,
    roll_no: String,
    usn: String,
    dept_id: String,
    semester: u8,
    hod_decided_at: Option<DateTime<Utc>>,
    lines: Vec<SlipLine>,
}

impl ClearanceSlip {
    /// Composes the slip from a fully approved record.
    pub fn compose(student: &Student, record: &ApprovalRecord) -> Result<Self, ChainError> {
        if !record.is_slip_eligible() {
            return Err(ChainError::PrerequisitesNotMet { stage: Stage::Hod });
        }

        let mut lines: Vec<SlipLine> = record
            .subject_approvals()
            .iter()
            .map(|entry| SlipLine {
                stage_label: format!("Subject: {}", entry.subject_name()),
                approver: entry.teacher_name().to_owned(),
                status: entry.decision().status(),
                decided_at: entry.decision().decided_at(),
            })
            .collect();

        lines.push(SlipLine {
            stage_label: "Mini Project".to_owned(),
            approver: record.mini_project_approval().supervisor_name().to_owned(),
            status: record.mini_project_approval().decision().status(),
            decided_at: record.mini_project_approval().decision().decided_at(),
        });
        lines.push(SlipLine {
            stage_label: "Mentor".to_owned(),
            approver: record.mentor_approval().mentor_name().to_owned(),
            status: record.mentor_approval().decision().status(),
            decided_at: record.mentor_approval().decision().decided_at(),
        });
        lines.push(SlipLine {
            stage_label: "Class Counsellor".to_owned(),
            approver: record.counsellor_approval().counsellor_name().to_owned(),
            status: record.counsellor_approval().decision().status(),
            decided_at: record.counsellor_approval().decision().decided_at(),
        });
        lines.push(SlipLine {
            stage_label: "Head of Department".to_owned(),
            approver: "HOD".to_owned(),
            status: record.hod_approval().decision().status(),
            decided_at: record.hod_approval().decision().decided_at(),
        });

        Ok(Self {
            student_name: student.name().as_str().to_owned(),
            roll_no: student.roll_no().as_str().to_owned(),
            usn: student.usn().as_str().to_owned(),
            dept_id: student.dept_id().as_str().to_owned(),
            semester: student.semester(),
            hod_decided_at: record.hod_approval().decision().decided_at(),
            lines,
        })
    }

    /// Returns the student display name.
    #[must_use]
    pub fn student_name(&self) -> &str {
        self.student_name.as_str()
    }

    /// Returns the college roll number.
    #[must_use]
    pub fn roll_no(&self) -> &str {
        self.roll_no.as_str()
    }

    /// Returns the university seat number.
    #[must_use]
    pub fn usn(&self) -> &str {
        self.usn.as_str()
    }

    /// Returns the department code.
    #[must_use]
    pub fn dept_id(&self) -> &str {
        self.dept_id.as_str()
    }

    /// Returns the semester the clearance covers.
    #[must_use]
    pub fn semester(&self) -> u8 {
        self.semester
    }

    /// Returns when the final HOD decision was taken.
    #[must_use]
    pub fn hod_decided_at(&self) -> Option<DateTime<Utc>> {
        self.hod_decided_at
    }

    /// Returns the per-stage sign-off lines, subjects first.
    #[must_use]
    pub fn lines(&self) -> &[SlipLine] {
        &self.lines
    }
}
