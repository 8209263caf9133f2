//! Stage capabilities: what one acting faculty member may sign off.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::approval::{ApprovalRecord, Stage};
use crate::catalog::SubjectId;
use crate::student::StudentId;

/// One authorization a faculty role grants over the approval chain.
///
/// Each variant carries the data that scopes it, so the gate is a plain
/// capability check with no role-name dispatch. A member holding several
/// roles carries one capability per role, evaluated independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StageCapability {
    /// May sign off subject entries for the owned subject codes.
    SubjectTeacher {
        /// Subject codes the teacher owns.
        subject_ids: BTreeSet<SubjectId>,
    },
    /// May sign off the mini-project stage for the listed students.
    ///
    /// Derived from the student directory: the records of supervised
    /// students name this member as mini-project supervisor.
    MiniProjectSupervisor {
        /// Students whose mini-project this member supervises.
        supervised_student_ids: BTreeSet<StudentId>,
    },
    /// May sign off the mentor stage for the listed mentees.
    Mentor {
        /// Students assigned to this mentor.
        mentee_ids: BTreeSet<StudentId>,
    },
    /// May sign off the counsellor stage on any record.
    ///
    /// Deliberately unscoped, matching the observed behavior; a real
    /// deployment would scope this by division or batch.
    ClassCounsellor,
    /// May sign off the HOD stage once the counsellor stage is approved.
    Hod,
}

impl StageCapability {
    /// Returns whether this capability covers acting on `stage` of `record`.
    #[must_use]
    pub fn authorizes(&self, record: &ApprovalRecord, stage: &Stage) -> bool {
        match (self, stage) {
            (Self::SubjectTeacher { subject_ids }, Stage::Subject { subject_id }) => {
                subject_ids.contains(subject_id)
                    && record
                        .subject_approvals()
                        .iter()
                        .any(|entry| entry.subject_id() == subject_id)
            }
            (
                Self::MiniProjectSupervisor {
                    supervised_student_ids,
                },
                Stage::MiniProject,
            ) => supervised_student_ids.contains(&record.student_id()),
            (Self::Mentor { mentee_ids }, Stage::Mentor) => {
                mentee_ids.contains(&record.student_id())
            }
            (Self::ClassCounsellor, Stage::Counsellor) => true,
            (Self::Hod, Stage::Hod) => record
                .counsellor_approval()
                .decision()
                .status()
                .is_approved(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;

    use super::StageCapability;
    use crate::approval::{ApprovalRecord, OpenCycleInput, Stage, StageAction, SubjectSignoff};
    use crate::catalog::SubjectId;
    use crate::student::StudentId;

    fn subject_id(code: &str) -> SubjectId {
        SubjectId::new(code).unwrap_or_else(|_| unreachable!())
    }

    fn record_for(student_id: StudentId) -> ApprovalRecord {
        ApprovalRecord::open(OpenCycleInput {
            student_id,
            subjects: vec![SubjectSignoff {
                subject_id: subject_id("CS301"),
                subject_name: "Operating Systems".to_owned(),
                teacher_name: "Prof. Rao".to_owned(),
            }],
            supervisor_name: "Prof. Iyer".to_owned(),
            mentor_name: "Prof. Menon".to_owned(),
            counsellor_name: "Prof. D'Souza".to_owned(),
        })
        .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn subject_teacher_is_scoped_to_owned_subjects() {
        let record = record_for(StudentId::new());
        let capability = StageCapability::SubjectTeacher {
            subject_ids: BTreeSet::from([subject_id("CS301")]),
        };

        assert!(capability.authorizes(
            &record,
            &Stage::Subject {
                subject_id: subject_id("CS301")
            }
        ));
        assert!(!capability.authorizes(
            &record,
            &Stage::Subject {
                subject_id: subject_id("EE204")
            }
        ));
        assert!(!capability.authorizes(&record, &Stage::Mentor));
    }

    #[test]
    fn mentor_is_scoped_to_mentees() {
        let mentee = StudentId::new();
        let record = record_for(mentee);
        let capability = StageCapability::Mentor {
            mentee_ids: BTreeSet::from([mentee]),
        };

        assert!(capability.authorizes(&record, &Stage::Mentor));

        let other = record_for(StudentId::new());
        assert!(!capability.authorizes(&other, &Stage::Mentor));
    }

    #[test]
    fn hod_requires_counsellor_sign_off_first() {
        let mut record = record_for(StudentId::new());
        let capability = StageCapability::Hod;
        assert!(!capability.authorizes(&record, &Stage::Hod));

        // Walk the chain up to the counsellor decision.
        let id = subject_id("CS301");
        let _ = record.set_subject_verification(&id, true);
        let _ = record.decide(
            &Stage::Subject { subject_id: id },
            StageAction::Approve,
            Utc::now(),
        );
        for stage in [Stage::MiniProject, Stage::Mentor, Stage::Counsellor] {
            let _ = record.decide(&stage, StageAction::Approve, Utc::now());
        }

        assert!(capability.authorizes(&record, &Stage::Hod));
    }
}
