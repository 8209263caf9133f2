use std::collections::HashMap;

use async_trait::async_trait;
use clearslip_application::ApprovalRepository;
use clearslip_core::{AppError, AppResult};
use clearslip_domain::{ApprovalRecord, StageKind, StudentId};
use tokio::sync::RwLock;

/// In-memory approval record store, used by the seeded standalone mode and
/// by tests.
///
/// Carries the same compare-and-swap save contract as the PostgreSQL
/// adapter: a write only commits when the stored version still equals the
/// caller's expected version.
#[derive(Debug, Default)]
pub struct InMemoryApprovalRepository {
    records: RwLock<HashMap<StudentId, ApprovalRecord>>,
}

impl InMemoryApprovalRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ApprovalRepository for InMemoryApprovalRepository {
    async fn create(&self, record: ApprovalRecord) -> AppResult<()> {
        let mut records = self.records.write().await;

        if records.contains_key(&record.student_id()) {
            return Err(AppError::Conflict(format!(
                "clearance cycle already open for student '{}'",
                record.student_id()
            )));
        }

        records.insert(record.student_id(), record);
        Ok(())
    }

    async fn find(&self, student_id: StudentId) -> AppResult<Option<ApprovalRecord>> {
        Ok(self.records.read().await.get(&student_id).cloned())
    }

    async fn list(&self) -> AppResult<Vec<ApprovalRecord>> {
        let records = self.records.read().await;

        let mut values: Vec<ApprovalRecord> = records.values().cloned().collect();
        values.sort_by_key(ApprovalRecord::student_id);

        Ok(values)
    }

    async fn list_pending(&self, stage_kind: StageKind) -> AppResult<Vec<ApprovalRecord>> {
        let records = self.records.read().await;

        let mut values: Vec<ApprovalRecord> = records
            .values()
            .filter(|record| record.has_pending_stage(stage_kind))
            .cloned()
            .collect();
        values.sort_by_key(ApprovalRecord::student_id);

        Ok(values)
    }

    async fn save(&self, record: ApprovalRecord, expected_version: u64) -> AppResult<()> {
        let mut records = self.records.write().await;

        let stored = records.get(&record.student_id()).ok_or_else(|| {
            AppError::NotFound(format!(
                "no open clearance cycle for student '{}'",
                record.student_id()
            ))
        })?;

        if stored.version() != expected_version {
            return Err(AppError::Conflict(format!(
                "record for student '{}' changed concurrently",
                record.student_id()
            )));
        }

        records.insert(record.student_id(), record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use clearslip_application::ApprovalRepository;
    use clearslip_domain::{
        ApprovalRecord, OpenCycleInput, Stage, StageAction, StageKind, StudentId, SubjectId,
        SubjectSignoff,
    };

    use super::InMemoryApprovalRepository;

    fn open_record(student_id: StudentId) -> ApprovalRecord {
        ApprovalRecord::open(OpenCycleInput {
            student_id,
            subjects: vec![SubjectSignoff {
                subject_id: SubjectId::new("CS301").unwrap_or_else(|_| unreachable!()),
                subject_name: "Operating Systems".to_owned(),
                teacher_name: "Prof. Rao".to_owned(),
            }],
            supervisor_name: "Prof. Iyer".to_owned(),
            mentor_name: "Prof. Menon".to_owned(),
            counsellor_name: "Prof. D'Souza".to_owned(),
        })
        .unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn create_rejects_second_cycle_for_same_student() {
        let repository = InMemoryApprovalRepository::new();
        let student_id = StudentId::new();

        assert!(repository.create(open_record(student_id)).await.is_ok());
        assert!(repository.create(open_record(student_id)).await.is_err());
    }

    #[tokio::test]
    async fn save_rejects_stale_version() {
        let repository = InMemoryApprovalRepository::new();
        let student_id = StudentId::new();
        let record = open_record(student_id);
        assert!(repository.create(record.clone()).await.is_ok());

        let mut mutated = record.clone();
        let subject_id = SubjectId::new("CS301").unwrap_or_else(|_| unreachable!());
        assert!(mutated.set_subject_verification(&subject_id, true).is_ok());

        let committed = repository.save(mutated.clone(), record.version()).await;
        assert!(committed.is_ok());

        // A second writer still holding the original snapshot must lose.
        let stale = repository.save(mutated, record.version()).await;
        assert!(stale.is_err());
    }

    #[tokio::test]
    async fn list_pending_filters_by_stage_family() {
        let repository = InMemoryApprovalRepository::new();
        let student_id = StudentId::new();
        let mut record = open_record(student_id);

        let subject_id = SubjectId::new("CS301").unwrap_or_else(|_| unreachable!());
        assert!(record.set_subject_verification(&subject_id, true).is_ok());
        assert!(
            record
                .decide(&Stage::Subject { subject_id }, StageAction::Approve, Utc::now())
                .is_ok()
        );

        assert!(repository.create(record).await.is_ok());

        let pending_subjects = repository.list_pending(StageKind::Subject).await;
        assert_eq!(pending_subjects.unwrap_or_default().len(), 0);

        let pending_mentor = repository.list_pending(StageKind::Mentor).await;
        assert_eq!(pending_mentor.unwrap_or_default().len(), 1);
    }
}
