//! PostgreSQL-backed approval record repository.

use async_trait::async_trait;
use sqlx::PgPool;

use clearslip_application::ApprovalRepository;
use clearslip_core::{AppError, AppResult};
use clearslip_domain::{ApprovalRecord, StageKind, StudentId};

/// PostgreSQL implementation of the approval record port.
///
/// Records are stored whole as JSONB with the version counter mirrored into
/// a column; the compare-and-swap save is a conditional `UPDATE` on that
/// column, so a decision taken against a stale snapshot never commits.
#[derive(Clone)]
pub struct PostgresApprovalRepository {
    pool: PgPool,
}

impl PostgresApprovalRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ApprovalRow {
    record: serde_json::Value,
}

impl ApprovalRow {
    fn into_record(self) -> AppResult<ApprovalRecord> {
        serde_json::from_value(self.record).map_err(|error| {
            AppError::Internal(format!("failed to decode approval record: {error}"))
        })
    }
}

fn encode_record(record: &ApprovalRecord) -> AppResult<serde_json::Value> {
    serde_json::to_value(record)
        .map_err(|error| AppError::Internal(format!("failed to encode approval record: {error}")))
}

fn version_as_i64(version: u64) -> AppResult<i64> {
    i64::try_from(version)
        .map_err(|error| AppError::Internal(format!("record version out of range: {error}")))
}

#[async_trait]
impl ApprovalRepository for PostgresApprovalRepository {
    async fn create(&self, record: ApprovalRecord) -> AppResult<()> {
        let payload = encode_record(&record)?;

        sqlx::query(
            r#"
            INSERT INTO approval_records (student_id, version, record)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(record.student_id().as_uuid())
        .bind(version_as_i64(record.version())?)
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if let sqlx::Error::Database(ref database_error) = error
                && database_error.code().as_deref() == Some("23505")
            {
                return AppError::Conflict(format!(
                    "clearance cycle already open for student '{}'",
                    record.student_id()
                ));
            }

            AppError::Internal(format!("failed to create approval record: {error}"))
        })?;

        Ok(())
    }

    async fn find(&self, student_id: StudentId) -> AppResult<Option<ApprovalRecord>> {
        let row = sqlx::query_as::<_, ApprovalRow>(
            r#"
            SELECT record
            FROM approval_records
            WHERE student_id = $1
            LIMIT 1
            "#,
        )
        .bind(student_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find approval record: {error}")))?;

        row.map(ApprovalRow::into_record).transpose()
    }

    async fn list(&self) -> AppResult<Vec<ApprovalRecord>> {
        let rows = sqlx::query_as::<_, ApprovalRow>(
            r#"
            SELECT record
            FROM approval_records
            ORDER BY student_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list approval records: {error}")))?;

        rows.into_iter().map(ApprovalRow::into_record).collect()
    }

    async fn list_pending(&self, stage_kind: StageKind) -> AppResult<Vec<ApprovalRecord>> {
        // The pending-stage predicate is chain logic; evaluate it in the
        // domain rather than encoding the JSONB layout into SQL.
        let records = self.list().await?;

        Ok(records
            .into_iter()
            .filter(|record| record.has_pending_stage(stage_kind))
            .collect())
    }

    async fn save(&self, record: ApprovalRecord, expected_version: u64) -> AppResult<()> {
        let payload = encode_record(&record)?;

        let result = sqlx::query(
            r#"
            UPDATE approval_records
            SET record = $2, version = $3, updated_at = now()
            WHERE student_id = $1 AND version = $4
            "#,
        )
        .bind(record.student_id().as_uuid())
        .bind(payload)
        .bind(version_as_i64(record.version())?)
        .bind(version_as_i64(expected_version)?)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to save approval record: {error}")))?;

        if result.rows_affected() == 0 {
            let exists = sqlx::query_scalar::<_, bool>(
                r#"
                SELECT EXISTS (SELECT 1 FROM approval_records WHERE student_id = $1)
                "#,
            )
            .bind(record.student_id().as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to check approval record: {error}"))
            })?;

            if exists {
                return Err(AppError::Conflict(format!(
                    "record for student '{}' changed concurrently",
                    record.student_id()
                )));
            }

            return Err(AppError::NotFound(format!(
                "no open clearance cycle for student '{}'",
                record.student_id()
            )));
        }

        Ok(())
    }
}
