//! PostgreSQL-backed audit trail.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::PgPool;

use clearslip_application::{AuditEvent, AuditRepository};
use clearslip_core::{AppError, AppResult};
use clearslip_domain::AuditAction;

/// PostgreSQL implementation of the append-only audit trail port.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AuditEventRow {
    subject: Option<String>,
    action: String,
    resource_type: String,
    resource_id: String,
    detail: Option<String>,
}

impl AuditEventRow {
    fn into_event(self) -> AppResult<AuditEvent> {
        Ok(AuditEvent {
            subject: self.subject,
            action: AuditAction::from_str(self.action.as_str())?,
            resource_type: self.resource_type,
            resource_id: self.resource_id,
            detail: self.detail,
        })
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_events (subject, action, resource_type, resource_id, detail)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(event.subject)
        .bind(event.action.as_str())
        .bind(event.resource_type)
        .bind(event.resource_id)
        .bind(event.detail)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append audit event: {error}")))?;

        Ok(())
    }

    async fn list_recent(&self, limit: i64) -> AppResult<Vec<AuditEvent>> {
        let rows = sqlx::query_as::<_, AuditEventRow>(
            r#"
            SELECT subject, action, resource_type, resource_id, detail
            FROM audit_events
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list audit events: {error}")))?;

        rows.into_iter().map(AuditEventRow::into_event).collect()
    }
}
