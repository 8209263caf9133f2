//! Audit trail port shared by application use-cases.

use async_trait::async_trait;
use clearslip_core::AppResult;
use clearslip_domain::AuditAction;

/// One audit trail entry emitted after a successful state change.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Stable identifier of the acting account, if authenticated.
    pub subject: Option<String>,
    /// What happened.
    pub action: AuditAction,
    /// Kind of the touched resource, e.g. `approval_record`.
    pub resource_type: String,
    /// Identifier of the touched resource.
    pub resource_id: String,
    /// Free-form human-readable context.
    pub detail: Option<String>,
}

/// Repository port for the append-only audit trail.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Appends one event to the trail.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;

    /// Returns the most recent events, newest first.
    async fn list_recent(&self, limit: i64) -> AppResult<Vec<AuditEvent>>;
}
