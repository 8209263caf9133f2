use clearslip_application::AuditEvent;
use serde::Serialize;
use ts_rs::TS;

/// One audit trail entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/audit-event-response.ts"
)]
pub struct AuditEventResponse {
    pub subject: Option<String>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub detail: Option<String>,
}

impl From<&AuditEvent> for AuditEventResponse {
    fn from(event: &AuditEvent) -> Self {
        Self {
            subject: event.subject.clone(),
            action: event.action.as_str().to_owned(),
            resource_type: event.resource_type.clone(),
            resource_id: event.resource_id.clone(),
            detail: event.detail.clone(),
        }
    }
}
