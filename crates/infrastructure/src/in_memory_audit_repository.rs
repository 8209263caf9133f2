use async_trait::async_trait;
use clearslip_application::{AuditEvent, AuditRepository};
use clearslip_core::AppResult;
use tokio::sync::RwLock;

/// In-memory append-only audit trail.
#[derive(Debug, Default)]
pub struct InMemoryAuditRepository {
    events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryAuditRepository {
    /// Creates an empty in-memory audit trail.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.write().await.push(event);
        Ok(())
    }

    async fn list_recent(&self, limit: i64) -> AppResult<Vec<AuditEvent>> {
        let events = self.events.read().await;
        let limit = usize::try_from(limit).unwrap_or(0);

        Ok(events.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use clearslip_application::{AuditEvent, AuditRepository};
    use clearslip_domain::AuditAction;

    use super::InMemoryAuditRepository;

    fn event(resource_id: &str) -> AuditEvent {
        AuditEvent {
            subject: Some("tester".to_owned()),
            action: AuditAction::StageApproved,
            resource_type: "approval_record".to_owned(),
            resource_id: resource_id.to_owned(),
            detail: None,
        }
    }

    #[tokio::test]
    async fn list_recent_returns_newest_first() {
        let repository = InMemoryAuditRepository::new();

        for resource_id in ["first", "second", "third"] {
            assert!(repository.append_event(event(resource_id)).await.is_ok());
        }

        let recent = repository.list_recent(2).await.unwrap_or_default();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].resource_id, "third");
        assert_eq!(recent[1].resource_id, "second");
    }
}
