use std::sync::Arc;

use clearslip_application::{
    ApprovalService, AuditRepository, AuthService, DirectoryService, IssuanceService,
};
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub approval_service: ApprovalService,
    pub issuance_service: IssuanceService,
    pub directory_service: DirectoryService,
    pub auth_service: AuthService,
    pub audit_repository: Arc<dyn AuditRepository>,
    /// Present only when serving against PostgreSQL; the health check probes
    /// it.
    pub postgres_pool: Option<PgPool>,
    pub frontend_url: String,
}
