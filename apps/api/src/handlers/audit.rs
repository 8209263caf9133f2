use axum::Json;
use axum::extract::{Extension, Query, State};
use clearslip_core::{AppError, PortalRole, UserIdentity};
use serde::Deserialize;

use crate::dto::AuditEventResponse;
use crate::error::ApiResult;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    pub limit: Option<i64>,
}

/// GET /api/audit - the most recent audit events (admin).
pub async fn audit_log_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<AuditLogQuery>,
) -> ApiResult<Json<Vec<AuditEventResponse>>> {
    if !user.has_role(PortalRole::Admin) {
        return Err(
            AppError::Forbidden("the audit log requires the admin portal role".to_owned()).into(),
        );
    }

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let events = state.audit_repository.list_recent(limit).await?;

    Ok(Json(events.iter().map(AuditEventResponse::from).collect()))
}
