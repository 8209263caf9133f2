use axum::Json;
use axum::extract::{Extension, Path, State};

use clearslip_core::UserIdentity;

use crate::dto::{
    ApprovalRecordResponse, DistributionStatsResponse, SlipResponse, TicketQueueEntryResponse,
    parse_student_id,
};
use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/tickets - slip-eligible records, undistributed first.
pub async fn ticket_queue_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<TicketQueueEntryResponse>>> {
    let entries = state.issuance_service.issuance_queue(&user).await?;

    Ok(Json(
        entries.iter().map(TicketQueueEntryResponse::from).collect(),
    ))
}

/// GET /api/tickets/stats - office dashboard counters.
pub async fn distribution_stats_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<DistributionStatsResponse>> {
    let stats = state.issuance_service.distribution_stats(&user).await?;
    Ok(Json(DistributionStatsResponse::from(stats)))
}

/// POST /api/tickets/{student_id} - hand out the hall ticket.
pub async fn issue_ticket_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(student_id): Path<String>,
) -> ApiResult<Json<ApprovalRecordResponse>> {
    let student_id = parse_student_id(&student_id)?;
    let record = state.issuance_service.issue_ticket(&user, student_id).await?;

    Ok(Json(ApprovalRecordResponse::from(&record)))
}

/// GET /api/slips/{student_id} - the printable clearance slip.
pub async fn slip_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(student_id): Path<String>,
) -> ApiResult<Json<SlipResponse>> {
    let student_id = parse_student_id(&student_id)?;
    let slip = state.issuance_service.slip(&user, student_id).await?;

    Ok(Json(SlipResponse::from(&slip)))
}
