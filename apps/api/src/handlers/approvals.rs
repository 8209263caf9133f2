use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use clearslip_application::VerifySubjectInput;
use clearslip_core::UserIdentity;
use clearslip_domain::{StageKind, SubjectId};

use crate::dto::{
    ApprovalRecordResponse, DecideStageRequest, VerifySubjectRequest, parse_student_id,
};
use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/approvals - every open record, for HOD review.
pub async fn approval_history_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<ApprovalRecordResponse>>> {
    let records = state.approval_service.approval_history(&user).await?;

    Ok(Json(
        records.iter().map(ApprovalRecordResponse::from).collect(),
    ))
}

/// GET /api/approvals/queue/{stage_kind} - records the acting faculty
/// member may decide at that stage family.
pub async fn pending_queue_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(stage_kind): Path<String>,
) -> ApiResult<Json<Vec<ApprovalRecordResponse>>> {
    let stage_kind = StageKind::from_str(stage_kind.as_str())?;
    let records = state.approval_service.pending_queue(&user, stage_kind).await?;

    Ok(Json(
        records.iter().map(ApprovalRecordResponse::from).collect(),
    ))
}

/// GET /api/approvals/{student_id} - one student's record.
pub async fn get_record_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(student_id): Path<String>,
) -> ApiResult<Json<ApprovalRecordResponse>> {
    let student_id = parse_student_id(&student_id)?;
    let record = state
        .approval_service
        .record_for_student(&user, student_id)
        .await?;

    Ok(Json(ApprovalRecordResponse::from(&record)))
}

/// GET /api/me/approval - the acting student's own record.
pub async fn my_record_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<ApprovalRecordResponse>> {
    let record = state.approval_service.my_record(&user).await?;
    Ok(Json(ApprovalRecordResponse::from(&record)))
}

/// POST /api/approvals/{student_id} - open a clearance cycle (admin).
pub async fn open_cycle_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(student_id): Path<String>,
) -> ApiResult<(StatusCode, Json<ApprovalRecordResponse>)> {
    let student_id = parse_student_id(&student_id)?;
    let record = state.approval_service.open_cycle(&user, student_id).await?;

    Ok((StatusCode::CREATED, Json(ApprovalRecordResponse::from(&record))))
}

/// POST /api/approvals/{student_id}/decisions - apply one stage decision.
pub async fn decide_stage_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(student_id): Path<String>,
    Json(payload): Json<DecideStageRequest>,
) -> ApiResult<Json<ApprovalRecordResponse>> {
    let student_id = parse_student_id(&student_id)?;
    let record = state
        .approval_service
        .decide_stage(&user, payload.into_input(student_id)?)
        .await?;

    Ok(Json(ApprovalRecordResponse::from(&record)))
}

/// PUT /api/approvals/{student_id}/subjects/{subject_id}/verification -
/// record the out-of-band requirement check for one subject entry.
pub async fn verify_subject_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((student_id, subject_id)): Path<(String, String)>,
    Json(payload): Json<VerifySubjectRequest>,
) -> ApiResult<Json<ApprovalRecordResponse>> {
    let record = state
        .approval_service
        .verify_subject_requirement(
            &user,
            VerifySubjectInput {
                student_id: parse_student_id(&student_id)?,
                subject_id: SubjectId::new(subject_id)?,
                verified: payload.verified,
            },
        )
        .await?;

    Ok(Json(ApprovalRecordResponse::from(&record)))
}
