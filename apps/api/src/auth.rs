//! Login, logout and account handlers over the server-side session.

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use clearslip_application::{AuthOutcome, RegisterAccountInput};
use clearslip_core::{AppError, PortalRole, UserIdentity};
use tower_sessions::Session;

use crate::dto::{
    AccountCreatedResponse, LoginRequest, RegisterAccountRequest, UserIdentityResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub const SESSION_USER_KEY: &str = "user_identity";

/// POST /api/auth/login - authenticate with email and password.
pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<UserIdentityResponse>> {
    let outcome = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;

    match outcome {
        AuthOutcome::Authenticated(identity) => {
            // Rotate the session id on privilege change.
            session.cycle_id().await.map_err(|error| {
                AppError::Internal(format!("failed to rotate session id: {error}"))
            })?;
            session
                .insert(SESSION_USER_KEY, identity.clone())
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to persist session identity: {error}"))
                })?;

            Ok(Json(UserIdentityResponse::from(identity)))
        }
        AuthOutcome::Failed => {
            Err(AppError::Unauthorized("invalid email or password".to_owned()).into())
        }
    }
}

/// POST /api/auth/logout - end the current session.
pub async fn logout_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<StatusCode> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?;

    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    if let Some(identity) = identity {
        state.auth_service.record_logout(&identity).await?;
    }

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/me - the authenticated user's identity.
pub async fn me_handler(
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<UserIdentityResponse>> {
    Ok(Json(UserIdentityResponse::from(user)))
}

/// POST /api/accounts - register a portal account (admin).
pub async fn register_account_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<RegisterAccountRequest>,
) -> ApiResult<(StatusCode, Json<AccountCreatedResponse>)> {
    let account_id = state
        .auth_service
        .register_account(
            &user,
            RegisterAccountInput {
                email: payload.email,
                display_name: payload.display_name,
                role: payload.role.parse::<PortalRole>()?,
                password: payload.password,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AccountCreatedResponse {
            account_id: account_id.to_string(),
        }),
    ))
}
