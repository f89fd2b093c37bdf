//! Balance summary, withdrawal and history endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use tracing::error;

use crate::api::auth::AuthUser;
use crate::api::state::AppState;
use crate::api::types::{BalanceResponse, WithdrawRequest, WithdrawalResponse};
use crate::error::GophermartError;

/// GET /api/user/balance
pub async fn summary(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Response {
    match state.balance.summary(user_id).await {
        Ok(summary) => Json(BalanceResponse::from(summary)).into_response(),
        Err(e) => {
            error!(error = %e, "balance summary failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// POST /api/user/balance/withdraw
pub async fn withdraw(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    payload: Result<Json<WithdrawRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(req)) = payload else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    match state.balance.withdraw(user_id, &req.order, req.sum).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(GophermartError::InvalidOrderNumber) | Err(GophermartError::InvalidAmount) => {
            StatusCode::UNPROCESSABLE_ENTITY.into_response()
        }
        Err(GophermartError::InsufficientBalance) => {
            StatusCode::PAYMENT_REQUIRED.into_response()
        }
        Err(e) => {
            error!(error = %e, "withdrawal failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /api/user/withdrawals
pub async fn withdrawals(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Response {
    match state.balance.withdrawals_history(user_id).await {
        Ok(history) if history.is_empty() => StatusCode::NO_CONTENT.into_response(),
        Ok(history) => {
            let response: Vec<WithdrawalResponse> =
                history.into_iter().map(WithdrawalResponse::from).collect();
            Json(response).into_response()
        }
        Err(e) => {
            error!(error = %e, "withdrawal history failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
