//! Order upload and listing endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use tracing::error;

use crate::api::auth::AuthUser;
use crate::api::state::AppState;
use crate::api::types::OrderResponse;
use crate::error::GophermartError;

/// POST /api/user/orders
///
/// Plain-text body holding the order number. 202 for a fresh upload, 200
/// for the owner's repeat, 409 when another user holds the number.
pub async fn upload(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    body: String,
) -> Response {
    let number = body.trim();
    if number.is_empty() {
        return StatusCode::BAD_REQUEST.into_response();
    }

    match state.orders.register(user_id, number).await {
        Ok((_, true)) => StatusCode::ACCEPTED.into_response(),
        Ok((_, false)) => StatusCode::OK.into_response(),
        Err(GophermartError::InvalidOrderNumber) => {
            StatusCode::UNPROCESSABLE_ENTITY.into_response()
        }
        Err(GophermartError::AlreadyExists) => StatusCode::CONFLICT.into_response(),
        Err(e) => {
            error!(error = %e, "order upload failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /api/user/orders
pub async fn list(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Response {
    match state.orders.list_by_user(user_id).await {
        Ok(orders) if orders.is_empty() => StatusCode::NO_CONTENT.into_response(),
        Ok(orders) => {
            let response: Vec<OrderResponse> =
                orders.into_iter().map(OrderResponse::from).collect();
            Json(response).into_response()
        }
        Err(e) => {
            error!(error = %e, "order listing failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
