//! Registration and login endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::api::auth::token_response_headers;
use crate::api::state::AppState;
use crate::api::types::AuthRequest;
use crate::error::GophermartError;

/// POST /api/user/register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(req)) = payload else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    match state.auth.register(&req.login, &req.password).await {
        Ok((_, token)) => (token_response_headers(&token), StatusCode::OK).into_response(),
        Err(GophermartError::InvalidCredentials) => StatusCode::BAD_REQUEST.into_response(),
        Err(GophermartError::AlreadyExists) => StatusCode::CONFLICT.into_response(),
        Err(e) => {
            error!(error = %e, "register failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// POST /api/user/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(req)) = payload else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    match state.auth.authenticate(&req.login, &req.password).await {
        Ok((_, token)) => (token_response_headers(&token), StatusCode::OK).into_response(),
        Err(GophermartError::InvalidCredentials) => StatusCode::UNAUTHORIZED.into_response(),
        Err(e) => {
            error!(error = %e, "login failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
