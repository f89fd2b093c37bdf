//! Token plumbing for authenticated endpoints.
//!
//! Clients present the token either as `Authorization: Bearer <t>` or in
//! the `gophermart_token` cookie; the bearer header wins when both are
//! present. Successful register/login responses carry the token in both
//! places.

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::state::AppState;

pub const AUTH_COOKIE: &str = "gophermart_token";

/// Authenticated user id, stored in request extensions by `require_auth`.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i64);

fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key.trim() == name).then(|| value.trim().to_string())
    })
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?;
    if raw.len() < 7 || !raw[..7].eq_ignore_ascii_case("bearer ") {
        return None;
    }
    Some(raw[7..].trim().to_string())
}

/// Pulls the auth token out of the request headers.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    extract_bearer(headers).or_else(|| extract_cookie(headers, AUTH_COOKIE))
}

/// Response headers carrying a fresh token: bearer header plus session
/// cookie.
pub fn token_response_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
        headers.insert(AUTHORIZATION, value);
    }
    let cookie = format!("{AUTH_COOKIE}={token}; Path=/; HttpOnly");
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        headers.insert(SET_COOKIE, value);
    }
    headers
}

/// Middleware guarding the authenticated endpoint group.
///
/// Parses the token and confirms the user still exists; a missing user is
/// indistinguishable from an invalid token.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_token(request.headers()) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    let user_id = match state.auth.parse_token(&token) {
        Ok(user_id) => user_id,
        Err(_) => return StatusCode::UNAUTHORIZED.into_response(),
    };

    if state.auth.get_by_id(user_id).await.is_err() {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    request.extensions_mut().insert(AuthUser(user_id));
    next.run(request).await
}
