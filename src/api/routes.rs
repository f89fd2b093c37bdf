use std::time::Instant;

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::decompression::RequestDecompressionLayer;
use tracing::info;

use super::auth::require_auth;
use super::handlers;
use super::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let authenticated = Router::new()
        .route(
            "/api/user/orders",
            post(handlers::orders::upload).get(handlers::orders::list),
        )
        .route("/api/user/balance", get(handlers::balance::summary))
        .route(
            "/api/user/balance/withdraw",
            post(handlers::balance::withdraw),
        )
        .route("/api/user/withdrawals", get(handlers::balance::withdrawals))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/api/user/register", post(handlers::auth::register))
        .route("/api/user/login", post(handlers::auth::login))
        .merge(authenticated)
        .layer(RequestDecompressionLayer::new().gzip(true))
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

/// Logs one line per request with method, path, status and latency.
async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
        %method,
        path,
        status = response.status().as_u16(),
        latency = ?start.elapsed(),
        "http request"
    );
    response
}
