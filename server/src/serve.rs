//! HTTP server setup

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::require_api_key;
use crate::errors::ServerError;
use crate::handlers::{
    delete_handler, deploy_handler, health_handler, list_handler, logs_handler, not_found_handler,
    status_handler, validate_handler,
};
use crate::options::ServerOptions;
use crate::state::ServerState;

/// Build the API router
pub fn router(state: Arc<ServerState>) -> Router {
    let api = Router::new()
        .route("/v1/validate", post(validate_handler))
        .route("/v1/deploy", post(deploy_handler))
        .route("/v1/deployments", get(list_handler))
        .route(
            "/v1/deployments/{id}",
            get(status_handler).delete(delete_handler),
        )
        .route("/v1/deployments/{id}/logs", get(logs_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .merge(api)
        .fallback(not_found_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and start the HTTP server.
///
/// Returns the bound address and the serve task handle.
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(SocketAddr, JoinHandle<Result<(), ServerError>>), ServerError> {
    let app = router(state);

    let addr = format!("{}:{}", options.host, options.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| ServerError::Internal(e.to_string()))?;

    info!("Starting HTTP server on {}", local_addr);

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    });

    Ok((local_addr, handle))
}
