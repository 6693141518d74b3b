//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, request tracing, a body size
//! limit, and all endpoint handlers.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS: only the origins named in config may call the API.
    let origins: Vec<HeaderValue> = state
        .config
        .general
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/threads",
            post(handlers::create_thread).get(handlers::list_threads),
        )
        .route(
            "/threads/{id}",
            get(handlers::get_thread)
                .put(handlers::update_thread)
                .delete(handlers::delete_thread),
        )
        .route(
            "/threads/{id}/messages",
            post(handlers::send_message).get(handlers::list_messages),
        )
        .route("/threads/{id}/history", get(handlers::get_history))
        // Largest accepted body is a 10k-char message; 64KB leaves headroom.
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the configured address.
pub async fn start_server(
    state: AppState,
) -> Result<(), colloquy_core::error::ColloquyError> {
    let addr = format!(
        "{}:{}",
        state.config.general.host, state.config.general.port
    );

    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| colloquy_core::error::ColloquyError::Api(format!("Failed to bind: {}", e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| colloquy_core::error::ColloquyError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
