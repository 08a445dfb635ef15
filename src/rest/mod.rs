// rest/mod.rs — Public REST API server.
//
// Axum HTTP server, local only by default (binds 127.0.0.1).
//
// Endpoints:
//   GET    /api/tasks
//   POST   /api/tasks
//   PATCH  /api/tasks/{id}
//   DELETE /api/tasks/{id}
//   GET    /api/health
//   (anything else) → 404 {"message": "Not found"}

pub mod routes;

use anyhow::Result;
use axum::http::StatusCode;
use axum::{
    routing::{get, patch},
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::AppContext;

pub async fn start_rest_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("REST API listening on http://{}", addr);
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/api/health", get(routes::health::health))
        .route(
            "/api/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/api/tasks/{id}",
            patch(routes::tasks::patch_task).delete(routes::tasks::delete_task),
        )
        .fallback(not_found)
        // The browser UI is served from another origin; no auth, so permissive
        // CORS is safe for a local-only bind.
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "message": "Not found" })))
}
