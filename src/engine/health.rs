// Mdm Teo — Liveness Endpoint
//
// Keeps hosting platforms happy. Read-only: reports the number of known
// group chats and nothing else.

use crate::atoms::error::EngineResult;
use axum::{extract::State, routing::get, Json, Router};
use log::info;
use mdmteo_core::ChatStore;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct HealthReport {
    pub ok: bool,
    pub chats: usize,
}

pub fn router(store: Arc<ChatStore>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .with_state(store)
}

async fn index(State(store): State<Arc<ChatStore>>) -> String {
    format!("Mdm Teo is awake. Watching {} group chats.", store.known_chats())
}

async fn health(State(store): State<Arc<ChatStore>>) -> Json<HealthReport> {
    Json(HealthReport { ok: true, chats: store.known_chats() })
}

/// Bind and serve until the task is dropped.
pub async fn serve(bind_address: &str, port: u16, store: Arc<ChatStore>) -> EngineResult<()> {
    let listener = tokio::net::TcpListener::bind((bind_address, port)).await?;
    info!("[health] Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(store)).await?;
    Ok(())
}
