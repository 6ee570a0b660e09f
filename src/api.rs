//! REST API for the currency exchange dialogue
//!
//! Feeds the same dispatcher as the Telegram transport, so the whole
//! conversation can be driven over HTTP.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::dispatch::DispatchHandle;
use crate::models::{ConversationId, EventKind, InboundEvent, OutboundMessage};

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EventRequest {
    pub conversation_id: Option<String>,
    pub kind: EventKind,
    pub payload: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventResponse {
    pub conversation_id: ConversationId,
    pub messages: Vec<OutboundMessage>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub dispatcher: DispatchHandle,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Event Endpoint
/// =============================

async fn submit_event(
    State(state): State<ApiState>,
    Json(req): Json<EventRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let conversation_id = match req.conversation_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => ConversationId::new(id),
        _ => ConversationId::new(uuid::Uuid::new_v4().to_string()),
    };

    let payload = match req.kind {
        // Accept both "start" and "/start"
        EventKind::Command => req.payload.trim().trim_start_matches('/').to_ascii_lowercase(),
        EventKind::Button | EventKind::Text => req.payload,
    };

    info!(
        conversation_id = %conversation_id,
        kind = ?req.kind,
        "Received dialogue event"
    );

    let event = InboundEvent {
        conversation_id: conversation_id.clone(),
        kind: req.kind,
        payload,
    };

    match state.dispatcher.submit(event).await {
        Ok(messages) => (
            StatusCode::OK,
            Json(ApiResponse::success(EventResponse {
                conversation_id,
                messages,
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::error(format!("Event dispatch failed: {}", e))),
        ),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(dispatcher: DispatchHandle) -> Router {
    let state = ApiState { dispatcher };

    Router::new()
        .route("/health", axum::routing::get(health))
        .route("/api/events", post(submit_event))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    dispatcher: DispatchHandle,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(dispatcher);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
