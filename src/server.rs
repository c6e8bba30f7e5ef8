//! HTTP surface: a thin axum adapter over the engine boundary.
//!
//! Handlers translate JSON to engine calls and engine errors to status
//! codes; no workflow logic lives here.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::engine::{Engine, PendingTicket, ReviewDecision, StateView, TurnRequest};
use crate::error::EngineError;
use crate::orders::{Order, OrderStore};

/// Shared server state.
pub struct AppState {
    pub engine: Arc<Engine>,
    pub orders: Arc<dyn OrderStore>,
}

/// Build the router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/triage/invoke", post(triage_invoke))
        .route("/admin/review/{thread_id}", post(admin_review))
        .route("/admin/pending", get(admin_pending))
        .route("/orders/get", get(orders_get))
        .route("/orders/search", get(orders_search))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until the listener fails.
pub async fn serve(state: Arc<AppState>, bind: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(addr = %bind, "listening");
    axum::serve(listener, router(state)).await
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn triage_invoke(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TurnRequest>,
) -> Result<Json<StateView>, (StatusCode, String)> {
    let view = state
        .engine
        .start_or_continue(request)
        .await
        .map_err(engine_error_response)?;
    Ok(Json(view))
}

#[derive(Deserialize)]
struct ReviewBody {
    status: ReviewDecision,
    #[serde(default)]
    feedback: Option<String>,
}

async fn admin_review(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    Json(body): Json<ReviewBody>,
) -> Result<Json<StateView>, (StatusCode, String)> {
    let view = state
        .engine
        .submit_review_decision(&thread_id, body.status, body.feedback)
        .await
        .map_err(engine_error_response)?;
    Ok(Json(view))
}

#[derive(Serialize)]
struct PendingResponse {
    pending_count: usize,
    tickets: Vec<PendingTicket>,
}

async fn admin_pending(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PendingResponse>, (StatusCode, String)> {
    let tickets = state
        .engine
        .pending_reviews()
        .await
        .map_err(engine_error_response)?;
    Ok(Json(PendingResponse {
        pending_count: tickets.len(),
        tickets,
    }))
}

#[derive(Deserialize)]
struct OrdersGetParams {
    order_id: String,
}

async fn orders_get(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OrdersGetParams>,
) -> Result<Json<Order>, (StatusCode, String)> {
    let order = state
        .orders
        .fetch_by_id(&params.order_id)
        .await
        .map_err(|e| (StatusCode::BAD_GATEWAY, e.to_string()))?;
    match order {
        Some(order) => Ok(Json(order)),
        None => Err((StatusCode::NOT_FOUND, "Order not found".to_string())),
    }
}

#[derive(Deserialize)]
struct OrdersSearchParams {
    customer_email: String,
}

#[derive(Serialize)]
struct OrdersSearchResponse {
    results: Vec<Order>,
}

async fn orders_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OrdersSearchParams>,
) -> Result<Json<OrdersSearchResponse>, (StatusCode, String)> {
    let results = state
        .orders
        .search_by_email(&params.customer_email)
        .await
        .map_err(|e| (StatusCode::BAD_GATEWAY, e.to_string()))?;
    Ok(Json(OrdersSearchResponse { results }))
}

fn engine_error_response(error: EngineError) -> (StatusCode, String) {
    let status = match &error {
        EngineError::EmptyTicket | EngineError::InvalidReview { .. } => StatusCode::BAD_REQUEST,
        EngineError::UnknownThread { .. } => StatusCode::NOT_FOUND,
        EngineError::NoPendingReview { .. } => StatusCode::CONFLICT,
        EngineError::OrderStore(_) | EngineError::Store(_) => StatusCode::BAD_GATEWAY,
        EngineError::StepBudgetExceeded { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error.to_string())
}
