//! `GET /healthz` — process liveness and active-session count.
//!
//! Not part of the telephony protocol; for an external load balancer or
//! orchestrator to probe.

use axum::extract::State;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    active_sessions: usize,
}

pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    let active_sessions = state.registry.len().await;
    axum::Json(HealthBody {
        status: "ok",
        active_sessions,
    })
}
