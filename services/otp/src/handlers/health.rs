use axum::{Json, extract::State, http::StatusCode};

use otpgate_core::health::{Health, readiness};

use crate::state::AppState;

/// `GET /readyz`: ready once the database answers a ping.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<Health>) {
    readiness(state.db.ping().await)
}
