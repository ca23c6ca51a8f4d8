use std::fmt::Display;

use axum::{Json, http::StatusCode};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

impl Health {
    fn with_status(status: &'static str) -> Self {
        Self {
            status,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Handler for `GET /healthz`. Liveness only; never touches dependencies.
pub async fn healthz() -> Json<Health> {
    Json(Health::with_status("ok"))
}

/// Map a dependency probe into a `GET /readyz` response.
///
/// Services run their own probe (e.g. a database ping) and hand the result here.
pub fn readiness<E: Display>(probe: Result<(), E>) -> (StatusCode, Json<Health>) {
    match probe {
        Ok(()) => (StatusCode::OK, Json(Health::with_status("ready"))),
        Err(e) => {
            tracing::warn!(error = %e, "readiness probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(Health::with_status("unavailable")),
            )
        }
    }
}
