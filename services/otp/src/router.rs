use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;

use otpgate_core::health::healthz;
use otpgate_core::middleware::{propagate_request_id_layer, request_id_layer, trace_layer};

use crate::handlers::{
    health::readyz,
    otp::{issue_otp, verify_otp},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // OTP
        .route("/otp/requests", post(issue_otp))
        .route("/otp/verify", post(verify_otp))
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(trace_layer())
                .layer(propagate_request_id_layer()),
        )
        .with_state(state)
}
