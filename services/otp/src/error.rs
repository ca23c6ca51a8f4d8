use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// OTP service error variants. Each maps to one stable `kind` string.
#[derive(Debug, thiserror::Error)]
pub enum OtpServiceError {
    #[error("{0} is required")]
    InvalidArgument(&'static str),
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    #[error("otp record not found")]
    NotFound,
    #[error("otp has expired")]
    Expired,
    #[error("invalid otp")]
    InvalidCode,
    #[error("otp already used")]
    AlreadyUsed,
    #[error("otp record already exists")]
    AlreadyExists,
    #[error("otp record modified concurrently")]
    Conflict,
    #[error("otp delivery failed")]
    Delivery(#[source] anyhow::Error),
    #[error("otp expiry out of range")]
    InvalidTtl,
    #[error("otp hashing failed")]
    Hashing(#[source] anyhow::Error),
    #[error("persistence error")]
    Persistence(#[from] anyhow::Error),
}

impl OtpServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) | Self::InvalidBody(_) => "INVALID_ARGUMENT",
            Self::NotFound => "NOT_FOUND",
            Self::Expired => "EXPIRED",
            Self::InvalidCode => "INVALID_CODE",
            Self::AlreadyUsed => "ALREADY_USED",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::Conflict => "CONFLICT",
            Self::Delivery(_) => "DELIVERY_FAILED",
            Self::InvalidTtl => "INVALID_TTL",
            Self::Hashing(_) => "HASHING_FAILED",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidArgument(_) | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Expired => StatusCode::GONE,
            Self::InvalidCode => StatusCode::FORBIDDEN,
            Self::AlreadyUsed | Self::AlreadyExists | Self::Conflict => StatusCode::CONFLICT,
            Self::Delivery(_) => StatusCode::BAD_GATEWAY,
            Self::InvalidTtl | Self::Hashing(_) | Self::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for OtpServiceError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for OtpServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        // 4xx are expected client outcomes and already visible in the trace layer.
        // Server-side failures carry an anyhow chain that must be logged here.
        match &self {
            Self::Delivery(e) | Self::Hashing(e) | Self::Persistence(e) => {
                tracing::error!(error = ?e, kind = self.kind(), "otp request failed");
            }
            Self::InvalidTtl => {
                tracing::error!(kind = self.kind(), "otp request failed");
            }
            _ => {}
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
