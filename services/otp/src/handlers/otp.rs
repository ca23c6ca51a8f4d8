use axum::{
    Json,
    extract::{FromRequest, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use otpgate_core::serde::to_rfc3339_ms;

use crate::domain::types::{OtpCode, OtpKind};
use crate::error::OtpServiceError;
use crate::state::AppState;
use crate::usecase::issue::IssueOtpInput;
use crate::usecase::verify::VerifyOtpInput;

/// `Json` whose rejections render as the service's `{kind, message}` body.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(OtpServiceError))]
pub struct JsonBody<T>(pub T);

// ── POST /otp/requests ────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct IssueOtpRequest {
    pub request_id: Option<Uuid>,
    #[serde(alias = "email", default)]
    pub identity: String,
    #[serde(default)]
    pub org_id: String,
    pub display_name: Option<String>,
    pub kind: Option<OtpKind>,
}

#[derive(Serialize)]
pub struct IssueOtpResponse {
    pub id: Uuid,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub expires_at: DateTime<Utc>,
}

pub async fn issue_otp(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<IssueOtpRequest>,
) -> Result<(StatusCode, Json<IssueOtpResponse>), OtpServiceError> {
    let output = state
        .issue_usecase()
        .execute(IssueOtpInput {
            request_id: body.request_id,
            identity: body.identity,
            org_id: body.org_id,
            display_name: body.display_name,
            kind: body.kind,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(IssueOtpResponse {
            id: output.id,
            expires_at: output.expires_at,
        }),
    ))
}

// ── POST /otp/verify ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(alias = "email", default)]
    pub identity: String,
    #[serde(alias = "otp", default)]
    pub code: String,
    pub request_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct VerifyOtpResponse {
    pub success: bool,
    pub message: &'static str,
}

pub async fn verify_otp(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, OtpServiceError> {
    state
        .verify_usecase()
        .execute(VerifyOtpInput {
            identity: body.identity,
            code: OtpCode::new(body.code),
            request_id: body.request_id,
        })
        .await?;
    Ok(Json(VerifyOtpResponse {
        success: true,
        message: "OTP verified successfully",
    }))
}
