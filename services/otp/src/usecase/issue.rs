use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::repository::{Clock, Notifier, OtpRepository};
use crate::domain::types::{
    DEFAULT_DISPLAY_NAME, DeliveryOutcome, DeliveryStatus, OtpKind, OtpRecord,
};
use crate::error::OtpServiceError;
use crate::usecase::code::{CodeHasher, generate_code};

pub struct IssueOtpInput {
    /// Id of the originating request; becomes the record id. Fresh UUIDv7 when absent.
    pub request_id: Option<Uuid>,
    pub identity: String,
    pub org_id: String,
    pub display_name: Option<String>,
    pub kind: Option<OtpKind>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueOtpOutput {
    pub id: Uuid,
    pub expires_at: DateTime<Utc>,
}

pub struct IssueOtpUseCase<R, N, C>
where
    R: OtpRepository,
    N: Notifier,
    C: Clock,
{
    pub records: R,
    pub notifier: N,
    pub clock: C,
    pub hasher: CodeHasher,
    pub ttl: Duration,
}

impl<R, N, C> IssueOtpUseCase<R, N, C>
where
    R: OtpRepository,
    N: Notifier,
    C: Clock,
{
    pub async fn execute(&self, input: IssueOtpInput) -> Result<IssueOtpOutput, OtpServiceError> {
        let identity = input.identity.trim();
        if identity.is_empty() {
            return Err(OtpServiceError::InvalidArgument("identity"));
        }
        if input.org_id.trim().is_empty() {
            return Err(OtpServiceError::InvalidArgument("org_id"));
        }
        let kind = input.kind.unwrap_or_default();
        let display_name = input
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_DISPLAY_NAME);

        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or(OtpServiceError::InvalidTtl)?;

        // 1. Code + hash; the plaintext stays on this stack frame only.
        let code = generate_code();
        let code_hash = self.hasher.hash(&code).await?;

        // 2. Persist as pending.
        let record = OtpRecord {
            id: input.request_id.unwrap_or_else(Uuid::now_v7),
            identity: identity.to_owned(),
            org_id: input.org_id,
            code_hash,
            kind,
            status: DeliveryStatus::Pending,
            used: false,
            used_at: None,
            sent_at: None,
            failed_at: None,
            error: None,
            created_at: now,
            expires_at,
        };
        self.records.create(&record).await?;
        tracing::info!(otp_id = %record.id, identity, kind = %kind, "otp issued");

        // 3. Exactly one delivery attempt, no store state held across it.
        match self
            .notifier
            .send(identity, &code, kind, display_name)
            .await
        {
            Ok(()) => {
                let outcome = DeliveryOutcome::Sent {
                    at: self.clock.now(),
                };
                self.records.update_status(record.id, &outcome).await?;
                tracing::info!(otp_id = %record.id, "otp delivered");
                Ok(IssueOtpOutput {
                    id: record.id,
                    expires_at: record.expires_at,
                })
            }
            Err(e) => {
                tracing::warn!(otp_id = %record.id, error = %e, "otp delivery failed");
                let outcome = DeliveryOutcome::Failed {
                    at: self.clock.now(),
                    error: e.to_string(),
                };
                if let Err(status_err) = self.records.update_status(record.id, &outcome).await {
                    tracing::error!(
                        otp_id = %record.id,
                        error = %status_err,
                        "failed to record otp delivery failure"
                    );
                }
                Err(OtpServiceError::Delivery(e))
            }
        }
    }
}
