use uuid::Uuid;

use crate::domain::repository::{Clock, OtpRepository};
use crate::domain::types::{OtpCode, OtpRecord, VerifiedOtp};
use crate::error::OtpServiceError;
use crate::usecase::code::CodeHasher;

pub struct VerifyOtpInput {
    pub identity: String,
    pub code: OtpCode,
    /// Verify this exact record instead of the identity's latest one.
    pub request_id: Option<Uuid>,
}

/// Checks a submitted code and consumes the record on success.
///
/// Failures are reported in a fixed order and the first one wins:
/// `NotFound`, `Expired`, `InvalidCode`, `AlreadyUsed`.
pub struct VerifyOtpUseCase<R, C>
where
    R: OtpRepository,
    C: Clock,
{
    pub records: R,
    pub clock: C,
    pub hasher: CodeHasher,
}

impl<R, C> VerifyOtpUseCase<R, C>
where
    R: OtpRepository,
    C: Clock,
{
    pub async fn execute(&self, input: VerifyOtpInput) -> Result<VerifiedOtp, OtpServiceError> {
        let identity = input.identity.trim();
        if identity.is_empty() {
            return Err(OtpServiceError::InvalidArgument("identity"));
        }
        if input.code.expose().is_empty() {
            return Err(OtpServiceError::InvalidArgument("code"));
        }

        let record = self
            .resolve(identity, input.request_id)
            .await?
            .ok_or(OtpServiceError::NotFound)?;

        let now = self.clock.now();
        if !record.is_live_at(now) {
            return Err(OtpServiceError::Expired);
        }

        // Malformed input cannot match any issued code; skip the bcrypt round.
        if !input.code.is_well_formed()
            || !self.hasher.verify(&input.code, &record.code_hash).await?
        {
            tracing::info!(otp_id = %record.id, "otp rejected: code mismatch");
            return Err(OtpServiceError::InvalidCode);
        }

        match self.records.mark_used(record.id, now).await {
            Ok(()) => {}
            Err(OtpServiceError::Conflict) => {
                tracing::info!(otp_id = %record.id, "otp rejected: already used");
                return Err(OtpServiceError::AlreadyUsed);
            }
            Err(e) => return Err(e),
        }

        tracing::info!(otp_id = %record.id, "otp verified");
        Ok(VerifiedOtp {
            id: record.id,
            identity: record.identity,
            org_id: record.org_id,
            kind: record.kind,
            verified_at: now,
        })
    }

    /// Only the newest unused record of an identity is reachable by identity.
    /// An older unused record is shadowed while a newer unused one exists and
    /// becomes reachable again once that one is consumed. When nothing unused
    /// is left, the newest record is returned so a replay reports `AlreadyUsed`.
    async fn resolve(
        &self,
        identity: &str,
        request_id: Option<Uuid>,
    ) -> Result<Option<OtpRecord>, OtpServiceError> {
        match request_id {
            Some(id) => Ok(self
                .records
                .get_by_id(id)
                .await?
                .filter(|r| r.identity == identity)),
            None => match self.records.find_latest_valid(identity).await? {
                Some(record) => Ok(Some(record)),
                None => self.records.find_latest(identity).await,
            },
        }
    }
}
