use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;

use crate::domain::repository::{Clock, OtpRepository};
use crate::error::OtpServiceError;

/// Deletes records whose validity window has closed, used or not.
pub struct SweepExpiredUseCase<R, C>
where
    R: OtpRepository,
    C: Clock,
{
    pub records: R,
    pub clock: C,
}

impl<R, C> SweepExpiredUseCase<R, C>
where
    R: OtpRepository,
    C: Clock,
{
    pub async fn execute(&self) -> Result<u64, OtpServiceError> {
        self.sweep(self.clock.now()).await
    }

    /// Delete every record with `expires_at < now`. Idempotent.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<u64, OtpServiceError> {
        let deleted = self.records.delete_expired_before(now).await?;
        tracing::info!(deleted, cutoff = %now, "swept expired otp records");
        Ok(deleted)
    }
}

/// Run the sweep every `period`, starting immediately. Never returns.
///
/// A failed sweep is logged and retried on the next tick; expired records are
/// already unverifiable, so a missed run only delays cleanup.
pub async fn run_reaper<R, C>(usecase: SweepExpiredUseCase<R, C>, period: Duration)
where
    R: OtpRepository,
    C: Clock,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if let Err(e) = usecase.execute().await {
            tracing::error!(error = ?e, "otp sweep failed");
        }
    }
}
