#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::types::{DeliveryOutcome, OtpCode, OtpKind, OtpRecord};
use crate::error::OtpServiceError;

/// Storage for OTP records. The only shared mutable state in the service.
///
/// Implementations must make `mark_used` a linearizable compare-and-set per id
/// and must not implement `delete_expired_before` as read-then-delete.
pub trait OtpRepository: Send + Sync {
    /// Insert a new record. `AlreadyExists` if the id is taken.
    async fn create(&self, record: &OtpRecord) -> Result<(), OtpServiceError>;

    /// Record the delivery outcome. `NotFound` if the record is gone.
    async fn update_status(
        &self,
        id: Uuid,
        outcome: &DeliveryOutcome,
    ) -> Result<(), OtpServiceError>;

    /// Most recently created unused record for `identity`; ties on
    /// `created_at` go to the highest id.
    async fn find_latest_valid(&self, identity: &str)
    -> Result<Option<OtpRecord>, OtpServiceError>;

    /// Most recently created record for `identity`, used or not. Same tie-break.
    async fn find_latest(&self, identity: &str) -> Result<Option<OtpRecord>, OtpServiceError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<OtpRecord>, OtpServiceError>;

    /// Flip `used` false → true and stamp `used_at`.
    /// `Conflict` if already used, `NotFound` if absent.
    async fn mark_used(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), OtpServiceError>;

    /// Delete every record with `expires_at < cutoff`; returns how many went.
    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, OtpServiceError>;
}

/// Out-of-band delivery of a freshly issued code.
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        identity: &str,
        code: &OtpCode,
        kind: OtpKind,
        display_name: &str,
    ) -> anyhow::Result<()>;
}

/// Time source, injected so expiry is deterministic under test.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
