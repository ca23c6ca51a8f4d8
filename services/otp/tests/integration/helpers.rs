use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use otpgate_otp::domain::repository::{Clock, Notifier, OtpRepository};
use otpgate_otp::domain::types::{
    DeliveryOutcome, DeliveryStatus, OTP_TTL_SECS, OtpCode, OtpKind, OtpRecord,
};
use otpgate_otp::error::OtpServiceError;
use otpgate_otp::usecase::code::CodeHasher;
use otpgate_otp::usecase::issue::{IssueOtpInput, IssueOtpUseCase};
use otpgate_otp::usecase::sweep::SweepExpiredUseCase;
use otpgate_otp::usecase::verify::{VerifyOtpInput, VerifyOtpUseCase};

// ── MemoryOtpRepo ────────────────────────────────────────────────────────────

/// In-memory store. Clones share the same records, so a test can keep one
/// handle for inspection while use cases own the others.
#[derive(Clone, Default)]
pub struct MemoryOtpRepo {
    pub records: Arc<Mutex<Vec<OtpRecord>>>,
    pub fail_writes: bool,
    pub sweep_calls: Arc<AtomicUsize>,
}

impl MemoryOtpRepo {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every write and sweep fails with a persistence error.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn snapshot(&self, id: Uuid) -> Option<OtpRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn insert(&self, record: OtpRecord) {
        self.records.lock().unwrap().push(record);
    }

    fn check_writable(&self) -> Result<(), OtpServiceError> {
        if self.fail_writes {
            return Err(anyhow::anyhow!("store unavailable").into());
        }
        Ok(())
    }

    fn latest_matching(&self, pred: impl Fn(&OtpRecord) -> bool) -> Option<OtpRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| pred(r))
            .max_by_key(|r| r.recency_key())
            .cloned()
    }
}

impl OtpRepository for MemoryOtpRepo {
    async fn create(&self, record: &OtpRecord) -> Result<(), OtpServiceError> {
        self.check_writable()?;
        let mut records = self.records.lock().unwrap();
        if records.iter().any(|r| r.id == record.id) {
            return Err(OtpServiceError::AlreadyExists);
        }
        records.push(record.clone());
        Ok(())
    }

    async fn update_status(
        &self,
        id: Uuid,
        outcome: &DeliveryOutcome,
    ) -> Result<(), OtpServiceError> {
        self.check_writable()?;
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(OtpServiceError::NotFound)?;
        record.status = outcome.status();
        match outcome {
            DeliveryOutcome::Sent { at } => record.sent_at = Some(*at),
            DeliveryOutcome::Failed { at, error } => {
                record.failed_at = Some(*at);
                record.error = Some(error.clone());
            }
        }
        Ok(())
    }

    async fn find_latest_valid(
        &self,
        identity: &str,
    ) -> Result<Option<OtpRecord>, OtpServiceError> {
        Ok(self.latest_matching(|r| r.identity == identity && !r.used))
    }

    async fn find_latest(&self, identity: &str) -> Result<Option<OtpRecord>, OtpServiceError> {
        Ok(self.latest_matching(|r| r.identity == identity))
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<OtpRecord>, OtpServiceError> {
        Ok(self.snapshot(id))
    }

    async fn mark_used(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), OtpServiceError> {
        self.check_writable()?;
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(OtpServiceError::NotFound)?;
        if record.used {
            return Err(OtpServiceError::Conflict);
        }
        record.used = true;
        record.used_at = Some(at);
        Ok(())
    }

    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, OtpServiceError> {
        self.sweep_calls.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.expires_at >= cutoff);
        Ok((before - records.len()) as u64)
    }
}

// ── MockNotifier ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Delivered {
    pub identity: String,
    pub code: String,
    pub kind: OtpKind,
    pub display_name: String,
}

#[derive(Clone, Default)]
pub struct MockNotifier {
    pub delivered: Arc<Mutex<Vec<Delivered>>>,
    pub attempts: Arc<AtomicUsize>,
    pub fail: bool,
}

impl MockNotifier {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Plaintext of the most recently delivered code.
    pub fn last_code(&self) -> OtpCode {
        let delivered = self.delivered.lock().unwrap();
        OtpCode::new(delivered.last().expect("no code delivered").code.clone())
    }
}

impl Notifier for MockNotifier {
    async fn send(
        &self,
        identity: &str,
        code: &OtpCode,
        kind: OtpKind,
        display_name: &str,
    ) -> anyhow::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("mail relay returned 503");
        }
        self.delivered.lock().unwrap().push(Delivered {
            identity: identity.to_owned(),
            code: code.expose().to_owned(),
            kind,
            display_name: display_name.to_owned(),
        });
        Ok(())
    }
}

// ── TestClock ────────────────────────────────────────────────────────────────

/// Manually driven clock; `at(s)` is `s` seconds after a fixed epoch.
#[derive(Clone)]
pub struct TestClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl TestClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(t0())),
        }
    }

    pub fn set(&self, secs: i64) {
        *self.now.lock().unwrap() = at(secs);
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub const TEST_IDENTITY: &str = "a@x.com";
pub const TEST_ORG: &str = "org-1";

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
}

pub fn at(secs: i64) -> DateTime<Utc> {
    t0() + Duration::seconds(secs)
}

/// Cheapest bcrypt cost; production uses 10.
pub fn test_hasher() -> CodeHasher {
    CodeHasher::new(4)
}

pub fn test_ttl() -> Duration {
    Duration::seconds(OTP_TTL_SECS)
}

pub fn issue_usecase(
    repo: &MemoryOtpRepo,
    notifier: &MockNotifier,
    clock: &TestClock,
) -> IssueOtpUseCase<MemoryOtpRepo, MockNotifier, TestClock> {
    IssueOtpUseCase {
        records: repo.clone(),
        notifier: notifier.clone(),
        clock: clock.clone(),
        hasher: test_hasher(),
        ttl: test_ttl(),
    }
}

pub fn verify_usecase(
    repo: &MemoryOtpRepo,
    clock: &TestClock,
) -> VerifyOtpUseCase<MemoryOtpRepo, TestClock> {
    VerifyOtpUseCase {
        records: repo.clone(),
        clock: clock.clone(),
        hasher: test_hasher(),
    }
}

pub fn sweep_usecase(
    repo: &MemoryOtpRepo,
    clock: &TestClock,
) -> SweepExpiredUseCase<MemoryOtpRepo, TestClock> {
    SweepExpiredUseCase {
        records: repo.clone(),
        clock: clock.clone(),
    }
}

pub fn issue_input(identity: &str) -> IssueOtpInput {
    IssueOtpInput {
        request_id: None,
        identity: identity.to_owned(),
        org_id: TEST_ORG.to_owned(),
        display_name: None,
        kind: None,
    }
}

pub fn verify_input(identity: &str, code: &OtpCode) -> VerifyOtpInput {
    VerifyOtpInput {
        identity: identity.to_owned(),
        code: code.clone(),
        request_id: None,
    }
}

/// A stored record with a throwaway hash, for store-level scenarios.
pub fn stored_record(id: u128, created_secs: i64, expires_secs: i64) -> OtpRecord {
    OtpRecord {
        id: Uuid::from_u128(id),
        identity: TEST_IDENTITY.to_owned(),
        org_id: TEST_ORG.to_owned(),
        code_hash: "$2b$04$invalidinvalidinvalidinvalidinvalidinvalidinvalidinva".to_owned(),
        kind: OtpKind::LoginVerification,
        status: DeliveryStatus::Sent,
        used: false,
        used_at: None,
        sent_at: Some(at(created_secs)),
        failed_at: None,
        error: None,
        created_at: at(created_secs),
        expires_at: at(expires_secs),
    }
}
