use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One issued one-time passcode.
///
/// Holds the bcrypt hash of the code, never the code itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpRecord {
    pub id: Uuid,
    pub identity: String,
    pub org_id: String,
    pub code_hash: String,
    pub kind: OtpKind,
    pub status: DeliveryStatus,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl OtpRecord {
    /// `now` is still inside the validity window (inclusive of `expires_at`).
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }

    /// Ordering used for "latest" lookups: creation time, then id.
    pub fn recency_key(&self) -> (DateTime<Utc>, Uuid) {
        (self.created_at, self.id)
    }
}

/// What the code is for. Selects the wording of the delivered message and is
/// otherwise opaque to verification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpKind {
    #[default]
    LoginVerification,
    RegistrationVerification,
}

impl OtpKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoginVerification => "login_verification",
            Self::RegistrationVerification => "registration_verification",
        }
    }
}

impl fmt::Display for OtpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OtpKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login_verification" => Ok(Self::LoginVerification),
            "registration_verification" => Ok(Self::RegistrationVerification),
            other => Err(UnknownVariant(other.to_owned())),
        }
    }
}

/// Issuance lifecycle. Independent of `used`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            other => Err(UnknownVariant(other.to_owned())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown variant {0:?}")]
pub struct UnknownVariant(pub String);

/// Result of the single delivery attempt made during issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent { at: DateTime<Utc> },
    Failed { at: DateTime<Utc>, error: String },
}

impl DeliveryOutcome {
    pub fn status(&self) -> DeliveryStatus {
        match self {
            Self::Sent { .. } => DeliveryStatus::Sent,
            Self::Failed { .. } => DeliveryStatus::Failed,
        }
    }
}

/// Plaintext passcode. Lives only in memory for the duration of an issue or
/// verify call; `Debug` is redacted so it cannot end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Exactly `OTP_CODE_LEN` ASCII digits.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == OTP_CODE_LEN && self.0.bytes().all(|b| b.is_ascii_digit())
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(******)")
    }
}

/// Confirmation returned by a successful verification. Carries no secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedOtp {
    pub id: Uuid,
    pub identity: String,
    pub org_id: String,
    pub kind: OtpKind,
    pub verified_at: DateTime<Utc>,
}

/// Number of decimal digits in a passcode.
pub const OTP_CODE_LEN: usize = 6;

/// Passcode time-to-live in seconds.
pub const OTP_TTL_SECS: i64 = 300;

/// Default bcrypt cost for passcode hashes.
pub const OTP_BCRYPT_COST: u32 = 10;

/// Name used in delivered messages when the request carries none.
pub const DEFAULT_DISPLAY_NAME: &str = "User";
