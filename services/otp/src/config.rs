use std::time::Duration;

use anyhow::ensure;
use serde::Deserialize;

use otpgate_core::config::Config;

use crate::domain::types::{OTP_BCRYPT_COST, OTP_TTL_SECS};

/// OTP service configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct OtpConfig {
    /// PostgreSQL connection URL. Env var: `DATABASE_URL`.
    pub database_url: String,
    /// TCP port to listen on (default 3114). Env var: `OTP_PORT`.
    #[serde(default = "default_port")]
    pub otp_port: u16,
    /// Code validity window in seconds (default 300). Env var: `OTP_TTL_SECS`.
    #[serde(default = "default_ttl_secs")]
    pub otp_ttl_secs: i64,
    /// bcrypt cost for stored code hashes (default 10). Env var: `OTP_BCRYPT_COST`.
    #[serde(default = "default_bcrypt_cost")]
    pub otp_bcrypt_cost: u32,
    /// Seconds between expiry sweeps (default 3600). Env var: `OTP_SWEEP_INTERVAL_SECS`.
    #[serde(default = "default_sweep_interval_secs")]
    pub otp_sweep_interval_secs: u64,
    /// Mail relay endpoint that receives delivery jobs. Env var: `MAIL_RELAY_URL`.
    pub mail_relay_url: String,
    /// Mail relay request timeout in seconds (default 10). Env var: `MAIL_RELAY_TIMEOUT_SECS`.
    #[serde(default = "default_mail_relay_timeout_secs")]
    pub mail_relay_timeout_secs: u64,
}

impl Config for OtpConfig {}

/// Longest accepted code lifetime.
pub const MAX_TTL_SECS: i64 = 24 * 60 * 60;

impl OtpConfig {
    /// Reject values that would only fail later, on a request or inside the reaper.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            (1..=MAX_TTL_SECS).contains(&self.otp_ttl_secs),
            "OTP_TTL_SECS must be between 1 and {MAX_TTL_SECS}, got {}",
            self.otp_ttl_secs
        );
        ensure!(
            (4..=31).contains(&self.otp_bcrypt_cost),
            "OTP_BCRYPT_COST must be between 4 and 31, got {}",
            self.otp_bcrypt_cost
        );
        ensure!(
            self.otp_sweep_interval_secs > 0,
            "OTP_SWEEP_INTERVAL_SECS must be positive"
        );
        ensure!(
            self.mail_relay_timeout_secs > 0,
            "MAIL_RELAY_TIMEOUT_SECS must be positive"
        );
        Ok(())
    }

    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.otp_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.otp_sweep_interval_secs)
    }

    pub fn mail_relay_timeout(&self) -> Duration {
        Duration::from_secs(self.mail_relay_timeout_secs)
    }
}

fn default_port() -> u16 {
    3114
}

fn default_ttl_secs() -> i64 {
    OTP_TTL_SECS
}

fn default_bcrypt_cost() -> u32 {
    OTP_BCRYPT_COST
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

fn default_mail_relay_timeout_secs() -> u64 {
    10
}
