use anyhow::Context as _;
use rand::RngExt;

use crate::domain::types::{OTP_BCRYPT_COST, OtpCode};
use crate::error::OtpServiceError;

const CODE_MIN: u32 = 100_000;
const CODE_MAX: u32 = 999_999;

/// Uniform 6-digit code from the thread-local CSPRNG. Never starts with `0`.
pub fn generate_code() -> OtpCode {
    let mut rng = rand::rng();
    OtpCode::new(rng.random_range(CODE_MIN..=CODE_MAX).to_string())
}

/// bcrypt hashing of passcodes. Salt is random per call and embedded in the
/// output; verification compares in constant time.
///
/// Both operations run on the blocking pool.
#[derive(Debug, Clone, Copy)]
pub struct CodeHasher {
    cost: u32,
}

impl Default for CodeHasher {
    fn default() -> Self {
        Self::new(OTP_BCRYPT_COST)
    }
}

impl CodeHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, code: &OtpCode) -> Result<String, OtpServiceError> {
        let cost = self.cost;
        let code = code.clone();
        tokio::task::spawn_blocking(move || bcrypt::hash(code.expose(), cost))
            .await
            .context("join bcrypt hash task")
            .map_err(OtpServiceError::Hashing)?
            .context("bcrypt hash")
            .map_err(OtpServiceError::Hashing)
    }

    /// `Ok(false)` on mismatch; `Err(Hashing)` when the stored hash is unusable.
    pub async fn verify(&self, code: &OtpCode, hash: &str) -> Result<bool, OtpServiceError> {
        let code = code.clone();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || bcrypt::verify(code.expose(), &hash))
            .await
            .context("join bcrypt verify task")
            .map_err(OtpServiceError::Hashing)?
            .context("bcrypt verify")
            .map_err(OtpServiceError::Hashing)
    }
}
