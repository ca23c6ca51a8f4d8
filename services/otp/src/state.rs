use sea_orm::DatabaseConnection;

use crate::domain::repository::SystemClock;
use crate::infra::db::DbOtpRepository;
use crate::infra::mail::HttpMailNotifier;
use crate::usecase::code::CodeHasher;
use crate::usecase::issue::IssueOtpUseCase;
use crate::usecase::sweep::SweepExpiredUseCase;
use crate::usecase::verify::VerifyOtpUseCase;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub notifier: HttpMailNotifier,
    pub hasher: CodeHasher,
    pub ttl: chrono::Duration,
}

impl AppState {
    pub fn otp_repo(&self) -> DbOtpRepository {
        DbOtpRepository {
            db: self.db.clone(),
        }
    }

    pub fn issue_usecase(&self) -> IssueOtpUseCase<DbOtpRepository, HttpMailNotifier, SystemClock> {
        IssueOtpUseCase {
            records: self.otp_repo(),
            notifier: self.notifier.clone(),
            clock: SystemClock,
            hasher: self.hasher,
            ttl: self.ttl,
        }
    }

    pub fn verify_usecase(&self) -> VerifyOtpUseCase<DbOtpRepository, SystemClock> {
        VerifyOtpUseCase {
            records: self.otp_repo(),
            clock: SystemClock,
            hasher: self.hasher,
        }
    }

    pub fn sweep_usecase(&self) -> SweepExpiredUseCase<DbOtpRepository, SystemClock> {
        SweepExpiredUseCase {
            records: self.otp_repo(),
            clock: SystemClock,
        }
    }
}
