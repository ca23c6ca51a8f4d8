use sea_orm::entity::prelude::*;

/// One issued one-time passcode. Only the bcrypt hash of the code is stored.
/// Deleted by the reaper once `expires_at` has passed.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "otp_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub identity: String,
    pub org_id: String,
    pub code_hash: String,
    /// `login_verification` | `registration_verification`
    pub kind: String,
    /// `pending` | `sent` | `failed`
    pub status: String,
    pub used: bool,
    pub used_at: Option<chrono::DateTime<chrono::Utc>>,
    pub sent_at: Option<chrono::DateTime<chrono::Utc>>,
    pub failed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub error: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
