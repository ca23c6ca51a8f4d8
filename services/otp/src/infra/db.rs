use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Select, SqlErr,
};
use uuid::Uuid;

use otpgate_otp_schema::otp_records;

use crate::domain::repository::OtpRepository;
use crate::domain::types::{DeliveryOutcome, DeliveryStatus, OtpKind, OtpRecord};
use crate::error::OtpServiceError;

// ── OTP record repository ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOtpRepository {
    pub db: DatabaseConnection,
}

impl DbOtpRepository {
    fn latest_for(identity: &str) -> Select<otp_records::Entity> {
        otp_records::Entity::find()
            .filter(otp_records::Column::Identity.eq(identity))
            .order_by_desc(otp_records::Column::CreatedAt)
            .order_by_desc(otp_records::Column::Id)
    }
}

impl OtpRepository for DbOtpRepository {
    async fn create(&self, record: &OtpRecord) -> Result<(), OtpServiceError> {
        let result = otp_records::ActiveModel {
            id: Set(record.id),
            identity: Set(record.identity.clone()),
            org_id: Set(record.org_id.clone()),
            code_hash: Set(record.code_hash.clone()),
            kind: Set(record.kind.as_str().to_owned()),
            status: Set(record.status.as_str().to_owned()),
            used: Set(record.used),
            used_at: Set(record.used_at),
            sent_at: Set(record.sent_at),
            failed_at: Set(record.failed_at),
            error: Set(record.error.clone()),
            created_at: Set(record.created_at),
            expires_at: Set(record.expires_at),
        }
        .insert(&self.db)
        .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(OtpServiceError::AlreadyExists)
            }
            Err(e) => Err(anyhow::Error::new(e).context("create otp record").into()),
        }
    }

    async fn update_status(
        &self,
        id: Uuid,
        outcome: &DeliveryOutcome,
    ) -> Result<(), OtpServiceError> {
        let mut patch = otp_records::ActiveModel {
            status: Set(outcome.status().as_str().to_owned()),
            ..Default::default()
        };
        match outcome {
            DeliveryOutcome::Sent { at } => {
                patch.sent_at = Set(Some(*at));
            }
            DeliveryOutcome::Failed { at, error } => {
                patch.failed_at = Set(Some(*at));
                patch.error = Set(Some(error.clone()));
            }
        }
        let result = otp_records::Entity::update_many()
            .set(patch)
            .filter(otp_records::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("update otp delivery status")?;
        if result.rows_affected == 0 {
            return Err(OtpServiceError::NotFound);
        }
        Ok(())
    }

    async fn find_latest_valid(
        &self,
        identity: &str,
    ) -> Result<Option<OtpRecord>, OtpServiceError> {
        let model = Self::latest_for(identity)
            .filter(otp_records::Column::Used.eq(false))
            .one(&self.db)
            .await
            .context("find latest unused otp record")?;
        model.map(record_from_model).transpose()
    }

    async fn find_latest(&self, identity: &str) -> Result<Option<OtpRecord>, OtpServiceError> {
        let model = Self::latest_for(identity)
            .one(&self.db)
            .await
            .context("find latest otp record")?;
        model.map(record_from_model).transpose()
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<OtpRecord>, OtpServiceError> {
        let model = otp_records::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("get otp record by id")?;
        model.map(record_from_model).transpose()
    }

    async fn mark_used(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), OtpServiceError> {
        // Conditional UPDATE is the compare-and-set: only one caller can see used = false.
        let result = otp_records::Entity::update_many()
            .set(otp_records::ActiveModel {
                used: Set(true),
                used_at: Set(Some(at)),
                ..Default::default()
            })
            .filter(otp_records::Column::Id.eq(id))
            .filter(otp_records::Column::Used.eq(false))
            .exec(&self.db)
            .await
            .context("mark otp record used")?;
        if result.rows_affected == 1 {
            return Ok(());
        }
        let exists = otp_records::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("recheck otp record after failed mark")?
            .is_some();
        if exists {
            Err(OtpServiceError::Conflict)
        } else {
            Err(OtpServiceError::NotFound)
        }
    }

    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, OtpServiceError> {
        let result = otp_records::Entity::delete_many()
            .filter(otp_records::Column::ExpiresAt.lt(cutoff))
            .exec(&self.db)
            .await
            .context("delete expired otp records")?;
        Ok(result.rows_affected)
    }
}

fn record_from_model(model: otp_records::Model) -> Result<OtpRecord, OtpServiceError> {
    let kind = model
        .kind
        .parse::<OtpKind>()
        .context("decode otp record kind")?;
    let status = model
        .status
        .parse::<DeliveryStatus>()
        .context("decode otp record status")?;
    Ok(OtpRecord {
        id: model.id,
        identity: model.identity,
        org_id: model.org_id,
        code_hash: model.code_hash,
        kind,
        status,
        used: model.used,
        used_at: model.used_at,
        sent_at: model.sent_at,
        failed_at: model.failed_at,
        error: model.error,
        created_at: model.created_at,
        expires_at: model.expires_at,
    })
}
