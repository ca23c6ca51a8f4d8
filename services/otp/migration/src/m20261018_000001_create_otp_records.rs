use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OtpRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OtpRecords::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OtpRecords::Identity).string().not_null())
                    .col(ColumnDef::new(OtpRecords::OrgId).string().not_null())
                    .col(ColumnDef::new(OtpRecords::CodeHash).string().not_null())
                    .col(ColumnDef::new(OtpRecords::Kind).string_len(32).not_null())
                    .col(ColumnDef::new(OtpRecords::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(OtpRecords::Used)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(OtpRecords::UsedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(OtpRecords::SentAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(OtpRecords::FailedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(OtpRecords::Error).text())
                    .col(
                        ColumnDef::new(OtpRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OtpRecords::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Latest-unused lookup: WHERE identity = ? AND used = false ORDER BY created_at DESC, id DESC
        manager
            .create_index(
                Index::create()
                    .table(OtpRecords::Table)
                    .col(OtpRecords::Identity)
                    .col(OtpRecords::Used)
                    .col(OtpRecords::CreatedAt)
                    .name("idx_otp_records_identity_used_created_at")
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(OtpRecords::Table)
                    .col(OtpRecords::ExpiresAt)
                    .name("idx_otp_records_expires_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OtpRecords::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum OtpRecords {
    Table,
    Id,
    Identity,
    OrgId,
    CodeHash,
    Kind,
    Status,
    Used,
    UsedAt,
    SentAt,
    FailedAt,
    Error,
    CreatedAt,
    ExpiresAt,
}
