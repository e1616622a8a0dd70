use sea_orm_migration::prelude::*;

use super::m20260301_000003_create_payments_table::Payments;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Ledger recomputation filters on (enrollment_id, status) for
        // every settlement attempt.
        manager
            .create_index(
                Index::create()
                    .name("idx_payments_enrollment_status")
                    .table(Payments::Table)
                    .col(Payments::EnrollmentId)
                    .col(Payments::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payments_user")
                    .table(Payments::Table)
                    .col(Payments::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_payments_enrollment_status")
                    .table(Payments::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_payments_user")
                    .table(Payments::Table)
                    .to_owned(),
            )
            .await
    }
}
