use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_offerings_table::Offerings;
use super::m20260301_000002_create_enrollments_table::Enrollments;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Payments::Reference)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Payments::ReceiptNumber)
                            .string()
                            .null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Payments::EnrollmentId).uuid().not_null())
                    .col(ColumnDef::new(Payments::OfferingId).uuid().not_null())
                    .col(ColumnDef::new(Payments::UserId).uuid().not_null())
                    .col(ColumnDef::new(Payments::RecordedBy).uuid().null())
                    .col(ColumnDef::new(Payments::UpdatedBy).uuid().null())
                    .col(
                        ColumnDef::new(Payments::Amount)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Payments::Currency).string().not_null())
                    .col(ColumnDef::new(Payments::PaymentType).string().not_null())
                    .col(
                        ColumnDef::new(Payments::InstallmentNumber)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Payments::TotalInstallments)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Payments::Provider).string().not_null())
                    .col(ColumnDef::new(Payments::Channel).string().not_null())
                    .col(ColumnDef::new(Payments::PayerPhone).string().null())
                    .col(
                        ColumnDef::new(Payments::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Payments::ManualEntry)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Payments::FailureReason).text().null())
                    .col(
                        ColumnDef::new(Payments::ProviderTransactionId)
                            .string()
                            .null(),
                    )
                    .col(ColumnDef::new(Payments::GatewayResponse).json().null())
                    .col(ColumnDef::new(Payments::PaidAt).timestamp().null())
                    .col(ColumnDef::new(Payments::Notes).text().null())
                    .col(ColumnDef::new(Payments::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Payments::UpdatedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_enrollment")
                            .from(Payments::Table, Payments::EnrollmentId)
                            .to(Enrollments::Table, Enrollments::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_offering")
                            .from(Payments::Table, Payments::OfferingId)
                            .to(Offerings::Table, Offerings::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Payments {
    Table,
    Id,
    Reference,
    ReceiptNumber,
    EnrollmentId,
    OfferingId,
    UserId,
    RecordedBy,
    UpdatedBy,
    Amount,
    Currency,
    PaymentType,
    InstallmentNumber,
    TotalInstallments,
    Provider,
    Channel,
    PayerPhone,
    Status,
    ManualEntry,
    FailureReason,
    ProviderTransactionId,
    GatewayResponse,
    PaidAt,
    Notes,
    CreatedAt,
    UpdatedAt,
}
