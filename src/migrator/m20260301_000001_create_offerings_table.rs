use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Offerings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Offerings::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Offerings::Name).string().not_null())
                    .col(
                        ColumnDef::new(Offerings::Price)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Offerings::Currency)
                            .string()
                            .not_null()
                            .default("XAF"),
                    )
                    .col(
                        ColumnDef::new(Offerings::MaxInstallments)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Offerings::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Offerings::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Offerings::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Offerings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Offerings {
    Table,
    Id,
    Name,
    Price,
    Currency,
    MaxInstallments,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
