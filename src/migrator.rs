//! Schema migrations, applied at startup when `auto_migrate` is set.

use sea_orm_migration::prelude::*;

mod m20260301_000001_create_offerings_table;
mod m20260301_000002_create_enrollments_table;
mod m20260301_000003_create_payments_table;
mod m20260301_000004_add_payment_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_offerings_table::Migration),
            Box::new(m20260301_000002_create_enrollments_table::Migration),
            Box::new(m20260301_000003_create_payments_table::Migration),
            Box::new(m20260301_000004_add_payment_indexes::Migration),
        ]
    }
}
