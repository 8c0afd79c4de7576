pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_core_tables;
mod m20240101_000002_create_counter_tables;
mod m20240101_000003_create_time_stats_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_core_tables::Migration),
            Box::new(m20240101_000002_create_counter_tables::Migration),
            Box::new(m20240101_000003_create_time_stats_tables::Migration),
        ]
    }
}
