pub use sea_orm_migration::prelude::*;
use uuid::Uuid;

mod m20250301_000000_init;
mod m20250301_000001_transfer_category;

/// Stable id of the seeded transfer category.
pub const TRANSFER_CATEGORY_ID: Uuid = Uuid::from_u128(0x0195_4a3e_7c00_7000_8000_0000_0000_0001);

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000000_init::Migration),
            Box::new(m20250301_000001_transfer_category::Migration),
        ]
    }
}
