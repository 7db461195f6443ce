pub use sea_orm_migration::prelude::*;

mod m20260115_000001_create_image_models;
mod m20260115_000002_create_orders;
mod m20260115_000003_create_tokens;
mod m20260115_000004_create_stock_prompts;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260115_000001_create_image_models::Migration),
            Box::new(m20260115_000002_create_orders::Migration),
            Box::new(m20260115_000003_create_tokens::Migration),
            Box::new(m20260115_000004_create_stock_prompts::Migration),
        ]
    }
}
