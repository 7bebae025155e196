pub use sea_orm_migration::prelude::*;

mod m20260901_000001_initial;
mod m20260905_000001_add_recharge_cards;
mod m20260912_000001_add_courses_and_enrollments;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260901_000001_initial::Migration),
            Box::new(m20260905_000001_add_recharge_cards::Migration),
            Box::new(m20260912_000001_add_courses_and_enrollments::Migration),
        ]
    }
}
