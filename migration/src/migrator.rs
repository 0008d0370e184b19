use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202603010001_create_users::Migration),
            Box::new(migrations::m202603010002_create_exams::Migration),
            Box::new(migrations::m202603010003_create_questions::Migration),
            Box::new(migrations::m202603010004_create_assignments::Migration),
            Box::new(migrations::m202603010005_create_submissions::Migration),
            Box::new(migrations::m202603010006_create_scores::Migration),
            Box::new(migrations::m202603010007_create_wrong_questions::Migration),
            Box::new(migrations::m202603010008_create_makeup_exams::Migration),
            Box::new(migrations::m202603010009_create_learning_recommendations::Migration),
            Box::new(migrations::m202603010010_create_notifications::Migration),
            Box::new(migrations::m202603010011_create_reminder_logs::Migration),
        ]
    }
}
