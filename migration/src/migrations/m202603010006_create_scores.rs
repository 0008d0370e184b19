use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202603010006_create_scores"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("scores"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id")).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Alias::new("assignment_id")).big_integer().not_null().unique_key())
                    .col(ColumnDef::new(Alias::new("total_score")).integer().not_null())
                    .col(ColumnDef::new(Alias::new("max_score")).integer().not_null())
                    .col(ColumnDef::new(Alias::new("percentage")).integer().not_null())
                    .col(ColumnDef::new(Alias::new("passed")).boolean().not_null())
                    .col(ColumnDef::new(Alias::new("graded_by")).big_integer().null())
                    .col(ColumnDef::new(Alias::new("graded_at")).timestamp().not_null())
                    .col(ColumnDef::new(Alias::new("feedback")).text().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("scores")).to_owned())
            .await
    }
}
