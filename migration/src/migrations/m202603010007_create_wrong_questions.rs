use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202603010007_create_wrong_questions"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("wrong_questions"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id")).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Alias::new("user_id")).big_integer().not_null())
                    .col(ColumnDef::new(Alias::new("question_id")).big_integer().not_null())
                    .col(ColumnDef::new(Alias::new("wrong_count")).integer().not_null().default(1))
                    .col(ColumnDef::new(Alias::new("last_wrong_at")).timestamp().not_null())
                    .col(ColumnDef::new(Alias::new("is_reviewed")).boolean().not_null().default(false))
                    .col(ColumnDef::new(Alias::new("reviewed_at")).timestamp().null())
                    .index(Index::create().col(Alias::new("user_id")).col(Alias::new("question_id")).unique())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("wrong_questions")).to_owned())
            .await
    }
}
