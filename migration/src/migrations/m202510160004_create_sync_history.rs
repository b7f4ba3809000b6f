use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510160004_create_sync_history"
    }
}

/// Audit table for sync runs. Nothing writes to it yet.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("sync_history"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id")).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Alias::new("sync_type")).string().not_null())
                    .col(ColumnDef::new(Alias::new("assignment_id")).integer().null())
                    .col(ColumnDef::new(Alias::new("records_processed")).integer().not_null().default(0))
                    .col(ColumnDef::new(Alias::new("records_successful")).integer().not_null().default(0))
                    .col(ColumnDef::new(Alias::new("records_failed")).integer().not_null().default(0))
                    .col(ColumnDef::new(Alias::new("error_log")).text().null())
                    .col(ColumnDef::new(Alias::new("started_at")).timestamp().not_null().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .col(ColumnDef::new(Alias::new("completed_at")).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Alias::new("sync_history"), Alias::new("assignment_id"))
                            .to(Alias::new("assignments"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("sync_history")).to_owned())
            .await
    }
}
