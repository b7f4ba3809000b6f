use sea_orm_migration::prelude::*;

/// Version recorded in the `schema_version` marker table.
pub const SCHEMA_VERSION: i32 = 1;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510160005_create_schema_version"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("schema_version"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("version")).integer().not_null().primary_key())
                    .col(ColumnDef::new(Alias::new("applied_at")).timestamp().not_null().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .to_owned(),
            )
            .await?;

        // Re-running must leave exactly one row per version.
        let insert = Query::insert()
            .into_table(Alias::new("schema_version"))
            .columns([Alias::new("version")])
            .values_panic([SCHEMA_VERSION.into()])
            .on_conflict(
                OnConflict::column(Alias::new("version"))
                    .do_nothing()
                    .to_owned(),
            )
            .to_owned();

        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("schema_version")).to_owned())
            .await
    }
}
