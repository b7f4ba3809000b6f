use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510160002_create_assignments"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("assignments"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id")).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Alias::new("name")).string().not_null().unique_key())
                    .col(ColumnDef::new(Alias::new("classroom_id")).big_integer().null())
                    .col(ColumnDef::new(Alias::new("classroom_url")).string().null())
                    .col(ColumnDef::new(Alias::new("template_repo_url")).string().null())
                    .col(ColumnDef::new(Alias::new("github_organization")).string().not_null())
                    .col(
                        ColumnDef::new(Alias::new("assignment_type"))
                            .enumeration(
                                Alias::new("assignment_type_enum"),
                                vec![Alias::new("individual"), Alias::new("group")],
                            )
                            .not_null()
                            .default("individual"),
                    )
                    .col(ColumnDef::new(Alias::new("deadline")).timestamp().null())
                    .col(ColumnDef::new(Alias::new("points_available")).integer().not_null().default(100))
                    .col(
                        ColumnDef::new(Alias::new("status"))
                            .enumeration(
                                Alias::new("assignment_status"),
                                vec![
                                    Alias::new("active"),
                                    Alias::new("closed"),
                                    Alias::new("archived"),
                                ],
                            )
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Alias::new("created_at")).timestamp().not_null().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .col(ColumnDef::new(Alias::new("updated_at")).timestamp().not_null().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_assignments_name")
                    .table(Alias::new("assignments"))
                    .col(Alias::new("name"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_assignments_org")
                    .table(Alias::new("assignments"))
                    .col(Alias::new("github_organization"))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("assignments")).to_owned())
            .await
    }
}
