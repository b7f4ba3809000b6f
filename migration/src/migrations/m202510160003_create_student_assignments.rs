use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510160003_create_student_assignments"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("student_assignments"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id")).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Alias::new("student_id")).integer().not_null())
                    .col(ColumnDef::new(Alias::new("assignment_id")).integer().not_null())
                    .col(ColumnDef::new(Alias::new("repository_url")).string().null())
                    .col(ColumnDef::new(Alias::new("repository_name")).string().null())
                    .col(
                        ColumnDef::new(Alias::new("acceptance_status"))
                            .enumeration(
                                Alias::new("acceptance_status"),
                                vec![
                                    Alias::new("pending"),
                                    Alias::new("accepted"),
                                    Alias::new("completed"),
                                    Alias::new("submitted"),
                                ],
                            )
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Alias::new("accepted_at")).timestamp().null())
                    .col(ColumnDef::new(Alias::new("last_commit_at")).timestamp().null())
                    .col(ColumnDef::new(Alias::new("last_synced_at")).timestamp().null())
                    .col(ColumnDef::new(Alias::new("notes")).text().null())
                    .col(ColumnDef::new(Alias::new("created_at")).timestamp().not_null().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .col(ColumnDef::new(Alias::new("updated_at")).timestamp().not_null().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .foreign_key(
                        ForeignKey::create()
                            .from(Alias::new("student_assignments"), Alias::new("student_id"))
                            .to(Alias::new("students"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Alias::new("student_assignments"), Alias::new("assignment_id"))
                            .to(Alias::new("assignments"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .name("uq_student_assignments_pair")
                            .unique()
                            .col(Alias::new("student_id"))
                            .col(Alias::new("assignment_id")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_student_assignments_student")
                    .table(Alias::new("student_assignments"))
                    .col(Alias::new("student_id"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_student_assignments_assignment")
                    .table(Alias::new("student_assignments"))
                    .col(Alias::new("assignment_id"))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(Alias::new("student_assignments"))
                    .to_owned(),
            )
            .await
    }
}
