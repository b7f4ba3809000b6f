use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510160001_create_students"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("students"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id")).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Alias::new("email")).string().not_null())
                    .col(ColumnDef::new(Alias::new("name")).string().not_null())
                    .col(ColumnDef::new(Alias::new("github_username")).string().null())
                    .col(ColumnDef::new(Alias::new("github_id")).big_integer().null())
                    .col(ColumnDef::new(Alias::new("github_organization")).string().not_null())
                    .col(ColumnDef::new(Alias::new("enrolled_date")).timestamp().null().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .col(
                        ColumnDef::new(Alias::new("status"))
                            .enumeration(
                                Alias::new("student_status"),
                                vec![
                                    Alias::new("active"),
                                    Alias::new("inactive"),
                                    Alias::new("dropped"),
                                ],
                            )
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Alias::new("notes")).text().null())
                    .col(ColumnDef::new(Alias::new("created_at")).timestamp().not_null().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .col(ColumnDef::new(Alias::new("updated_at")).timestamp().not_null().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .index(
                        Index::create()
                            .name("uq_students_email_org")
                            .unique()
                            .col(Alias::new("email"))
                            .col(Alias::new("github_organization")),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, columns) in [
            ("idx_students_email", vec!["email"]),
            ("idx_students_org", vec!["github_organization"]),
            ("idx_students_email_org", vec!["email", "github_organization"]),
            ("idx_students_github_username", vec!["github_username"]),
        ] {
            let mut index = Index::create();
            index.if_not_exists().name(name).table(Alias::new("students"));
            for column in columns {
                index.col(Alias::new(column));
            }
            manager.create_index(index.to_owned()).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("students")).to_owned())
            .await
    }
}
