pub mod error;
pub mod models;
pub mod test_utils;
pub mod timestamp;
pub mod validation;

pub use error::{RosterError, RosterResult};
pub use timestamp::Timestamp;

use common::config::AppConfig;
use log::info;
use migration::Migrator;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DbErr, FromQueryResult, Statement,
};
use sea_orm_migration::{MigratorTrait, SchemaManager};
use std::path::Path;

/// Connects to the database named by the `DATABASE_PATH` setting.
pub async fn connect() -> Result<DatabaseConnection, DbErr> {
    connect_to(&AppConfig::global().database_path).await
}

/// Connects to a SQLite file path or an explicit `sqlite:` URL.
///
/// A plain path has its parent directory created and the file is created on
/// first use.
pub async fn connect_to(path_or_url: &str) -> Result<DatabaseConnection, DbErr> {
    let url = if path_or_url.starts_with("sqlite:") {
        path_or_url.to_string()
    } else {
        if let Some(parent) = Path::new(path_or_url).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DbErr::Custom(format!("failed to create {}: {e}", parent.display()))
                })?;
            }
        }
        format!("sqlite://{path_or_url}?mode=rwc")
    };

    Database::connect(&url).await
}

/// Brings the schema up to date. Safe to call on every start.
pub async fn initialize(db: &DatabaseConnection) -> Result<(), DbErr> {
    Migrator::up(db, None).await?;
    info!("Database schema initialized");
    Ok(())
}

/// Writes a consistent copy of the whole store to `path` with `VACUUM INTO`.
/// The parent directory is created and the target must not exist yet.
pub async fn backup(db: &DatabaseConnection, path: &Path) -> Result<(), DbErr> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DbErr::Custom(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
    }

    let target = path.to_string_lossy().to_string();
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "VACUUM INTO ?",
        [target.clone().into()],
    ))
    .await?;

    info!("Database backed up to {}", target);
    Ok(())
}

#[derive(Debug, FromQueryResult)]
struct VersionRow {
    version: i32,
}

/// Current schema version, or `None` when the store was never initialized.
pub async fn schema_version(db: &DatabaseConnection) -> Result<Option<i32>, DbErr> {
    let manager = SchemaManager::new(db);
    if !manager.has_table("schema_version").await? {
        return Ok(None);
    }

    let row = VersionRow::find_by_statement(Statement::from_string(
        db.get_database_backend(),
        "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
    ))
    .one(db)
    .await?;

    Ok(row.map(|r| r.version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::SCHEMA_VERSION;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_fresh_store_has_no_version() {
        let db = connect_to("sqlite::memory:").await.unwrap();
        assert_eq!(schema_version(&db).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let db = connect_to("sqlite::memory:").await.unwrap();

        initialize(&db).await.expect("first initialize");
        initialize(&db).await.expect("second initialize");

        assert_eq!(schema_version(&db).await.unwrap(), Some(SCHEMA_VERSION));
    }

    #[tokio::test]
    async fn test_connect_to_file_creates_parent_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("roster.db");
        let path = path.to_string_lossy().to_string();

        {
            let db = connect_to(&path).await.unwrap();
            initialize(&db).await.unwrap();
            db.close().await.unwrap();
        }

        assert!(Path::new(&path).exists());

        let db = connect_to(&path).await.unwrap();
        initialize(&db).await.unwrap();
        assert_eq!(schema_version(&db).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_backup_copies_rows_into_new_file() {
        use crate::models::student::{self, NewStudent};

        let dir = tempdir().unwrap();
        let source = dir.path().join("roster.db");
        let db = connect_to(&source.to_string_lossy()).await.unwrap();
        initialize(&db).await.unwrap();
        student::Model::create(&db, NewStudent::new("ada@example.com", "Ada", "cs101").unwrap())
            .await
            .unwrap();

        let target = dir.path().join("backups").join("roster-copy.db");
        backup(&db, &target).await.expect("backup should succeed");
        assert!(target.exists());

        let copy = connect_to(&target.to_string_lossy()).await.unwrap();
        assert_eq!(schema_version(&copy).await.unwrap(), Some(SCHEMA_VERSION));
        let found = student::Model::find_by_email(&copy, "ada@example.com", "cs101")
            .await
            .unwrap();
        assert_eq!(found.map(|s| s.name), Some("Ada".to_string()));
    }

    #[tokio::test]
    async fn test_backup_refuses_existing_target() {
        let dir = tempdir().unwrap();
        let db = connect_to("sqlite::memory:").await.unwrap();
        initialize(&db).await.unwrap();

        let target = dir.path().join("roster-copy.db");
        std::fs::write(&target, b"occupied").unwrap();

        assert!(backup(&db, &target).await.is_err());
    }
}
