use sea_orm::DatabaseConnection;

/// A fresh in-memory SQLite store with the roster schema applied.
pub async fn setup_test_db() -> DatabaseConnection {
    let db = crate::connect_to("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory db");

    crate::initialize(&db)
        .await
        .expect("Failed to run migrations");

    db
}
