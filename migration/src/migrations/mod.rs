pub mod m202510160001_create_students;
pub mod m202510160002_create_assignments;
pub mod m202510160003_create_student_assignments;
pub mod m202510160004_create_sync_history;
pub mod m202510160005_create_schema_version;
