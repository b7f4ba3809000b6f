use db::models::student::{self, NewStudent, StudentStatus};
use db::validation::{normalize_optional, parse_choice, parse_timestamp};
use db::{RosterError, RosterResult};
use log::{debug, info, warn};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

/// One student row handed to a bulk import. Text fields are validated on import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub github_username: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub enrolled_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl StudentRecord {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builds the student this record describes inside `organization`.
    ///
    /// A blank status means active. An unparseable enrollment date is dropped
    /// and the store default applies.
    pub fn to_new_student(&self, organization: &str) -> RosterResult<NewStudent> {
        let mut student = NewStudent::new(&self.email, &self.name, organization)?;

        if let Some(status) = normalize_optional(self.status.clone()) {
            student.status = parse_choice::<StudentStatus>("status", &status)?;
        }
        student.enrolled_date = self.enrolled_date.as_deref().and_then(parse_timestamp);
        student.github_username = normalize_optional(self.github_username.clone());
        student.notes = normalize_optional(self.notes.clone());

        Ok(student)
    }
}

/// Outcome of a bulk import. Never persisted.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ImportResult {
    pub total_rows: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
    pub imported_students: Vec<student::Model>,
}

impl ImportResult {
    pub fn new(total_rows: usize) -> Self {
        Self {
            total_rows,
            ..Default::default()
        }
    }

    /// Records a failed row.
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.failed += 1;
    }

    pub fn add_success(&mut self, student: student::Model) {
        self.imported_students.push(student);
        self.successful += 1;
    }

    pub fn add_skip(&mut self) {
        self.skipped += 1;
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_rows == 0 {
            return 0.0;
        }
        self.successful as f64 / self.total_rows as f64 * 100.0
    }
}

pub struct ImportService {
    db: DatabaseConnection,
}

impl ImportService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts every record as a student of `organization`, numbering records
    /// from 1 in error messages. Existing students are skipped when
    /// `skip_duplicates` is set and reported as failures otherwise. The batch
    /// always runs to the end.
    pub async fn import_students(
        &self,
        organization: &str,
        records: Vec<StudentRecord>,
        skip_duplicates: bool,
    ) -> ImportResult {
        let mut result = ImportResult::new(records.len());

        for (index, record) in records.into_iter().enumerate() {
            let row = index + 1;

            let new_student = match record.to_new_student(organization) {
                Ok(student) => student,
                Err(RosterError::Validation(msg)) => {
                    result.add_error(format!("Record {row}: Validation error: {msg}"));
                    continue;
                }
                Err(e) => {
                    result.add_error(format!("Record {row}: Unexpected error: {e}"));
                    continue;
                }
            };
            let email = new_student.email.clone();

            match student::Model::create(&self.db, new_student).await {
                Ok(created) => result.add_success(created),
                Err(e) if e.is_integrity_violation() => {
                    if skip_duplicates {
                        debug!("Skipping duplicate student: {}", email);
                        result.add_skip();
                    } else {
                        result.add_error(format!("Record {row}: Duplicate student: {email}"));
                    }
                }
                Err(RosterError::Validation(msg)) => {
                    result.add_error(format!("Record {row}: Validation error: {msg}"));
                }
                Err(e) => {
                    warn!("Failed to import record {}: {}", row, e);
                    result.add_error(format!("Record {row}: Unexpected error: {e}"));
                }
            }
        }

        info!(
            "Import complete: {} imported, {} skipped, {} failed",
            result.successful, result.skipped, result.failed
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::test_utils::setup_test_db;

    const ORG: &str = "cs101";

    #[test]
    fn test_record_builds_student() {
        let record = StudentRecord {
            github_username: Some(" ada ".into()),
            status: Some("Inactive".into()),
            enrolled_date: Some("2025-09-01".into()),
            ..StudentRecord::new("ADA@example.com", "Ada Lovelace")
        };

        let student = record.to_new_student(ORG).unwrap();
        assert_eq!(student.email, "ada@example.com");
        assert_eq!(student.github_username.as_deref(), Some("ada"));
        assert_eq!(student.status, StudentStatus::Inactive);
        assert_eq!(
            student.enrolled_date.map(|d| d.to_rfc3339()),
            Some("2025-09-01T00:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_unparseable_enrollment_date_is_dropped() {
        let record = StudentRecord {
            enrolled_date: Some("first week of term".into()),
            ..StudentRecord::new("ada@example.com", "Ada")
        };
        assert_eq!(record.to_new_student(ORG).unwrap().enrolled_date, None);
    }

    #[test]
    fn test_records_deserialize_with_defaults() {
        let records: Vec<StudentRecord> = serde_json::from_str(
            r#"[
                {"email": "ada@example.com", "name": "Ada", "github_username": "ada"},
                {"email": "alan@example.com", "name": "Alan", "status": "dropped"}
            ]"#,
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, None);
        assert_eq!(records[1].status.as_deref(), Some("dropped"));
        assert_eq!(records[1].github_username, None);
    }

    #[tokio::test]
    async fn test_import_counts_each_outcome() {
        let db = setup_test_db().await;
        let service = ImportService::new(db.clone());

        let records = vec![
            StudentRecord::new("ada@example.com", "Ada"),
            StudentRecord::new("", "Nameless"),
            StudentRecord {
                status: Some("graduated".into()),
                ..StudentRecord::new("alan@example.com", "Alan")
            },
            StudentRecord::new("ADA@example.com", "Ada Again"),
        ];

        let result = service.import_students(ORG, records, true).await;

        assert_eq!(result.total_rows, 4);
        assert_eq!(result.successful, 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.failed, 2);
        assert_eq!(
            result.errors,
            vec![
                "Record 2: Validation error: missing required fields: email".to_string(),
                "Record 3: Validation error: status must be one of: active, inactive, dropped"
                    .to_string(),
            ]
        );
        assert_eq!(result.imported_students[0].email, "ada@example.com");
        assert!((result.success_rate() - 25.0).abs() < f64::EPSILON);
        assert_eq!(student::Model::count(&db, Some(ORG)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_import_duplicates_fail_without_skip() {
        let db = setup_test_db().await;
        let service = ImportService::new(db);

        let records = vec![
            StudentRecord::new("ada@example.com", "Ada"),
            StudentRecord::new("ada@example.com", "Ada"),
        ];

        let result = service.import_students(ORG, records, false).await;

        assert_eq!(result.successful, 1);
        assert_eq!(result.skipped, 0);
        assert_eq!(result.failed, 1);
        assert_eq!(
            result.errors,
            vec!["Record 2: Duplicate student: ada@example.com".to_string()]
        );
    }

    #[tokio::test]
    async fn test_same_records_import_into_two_organizations() {
        let db = setup_test_db().await;
        let service = ImportService::new(db.clone());
        let records = vec![StudentRecord::new("ada@example.com", "Ada")];

        let first = service.import_students("cs101", records.clone(), false).await;
        let second = service.import_students("cs102", records, false).await;

        assert_eq!(first.successful, 1);
        assert_eq!(second.successful, 1);
        assert_eq!(student::Model::count(&db, None).await.unwrap(), 2);
    }

    #[test]
    fn test_empty_import_rate() {
        assert_eq!(ImportResult::new(0).success_rate(), 0.0);
    }
}
