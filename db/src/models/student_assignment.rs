use chrono::{DateTime, Utc};
use log::info;
use sea_orm::ActiveValue::{NotSet, Set, Unchanged};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::{assignment, student};
use crate::error::{RosterError, RosterResult};
use crate::timestamp::Timestamp;
use crate::validation::normalize_optional;

/// Links one student to one assignment together with the repository they
/// work in. At most one link exists per `(student_id, assignment_id)`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "student_assignments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: i64,
    pub assignment_id: i64,
    pub repository_url: Option<String>,
    pub repository_name: Option<String>,
    pub acceptance_status: AcceptanceStatus,
    /// Set the first time the link is seen as accepted and never moved afterwards.
    pub accepted_at: Option<Timestamp>,
    pub last_commit_at: Option<Timestamp>,
    pub last_synced_at: Option<Timestamp>,
    pub notes: Option<String>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "acceptance_status")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AcceptanceStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,

    #[sea_orm(string_value = "accepted")]
    Accepted,

    #[sea_orm(string_value = "completed")]
    Completed,

    #[sea_orm(string_value = "submitted")]
    Submitted,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id",
        on_delete = "Cascade"
    )]
    Student,

    #[sea_orm(
        belongs_to = "super::assignment::Entity",
        from = "Column::AssignmentId",
        to = "super::assignment::Column::Id",
        on_delete = "Cascade"
    )]
    Assignment,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStudentAssignment {
    pub student_id: i64,
    pub assignment_id: i64,
    pub repository_url: Option<String>,
    pub repository_name: Option<String>,
    pub acceptance_status: AcceptanceStatus,
    pub accepted_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl NewStudentAssignment {
    /// A pending link with no repository yet.
    pub fn new(student_id: i64, assignment_id: i64) -> RosterResult<Self> {
        Self {
            student_id,
            assignment_id,
            repository_url: None,
            repository_name: None,
            acceptance_status: AcceptanceStatus::Pending,
            accepted_at: None,
            notes: None,
        }
        .validated()
    }

    pub fn with_repository(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.repository_name = normalize_optional(Some(name.into()));
        self.repository_url = normalize_optional(Some(url.into()));
        self
    }

    pub fn validated(mut self) -> RosterResult<Self> {
        if self.student_id <= 0 || self.assignment_id <= 0 {
            return Err(RosterError::Validation(
                "student_id and assignment_id are required".to_string(),
            ));
        }

        self.repository_url = normalize_optional(self.repository_url);
        self.repository_name = normalize_optional(self.repository_name);
        self.notes = normalize_optional(self.notes);
        Ok(self)
    }
}

impl Model {
    /// Inserts a link. Both ends must exist and the pair must be new, otherwise
    /// the store rejects it with [`RosterError::IntegrityViolation`].
    pub async fn create<C>(db: &C, link: NewStudentAssignment) -> RosterResult<Model>
    where
        C: ConnectionTrait,
    {
        let link = link.validated()?;
        let now = Timestamp::now();

        let active = ActiveModel {
            student_id: Set(link.student_id),
            assignment_id: Set(link.assignment_id),
            repository_url: Set(link.repository_url),
            repository_name: Set(link.repository_name),
            acceptance_status: Set(link.acceptance_status),
            accepted_at: Set(link.accepted_at.map(Timestamp)),
            last_commit_at: Set(None),
            last_synced_at: Set(None),
            notes: Set(link.notes),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        };

        let model = active.insert(db).await?;
        info!(
            "Linked student {} to assignment {} (ID: {})",
            model.student_id, model.assignment_id, model.id
        );
        Ok(model)
    }

    /// Writes the mutable fields of `link` back to its row. The student and
    /// assignment ends of a link never move.
    pub async fn update<C>(db: &C, link: &Model) -> RosterResult<bool>
    where
        C: ConnectionTrait,
    {
        if link.student_id <= 0 || link.assignment_id <= 0 {
            return Err(RosterError::Validation(
                "student_id and assignment_id are required".to_string(),
            ));
        }

        let active = ActiveModel {
            id: Unchanged(link.id),
            student_id: NotSet,
            assignment_id: NotSet,
            repository_url: Set(normalize_optional(link.repository_url.clone())),
            repository_name: Set(normalize_optional(link.repository_name.clone())),
            acceptance_status: Set(link.acceptance_status),
            accepted_at: Set(link.accepted_at),
            last_commit_at: Set(link.last_commit_at),
            last_synced_at: Set(link.last_synced_at),
            notes: Set(link.notes.clone()),
            created_at: NotSet,
            updated_at: Set(Some(Timestamp::now())),
        };

        match active.update(db).await {
            Ok(_) => Ok(true),
            Err(DbErr::RecordNotUpdated) => Ok(false),
            Err(e) => Err(RosterError::from(e)),
        }
    }

    pub async fn find_by_id<C>(db: &C, id: i64) -> Result<Option<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find_by_id(id).one(db).await
    }

    pub async fn find_by_pair<C>(
        db: &C,
        student_id: i64,
        assignment_id: i64,
    ) -> Result<Option<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::AssignmentId.eq(assignment_id))
            .one(db)
            .await
    }

    /// Every link on an assignment paired with its student, ordered by student name.
    pub async fn find_students_for_assignment<C>(
        db: &C,
        assignment_id: i64,
    ) -> Result<Vec<(Model, student::Model)>, DbErr>
    where
        C: ConnectionTrait,
    {
        let rows = Entity::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .find_also_related(student::Entity)
            .order_by_asc(student::Column::Name)
            .order_by_asc(Column::Id)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(link, student)| student.map(|s| (link, s)))
            .collect())
    }

    /// Every link held by a student paired with its assignment, newest assignment first.
    pub async fn find_assignments_for_student<C>(
        db: &C,
        student_id: i64,
    ) -> Result<Vec<(Model, assignment::Model)>, DbErr>
    where
        C: ConnectionTrait,
    {
        let rows = Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .find_also_related(assignment::Entity)
            .order_by_desc(assignment::Column::CreatedAt)
            .order_by_desc(assignment::Column::Id)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(link, assignment)| assignment.map(|a| (link, a)))
            .collect())
    }

    pub async fn delete<C>(db: &C, id: i64) -> RosterResult<bool>
    where
        C: ConnectionTrait,
    {
        let res = Entity::delete_by_id(id).exec(db).await?;
        Ok(res.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignment::NewAssignment;
    use crate::models::student::NewStudent;
    use crate::test_utils::setup_test_db;
    use sea_orm::DatabaseConnection;

    async fn seed(db: &DatabaseConnection) -> (student::Model, assignment::Model) {
        let student = student::Model::create(
            db,
            NewStudent::new("ada@example.com", "Ada Lovelace", "cs101").unwrap(),
        )
        .await
        .unwrap();
        let assignment =
            assignment::Model::create(db, NewAssignment::new("python-basics", "cs101").unwrap())
                .await
                .unwrap();
        (student, assignment)
    }

    #[test]
    fn test_new_link_requires_both_ends() {
        let err = NewStudentAssignment::new(0, 3).unwrap_err();
        assert!(matches!(err, RosterError::Validation(_)));
        assert!(NewStudentAssignment::new(1, 3).is_ok());
    }

    #[tokio::test]
    async fn test_create_and_find_by_pair() {
        let db = setup_test_db().await;
        let (student, assignment) = seed(&db).await;

        let link = Model::create(
            &db,
            NewStudentAssignment::new(student.id, assignment.id)
                .unwrap()
                .with_repository("python-basics-ada", "https://github.com/cs101/python-basics-ada"),
        )
        .await
        .expect("Failed to create link");

        assert_eq!(link.acceptance_status, AcceptanceStatus::Pending);
        assert!(link.accepted_at.is_none());

        let found = Model::find_by_pair(&db, student.id, assignment.id)
            .await
            .unwrap()
            .expect("link by pair");
        assert_eq!(found.id, link.id);
        assert_eq!(found.repository_name.as_deref(), Some("python-basics-ada"));
    }

    #[tokio::test]
    async fn test_duplicate_pair_is_integrity_violation() {
        let db = setup_test_db().await;
        let (student, assignment) = seed(&db).await;

        Model::create(&db, NewStudentAssignment::new(student.id, assignment.id).unwrap())
            .await
            .unwrap();
        let err = Model::create(&db, NewStudentAssignment::new(student.id, assignment.id).unwrap())
            .await
            .unwrap_err();

        assert!(err.is_integrity_violation(), "got {err:?}");
    }

    #[tokio::test]
    async fn test_link_to_missing_student_is_integrity_violation() {
        let db = setup_test_db().await;
        let (_, assignment) = seed(&db).await;

        let err = Model::create(&db, NewStudentAssignment::new(999, assignment.id).unwrap())
            .await
            .unwrap_err();

        assert!(err.is_integrity_violation(), "got {err:?}");
    }

    #[tokio::test]
    async fn test_update_keeps_pair() {
        let db = setup_test_db().await;
        let (student, assignment) = seed(&db).await;

        let mut link = Model::create(&db, NewStudentAssignment::new(student.id, assignment.id).unwrap())
            .await
            .unwrap();
        let now = Timestamp::now();
        link.acceptance_status = AcceptanceStatus::Accepted;
        link.accepted_at = Some(now);
        link.last_synced_at = Some(now);

        assert!(Model::update(&db, &link).await.unwrap());

        let reloaded = Model::find_by_id(&db, link.id).await.unwrap().unwrap();
        assert_eq!(reloaded.acceptance_status, AcceptanceStatus::Accepted);
        assert_eq!(
            reloaded.accepted_at.map(|t| t.0.timestamp_millis()),
            Some(now.0.timestamp_millis())
        );
        assert_eq!(reloaded.student_id, student.id);

        link.id = 4242;
        assert!(!Model::update(&db, &link).await.unwrap());
    }

    #[tokio::test]
    async fn test_deleting_student_cascades_to_links() {
        let db = setup_test_db().await;
        let (student, assignment) = seed(&db).await;

        let link = Model::create(&db, NewStudentAssignment::new(student.id, assignment.id).unwrap())
            .await
            .unwrap();

        assert!(student::Model::delete(&db, student.id).await.unwrap());
        assert!(Model::find_by_id(&db, link.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deleting_assignment_cascades_to_links() {
        let db = setup_test_db().await;
        let (student, assignment) = seed(&db).await;

        let link = Model::create(&db, NewStudentAssignment::new(student.id, assignment.id).unwrap())
            .await
            .unwrap();

        assert!(assignment::Model::delete(&db, assignment.id).await.unwrap());
        assert!(Model::find_by_id(&db, link.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_join_queries() {
        let db = setup_test_db().await;
        let (ada, first) = seed(&db).await;
        let alan = student::Model::create(
            &db,
            NewStudent::new("alan@example.com", "Alan Turing", "cs101").unwrap(),
        )
        .await
        .unwrap();
        let second = assignment::Model::create(&db, NewAssignment::new("lab-2", "cs101").unwrap())
            .await
            .unwrap();

        for (s, a) in [(alan.id, first.id), (ada.id, first.id), (ada.id, second.id)] {
            Model::create(&db, NewStudentAssignment::new(s, a).unwrap())
                .await
                .unwrap();
        }

        let students = Model::find_students_for_assignment(&db, first.id).await.unwrap();
        let names: Vec<&str> = students.iter().map(|(_, s)| s.name.as_str()).collect();
        assert_eq!(names, vec!["Ada Lovelace", "Alan Turing"]);

        let assignments = Model::find_assignments_for_student(&db, ada.id).await.unwrap();
        let ids: Vec<i64> = assignments.iter().map(|(_, a)| a.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_unparseable_accepted_at_reads_back_as_absent() {
        let db = setup_test_db().await;
        let (student, assignment) = seed(&db).await;

        let link = Model::create(&db, NewStudentAssignment::new(student.id, assignment.id).unwrap())
            .await
            .unwrap();
        db.execute_unprepared(
            "UPDATE student_assignments SET accepted_at = '??', last_synced_at = 'yesterday'",
        )
        .await
        .unwrap();

        let found = Model::find_by_pair(&db, student.id, assignment.id)
            .await
            .expect("row with bad timestamps must still decode")
            .unwrap();
        assert_eq!(found.id, link.id);
        assert_eq!(found.accepted_at, None);
        assert_eq!(found.last_synced_at, None);

        let joined = Model::find_students_for_assignment(&db, assignment.id).await.unwrap();
        assert_eq!(joined.len(), 1);
    }
}
