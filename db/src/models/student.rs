use chrono::{DateTime, Utc};
use log::info;
use sea_orm::ActiveValue::{NotSet, Set, Unchanged};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, PaginatorTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{RosterError, RosterResult};
use crate::timestamp::Timestamp;
use crate::validation::{normalize_email, normalize_optional, require_fields};

/// A student on a classroom roster, stored in the `students` table.
///
/// `(email, github_organization)` is unique. The GitHub username is not
/// unique in the store, so lookups by username are always scoped to an
/// organization unless the caller explicitly asks for every match.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Lowercased, trimmed email address.
    pub email: String,
    pub name: String,
    pub github_username: Option<String>,
    pub github_id: Option<i64>,
    pub github_organization: String,
    pub enrolled_date: Option<Timestamp>,
    pub status: StudentStatus,
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
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "student_status")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StudentStatus {
    #[default]
    #[sea_orm(string_value = "active")]
    Active,

    #[sea_orm(string_value = "inactive")]
    Inactive,

    #[sea_orm(string_value = "dropped")]
    Dropped,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::student_assignment::Entity")]
    StudentAssignments,
}

impl Related<super::student_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudentAssignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A validated student that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStudent {
    pub email: String,
    pub name: String,
    pub github_organization: String,
    pub github_username: Option<String>,
    pub github_id: Option<i64>,
    pub enrolled_date: Option<DateTime<Utc>>,
    pub status: StudentStatus,
    pub notes: Option<String>,
}

impl NewStudent {
    pub fn new(email: &str, name: &str, github_organization: &str) -> RosterResult<Self> {
        Self {
            email: email.to_string(),
            name: name.to_string(),
            github_organization: github_organization.to_string(),
            github_username: None,
            github_id: None,
            enrolled_date: None,
            status: StudentStatus::Active,
            notes: None,
        }
        .validated()
    }

    pub fn with_github_username(mut self, username: impl Into<String>) -> Self {
        self.github_username = normalize_optional(Some(username.into()));
        self
    }

    /// Checks required fields and normalizes the email and optional strings.
    pub fn validated(mut self) -> RosterResult<Self> {
        require_fields(&[
            ("email", &self.email),
            ("name", &self.name),
            ("github_organization", &self.github_organization),
        ])?;

        self.email = normalize_email(&self.email);
        self.name = self.name.trim().to_string();
        self.github_organization = self.github_organization.trim().to_string();
        self.github_username = normalize_optional(self.github_username);
        self.notes = normalize_optional(self.notes);
        Ok(self)
    }
}

impl Model {
    /// Inserts a student and returns it with its store-assigned id.
    ///
    /// A second student with the same `(email, github_organization)` fails
    /// with [`RosterError::IntegrityViolation`].
    pub async fn create<C>(db: &C, student: NewStudent) -> RosterResult<Model>
    where
        C: ConnectionTrait,
    {
        let student = student.validated()?;
        let now = Timestamp::now();

        let active = ActiveModel {
            email: Set(student.email),
            name: Set(student.name),
            github_username: Set(student.github_username),
            github_id: Set(student.github_id),
            github_organization: Set(student.github_organization),
            enrolled_date: Set(Some(student.enrolled_date.map(Timestamp).unwrap_or(now))),
            status: Set(student.status),
            notes: Set(student.notes),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        };

        let model = active.insert(db).await?;
        info!("Added student: {} (ID: {})", model.email, model.id);
        Ok(model)
    }

    /// Writes every mutable field of `student` back to its row.
    ///
    /// Returns `false` when no row with that id exists.
    pub async fn update<C>(db: &C, student: &Model) -> RosterResult<bool>
    where
        C: ConnectionTrait,
    {
        require_fields(&[
            ("email", &student.email),
            ("name", &student.name),
            ("github_organization", &student.github_organization),
        ])?;

        let active = ActiveModel {
            id: Unchanged(student.id),
            email: Set(normalize_email(&student.email)),
            name: Set(student.name.trim().to_string()),
            github_username: Set(normalize_optional(student.github_username.clone())),
            github_id: Set(student.github_id),
            github_organization: Set(student.github_organization.trim().to_string()),
            enrolled_date: Set(student.enrolled_date),
            status: Set(student.status),
            notes: Set(student.notes.clone()),
            created_at: NotSet,
            updated_at: Set(Some(Timestamp::now())),
        };

        match active.update(db).await {
            Ok(model) => {
                info!("Updated student: {} (ID: {})", model.email, model.id);
                Ok(true)
            }
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

    pub async fn find_by_email<C>(
        db: &C,
        email: &str,
        github_organization: &str,
    ) -> Result<Option<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::Email.eq(normalize_email(email)))
            .filter(Column::GithubOrganization.eq(github_organization.trim()))
            .one(db)
            .await
    }

    /// Finds the student holding `github_username` inside one organization.
    pub async fn find_by_github<C>(
        db: &C,
        github_username: &str,
        github_organization: &str,
    ) -> Result<Option<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::GithubUsername.eq(github_username.trim()))
            .filter(Column::GithubOrganization.eq(github_organization.trim()))
            .order_by_asc(Column::Id)
            .one(db)
            .await
    }

    /// Every student holding `github_username`, across all organizations, oldest first.
    pub async fn find_all_by_github<C>(db: &C, github_username: &str) -> Result<Vec<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::GithubUsername.eq(github_username.trim()))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    /// Lists students, optionally scoped by organization and status.
    ///
    /// Ordered by name; unscoped listings are grouped by organization first.
    pub async fn list<C>(
        db: &C,
        github_organization: Option<&str>,
        status: Option<StudentStatus>,
    ) -> Result<Vec<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut query = Entity::find();

        if let Some(status) = status {
            query = query.filter(Column::Status.eq(status));
        }

        match github_organization {
            Some(org) => query = query.filter(Column::GithubOrganization.eq(org.trim())),
            None => query = query.order_by_asc(Column::GithubOrganization),
        }

        query
            .order_by_asc(Column::Name)
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    pub async fn count<C>(db: &C, github_organization: Option<&str>) -> Result<u64, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut query = Entity::find();
        if let Some(org) = github_organization {
            query = query.filter(Column::GithubOrganization.eq(org.trim()));
        }
        query.count(db).await
    }

    /// Deletes a student; their assignment links go with them.
    pub async fn delete<C>(db: &C, id: i64) -> RosterResult<bool>
    where
        C: ConnectionTrait,
    {
        let res = Entity::delete_by_id(id).exec(db).await?;
        if res.rows_affected > 0 {
            info!("Deleted student ID: {}", id);
        }
        Ok(res.rows_affected > 0)
    }

    pub async fn link_github_username<C>(
        db: &C,
        id: i64,
        github_username: &str,
        github_id: Option<i64>,
    ) -> RosterResult<bool>
    where
        C: ConnectionTrait,
    {
        require_fields(&[("github_username", github_username)])?;

        let active = ActiveModel {
            id: Unchanged(id),
            github_username: Set(Some(github_username.trim().to_string())),
            github_id: Set(github_id),
            updated_at: Set(Some(Timestamp::now())),
            ..Default::default()
        };

        match active.update(db).await {
            Ok(_) => {
                info!("Linked student {} to GitHub: {}", id, github_username.trim());
                Ok(true)
            }
            Err(DbErr::RecordNotUpdated) => Ok(false),
            Err(e) => Err(RosterError::from(e)),
        }
    }
}
