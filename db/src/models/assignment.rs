use chrono::{DateTime, Utc};
use log::info;
use sea_orm::ActiveValue::{NotSet, Set, Unchanged};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, PaginatorTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{RosterError, RosterResult};
use crate::timestamp::Timestamp;
use crate::validation::{normalize_optional, require_fields};

pub const DEFAULT_POINTS_AVAILABLE: i32 = 100;

/// An assignment in the `assignments` table. The name is unique across every
/// organization sharing the store.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "assignments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub name: String,
    /// GitHub Classroom assignment id.
    pub classroom_id: Option<i64>,
    pub classroom_url: Option<String>,
    pub template_repo_url: Option<String>,
    pub github_organization: String,
    pub assignment_type: AssignmentType,
    pub deadline: Option<Timestamp>,
    pub points_available: i32,
    pub status: AssignmentStatus,
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
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "assignment_type_enum")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AssignmentType {
    #[default]
    #[sea_orm(string_value = "individual")]
    Individual,

    #[sea_orm(string_value = "group")]
    Group,
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
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "assignment_status")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AssignmentStatus {
    #[default]
    #[sea_orm(string_value = "active")]
    Active,

    #[sea_orm(string_value = "closed")]
    Closed,

    #[sea_orm(string_value = "archived")]
    Archived,
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

/// A validated assignment that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAssignment {
    pub name: String,
    pub github_organization: String,
    pub classroom_id: Option<i64>,
    pub classroom_url: Option<String>,
    pub template_repo_url: Option<String>,
    pub assignment_type: AssignmentType,
    pub deadline: Option<DateTime<Utc>>,
    pub points_available: i32,
    pub status: AssignmentStatus,
}

impl NewAssignment {
    /// An individual, active assignment worth the default points.
    pub fn new(name: &str, github_organization: &str) -> RosterResult<Self> {
        Self {
            name: name.to_string(),
            github_organization: github_organization.to_string(),
            classroom_id: None,
            classroom_url: None,
            template_repo_url: None,
            assignment_type: AssignmentType::Individual,
            deadline: None,
            points_available: DEFAULT_POINTS_AVAILABLE,
            status: AssignmentStatus::Active,
        }
        .validated()
    }

    pub fn validated(mut self) -> RosterResult<Self> {
        require_fields(&[
            ("name", &self.name),
            ("github_organization", &self.github_organization),
        ])?;

        self.name = self.name.trim().to_string();
        self.github_organization = self.github_organization.trim().to_string();
        self.classroom_url = normalize_optional(self.classroom_url);
        self.template_repo_url = normalize_optional(self.template_repo_url);
        Ok(self)
    }
}

impl Model {
    /// Inserts an assignment. A duplicate name fails with
    /// [`RosterError::IntegrityViolation`] regardless of organization.
    pub async fn create<C>(db: &C, assignment: NewAssignment) -> RosterResult<Model>
    where
        C: ConnectionTrait,
    {
        let assignment = assignment.validated()?;
        let now = Timestamp::now();

        let active = ActiveModel {
            name: Set(assignment.name),
            classroom_id: Set(assignment.classroom_id),
            classroom_url: Set(assignment.classroom_url),
            template_repo_url: Set(assignment.template_repo_url),
            github_organization: Set(assignment.github_organization),
            assignment_type: Set(assignment.assignment_type),
            deadline: Set(assignment.deadline.map(Timestamp)),
            points_available: Set(assignment.points_available),
            status: Set(assignment.status),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        };

        let model = active.insert(db).await?;
        info!("Added assignment: {} (ID: {})", model.name, model.id);
        Ok(model)
    }

    pub async fn update<C>(db: &C, assignment: &Model) -> RosterResult<bool>
    where
        C: ConnectionTrait,
    {
        require_fields(&[
            ("name", &assignment.name),
            ("github_organization", &assignment.github_organization),
        ])?;

        let active = ActiveModel {
            id: Unchanged(assignment.id),
            name: Set(assignment.name.trim().to_string()),
            classroom_id: Set(assignment.classroom_id),
            classroom_url: Set(normalize_optional(assignment.classroom_url.clone())),
            template_repo_url: Set(normalize_optional(assignment.template_repo_url.clone())),
            github_organization: Set(assignment.github_organization.trim().to_string()),
            assignment_type: Set(assignment.assignment_type),
            deadline: Set(assignment.deadline),
            points_available: Set(assignment.points_available),
            status: Set(assignment.status),
            created_at: NotSet,
            updated_at: Set(Some(Timestamp::now())),
        };

        match active.update(db).await {
            Ok(model) => {
                info!("Updated assignment: {} (ID: {})", model.name, model.id);
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

    /// Looks an assignment up by its globally unique name.
    pub async fn find_by_name<C>(db: &C, name: &str) -> Result<Option<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::Name.eq(name.trim()))
            .one(db)
            .await
    }

    /// Newest first; unscoped listings are grouped by organization.
    pub async fn list<C>(
        db: &C,
        github_organization: Option<&str>,
        status: Option<AssignmentStatus>,
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
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
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

    /// Deletes an assignment; every student link to it goes too.
    pub async fn delete<C>(db: &C, id: i64) -> RosterResult<bool>
    where
        C: ConnectionTrait,
    {
        let res = Entity::delete_by_id(id).exec(db).await?;
        if res.rows_affected > 0 {
            info!("Deleted assignment ID: {}", id);
        }
        Ok(res.rows_affected > 0)
    }
}
