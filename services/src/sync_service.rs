//! Reconciles discovered student repositories with the roster.
//!
//! A reconciliation pass takes the repositories found for one assignment,
//! matches each claimed identifier to a student in the same organization and
//! upserts the student's link to the assignment. Items are handled one by one
//! in input order and a failing item never stops the pass.

use db::models::assignment::{self, NewAssignment};
use db::models::student::{self, StudentStatus};
use db::models::student_assignment::{self, AcceptanceStatus, NewStudentAssignment};
use db::validation::normalize_optional;
use db::{RosterError, RosterResult, Timestamp};
use log::{debug, error, info, warn};
use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use strum::{Display, EnumString};

/// Identifier reported for repositories that carry no claimed identifier.
pub const UNKNOWN_IDENTIFIER: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SyncType {
    #[default]
    Repositories,
    GithubClassroom,
}

/// One repository found for an assignment, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredRepo {
    pub repo_name: String,
    pub repo_url: String,
    /// GitHub username the repository claims to belong to.
    pub identifier: Option<String>,
}

impl DiscoveredRepo {
    pub fn new(
        repo_name: impl Into<String>,
        repo_url: impl Into<String>,
        identifier: Option<&str>,
    ) -> Self {
        Self {
            repo_name: repo_name.into(),
            repo_url: repo_url.into(),
            identifier: identifier.map(str::to_string),
        }
    }

    /// The claimed identifier, trimmed. Blank identifiers count as missing.
    pub fn claimed_identifier(&self) -> Option<&str> {
        self.identifier
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Outcome of one reconciliation pass. Never persisted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SyncResult {
    pub sync_type: SyncType,
    pub total_repos: usize,
    pub linked_count: usize,
    pub unlinked_count: usize,
    pub errors: Vec<String>,
    /// URLs of the repositories that could not be linked.
    pub unlinked_repos: Vec<String>,
}

impl SyncResult {
    pub fn new(sync_type: SyncType, total_repos: usize) -> Self {
        Self {
            sync_type,
            total_repos,
            ..Default::default()
        }
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn add_linked(&mut self) {
        self.linked_count += 1;
    }

    pub fn add_unlinked(&mut self, repo_url: impl Into<String>) {
        self.unlinked_repos.push(repo_url.into());
        self.unlinked_count += 1;
    }

    /// Linked repositories as a percentage of all repositories seen.
    pub fn success_rate(&self) -> f64 {
        if self.total_repos == 0 {
            return 0.0;
        }
        self.linked_count as f64 / self.total_repos as f64 * 100.0
    }
}

/// Repository coverage of an assignment across the active roster of one organization.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SyncStatistics {
    pub total_students: u64,
    pub students_with_repos: u64,
    pub students_without_repos: u64,
    pub acceptance_rate: f64,
}

enum LinkOutcome {
    Created,
    Updated,
    NoStudent,
}

pub struct SyncService {
    db: DatabaseConnection,
}

impl SyncService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Links every discovered repository whose identifier matches a student of
    /// `organization` to the assignment named `assignment_name`, creating the
    /// assignment first when it does not exist.
    ///
    /// Running the same input twice leaves the store with one link per
    /// student and yields the same counts. Only a failure to resolve the
    /// assignment is returned as an error; per-repository failures are
    /// collected in [`SyncResult::errors`].
    pub async fn reconcile(
        &self,
        assignment_name: &str,
        organization: &str,
        discovered: &[DiscoveredRepo],
    ) -> RosterResult<SyncResult> {
        let organization = organization.trim();
        let mut result = SyncResult::new(SyncType::Repositories, discovered.len());

        info!(
            "Syncing {} repositories for assignment: {}",
            discovered.len(),
            assignment_name
        );

        let assignment = self.resolve_assignment(assignment_name, organization).await?;

        for repo in discovered {
            let Some(identifier) = repo.claimed_identifier() else {
                result.add_unlinked(&repo.repo_url);
                result.add_error(format!(
                    "Repository {} has no student identifier",
                    repo.repo_name
                ));
                continue;
            };

            match self
                .link_repository(assignment.id, organization, repo, identifier)
                .await
            {
                Ok(LinkOutcome::Created) => {
                    result.add_linked();
                    debug!("Created link: {} -> {}", identifier, repo.repo_name);
                }
                Ok(LinkOutcome::Updated) => {
                    result.add_linked();
                    debug!("Updated link: {} -> {}", identifier, repo.repo_name);
                }
                Ok(LinkOutcome::NoStudent) => {
                    result.add_unlinked(&repo.repo_url);
                    debug!("No roster entry for GitHub user: {}", identifier);
                }
                Err(e) => {
                    error!("Failed to process repository {}: {}", repo.repo_name, e);
                    result.add_unlinked(&repo.repo_url);
                    result.add_error(format!("Error processing {}: {}", repo.repo_name, e));
                }
            }
        }

        info!(
            "Sync complete: {} linked, {} unlinked",
            result.linked_count, result.unlinked_count
        );

        Ok(result)
    }

    async fn resolve_assignment(
        &self,
        assignment_name: &str,
        organization: &str,
    ) -> RosterResult<assignment::Model> {
        if let Some(existing) = assignment::Model::find_by_name(&self.db, assignment_name).await? {
            if existing.github_organization != organization {
                warn!(
                    "Assignment {} belongs to {}, reusing it for {}",
                    existing.name, existing.github_organization, organization
                );
            }
            return Ok(existing);
        }

        info!("Creating new assignment: {}", assignment_name);
        assignment::Model::create(&self.db, NewAssignment::new(assignment_name, organization)?).await
    }

    /// Upserts the link for one repository. The existence check and the write
    /// share a transaction.
    async fn link_repository(
        &self,
        assignment_id: i64,
        organization: &str,
        repo: &DiscoveredRepo,
        identifier: &str,
    ) -> RosterResult<LinkOutcome> {
        let txn = self.db.begin().await?;

        let Some(student) = student::Model::find_by_github(&txn, identifier, organization).await?
        else {
            txn.commit().await?;
            return Ok(LinkOutcome::NoStudent);
        };

        let now = Timestamp::now();
        let outcome = match student_assignment::Model::find_by_pair(&txn, student.id, assignment_id).await? {
            Some(mut link) => {
                link.repository_url = normalize_optional(Some(repo.repo_url.clone()));
                link.repository_name = normalize_optional(Some(repo.repo_name.clone()));
                link.acceptance_status = AcceptanceStatus::Accepted;
                link.accepted_at = link.accepted_at.or(Some(now));
                link.last_synced_at = Some(now);

                if !student_assignment::Model::update(&txn, &link).await? {
                    warn!("Link {} vanished during sync", link.id);
                    return Err(RosterError::Database(DbErr::RecordNotUpdated));
                }
                LinkOutcome::Updated
            }
            None => {
                let new_link = NewStudentAssignment {
                    acceptance_status: AcceptanceStatus::Accepted,
                    ..NewStudentAssignment::new(student.id, assignment_id)?
                        .with_repository(repo.repo_name.as_str(), repo.repo_url.as_str())
                };
                let mut link = student_assignment::Model::create(&txn, new_link).await?;

                link.accepted_at = link.accepted_at.or(Some(now));
                link.last_synced_at = Some(now);
                if !student_assignment::Model::update(&txn, &link).await? {
                    warn!("Link {} vanished during sync", link.id);
                    return Err(RosterError::Database(DbErr::RecordNotUpdated));
                }
                LinkOutcome::Created
            }
        };

        txn.commit().await?;
        Ok(outcome)
    }

    /// Active students of `organization` with no link to the assignment.
    /// Empty when the assignment does not exist.
    pub async fn unlinked_students(
        &self,
        assignment_name: &str,
        organization: &str,
    ) -> RosterResult<Vec<student::Model>> {
        let Some(assignment) = assignment::Model::find_by_name(&self.db, assignment_name).await?
        else {
            warn!("Assignment not found: {}", assignment_name);
            return Ok(Vec::new());
        };

        let linked = self.linked_student_ids(assignment.id).await?;
        let unlinked: Vec<student::Model> =
            student::Model::list(&self.db, Some(organization), Some(StudentStatus::Active))
                .await?
                .into_iter()
                .filter(|s| !linked.contains(&s.id))
                .collect();

        info!(
            "Found {} students without repositories for {}",
            unlinked.len(),
            assignment_name
        );
        Ok(unlinked)
    }

    /// `(repo_name, identifier)` for every discovered repository that matches
    /// no student of `organization`.
    pub async fn unlinked_repositories(
        &self,
        assignment_name: &str,
        organization: &str,
        discovered: &[DiscoveredRepo],
    ) -> RosterResult<Vec<(String, String)>> {
        let mut unlinked = Vec::new();

        for repo in discovered {
            let Some(identifier) = repo.claimed_identifier() else {
                unlinked.push((repo.repo_name.clone(), UNKNOWN_IDENTIFIER.to_string()));
                continue;
            };

            if student::Model::find_by_github(&self.db, identifier, organization)
                .await?
                .is_none()
            {
                unlinked.push((repo.repo_name.clone(), identifier.to_string()));
            }
        }

        info!(
            "Found {} unlinked repositories for {}",
            unlinked.len(),
            assignment_name
        );
        Ok(unlinked)
    }

    /// Counts only students that are both active in `organization` and linked,
    /// so `students_without_repos` never goes negative.
    pub async fn sync_statistics(
        &self,
        assignment_name: &str,
        organization: &str,
    ) -> RosterResult<SyncStatistics> {
        let Some(assignment) = assignment::Model::find_by_name(&self.db, assignment_name).await?
        else {
            return Ok(SyncStatistics::default());
        };

        let linked = self.linked_student_ids(assignment.id).await?;
        let active =
            student::Model::list(&self.db, Some(organization), Some(StudentStatus::Active)).await?;

        let total_students = active.len() as u64;
        let students_with_repos = active.iter().filter(|s| linked.contains(&s.id)).count() as u64;
        let acceptance_rate = if total_students > 0 {
            students_with_repos as f64 / total_students as f64 * 100.0
        } else {
            0.0
        };

        Ok(SyncStatistics {
            total_students,
            students_with_repos,
            students_without_repos: total_students - students_with_repos,
            acceptance_rate,
        })
    }

    async fn linked_student_ids(&self, assignment_id: i64) -> RosterResult<HashSet<i64>> {
        let rows =
            student_assignment::Model::find_students_for_assignment(&self.db, assignment_id).await?;
        Ok(rows.into_iter().map(|(_, s)| s.id).collect())
    }
}
