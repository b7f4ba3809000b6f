use db::models::{assignment, student};
use db::RosterResult;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

/// Row counts for the roster, optionally scoped to one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RosterSummary {
    pub students: u64,
    pub assignments: u64,
}

pub struct RosterService {
    db: DatabaseConnection,
}

impl RosterService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Counts students and assignments. `None` counts every organization.
    pub async fn summary(&self, organization: Option<&str>) -> RosterResult<RosterSummary> {
        Ok(RosterSummary {
            students: student::Model::count(&self.db, organization).await?,
            assignments: assignment::Model::count(&self.db, organization).await?,
        })
    }
}
