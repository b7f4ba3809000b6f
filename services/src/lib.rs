pub mod import_service;
pub mod roster_service;
pub mod sync_service;

pub use import_service::{ImportResult, ImportService, StudentRecord};
pub use roster_service::{RosterService, RosterSummary};
pub use sync_service::{DiscoveredRepo, SyncResult, SyncService, SyncStatistics, SyncType};
