pub use sea_orm_migration::prelude::*;

mod migrations;
mod migrator;

pub use migrations::m202510160005_create_schema_version::SCHEMA_VERSION;
pub use migrator::Migrator;
