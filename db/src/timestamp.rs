//! Column type for stored timestamps.
//!
//! Rows written by other tools may carry timestamps in any ISO-8601 flavour,
//! or garbage. `Timestamp` decodes leniently through
//! [`parse_timestamp`](crate::validation::parse_timestamp): a value that does
//! not parse reads back as NULL, so an `Option<Timestamp>` field becomes
//! `None` instead of failing the whole row.

use chrono::{DateTime, Utc};
use log::warn;
use sea_orm::sea_query::{ArrayType, ColumnType, Nullable, ValueType, ValueTypeErr};
use sea_orm::{ColIdx, QueryResult, TryGetError, TryGetable, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::validation::parse_timestamp;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Timestamp(Utc::now())
    }

    pub fn into_inner(self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Timestamp(value)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(value: Timestamp) -> Self {
        value.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<Timestamp> for Value {
    fn from(value: Timestamp) -> Self {
        Value::from(value.0)
    }
}

impl Nullable for Timestamp {
    fn null() -> Value {
        <DateTime<Utc> as Nullable>::null()
    }
}

impl ValueType for Timestamp {
    fn try_from(v: Value) -> Result<Self, ValueTypeErr> {
        <DateTime<Utc> as ValueType>::try_from(v).map(Timestamp)
    }

    fn type_name() -> String {
        stringify!(Timestamp).to_owned()
    }

    fn array_type() -> ArrayType {
        <DateTime<Utc> as ValueType>::array_type()
    }

    fn column_type() -> ColumnType {
        ColumnType::Timestamp
    }
}

impl TryGetable for Timestamp {
    fn try_get_by<I: ColIdx>(res: &QueryResult, index: I) -> Result<Self, TryGetError> {
        let raw = match String::try_get_by(res, index) {
            Ok(raw) => raw,
            Err(TryGetError::Null(col)) => return Err(TryGetError::Null(col)),
            Err(TryGetError::DbErr(e)) => {
                warn!("Unreadable timestamp in column {:?}: {}", index, e);
                return Err(TryGetError::Null(format!("{index:?}")));
            }
        };

        match parse_timestamp(&raw) {
            Some(parsed) => Ok(Timestamp(parsed)),
            None => {
                warn!("Unparseable timestamp in column {:?}: {:?}", index, raw);
                Err(TryGetError::Null(format!("{index:?}")))
            }
        }
    }
}
