use crate::domain_model::LegacyId;
use crate::domain_port::StoreError;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::mysql::MySqlDatabaseError;

pub fn is_dup_key(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db) = err {
        if let Some(mysql_err) = db.try_downcast_ref::<MySqlDatabaseError>() {
            return mysql_err.number() == 1062; // ER_DUP_ENTRY
        }
    }

    false
}

pub fn store_error(err: sqlx::Error) -> StoreError {
    if is_dup_key(&err) {
        StoreError::DuplicateKey(err.to_string())
    } else {
        StoreError::Backend(err.to_string())
    }
}

/// Legacy `DATETIME` columns hold UTC wall-clock time.
#[inline]
pub fn utc(at: Option<NaiveDateTime>) -> Option<DateTime<Utc>> {
    at.map(|at| at.and_utc())
}

/// Reads a text id column; blanks and non-numeric values become `None`.
#[inline]
pub fn legacy_id(raw: Option<String>) -> Option<LegacyId> {
    raw.and_then(|s| s.trim().parse().ok())
}
