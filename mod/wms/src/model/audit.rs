use serde::{Deserialize, Serialize};

use openwms_core::ServiceError;
use sql::Row;

use super::pallet::{require_i64, require_str};

/// Audit actions written by the repository. One constant per mutation.
pub mod action {
    pub const REGISTER: &str = "REGISTER";
    pub const CONFIRM: &str = "CONFIRM";
    pub const UNDO: &str = "UNDO";
    pub const CLOSE: &str = "CLOSE";
    pub const CLEAR: &str = "CLEAR";
    pub const BACKUP: &str = "BACKUP";
    pub const RESTORE: &str = "RESTORE";
}

/// AuditEntry — append-only trail row, written in the same transaction as
/// the mutation it records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: String,
    pub action: String,
    pub details: String,
    pub machine_name: String,
}

impl AuditEntry {
    pub fn from_row(row: &Row) -> Result<Self, ServiceError> {
        Ok(Self {
            id: require_i64(row, "id")?,
            timestamp: require_str(row, "timestamp")?,
            action: require_str(row, "action")?,
            details: require_str(row, "details")?,
            machine_name: require_str(row, "machine_name")?,
        })
    }
}
