//! Warehouse repository — owns all persisted state and implements the
//! allocation, confirm, undo and snapshot algorithms as atomic operations
//! against the `sql` capability traits.
//!
//! Every mutating operation runs inside [`WmsRepo::mutate`]: one
//! process-wide write lock, one transaction, full rollback on any error.
//! The in-process lock, not the database engine, is what enforces
//! single-writer semantics. Read-only queries skip the lock entirely.

pub mod backup;
pub mod confirm;
pub mod queries;
pub mod register;
pub mod schema;
pub mod undo;

use std::sync::Mutex;

use openwms_core::{ServiceError, now_rfc3339};
use sql::{SQLError, SQLExecutor, SQLStore, Value};

use crate::model::audit::action;

pub use backup::{SNAPSHOT_VERSION, Snapshot};

/// Repository over the four persisted tables (pallets, line items, scan
/// ledger, audit log).
pub struct WmsRepo {
    pub(crate) sql: Box<dyn SQLStore>,
    write_lock: Mutex<()>,
    pub(crate) variant_cap: u32,
    pub(crate) machine: String,
}

impl WmsRepo {
    /// Initialize the schema and build the repository.
    pub fn new(
        sql: Box<dyn SQLStore>,
        variant_cap: u32,
        machine: String,
    ) -> Result<Self, ServiceError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Self {
            sql,
            write_lock: Mutex::new(()),
            variant_cap,
            machine,
        })
    }

    /// Run `f` in one transaction under the process-wide write lock.
    ///
    /// The lock is held until commit or rollback completes, so concurrent
    /// mutating callers serialize here, never inside the storage engine.
    pub(crate) fn mutate<T>(
        &self,
        f: impl Fn(&dyn SQLExecutor) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| ServiceError::Internal("write lock poisoned".into()))?;

        let mut out = None;
        let mut failure = None;
        let result = self.sql.transaction(&mut |tx| match f(tx) {
            Ok(value) => {
                out = Some(value);
                Ok(())
            }
            Err(e) => {
                failure = Some(e);
                Err(SQLError::Transaction("rolled back".into()))
            }
        });

        match result {
            Ok(()) => out
                .ok_or_else(|| ServiceError::Internal("transaction closure did not run".into())),
            Err(e) => Err(failure.unwrap_or_else(|| ServiceError::Storage(e.to_string()))),
        }
    }

    /// Append an audit row inside the caller's transaction.
    pub(crate) fn append_audit(
        &self,
        tx: &dyn SQLExecutor,
        action: &str,
        details: &str,
    ) -> Result<(), ServiceError> {
        tx.exec(
            "INSERT INTO audit_entries (timestamp, action, details, machine_name) \
             VALUES (?1, ?2, ?3, ?4)",
            &[
                Value::Text(now_rfc3339()),
                Value::Text(action.to_string()),
                Value::Text(details.to_string()),
                Value::Text(self.machine.clone()),
            ],
        )
        .map_err(storage)?;
        Ok(())
    }

    /// Mark a pallet closed. Closed pallets no longer accept allocations.
    pub fn close_pallet(&self, pallet_id: &str) -> Result<(), ServiceError> {
        self.mutate(|tx| {
            let affected = tx
                .exec(
                    "UPDATE pallets SET is_closed = 1 WHERE pallet_id = ?1",
                    &[Value::Text(pallet_id.to_string())],
                )
                .map_err(storage)?;
            if affected == 0 {
                return Err(ServiceError::NotFound(format!("pallet {}", pallet_id)));
            }
            self.append_audit(tx, action::CLOSE, pallet_id)?;
            Ok(())
        })
    }

    /// Wipe pallets, line items and the scan ledger. The audit trail is
    /// kept — it records the clear itself.
    pub fn clear_all(&self) -> Result<(), ServiceError> {
        self.mutate(|tx| {
            tx.exec("DELETE FROM scan_entries", &[]).map_err(storage)?;
            tx.exec("DELETE FROM pallet_items", &[]).map_err(storage)?;
            tx.exec("DELETE FROM pallets", &[]).map_err(storage)?;
            self.append_audit(tx, action::CLEAR, "all pallets and scans cleared")?;
            Ok(())
        })
    }
}

pub(crate) fn storage(e: SQLError) -> ServiceError {
    ServiceError::Storage(e.to_string())
}

#[cfg(test)]
pub(crate) mod test_support {
    use sql::SqliteStore;

    use super::WmsRepo;

    pub fn repo() -> WmsRepo {
        repo_with_cap(4)
    }

    pub fn repo_with_cap(variant_cap: u32) -> WmsRepo {
        let sql = SqliteStore::open_in_memory().expect("in-memory sqlite");
        WmsRepo::new(Box::new(sql), variant_cap, "test-machine".into()).expect("repo")
    }
}
