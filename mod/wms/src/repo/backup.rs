//! Snapshot backup and restore.
//!
//! The snapshot is a row-for-row JSON dump of all four tables plus a
//! schema version. Restore validates the payload completely before the
//! first destructive statement runs; truncate-and-reinsert happens in one
//! transaction under the write lock, so readers only ever see the old or
//! the new dataset.

use serde::{Deserialize, Serialize};

use openwms_core::ServiceError;
use sql::{SQLExecutor, Value};

use crate::model::audit::action;
use crate::model::{AuditEntry, Pallet, PalletItem, ScanEntry};

use super::{WmsRepo, storage};

/// Version stamped into every snapshot. Bump on any schema change.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Full-dataset snapshot, mirroring the persisted tables row-for-row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u32,
    pub pallets: Vec<Pallet>,
    pub pallet_items: Vec<PalletItem>,
    pub scan_entries: Vec<ScanEntry>,
    pub audit_entries: Vec<AuditEntry>,
}

impl WmsRepo {
    /// Serialize the complete dataset into one snapshot payload.
    ///
    /// Runs under the write lock so the four table reads are
    /// point-in-time consistent. The audit row recording the backup is
    /// written after serialization and is therefore not part of the
    /// payload itself.
    pub fn backup(&self) -> Result<Vec<u8>, ServiceError> {
        self.mutate(|tx| {
            let snapshot = read_snapshot(tx)?;
            let payload = serde_json::to_vec(&snapshot)
                .map_err(|e| ServiceError::Internal(format!("snapshot encode: {}", e)))?;
            self.append_audit(
                tx,
                action::BACKUP,
                &format!("snapshot {} bytes", payload.len()),
            )?;
            Ok(payload)
        })
    }

    /// Replace the complete dataset with a snapshot payload.
    ///
    /// Malformed or version-mismatched payloads fail with
    /// [`ServiceError::Corrupt`] before anything is truncated. Original
    /// row ids are preserved; integer keys continue from the restored
    /// maximum afterwards.
    pub fn restore(&self, payload: &[u8]) -> Result<(), ServiceError> {
        let snapshot: Snapshot = serde_json::from_slice(payload)
            .map_err(|e| ServiceError::Corrupt(format!("malformed snapshot: {}", e)))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(ServiceError::Corrupt(format!(
                "unsupported snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }

        self.mutate(|tx| {
            tx.exec("DELETE FROM scan_entries", &[]).map_err(storage)?;
            tx.exec("DELETE FROM pallet_items", &[]).map_err(storage)?;
            tx.exec("DELETE FROM pallets", &[]).map_err(storage)?;
            tx.exec("DELETE FROM audit_entries", &[]).map_err(storage)?;

            for pallet in &snapshot.pallets {
                insert_pallet(tx, pallet)?;
            }
            for item in &snapshot.pallet_items {
                insert_item(tx, item)?;
            }
            for entry in &snapshot.scan_entries {
                insert_scan(tx, entry)?;
            }
            for audit in &snapshot.audit_entries {
                insert_audit(tx, audit)?;
            }

            self.append_audit(
                tx,
                action::RESTORE,
                &format!(
                    "snapshot {} bytes; {} pallets, {} items, {} scans, {} audit rows",
                    payload.len(),
                    snapshot.pallets.len(),
                    snapshot.pallet_items.len(),
                    snapshot.scan_entries.len(),
                    snapshot.audit_entries.len(),
                ),
            )?;

            Ok(())
        })
    }
}

fn read_snapshot(tx: &dyn SQLExecutor) -> Result<Snapshot, ServiceError> {
    let pallets = tx
        .query(
            "SELECT pallet_id, group_key, product_number, expiry_date, \
                    total_quantity, is_closed, created_at \
             FROM pallets ORDER BY pallet_id",
            &[],
        )
        .map_err(storage)?
        .iter()
        .map(Pallet::from_row)
        .collect::<Result<Vec<_>, _>>()?;

    let pallet_items = tx
        .query(
            "SELECT id, pallet_id, product_number, expiry_date, quantity \
             FROM pallet_items ORDER BY id",
            &[],
        )
        .map_err(storage)?
        .iter()
        .map(PalletItem::from_row)
        .collect::<Result<Vec<_>, _>>()?;

    let scan_entries = tx
        .query(
            "SELECT id, timestamp, product_number, expiry_date, quantity, pallet_id, \
                    group_key, created_new_pallet, confirmed_quantity, confirmed_moved, \
                    confirmed_at \
             FROM scan_entries ORDER BY id",
            &[],
        )
        .map_err(storage)?
        .iter()
        .map(ScanEntry::from_row)
        .collect::<Result<Vec<_>, _>>()?;

    let audit_entries = tx
        .query(
            "SELECT id, timestamp, action, details, machine_name \
             FROM audit_entries ORDER BY id",
            &[],
        )
        .map_err(storage)?
        .iter()
        .map(AuditEntry::from_row)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Snapshot {
        version: SNAPSHOT_VERSION,
        pallets,
        pallet_items,
        scan_entries,
        audit_entries,
    })
}

fn insert_pallet(tx: &dyn SQLExecutor, pallet: &Pallet) -> Result<(), ServiceError> {
    tx.exec(
        "INSERT INTO pallets \
         (pallet_id, group_key, product_number, expiry_date, total_quantity, \
          is_closed, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        &[
            Value::Text(pallet.pallet_id.clone()),
            Value::Text(pallet.group_key.clone()),
            Value::Text(pallet.product_number.clone()),
            Value::Text(pallet.expiry_date.clone()),
            Value::Integer(pallet.total_quantity),
            Value::Integer(pallet.is_closed as i64),
            Value::Text(pallet.created_at.clone()),
        ],
    )
    .map_err(storage)?;
    Ok(())
}

fn insert_item(tx: &dyn SQLExecutor, item: &PalletItem) -> Result<(), ServiceError> {
    tx.exec(
        "INSERT INTO pallet_items (id, pallet_id, product_number, expiry_date, quantity) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        &[
            Value::Integer(item.id),
            Value::Text(item.pallet_id.clone()),
            Value::Text(item.product_number.clone()),
            Value::Text(item.expiry_date.clone()),
            Value::Integer(item.quantity),
        ],
    )
    .map_err(storage)?;
    Ok(())
}

fn insert_scan(tx: &dyn SQLExecutor, entry: &ScanEntry) -> Result<(), ServiceError> {
    tx.exec(
        "INSERT INTO scan_entries \
         (id, timestamp, product_number, expiry_date, quantity, pallet_id, group_key, \
          created_new_pallet, confirmed_quantity, confirmed_moved, confirmed_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        &[
            Value::Integer(entry.id),
            Value::Text(entry.timestamp.clone()),
            Value::Text(entry.product_number.clone()),
            Value::Text(entry.expiry_date.clone()),
            Value::Integer(entry.quantity),
            Value::Text(entry.pallet_id.clone()),
            Value::Text(entry.group_key.clone()),
            Value::Integer(entry.created_new_pallet as i64),
            Value::Integer(entry.confirmed_quantity),
            Value::Integer(entry.confirmed_moved as i64),
            match &entry.confirmed_at {
                Some(ts) => Value::Text(ts.clone()),
                None => Value::Null,
            },
        ],
    )
    .map_err(storage)?;
    Ok(())
}

fn insert_audit(tx: &dyn SQLExecutor, audit: &AuditEntry) -> Result<(), ServiceError> {
    tx.exec(
        "INSERT INTO audit_entries (id, timestamp, action, details, machine_name) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        &[
            Value::Integer(audit.id),
            Value::Text(audit.timestamp.clone()),
            Value::Text(audit.action.clone()),
            Value::Text(audit.details.clone()),
            Value::Text(audit.machine_name.clone()),
        ],
    )
    .map_err(storage)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use openwms_core::ServiceError;

    use super::super::test_support::repo;
    use super::{SNAPSHOT_VERSION, Snapshot};

    #[test]
    fn backup_restore_roundtrip() {
        let source = repo();
        source.register("ITEM-1", "20260101", 2).unwrap();
        source.register("ITEM-2", "20260101", 1).unwrap();
        source.register("ITEM-1", "20270101", 3).unwrap(); // second pallet
        source.confirm_latest_unconfirmed("P-001", Utc::now()).unwrap();
        source.close_pallet("P-002").unwrap();

        let payload = source.backup().unwrap();
        let before: Snapshot = serde_json::from_slice(&payload).unwrap();

        let target = repo();
        target.register("OTHER", "20250101", 9).unwrap(); // overwritten
        target.restore(&payload).unwrap();

        let after_payload = target.backup().unwrap();
        let after: Snapshot = serde_json::from_slice(&after_payload).unwrap();

        assert_eq!(before.pallets, after.pallets);
        assert_eq!(before.pallet_items, after.pallet_items);
        assert_eq!(before.scan_entries, after.scan_entries);
        // The restore's own audit row is the only difference.
        assert_eq!(after.audit_entries.len(), before.audit_entries.len() + 1);
        assert_eq!(
            after.audit_entries[..before.audit_entries.len()],
            before.audit_entries[..],
        );
        assert_eq!(after.audit_entries.last().unwrap().action, "RESTORE");
    }

    #[test]
    fn backup_records_payload_size_in_audit() {
        let r = repo();
        r.register("ITEM-1", "20260101", 1).unwrap();
        let payload = r.backup().unwrap();

        let audit = r.recent_audit(1).unwrap();
        assert_eq!(audit[0].action, "BACKUP");
        assert_eq!(audit[0].details, format!("snapshot {} bytes", payload.len()));
    }

    #[test]
    fn restore_preserves_ledger_ids_and_continues_after_max() {
        let r = repo();
        r.register("ITEM-1", "20260101", 1).unwrap();
        r.register("ITEM-2", "20260101", 1).unwrap();
        let payload = r.backup().unwrap();

        let target = repo();
        target.restore(&payload).unwrap();

        let ids: Vec<i64> = target
            .recent_entries(10)
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![2, 1]);

        // New entries continue past the restored maximum.
        target.register("ITEM-3", "20260101", 1).unwrap();
        assert_eq!(target.recent_entries(1).unwrap()[0].id, 3);
    }

    #[test]
    fn malformed_payload_fails_before_truncation() {
        let r = repo();
        r.register("ITEM-1", "20260101", 2).unwrap();

        let err = r.restore(b"{ not json").unwrap_err();
        assert!(matches!(err, ServiceError::Corrupt(_)));

        // Existing data untouched.
        assert_eq!(r.open_pallets().unwrap().len(), 1);
        assert_eq!(r.get_pallet("P-001").unwrap().total_quantity, 2);
    }

    #[test]
    fn version_mismatch_fails_before_truncation() {
        let r = repo();
        r.register("ITEM-1", "20260101", 2).unwrap();
        let payload = r.backup().unwrap();

        let mut snapshot: Snapshot = serde_json::from_slice(&payload).unwrap();
        snapshot.version = SNAPSHOT_VERSION + 1;
        let tampered = serde_json::to_vec(&snapshot).unwrap();

        let err = r.restore(&tampered).unwrap_err();
        assert!(matches!(err, ServiceError::Corrupt(_)));
        assert_eq!(r.open_pallets().unwrap().len(), 1);
    }

    #[test]
    fn structurally_wrong_payload_is_corrupt() {
        let r = repo();
        let err = r.restore(br#"{"version": 1}"#).unwrap_err();
        assert!(matches!(err, ServiceError::Corrupt(_)));
    }
}
