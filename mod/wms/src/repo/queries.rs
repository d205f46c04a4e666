//! Read-only queries. These take no write lock and rely on the store's
//! transaction isolation; they never observe a half-applied mutation.

use openwms_core::ServiceError;
use sql::Value;

use crate::model::{AuditEntry, Pallet, PalletItem, ScanEntry};

use super::{WmsRepo, storage};

const PALLET_COLUMNS: &str =
    "pallet_id, group_key, product_number, expiry_date, total_quantity, is_closed, created_at";

const SCAN_COLUMNS: &str = "id, timestamp, product_number, expiry_date, quantity, pallet_id, \
     group_key, created_new_pallet, confirmed_quantity, confirmed_moved, confirmed_at";

impl WmsRepo {
    /// All open pallets in ascending numeric order.
    pub fn open_pallets(&self) -> Result<Vec<Pallet>, ServiceError> {
        let rows = self
            .sql
            .query(
                &format!("SELECT {} FROM pallets WHERE is_closed = 0", PALLET_COLUMNS),
                &[],
            )
            .map_err(storage)?;
        let mut pallets = rows
            .iter()
            .map(Pallet::from_row)
            .collect::<Result<Vec<_>, _>>()?;
        pallets.sort_by_key(Pallet::number);
        Ok(pallets)
    }

    /// Look up a single pallet.
    pub fn get_pallet(&self, pallet_id: &str) -> Result<Pallet, ServiceError> {
        let rows = self
            .sql
            .query(
                &format!("SELECT {} FROM pallets WHERE pallet_id = ?1", PALLET_COLUMNS),
                &[Value::Text(pallet_id.to_string())],
            )
            .map_err(storage)?;
        let row = rows
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("pallet {}", pallet_id)))?;
        Pallet::from_row(row)
    }

    /// Line items of one pallet, oldest first.
    pub fn pallet_contents(&self, pallet_id: &str) -> Result<Vec<PalletItem>, ServiceError> {
        // Distinguishes "unknown pallet" from "empty pallet".
        self.get_pallet(pallet_id)?;
        let rows = self
            .sql
            .query(
                "SELECT id, pallet_id, product_number, expiry_date, quantity \
                 FROM pallet_items WHERE pallet_id = ?1 ORDER BY id",
                &[Value::Text(pallet_id.to_string())],
            )
            .map_err(storage)?;
        rows.iter().map(PalletItem::from_row).collect()
    }

    /// The newest `limit` scan ledger rows, newest first.
    pub fn recent_entries(&self, limit: usize) -> Result<Vec<ScanEntry>, ServiceError> {
        let rows = self
            .sql
            .query(
                &format!(
                    "SELECT {} FROM scan_entries ORDER BY id DESC LIMIT ?1",
                    SCAN_COLUMNS
                ),
                &[Value::Integer(limit as i64)],
            )
            .map_err(storage)?;
        rows.iter().map(ScanEntry::from_row).collect()
    }

    /// The newest `limit` audit rows, newest first.
    pub fn recent_audit(&self, limit: usize) -> Result<Vec<AuditEntry>, ServiceError> {
        let rows = self
            .sql
            .query(
                "SELECT id, timestamp, action, details, machine_name \
                 FROM audit_entries ORDER BY id DESC LIMIT ?1",
                &[Value::Integer(limit as i64)],
            )
            .map_err(storage)?;
        rows.iter().map(AuditEntry::from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use openwms_core::ServiceError;

    use super::super::test_support::repo;

    #[test]
    fn open_pallets_sorted_numerically() {
        let r = repo();
        // Force several pallets via expiry conflicts on one product.
        r.register("ITEM-1", "20260101", 1).unwrap();
        r.register("ITEM-1", "20260201", 1).unwrap();
        r.register("ITEM-1", "20260301", 1).unwrap();

        let ids: Vec<String> = r
            .open_pallets()
            .unwrap()
            .into_iter()
            .map(|p| p.pallet_id)
            .collect();
        assert_eq!(ids, vec!["P-001", "P-002", "P-003"]);
    }

    #[test]
    fn closed_pallets_excluded_from_open_listing() {
        let r = repo();
        r.register("ITEM-1", "20260101", 1).unwrap();
        r.register("ITEM-1", "20260201", 1).unwrap();
        r.close_pallet("P-001").unwrap();

        let ids: Vec<String> = r
            .open_pallets()
            .unwrap()
            .into_iter()
            .map(|p| p.pallet_id)
            .collect();
        assert_eq!(ids, vec!["P-002"]);
    }

    #[test]
    fn contents_of_unknown_pallet_is_not_found() {
        let r = repo();
        assert!(matches!(
            r.pallet_contents("P-404").unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[test]
    fn recent_entries_newest_first_with_limit() {
        let r = repo();
        r.register("ITEM-1", "20260101", 1).unwrap();
        r.register("ITEM-2", "20260101", 1).unwrap();
        r.register("ITEM-3", "20260101", 1).unwrap();

        let entries = r.recent_entries(2).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].product_number, "ITEM-3");
        assert_eq!(entries[1].product_number, "ITEM-2");
    }
}
