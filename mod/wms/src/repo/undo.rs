//! Undo — reverse the most recent registration, system-wide.

use openwms_core::ServiceError;
use sql::{SQLExecutor, Value};

use crate::model::ScanEntry;
use crate::model::audit::action;

use super::{WmsRepo, storage};

impl WmsRepo {
    /// Reverse the newest scan entry in the ledger.
    ///
    /// Deletes the entry, rolls its quantity out of the matching line item
    /// and the pallet total, and deletes the pallet outright when the entry
    /// founded it and nothing else remains. Returns the reversed pallet id
    /// and quantity, or `None` on an empty ledger.
    ///
    /// Confirmation progress is deliberately not checked: a fully
    /// confirmed move is undone the same way as a pending one. The audit
    /// row records how far confirmation had gotten.
    pub fn undo_last(&self) -> Result<Option<(String, i64)>, ServiceError> {
        self.mutate(|tx| {
            let rows = tx
                .query(
                    "SELECT id, timestamp, product_number, expiry_date, quantity, \
                            pallet_id, group_key, created_new_pallet, \
                            confirmed_quantity, confirmed_moved, confirmed_at \
                     FROM scan_entries ORDER BY id DESC LIMIT 1",
                    &[],
                )
                .map_err(storage)?;

            let Some(row) = rows.first() else {
                return Ok(None);
            };
            let entry = ScanEntry::from_row(row)?;

            tx.exec(
                "DELETE FROM scan_entries WHERE id = ?1",
                &[Value::Integer(entry.id)],
            )
            .map_err(storage)?;

            tx.exec(
                "UPDATE pallet_items SET quantity = quantity - ?1 \
                 WHERE pallet_id = ?2 AND product_number = ?3 AND expiry_date = ?4",
                &[
                    Value::Integer(entry.quantity),
                    Value::Text(entry.pallet_id.clone()),
                    Value::Text(entry.product_number.clone()),
                    Value::Text(entry.expiry_date.clone()),
                ],
            )
            .map_err(storage)?;

            tx.exec(
                "DELETE FROM pallet_items \
                 WHERE pallet_id = ?1 AND product_number = ?2 AND expiry_date = ?3 \
                 AND quantity <= 0",
                &[
                    Value::Text(entry.pallet_id.clone()),
                    Value::Text(entry.product_number.clone()),
                    Value::Text(entry.expiry_date.clone()),
                ],
            )
            .map_err(storage)?;

            let new_total = remaining_total(tx, &entry.pallet_id)?;

            let mut details = format!(
                "{} ({}) x{} from {}; was confirmed {}/{}",
                entry.product_number,
                entry.expiry_date,
                entry.quantity,
                entry.pallet_id,
                entry.confirmed_quantity,
                entry.quantity,
            );

            if new_total <= 0 && entry.created_new_pallet {
                // Reversing the founding registration removes the pallet.
                tx.exec(
                    "DELETE FROM pallet_items WHERE pallet_id = ?1",
                    &[Value::Text(entry.pallet_id.clone())],
                )
                .map_err(storage)?;
                tx.exec(
                    "DELETE FROM pallets WHERE pallet_id = ?1",
                    &[Value::Text(entry.pallet_id.clone())],
                )
                .map_err(storage)?;
                details.push_str("; pallet deleted");
            } else {
                tx.exec(
                    "UPDATE pallets SET total_quantity = ?1 WHERE pallet_id = ?2",
                    &[
                        Value::Integer(new_total.max(0)),
                        Value::Text(entry.pallet_id.clone()),
                    ],
                )
                .map_err(storage)?;
            }

            self.append_audit(tx, action::UNDO, &details)?;

            Ok(Some((entry.pallet_id.clone(), entry.quantity)))
        })
    }
}

fn remaining_total(tx: &dyn SQLExecutor, pallet_id: &str) -> Result<i64, ServiceError> {
    let rows = tx
        .query(
            "SELECT COALESCE(SUM(quantity), 0) AS total FROM pallet_items \
             WHERE pallet_id = ?1",
            &[Value::Text(pallet_id.to_string())],
        )
        .map_err(storage)?;
    Ok(rows.first().and_then(|r| r.get_i64("total")).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use openwms_core::ServiceError;

    use super::super::test_support::repo;

    #[test]
    fn undo_on_empty_ledger_is_none() {
        let r = repo();
        assert!(r.undo_last().unwrap().is_none());
    }

    #[test]
    fn undo_founding_registration_deletes_pallet() {
        let r = repo();
        r.register("ITEM-1", "20260101", 2).unwrap();

        let undone = r.undo_last().unwrap();
        assert_eq!(undone, Some(("P-001".into(), 2)));

        assert!(r.open_pallets().unwrap().is_empty());
        assert!(matches!(
            r.get_pallet("P-001").unwrap_err(),
            ServiceError::NotFound(_)
        ));
        assert!(r.recent_entries(10).unwrap().is_empty());
    }

    #[test]
    fn undo_decrements_existing_line_item() {
        let r = repo();
        r.register("ITEM-1", "20260101", 2).unwrap();
        r.register("ITEM-1", "20260101", 3).unwrap();

        let undone = r.undo_last().unwrap();
        assert_eq!(undone, Some(("P-001".into(), 3)));

        let pallet = r.get_pallet("P-001").unwrap();
        assert_eq!(pallet.total_quantity, 2);
        let items = r.pallet_contents("P-001").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
    }

    #[test]
    fn undo_removes_drained_line_item_but_keeps_pallet() {
        let r = repo();
        r.register("ITEM-1", "20260101", 2).unwrap(); // founds P-001
        r.register("ITEM-2", "20260101", 1).unwrap(); // second variant

        let undone = r.undo_last().unwrap();
        assert_eq!(undone, Some(("P-001".into(), 1)));

        // ITEM-2's line item is gone, the pallet survives with ITEM-1.
        let items = r.pallet_contents("P-001").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_number, "ITEM-1");
        assert_eq!(r.get_pallet("P-001").unwrap().total_quantity, 2);
    }

    #[test]
    fn undo_is_global_lifo() {
        let r = repo();
        r.register("ITEM-1", "20260101", 1).unwrap(); // P-001
        r.register("ITEM-1", "20270101", 1).unwrap(); // P-002 (conflict)

        // Newest entry is P-002's, regardless of which pallet was touched
        // first.
        assert_eq!(r.undo_last().unwrap(), Some(("P-002".into(), 1)));
        assert_eq!(r.undo_last().unwrap(), Some(("P-001".into(), 1)));
        assert!(r.undo_last().unwrap().is_none());
    }

    #[test]
    fn fully_confirmed_entry_can_still_be_undone() {
        let r = repo();
        r.register("ITEM-1", "20260101", 2).unwrap();
        r.confirm_latest_unconfirmed("P-001", Utc::now()).unwrap();
        r.confirm_latest_unconfirmed("P-001", Utc::now()).unwrap();

        assert_eq!(r.undo_last().unwrap(), Some(("P-001".into(), 2)));
        assert!(r.open_pallets().unwrap().is_empty());

        // The audit row preserves the confirmation progress that was lost.
        let audit = r.recent_audit(1).unwrap();
        assert_eq!(audit[0].action, "UNDO");
        assert!(audit[0].details.contains("was confirmed 2/2"));
    }

    #[test]
    fn undo_after_pallet_closed_still_reverses() {
        let r = repo();
        r.register("ITEM-1", "20260101", 2).unwrap();
        r.close_pallet("P-001").unwrap();

        assert_eq!(r.undo_last().unwrap(), Some(("P-001".into(), 2)));
        assert!(matches!(
            r.get_pallet("P-001").unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }
}
