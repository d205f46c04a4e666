//! Confirm-move state machine.
//!
//! A scan entry is Pending until its confirmed quantity reaches the
//! registered quantity. Each pallet scan confirms exactly one colli,
//! newest pending entry first.

use chrono::{DateTime, Utc};

use openwms_core::ServiceError;
use sql::Value;

use crate::model::audit::action;

use super::{WmsRepo, storage};

impl WmsRepo {
    /// Confirm one colli on `pallet_id`.
    ///
    /// Picks the highest-id entry with confirmation still outstanding,
    /// increments its confirmed quantity by one and stamps it. Returns the
    /// entry id, or `None` when the pallet has nothing pending — other
    /// pallets are never searched.
    pub fn confirm_latest_unconfirmed(
        &self,
        pallet_id: &str,
        confirmed_at: DateTime<Utc>,
    ) -> Result<Option<i64>, ServiceError> {
        self.mutate(|tx| {
            let rows = tx
                .query(
                    "SELECT id, quantity, confirmed_quantity FROM scan_entries \
                     WHERE pallet_id = ?1 AND confirmed_quantity < quantity \
                     ORDER BY id DESC LIMIT 1",
                    &[Value::Text(pallet_id.to_string())],
                )
                .map_err(storage)?;

            let Some(row) = rows.first() else {
                return Ok(None);
            };

            let entry_id = row
                .get_i64("id")
                .ok_or_else(|| ServiceError::Internal("missing column id".into()))?;
            let quantity = row
                .get_i64("quantity")
                .ok_or_else(|| ServiceError::Internal("missing column quantity".into()))?;
            let confirmed = row
                .get_i64("confirmed_quantity")
                .ok_or_else(|| ServiceError::Internal("missing column confirmed_quantity".into()))?;

            let new_confirmed = confirmed + 1;
            let moved = new_confirmed >= quantity;

            tx.exec(
                "UPDATE scan_entries \
                 SET confirmed_quantity = ?1, confirmed_moved = ?2, confirmed_at = ?3 \
                 WHERE id = ?4",
                &[
                    Value::Integer(new_confirmed),
                    Value::Integer(moved as i64),
                    Value::Text(confirmed_at.to_rfc3339()),
                    Value::Integer(entry_id),
                ],
            )
            .map_err(storage)?;

            self.append_audit(
                tx,
                action::CONFIRM,
                &format!("{} entry {} ({}/{})", pallet_id, entry_id, new_confirmed, quantity),
            )?;

            Ok(Some(entry_id))
        })
    }
}
