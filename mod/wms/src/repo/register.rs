//! Registration and pallet allocation.

use std::collections::HashMap;

use openwms_core::{ServiceError, now_rfc3339};
use sql::{SQLExecutor, Value};

use crate::model::audit::action;
use crate::model::pallet::parse_pallet_number;
use crate::model::group_key;

use super::{WmsRepo, storage};

/// Per-pallet view of the open pallets considered during allocation.
#[derive(Debug, Default)]
struct Candidate {
    /// Distinct (product, expiry) variants currently on the pallet.
    variants: u32,
    /// Holds this exact (product, expiry) already.
    has_exact: bool,
    /// Holds this product under a different expiry — hard exclusion.
    has_conflict: bool,
}

impl WmsRepo {
    /// Register `quantity` colli of (product, expiry) onto a pallet.
    ///
    /// Allocation order: conflict-free pallet with an exact variant match
    /// first, then the lowest-numbered open pallet with room under the
    /// variant cap, then a freshly created pallet. Returns the target
    /// pallet id and whether it was created by this call.
    pub fn register(
        &self,
        product: &str,
        expiry: &str,
        quantity: i64,
    ) -> Result<(String, bool), ServiceError> {
        self.mutate(|tx| {
            let (pallet_id, created_new) = allocate(tx, product, expiry, self.variant_cap)?;
            let now = now_rfc3339();

            if created_new {
                tx.exec(
                    "INSERT INTO pallets \
                     (pallet_id, group_key, product_number, expiry_date, \
                      total_quantity, is_closed, created_at) \
                     VALUES (?1, ?2, ?3, ?4, 0, 0, ?5)",
                    &[
                        Value::Text(pallet_id.clone()),
                        Value::Text(group_key(product, expiry)),
                        Value::Text(product.to_string()),
                        Value::Text(expiry.to_string()),
                        Value::Text(now.clone()),
                    ],
                )
                .map_err(storage)?;
            }

            upsert_item(tx, &pallet_id, product, expiry, quantity)?;

            tx.exec(
                "UPDATE pallets SET total_quantity = total_quantity + ?1 \
                 WHERE pallet_id = ?2",
                &[Value::Integer(quantity), Value::Text(pallet_id.clone())],
            )
            .map_err(storage)?;

            tx.exec(
                "INSERT INTO scan_entries \
                 (timestamp, product_number, expiry_date, quantity, pallet_id, \
                  group_key, created_new_pallet, confirmed_quantity, \
                  confirmed_moved, confirmed_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, 0, NULL)",
                &[
                    Value::Text(now),
                    Value::Text(product.to_string()),
                    Value::Text(expiry.to_string()),
                    Value::Integer(quantity),
                    Value::Text(pallet_id.clone()),
                    Value::Text(group_key(product, expiry)),
                    Value::Integer(created_new as i64),
                ],
            )
            .map_err(storage)?;

            let details = if created_new {
                format!("{} ({}) x{} -> {} (new pallet)", product, expiry, quantity, pallet_id)
            } else {
                format!("{} ({}) x{} -> {}", product, expiry, quantity, pallet_id)
            };
            self.append_audit(tx, action::REGISTER, &details)?;

            Ok((pallet_id, created_new))
        })
    }
}

/// Pick the target pallet for (product, expiry), or mint a new id.
fn allocate(
    tx: &dyn SQLExecutor,
    product: &str,
    expiry: &str,
    variant_cap: u32,
) -> Result<(String, bool), ServiceError> {
    let open_rows = tx
        .query("SELECT pallet_id FROM pallets WHERE is_closed = 0", &[])
        .map_err(storage)?;

    let mut candidates: HashMap<String, Candidate> = HashMap::new();
    for row in &open_rows {
        if let Some(id) = row.get_str("pallet_id") {
            candidates.insert(id.to_string(), Candidate::default());
        }
    }

    let item_rows = tx
        .query(
            "SELECT i.pallet_id, i.product_number, i.expiry_date \
             FROM pallet_items i \
             JOIN pallets p ON p.pallet_id = i.pallet_id \
             WHERE p.is_closed = 0",
            &[],
        )
        .map_err(storage)?;

    for row in &item_rows {
        let (Some(id), Some(item_product), Some(item_expiry)) = (
            row.get_str("pallet_id"),
            row.get_str("product_number"),
            row.get_str("expiry_date"),
        ) else {
            continue;
        };
        let Some(candidate) = candidates.get_mut(id) else {
            continue;
        };
        candidate.variants += 1;
        if item_product == product {
            if item_expiry == expiry {
                candidate.has_exact = true;
            } else {
                candidate.has_conflict = true;
            }
        }
    }

    // Ascending numeric order makes this a deterministic "fill the lowest
    // open pallet" policy.
    let mut ordered: Vec<(i64, &String, &Candidate)> = candidates
        .iter()
        .filter_map(|(id, c)| parse_pallet_number(id).map(|n| (n, id, c)))
        .collect();
    ordered.sort_by_key(|(n, _, _)| *n);

    let exact = ordered
        .iter()
        .find(|(_, _, c)| !c.has_conflict && c.has_exact);
    if let Some((_, id, _)) = exact {
        return Ok(((*id).clone(), false));
    }

    let with_room = ordered
        .iter()
        .find(|(_, _, c)| !c.has_conflict && c.variants < variant_cap);
    if let Some((_, id, _)) = with_room {
        return Ok(((*id).clone(), false));
    }

    Ok((next_pallet_id(tx)?, true))
}

/// Mint the next pallet id: max numeric suffix over all pallets (open or
/// closed) plus one, zero-padded to three digits.
fn next_pallet_id(tx: &dyn SQLExecutor) -> Result<String, ServiceError> {
    let rows = tx
        .query("SELECT pallet_id FROM pallets", &[])
        .map_err(storage)?;
    let max = rows
        .iter()
        .filter_map(|r| r.get_str("pallet_id").and_then(parse_pallet_number))
        .max()
        .unwrap_or(0);
    Ok(format!("P-{:03}", max + 1))
}

/// Insert or increment the (pallet, product, expiry) line item.
fn upsert_item(
    tx: &dyn SQLExecutor,
    pallet_id: &str,
    product: &str,
    expiry: &str,
    quantity: i64,
) -> Result<(), ServiceError> {
    let affected = tx
        .exec(
            "UPDATE pallet_items SET quantity = quantity + ?1 \
             WHERE pallet_id = ?2 AND product_number = ?3 AND expiry_date = ?4",
            &[
                Value::Integer(quantity),
                Value::Text(pallet_id.to_string()),
                Value::Text(product.to_string()),
                Value::Text(expiry.to_string()),
            ],
        )
        .map_err(storage)?;

    if affected == 0 {
        tx.exec(
            "INSERT INTO pallet_items (pallet_id, product_number, expiry_date, quantity) \
             VALUES (?1, ?2, ?3, ?4)",
            &[
                Value::Text(pallet_id.to_string()),
                Value::Text(product.to_string()),
                Value::Text(expiry.to_string()),
                Value::Integer(quantity),
            ],
        )
        .map_err(storage)?;
    }

    Ok(())
}
