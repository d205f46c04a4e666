use serde::{Deserialize, Serialize};

use openwms_core::ServiceError;
use sql::Row;

use super::pallet::{require_bool, require_i64, require_str};

/// Confirmation progress of a scan entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfirmState {
    Pending,
    PartiallyConfirmed,
    FullyConfirmed,
}

/// ScanEntry — one row of the append-only scan ledger.
///
/// Created by registration, mutated only by incrementing
/// `confirmed_quantity`, deleted only by undo (which always removes the
/// newest row, ledger-wide).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScanEntry {
    pub id: i64,
    pub timestamp: String,
    pub product_number: String,
    pub expiry_date: String,
    pub quantity: i64,
    pub pallet_id: String,
    pub group_key: String,

    /// Whether this registration founded its pallet. Undo uses this to
    /// decide whether reversing the entry also deletes the pallet.
    pub created_new_pallet: bool,

    pub confirmed_quantity: i64,
    pub confirmed_moved: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<String>,
}

impl ScanEntry {
    pub fn confirm_state(&self) -> ConfirmState {
        if self.confirmed_moved {
            ConfirmState::FullyConfirmed
        } else if self.confirmed_quantity > 0 {
            ConfirmState::PartiallyConfirmed
        } else {
            ConfirmState::Pending
        }
    }

    pub fn from_row(row: &Row) -> Result<Self, ServiceError> {
        Ok(Self {
            id: require_i64(row, "id")?,
            timestamp: require_str(row, "timestamp")?,
            product_number: require_str(row, "product_number")?,
            expiry_date: require_str(row, "expiry_date")?,
            quantity: require_i64(row, "quantity")?,
            pallet_id: require_str(row, "pallet_id")?,
            group_key: require_str(row, "group_key")?,
            created_new_pallet: require_bool(row, "created_new_pallet")?,
            confirmed_quantity: require_i64(row, "confirmed_quantity")?,
            confirmed_moved: require_bool(row, "confirmed_moved")?,
            confirmed_at: row.get_str("confirmed_at").map(String::from),
        })
    }
}
