use serde::{Deserialize, Serialize};

use openwms_core::ServiceError;
use sql::Row;

/// Pallet — a physical container accumulating colli until closed.
/// PK = pallet_id ("P-NNN", monotonically assigned).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pallet {
    pub pallet_id: String,

    /// Group key of the registration that founded the pallet.
    pub group_key: String,

    pub product_number: String,

    pub expiry_date: String,

    /// Cached sum of the pallet's line item quantities.
    pub total_quantity: i64,

    pub is_closed: bool,

    pub created_at: String,
}

impl Pallet {
    /// Numeric suffix of the id ("P-012" → 12). Ids that do not follow
    /// the scheme sort first.
    pub fn number(&self) -> i64 {
        parse_pallet_number(&self.pallet_id).unwrap_or(0)
    }

    pub fn from_row(row: &Row) -> Result<Self, ServiceError> {
        Ok(Self {
            pallet_id: require_str(row, "pallet_id")?,
            group_key: require_str(row, "group_key")?,
            product_number: require_str(row, "product_number")?,
            expiry_date: require_str(row, "expiry_date")?,
            total_quantity: require_i64(row, "total_quantity")?,
            is_closed: require_bool(row, "is_closed")?,
            created_at: require_str(row, "created_at")?,
        })
    }
}

/// PalletLineItem — quantity of one (product, expiry) variant on a pallet.
/// Unique per (pallet_id, product_number, expiry_date).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PalletItem {
    pub id: i64,
    pub pallet_id: String,
    pub product_number: String,
    pub expiry_date: String,
    pub quantity: i64,
}

impl PalletItem {
    pub fn from_row(row: &Row) -> Result<Self, ServiceError> {
        Ok(Self {
            id: require_i64(row, "id")?,
            pallet_id: require_str(row, "pallet_id")?,
            product_number: require_str(row, "product_number")?,
            expiry_date: require_str(row, "expiry_date")?,
            quantity: require_i64(row, "quantity")?,
        })
    }
}

/// Parse the numeric suffix from a "P-NNN" pallet id.
pub fn parse_pallet_number(pallet_id: &str) -> Option<i64> {
    pallet_id.strip_prefix("P-")?.parse().ok()
}

pub(crate) fn require_str(row: &Row, name: &str) -> Result<String, ServiceError> {
    row.get_str(name)
        .map(String::from)
        .ok_or_else(|| ServiceError::Internal(format!("missing column {}", name)))
}

pub(crate) fn require_i64(row: &Row, name: &str) -> Result<i64, ServiceError> {
    row.get_i64(name)
        .ok_or_else(|| ServiceError::Internal(format!("missing column {}", name)))
}

pub(crate) fn require_bool(row: &Row, name: &str) -> Result<bool, ServiceError> {
    row.get_bool(name)
        .ok_or_else(|| ServiceError::Internal(format!("missing column {}", name)))
}
