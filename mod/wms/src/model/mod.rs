pub mod audit;
pub mod pallet;
pub mod scan;

pub use audit::AuditEntry;
pub use pallet::{Pallet, PalletItem};
pub use scan::{ConfirmState, ScanEntry};

/// Derived `product|expiry` key identifying a variant grouping.
pub fn group_key(product_number: &str, expiry_date: &str) -> String {
    format!("{}|{}", product_number, expiry_date)
}
