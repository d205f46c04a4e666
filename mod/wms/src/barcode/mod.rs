//! Barcode handling — product scan normalization and the pallet label
//! codec.

pub mod normalize;
pub mod pallet;

pub use normalize::normalize_product_code;
pub use pallet::{decode_pallet_code, encode_pallet_code, PalletCodeError, PALLET_PREFIX};
