//! WMS module — pallet consolidation for outbound sorting.
//!
//! Colli (physical scannable units) are registered by product barcode and
//! allocated onto open pallets; pallet scans confirm physical placement;
//! the most recent registration can always be undone. All persisted state
//! lives behind the `sql` capability traits and every mutation is a single
//! transaction under one process-wide write lock.

pub mod barcode;
pub mod config;
pub mod guard;
pub mod model;
pub mod repo;
pub mod service;

pub use config::WmsConfig;
pub use service::WmsService;
