//! Orchestration service — input validation, barcode normalization,
//! duplicate suppression and logging in front of the repository.
//!
//! Validation failures and duplicate scans are rejected here, before any
//! storage I/O. Everything that touches the database is delegated to
//! [`WmsRepo`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use openwms_core::ServiceError;
use sql::SQLStore;

use crate::barcode::{decode_pallet_code, normalize_product_code};
use crate::config::WmsConfig;
use crate::guard::ScanGuard;
use crate::model::{AuditEntry, Pallet, PalletItem, ScanEntry};
use crate::repo::WmsRepo;

/// Result of a registration scan.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub pallet_id: String,
    pub created_new: bool,
}

/// Result of an undo.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UndoneScan {
    pub pallet_id: String,
    pub quantity: i64,
}

/// Result of a batch confirmation: how many scans were requested and how
/// many confirmed before the pallet ran out of pending entries.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchConfirmation {
    pub requested: u32,
    pub confirmed: u32,
}

/// WMS service — validation and orchestration over the repository.
pub struct WmsService {
    repo: WmsRepo,
    guard: ScanGuard,
}

impl WmsService {
    pub fn new(sql: Box<dyn SQLStore>, config: WmsConfig) -> Result<Self, ServiceError> {
        let repo = WmsRepo::new(sql, config.variant_cap, config.machine.clone())?;
        let guard = ScanGuard::new(config.guard_enabled, config.duplicate_window_ms);
        Ok(Self { repo, guard })
    }

    // ── Mutations ──

    /// Register `quantity` colli from a raw product scan.
    pub fn register(
        &self,
        raw_product: &str,
        expiry: &str,
        quantity: i64,
    ) -> Result<Registration, ServiceError> {
        let product = normalize_product_code(raw_product);
        if product.is_empty() {
            return Err(ServiceError::Validation("product barcode is required".into()));
        }
        let expiry = validate_expiry(expiry)?;
        if quantity <= 0 {
            return Err(ServiceError::Validation(format!(
                "quantity must be positive, got {}",
                quantity
            )));
        }

        let (pallet_id, created_new) = self.repo.register(&product, &expiry, quantity)?;
        info!(
            product = %product,
            quantity,
            pallet = %pallet_id,
            created_new,
            "registered colli"
        );
        Ok(Registration { pallet_id, created_new })
    }

    /// Confirm one colli from a raw pallet scan.
    ///
    /// Returns the confirmed scan entry id, or `None` when the pallet has
    /// nothing pending.
    pub fn confirm(
        &self,
        scanned_code: &str,
        confirmed_at: DateTime<Utc>,
    ) -> Result<Option<i64>, ServiceError> {
        let pallet_id = self.decode_scan(scanned_code)?;

        let result = self.repo.confirm_latest_unconfirmed(&pallet_id, confirmed_at)?;
        match result {
            Some(entry_id) => info!(pallet = %pallet_id, entry_id, "confirmed colli"),
            None => debug!(pallet = %pallet_id, "nothing pending to confirm"),
        }
        Ok(result)
    }

    /// Confirm up to `count` colli from one pallet scan, sequentially,
    /// halting when the pallet runs out of pending entries.
    pub fn confirm_batch(
        &self,
        scanned_code: &str,
        count: u32,
    ) -> Result<BatchConfirmation, ServiceError> {
        let pallet_id = self.decode_scan(scanned_code)?;

        let mut confirmed = 0;
        for _ in 0..count {
            match self.repo.confirm_latest_unconfirmed(&pallet_id, Utc::now())? {
                Some(_) => confirmed += 1,
                None => break,
            }
        }

        info!(pallet = %pallet_id, requested = count, confirmed, "batch confirmation");
        Ok(BatchConfirmation { requested: count, confirmed })
    }

    /// Undo the most recent registration, system-wide.
    pub fn undo_last(&self) -> Result<Option<UndoneScan>, ServiceError> {
        let result = self.repo.undo_last()?;
        match &result {
            Some((pallet_id, quantity)) => {
                info!(pallet = %pallet_id, quantity, "undid last registration")
            }
            None => debug!("nothing to undo"),
        }
        Ok(result.map(|(pallet_id, quantity)| UndoneScan { pallet_id, quantity }))
    }

    /// Close a pallet so allocation skips it.
    pub fn close_pallet(&self, pallet_id: &str) -> Result<(), ServiceError> {
        let pallet_id = pallet_id.trim();
        if pallet_id.is_empty() {
            return Err(ServiceError::Validation("pallet id is required".into()));
        }
        self.repo.close_pallet(pallet_id)?;
        info!(pallet = %pallet_id, "closed pallet");
        Ok(())
    }

    /// Wipe all pallets and scans (the audit trail is kept).
    pub fn clear_all(&self) -> Result<(), ServiceError> {
        self.repo.clear_all()?;
        info!("cleared all pallets and scans");
        Ok(())
    }

    /// Serialize the full dataset into a snapshot payload.
    pub fn backup(&self) -> Result<Vec<u8>, ServiceError> {
        let payload = self.repo.backup()?;
        info!(bytes = payload.len(), "created snapshot");
        Ok(payload)
    }

    /// Replace the full dataset from a snapshot payload.
    pub fn restore(&self, payload: &[u8]) -> Result<(), ServiceError> {
        self.repo.restore(payload)?;
        info!(bytes = payload.len(), "restored snapshot");
        Ok(())
    }

    // ── Queries ──

    pub fn open_pallets(&self) -> Result<Vec<Pallet>, ServiceError> {
        self.repo.open_pallets()
    }

    pub fn get_pallet(&self, pallet_id: &str) -> Result<Pallet, ServiceError> {
        self.repo.get_pallet(pallet_id)
    }

    pub fn pallet_contents(&self, pallet_id: &str) -> Result<Vec<PalletItem>, ServiceError> {
        self.repo.pallet_contents(pallet_id)
    }

    pub fn recent_entries(&self, limit: usize) -> Result<Vec<ScanEntry>, ServiceError> {
        self.repo.recent_entries(limit)
    }

    pub fn recent_audit(&self, limit: usize) -> Result<Vec<AuditEntry>, ServiceError> {
        self.repo.recent_audit(limit)
    }

    // ── Helpers ──

    /// Decode a pallet scan and run it past the duplicate guard.
    fn decode_scan(&self, scanned_code: &str) -> Result<String, ServiceError> {
        let pallet_id = decode_pallet_code(scanned_code)
            .map_err(|e| ServiceError::Validation(e.to_string()))?;

        if self.guard.is_blocked(&pallet_id) {
            debug!(pallet = %pallet_id, "duplicate pallet scan suppressed");
            return Err(ServiceError::DuplicateScan(format!(
                "pallet {} was scanned again within the suppression window",
                pallet_id
            )));
        }

        Ok(pallet_id)
    }
}

/// Expiry dates travel as compact `YYYYMMDD` strings; anything else is
/// rejected before storage.
fn validate_expiry(expiry: &str) -> Result<String, ServiceError> {
    let expiry = expiry.trim();
    if expiry.len() != 8 || !expiry.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ServiceError::Validation(format!(
            "expiry date must be 8 digits (YYYYMMDD), got '{}'",
            expiry
        )));
    }
    NaiveDate::parse_from_str(expiry, "%Y%m%d").map_err(|_| {
        ServiceError::Validation(format!("expiry date '{}' is not a valid date", expiry))
    })?;
    Ok(expiry.to_string())
}
