//! Duplicate scan guard.
//!
//! Handheld scanners double-fire: one physical trigger pull can deliver
//! the same pallet code twice within milliseconds, which would confirm two
//! colli instead of one. The guard absorbs these repeats with a sliding
//! window per pallet id. It is best-effort and in-process only — not
//! durable, not distributed — and deliberately independent of the write
//! lock so rejection never waits on storage I/O.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Entry cap above which stale timestamps are swept out opportunistically.
const SWEEP_LIMIT: usize = 512;

/// Sliding-window duplicate filter keyed by pallet id.
pub struct ScanGuard {
    enabled: bool,
    window: Duration,
    last_seen: Mutex<HashMap<String, Instant>>,
}

impl ScanGuard {
    pub fn new(enabled: bool, window_ms: u64) -> Self {
        Self {
            enabled,
            window: Duration::from_millis(window_ms),
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    /// Check whether a scan of `pallet_id` is a duplicate.
    ///
    /// A repeat within the window is blocked and *refreshes* the window,
    /// so a scanner stuck in a retry loop stays blocked. A first scan (or
    /// one past the window) records the current time and passes.
    pub fn is_blocked(&self, pallet_id: &str) -> bool {
        if !self.enabled || self.window.is_zero() {
            return false;
        }

        let now = Instant::now();
        let threshold = now.checked_sub(self.window);

        // The guard is advisory; a poisoned map just keeps its entries.
        let mut map = match self.last_seen.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(last) = map.get_mut(pallet_id) {
            let within_window = match threshold {
                Some(t) => *last >= t,
                // Window reaches before process start — everything is recent.
                None => true,
            };
            if within_window {
                *last = now;
                return true;
            }
        }

        map.insert(pallet_id.to_string(), now);

        if map.len() > SWEEP_LIMIT {
            if let Some(t) = threshold {
                map.retain(|_, seen| *seen >= t);
            }
        }

        false
    }

    /// Number of tracked pallet ids (test hook).
    #[cfg(test)]
    fn tracked(&self) -> usize {
        match self.last_seen.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn disabled_never_blocks() {
        let g = ScanGuard::new(false, 1000);
        assert!(!g.is_blocked("P-001"));
        assert!(!g.is_blocked("P-001"));
    }

    #[test]
    fn zero_window_never_blocks() {
        let g = ScanGuard::new(true, 0);
        assert!(!g.is_blocked("P-001"));
        assert!(!g.is_blocked("P-001"));
    }

    #[test]
    fn repeat_within_window_blocked() {
        let g = ScanGuard::new(true, 60_000);
        assert!(!g.is_blocked("P-001"));
        assert!(g.is_blocked("P-001"));
        // Different pallet is unaffected.
        assert!(!g.is_blocked("P-002"));
    }

    #[test]
    fn passes_again_after_window() {
        let g = ScanGuard::new(true, 30);
        assert!(!g.is_blocked("P-001"));
        sleep(Duration::from_millis(50));
        assert!(!g.is_blocked("P-001"));
    }

    #[test]
    fn blocked_scan_refreshes_window() {
        let g = ScanGuard::new(true, 60);
        assert!(!g.is_blocked("P-001"));
        sleep(Duration::from_millis(35));
        // Still inside the window — blocked, and the window restarts.
        assert!(g.is_blocked("P-001"));
        sleep(Duration::from_millis(35));
        // Without the refresh this would pass; the refresh keeps it blocked.
        assert!(g.is_blocked("P-001"));
    }

    #[test]
    fn sweep_drops_stale_entries() {
        let g = ScanGuard::new(true, 20);
        for i in 0..SWEEP_LIMIT {
            assert!(!g.is_blocked(&format!("P-{:04}", i)));
        }
        assert_eq!(g.tracked(), SWEEP_LIMIT);

        sleep(Duration::from_millis(40));

        // Crossing the cap triggers the sweep; everything recorded before
        // the pause is stale by now.
        assert!(!g.is_blocked("P-9999"));
        assert_eq!(g.tracked(), 1);
    }
}
