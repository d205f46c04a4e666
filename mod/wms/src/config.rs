use serde::Deserialize;

use openwms_core::machine_name;

/// WMS module configuration.
///
/// All fields have defaults so an embedding binary can deserialize this
/// from a partial config file section (or just use `WmsConfig::default()`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WmsConfig {
    /// Maximum distinct (product, expiry) variants per pallet. A scan that
    /// extends an already-present variant is exempt from the cap.
    pub variant_cap: u32,

    /// Duplicate-scan suppression window in milliseconds. Zero disables
    /// suppression even when `guard_enabled` is true.
    pub duplicate_window_ms: u64,

    /// Whether the duplicate-scan guard is active at all.
    pub guard_enabled: bool,

    /// Machine identifier written into audit rows.
    pub machine: String,
}

impl Default for WmsConfig {
    fn default() -> Self {
        Self {
            variant_cap: 4,
            duplicate_window_ms: 1500,
            guard_enabled: true,
            machine: machine_name(),
        }
    }
}
