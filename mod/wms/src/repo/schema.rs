use openwms_core::ServiceError;
use sql::SQLStore;

/// SQL DDL statements to initialize the WMS schema.
///
/// Integer primary keys are rowid aliases: the engine hands out
/// max(existing id) + 1, which is exactly the resynchronization the
/// snapshot restore relies on after reinserting rows with preserved ids.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS pallets (
        pallet_id TEXT PRIMARY KEY,
        group_key TEXT NOT NULL,
        product_number TEXT NOT NULL,
        expiry_date TEXT NOT NULL,
        total_quantity INTEGER NOT NULL DEFAULT 0,
        is_closed INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS pallet_items (
        id INTEGER PRIMARY KEY,
        pallet_id TEXT NOT NULL,
        product_number TEXT NOT NULL,
        expiry_date TEXT NOT NULL,
        quantity INTEGER NOT NULL,
        UNIQUE(pallet_id, product_number, expiry_date)
    )",
    "CREATE TABLE IF NOT EXISTS scan_entries (
        id INTEGER PRIMARY KEY,
        timestamp TEXT NOT NULL,
        product_number TEXT NOT NULL,
        expiry_date TEXT NOT NULL,
        quantity INTEGER NOT NULL,
        pallet_id TEXT NOT NULL,
        group_key TEXT NOT NULL,
        created_new_pallet INTEGER NOT NULL DEFAULT 0,
        confirmed_quantity INTEGER NOT NULL DEFAULT 0,
        confirmed_moved INTEGER NOT NULL DEFAULT 0,
        confirmed_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS audit_entries (
        id INTEGER PRIMARY KEY,
        timestamp TEXT NOT NULL,
        action TEXT NOT NULL,
        details TEXT NOT NULL,
        machine_name TEXT NOT NULL
    )",
    // Indexes
    "CREATE INDEX IF NOT EXISTS idx_items_pallet ON pallet_items(pallet_id)",
    "CREATE INDEX IF NOT EXISTS idx_scan_pallet ON scan_entries(pallet_id)",
    "CREATE INDEX IF NOT EXISTS idx_pallets_open ON pallets(is_closed)",
];

pub fn init_schema(sql: &dyn SQLStore) -> Result<(), ServiceError> {
    for stmt in SCHEMA {
        sql.exec(stmt, &[])
            .map_err(|e| ServiceError::Storage(format!("schema init failed: {}", e)))?;
    }
    Ok(())
}
