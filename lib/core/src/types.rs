/// Get the current time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Best-effort machine identifier for audit rows.
///
/// Reads `HOSTNAME` (set by most shells and container runtimes) and falls
/// back to a fixed placeholder so audit rows are never empty.
pub fn machine_name() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
