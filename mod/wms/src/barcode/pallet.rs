//! Pallet label codec.
//!
//! Pallet labels are printed as `PALLET:P-001`. Handheld scanners with a
//! mismatched keyboard layout can mangle separators (`:` arriving as `+`,
//! stray characters around the payload), so decoding is deliberately
//! tolerant: it hunts for the `P-<digits>` core and rebuilds the canonical
//! id from that.

/// Prefix marking a scan payload as a pallet label.
pub const PALLET_PREFIX: &str = "PALLET:";

/// Errors during pallet code decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PalletCodeError {
    #[error("no pallet number found in scan '{0}'")]
    NoNumber(String),
}

/// Encode a pallet id into its label payload.
///
/// The id is trimmed, upper-cased, legacy `+` separators become `-`, and
/// anything outside `[A-Z0-9-]` is dropped before prefixing.
pub fn encode_pallet_code(pallet_id: &str) -> String {
    let normalized: String = pallet_id
        .trim()
        .to_uppercase()
        .chars()
        .map(|c| if c == '+' { '-' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    format!("{}{}", PALLET_PREFIX, normalized)
}

/// Decode a scanned payload back into a canonical pallet id.
///
/// Tolerant of scanner noise: upper-cases, maps `+` to `-`, drops
/// characters outside `[A-Z0-9:-]`, then takes the digit run after the
/// first `P-` occurrence and rebuilds `P-<digits>`.
pub fn decode_pallet_code(raw: &str) -> Result<String, PalletCodeError> {
    let cleaned: String = raw
        .trim()
        .to_uppercase()
        .chars()
        .map(|c| if c == '+' { '-' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == ':')
        .collect();

    let body = cleaned.strip_prefix(PALLET_PREFIX).unwrap_or(&cleaned);

    if let Some(pos) = body.find("P-") {
        let digits: String = body[pos + 2..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if !digits.is_empty() {
            return Ok(format!("P-{}", digits));
        }
    }

    Err(PalletCodeError::NoNumber(raw.trim().to_string()))
}
