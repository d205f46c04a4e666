//! Product barcode normalization.
//!
//! Scanners deliver the same physical article in several shapes: with or
//! without an AIM symbology identifier, as 12-digit UPC-A or as its
//! 13-digit EAN-13 form. Normalization folds these into one comparable
//! key so a product groups onto one pallet regardless of scanner setup.

/// Canonicalize a raw scan into a comparable product identifier.
///
/// Rules:
/// - a leading 3-character AIM symbology identifier (e.g. `]E0`) is
///   stripped;
/// - an all-digit remainder of length 12 with a valid check digit is
///   zero-padded to 13 (UPC-A → EAN-13 equivalence);
/// - an all-digit remainder of length 8 or 13 with a valid check digit is
///   kept as-is;
/// - anything else is upper-cased and returned verbatim;
/// - empty or whitespace input normalizes to the empty string, which the
///   caller treats as a validation failure.
pub fn normalize_product_code(raw: &str) -> String {
    let stripped = strip_symbology_prefix(raw.trim()).trim();
    if stripped.is_empty() {
        return String::new();
    }

    if stripped.bytes().all(|b| b.is_ascii_digit()) {
        match stripped.len() {
            12 if check_digit_valid(stripped) => return format!("0{}", stripped),
            8 | 13 if check_digit_valid(stripped) => return stripped.to_string(),
            _ => {}
        }
    }

    stripped.to_uppercase()
}

/// AIM symbology identifiers are `]` + code character + modifier digit.
fn strip_symbology_prefix(s: &str) -> &str {
    if s.starts_with(']') {
        if let Some(rest) = s.get(3..) {
            return rest;
        }
    }
    s
}

/// GTIN mod-10 check: over the body (all but the last digit), digits at
/// odd positions counted from the right weigh 3; the check digit is what
/// brings the sum to the next multiple of 10.
fn check_digit_valid(code: &str) -> bool {
    let digits: Vec<u32> = code.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != code.len() || digits.len() < 2 {
        return false;
    }

    let check = digits[digits.len() - 1];
    let sum: u32 = digits[..digits.len() - 1]
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { d * 3 } else { *d })
        .sum();

    (10 - sum % 10) % 10 == check
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upc_a_pads_to_ean_13() {
        assert_eq!(normalize_product_code("036000291452"), "0036000291452");
    }

    #[test]
    fn ean_13_unchanged() {
        assert_eq!(normalize_product_code("0036000291452"), "0036000291452");
    }

    #[test]
    fn upc_and_ean_forms_agree() {
        assert_eq!(
            normalize_product_code("036000291452"),
            normalize_product_code("0036000291452"),
        );
    }

    #[test]
    fn ean_8_unchanged() {
        assert_eq!(normalize_product_code("96385074"), "96385074");
    }

    #[test]
    fn symbology_prefix_stripped() {
        assert_eq!(normalize_product_code("]E0036000291452"), "0036000291452");
        assert_eq!(normalize_product_code("]C1ITEM-1"), "ITEM-1");
    }

    #[test]
    fn invalid_check_digit_kept_verbatim() {
        // 036000291453 fails the check (valid digit is 2) — no padding.
        assert_eq!(normalize_product_code("036000291453"), "036000291453");
    }

    #[test]
    fn odd_length_digits_kept_verbatim() {
        assert_eq!(normalize_product_code("12345"), "12345");
    }

    #[test]
    fn non_digit_uppercased() {
        assert_eq!(normalize_product_code("item-1"), "ITEM-1");
        assert_eq!(normalize_product_code("  abc123  "), "ABC123");
    }

    #[test]
    fn empty_and_whitespace_normalize_to_empty() {
        assert_eq!(normalize_product_code(""), "");
        assert_eq!(normalize_product_code("   "), "");
        assert_eq!(normalize_product_code("]E0"), "");
    }

    #[test]
    fn check_digit_math() {
        assert!(check_digit_valid("036000291452"));
        assert!(check_digit_valid("0036000291452"));
        assert!(check_digit_valid("96385074"));
        assert!(!check_digit_valid("036000291453"));
        assert!(!check_digit_valid("96385075"));
    }
}
