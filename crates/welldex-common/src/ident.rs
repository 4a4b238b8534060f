//! Deterministic identity construction (spec.md §3, §4.1).
//!
//! Every identifier here is a pure function of its inputs: same
//! `(source_tag, natural_key)` always yields the same string, on any
//! machine, on any run — this is what makes re-ingestion idempotent rather
//! than exactly-once.

use sha2::{Digest, Sha256};

/// Deterministically derive a UUID-v4-shaped string from `namespace` and
/// `key`: `SHA-256(namespace + ':' + key)`, truncated to 16 bytes, with the
/// version nibble forced to 4 and the variant bits forced to RFC-4122. This
/// is intentionally not a real random UUIDv4 — it's a content hash wearing
/// a UUID's clothes so downstream systems that expect UUID-shaped strings
/// don't need special-casing.
pub fn deterministic_uuid(namespace: &str, key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update(b":");
    hasher.update(key.as_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);

    // Version 4 (random-appearing) in the high nibble of byte 6.
    bytes[6] = (bytes[6] & 0x0F) | 0x40;
    // RFC-4122 variant in the top two bits of byte 8.
    bytes[8] = (bytes[8] & 0x3F) | 0x80;

    format_uuid_bytes(&bytes)
}

fn format_uuid_bytes(b: &[u8; 16]) -> String {
    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7], b[8], b[9], b[10], b[11], b[12], b[13], b[14], b[15]
    )
}

/// Build the canonical asset identifier. For API-bearing sources, prefer
/// the zero-padded API number; otherwise fall back to a content-addressed
/// UUID over the source's natural key.
pub fn asset_id(source_tag: &str, api_number: Option<&str>, fallback_key: &str) -> String {
    match api_number {
        Some(api) if !api.trim().is_empty() => {
            format!("{source_tag}_{}", zero_pad_api_number(api))
        }
        _ => format!("{source_tag}_{}", deterministic_uuid(source_tag, fallback_key)),
    }
}

/// API numbers are conventionally zero-padded to 14 digits (state code +
/// county code + well sequence + 2 check digits), but sources vary in how
/// much padding they already apply — pad up to 14, never truncate.
fn zero_pad_api_number(api: &str) -> String {
    let digits: String = api.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() >= 14 {
        digits
    } else {
        format!("{:0>14}", digits)
    }
}

/// Build the canonical operator identifier: source operator number when
/// available, else the normalized name.
pub fn operator_id(source_tag: &str, operator_number: Option<&str>, normalized_name: &str) -> String {
    match operator_number {
        Some(num) if !num.trim().is_empty() => format!("{source_tag}_OP_{num}"),
        _ => format!("{source_tag}_OP_{normalized_name}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_uuid_is_stable_across_calls() {
        let a = deterministic_uuid("nd_ndic", "well-12345");
        let b = deterministic_uuid("nd_ndic", "well-12345");
        assert_eq!(a, b);
    }

    #[test]
    fn deterministic_uuid_differs_by_key() {
        let a = deterministic_uuid("nd_ndic", "well-12345");
        let b = deterministic_uuid("nd_ndic", "well-99999");
        assert_ne!(a, b);
    }

    #[test]
    fn deterministic_uuid_has_version_and_variant_bits() {
        let id = deterministic_uuid("ns", "key");
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[2].chars().next().unwrap(), '4');
        let variant_nibble = parts[3].chars().next().unwrap();
        assert!(matches!(variant_nibble, '8' | '9' | 'a' | 'b'));
    }

    #[test]
    fn asset_id_prefers_api_number() {
        let id = asset_id("tx_rrc", Some("42-123-45678"), "unused");
        assert_eq!(id, "tx_rrc_00004212345678");
    }

    #[test]
    fn asset_id_pads_short_api_numbers() {
        let id = asset_id("tx_rrc", Some("123"), "unused");
        assert_eq!(id, "tx_rrc_00000000000123");
    }

    #[test]
    fn asset_id_falls_back_to_deterministic_uuid() {
        let id = asset_id("nd_ndic", None, "natural-key-1");
        assert!(id.starts_with("nd_ndic_"));
        assert_eq!(id, asset_id("nd_ndic", None, "natural-key-1"));
    }

    #[test]
    fn operator_id_prefers_number() {
        assert_eq!(operator_id("ok_occ", Some("7890"), "ignored"), "ok_occ_OP_7890");
    }

    #[test]
    fn operator_id_falls_back_to_name() {
        assert_eq!(
            operator_id("ok_occ", None, "pioneernaturalresources"),
            "ok_occ_OP_pioneernaturalresources"
        );
    }
}
