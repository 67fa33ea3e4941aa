//! Field-element helpers — canonical hex form and the event-name selector.
//!
//! The stream delivers every scalar as a `0x`-prefixed hex string of a
//! 252-bit field element. Canonical form is lowercase with no leading zero
//! nibbles (`0x0` for zero), which makes string equality usable for
//! address and selector comparison.

use thiserror::Error;
use tiny_keccak::{Hasher, Keccak};

/// Low-level parse failures, mapped to field-aware errors by the normalizer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeltError {
    #[error("not a hex field element")]
    InvalidHex,
    #[error("value exceeds 64 bits")]
    Overflow,
}

/// Canonicalize a hex field element: lowercase, `0x` prefix, no leading zeros.
pub fn canonical(word: &str) -> Result<String, FeltError> {
    let digits = word.strip_prefix("0x").or_else(|| word.strip_prefix("0X")).unwrap_or(word);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(FeltError::InvalidHex);
    }
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        return Ok("0x0".to_string());
    }
    Ok(format!("0x{}", trimmed.to_ascii_lowercase()))
}

/// Parse a felt word into a `u64`. Fails with [`FeltError::Overflow`] when the
/// value needs more than 64 bits.
pub fn to_u64(word: &str) -> Result<u64, FeltError> {
    let canon = canonical(word)?;
    let digits = &canon[2..];
    if digits.len() > 16 {
        return Err(FeltError::Overflow);
    }
    u64::from_str_radix(digits, 16).map_err(|_| FeltError::InvalidHex)
}

/// Decode a felt word into its big-endian byte content, leading zero bytes
/// stripped. Used for Cairo short strings (at most 31 bytes of payload).
pub fn to_bytes(word: &str) -> Result<Vec<u8>, FeltError> {
    let canon = canonical(word)?;
    let digits = &canon[2..];
    if digits == "0" {
        return Ok(Vec::new());
    }
    let padded = if digits.len() % 2 == 1 {
        format!("0{digits}")
    } else {
        digits.to_string()
    };
    hex::decode(padded).map_err(|_| FeltError::InvalidHex)
}

/// Compute the event-name selector: `keccak256(name)` with the top 6 bits
/// masked off (the value mod 2^250), returned in canonical hex form.
///
/// This matches `starknet.js getSelectorFromName` for plain ASCII names.
pub fn selector(name: &str) -> String {
    let mut hasher = Keccak::v256();
    hasher.update(name.as_bytes());
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out[0] &= 0x03;
    let full = hex::encode(out);
    let trimmed = full.trim_start_matches('0');
    if trimmed.is_empty() {
        "0x0".to_string()
    } else {
        format!("0x{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_strips_zeros_and_lowercases() {
        assert_eq!(canonical("0x0000ABC").unwrap(), "0xabc");
        assert_eq!(canonical("0x0").unwrap(), "0x0");
        assert_eq!(canonical("0x000000").unwrap(), "0x0");
        assert_eq!(canonical("ff").unwrap(), "0xff");
    }

    #[test]
    fn canonical_rejects_garbage() {
        assert_eq!(canonical("0xzz").unwrap_err(), FeltError::InvalidHex);
        assert_eq!(canonical("").unwrap_err(), FeltError::InvalidHex);
        assert_eq!(canonical("0x").unwrap_err(), FeltError::InvalidHex);
    }

    #[test]
    fn to_u64_parses_and_overflows() {
        assert_eq!(to_u64("0x2a").unwrap(), 42);
        assert_eq!(to_u64("0x0").unwrap(), 0);
        assert_eq!(to_u64("0xffffffffffffffff").unwrap(), u64::MAX);
        // 17 hex digits — needs 65+ bits
        assert_eq!(to_u64("0x10000000000000000").unwrap_err(), FeltError::Overflow);
    }

    #[test]
    fn to_bytes_short_string() {
        // "hello" encoded as a short-string felt
        assert_eq!(to_bytes("0x68656c6c6f").unwrap(), b"hello");
        assert!(to_bytes("0x0").unwrap().is_empty());
        // odd nibble count gets left-padded
        assert_eq!(to_bytes("0x141").unwrap(), vec![0x01, 0x41]);
    }

    #[test]
    fn selector_matches_starknet_reference() {
        // Reference values from starknet.js getSelectorFromName.
        assert_eq!(
            selector("CourseCreated"),
            "0x253a422b6f18d3b1c5adca303cc3783206dd2d318d03cc1369d58c2f4f0b212"
        );
        assert_eq!(
            selector("transfer"),
            "0x83afd3f4caedc6eebf44246fe54e38c95e3179a5ec9ea81740eca5b482d12e"
        );
    }

    #[test]
    fn selector_is_250_bits() {
        for name in ["CourseCreated", "AcquiredCourse", "AdminTransferred"] {
            let sel = selector(name);
            // canonical hex of a 250-bit value never exceeds 63 digits
            assert!(sel.len() <= 2 + 63, "{name} selector too wide: {sel}");
        }
    }
}
