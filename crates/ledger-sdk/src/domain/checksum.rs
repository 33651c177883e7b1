//! # Entity-Id Checksum
//!
//! Five-letter checksum binding a `shard.realm.num` address to a network.
//! The algorithm is shared with every other client of the network, so the
//! output must be bit-exact.

use std::fmt;

use super::errors::SdkError;

/// 26^3
const P3: u64 = 17_576;
/// 26^5
const P5: u64 = 11_881_376;
/// Odd multiplier applied to the combined value
const MULTIPLIER: u64 = 1_000_003;
/// Zero bytes appended to the ledger id before hashing
const LEDGER_ID_PADDING: usize = 6;

/// Network identity bytes.
///
/// Only used as checksum input; two networks with the same ledger id accept
/// each other's checksums.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LedgerId(Vec<u8>);

impl LedgerId {
    /// Wrap raw identity bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Mainnet (`0x00`).
    pub fn mainnet() -> Self {
        Self(vec![0x00])
    }

    /// Testnet (`0x01`).
    pub fn testnet() -> Self {
        Self(vec![0x01])
    }

    /// Previewnet (`0x02`).
    pub fn previewnet() -> Self {
        Self(vec![0x02])
    }

    /// Local development node (`0x03`).
    pub fn local_node() -> Self {
        Self(vec![0x03])
    }

    /// Parse from hex, with or without a `0x` prefix.
    pub fn from_hex(encoded: &str) -> Result<Self, SdkError> {
        let trimmed = encoded.trim().trim_start_matches("0x");
        hex::decode(trimmed)
            .map(Self)
            .map_err(|e| SdkError::Config(format!("invalid ledger id {encoded:?}: {e}")))
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for LedgerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

/// Compute the checksum of `address` (`"shard.realm.num"`) for `ledger_id`.
///
/// Anything that is not an ASCII digit is weighted like the `.` separator.
pub fn generate_checksum(ledger_id: &LedgerId, address: &str) -> String {
    let mut sum_even = 0u64;
    let mut sum_odd = 0u64;
    let mut digit_hash = 0u64;

    for (i, ch) in address.chars().enumerate() {
        let d = u64::from(ch.to_digit(10).unwrap_or(10));
        if i % 2 == 0 {
            sum_even = (sum_even + d) % 11;
        } else {
            sum_odd = (sum_odd + d) % 11;
        }
        digit_hash = (31 * digit_hash + d) % P3;
    }

    let mut ledger_hash = 0u64;
    let padded = ledger_id
        .as_bytes()
        .iter()
        .copied()
        .chain(std::iter::repeat(0u8).take(LEDGER_ID_PADDING));
    for b in padded {
        ledger_hash = (31 * ledger_hash + u64::from(b)) % P5;
    }

    let len = address.chars().count() as u64;
    let mut c = ((((len % 5) * 11 + sum_even) * 11 + sum_odd) * P3 + digit_hash + ledger_hash) % P5;
    c = (c * MULTIPLIER) % P5;

    let mut letters = [0u8; 5];
    for slot in letters.iter_mut().rev() {
        *slot = b'a' + (c % 26) as u8;
        c /= 26;
    }
    letters.iter().map(|&b| b as char).collect()
}

/// Check a supplied checksum against the recomputed value.
///
/// A missing checksum always validates.
pub fn validate_checksum(
    shard: u64,
    realm: u64,
    num: u64,
    checksum: Option<&str>,
    ledger_id: &LedgerId,
) -> Result<(), SdkError> {
    let Some(actual) = checksum else {
        return Ok(());
    };

    let address = format!("{shard}.{realm}.{num}");
    let expected = generate_checksum(ledger_id, &address);
    if expected == actual {
        Ok(())
    } else {
        Err(SdkError::ChecksumMismatch {
            entity: address,
            expected,
            actual: actual.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_published_vectors() {
        assert_eq!(generate_checksum(&LedgerId::mainnet(), "0.0.1"), "dfkxr");
        assert_eq!(generate_checksum(&LedgerId::testnet(), "0.0.1"), "mswfa");
        assert_eq!(generate_checksum(&LedgerId::previewnet(), "0.0.1"), "wghmj");
        assert_eq!(generate_checksum(&LedgerId::local_node(), "0.0.1"), "ftsts");
    }

    #[test]
    fn test_longer_address() {
        assert_eq!(generate_checksum(&LedgerId::mainnet(), "0.0.123"), "vfmkw");
        assert_eq!(generate_checksum(&LedgerId::testnet(), "0.0.123"), "esxsf");
    }

    #[test]
    fn test_validate_accepts_vectors() {
        for (ledger, sum) in [
            (LedgerId::mainnet(), "dfkxr"),
            (LedgerId::testnet(), "mswfa"),
            (LedgerId::previewnet(), "wghmj"),
            (LedgerId::local_node(), "ftsts"),
        ] {
            assert!(validate_checksum(0, 0, 1, Some(sum), &ledger).is_ok());
        }
    }

    #[test]
    fn test_missing_checksum_validates() {
        assert!(validate_checksum(0, 0, 1, None, &LedgerId::mainnet()).is_ok());
    }

    #[test]
    fn test_wrong_network_rejected() {
        let err = validate_checksum(0, 0, 1, Some("dfkxr"), &LedgerId::testnet()).unwrap_err();
        match err {
            SdkError::ChecksumMismatch {
                entity,
                expected,
                actual,
            } => {
                assert_eq!(entity, "0.0.1");
                assert_eq!(expected, "mswfa");
                assert_eq!(actual, "dfkxr");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_ledger_id_hex() {
        assert_eq!(LedgerId::from_hex("0x03").unwrap(), LedgerId::local_node());
        assert_eq!(LedgerId::testnet().to_string(), "01");
        assert!(LedgerId::from_hex("zz").is_err());
    }

    proptest! {
        #[test]
        fn prop_single_char_mutation_rejected(pos in 0usize..5, letter in 0u8..26) {
            let valid = generate_checksum(&LedgerId::mainnet(), "0.0.1");
            let mut bytes = valid.clone().into_bytes();
            let replacement = b'a' + letter;
            prop_assume!(bytes[pos] != replacement);
            bytes[pos] = replacement;
            let mutated = String::from_utf8(bytes).unwrap();
            prop_assert!(validate_checksum(0, 0, 1, Some(&mutated), &LedgerId::mainnet()).is_err());
        }

        #[test]
        fn prop_checksum_is_five_lowercase_letters(shard in 0u64..1000, realm in 0u64..1000, num in 0u64..u64::MAX) {
            let sum = generate_checksum(&LedgerId::testnet(), &format!("{shard}.{realm}.{num}"));
            prop_assert_eq!(sum.len(), 5);
            prop_assert!(sum.bytes().all(|b| b.is_ascii_lowercase()));
        }
    }
}
