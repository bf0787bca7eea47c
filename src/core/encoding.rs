//! Serde helpers for wire-compatible JSON
//!
//! 256-bit integers are written as decimal strings so that values beyond the
//! double-precision range survive a round trip through any JSON tooling.
//! Byte payloads are written as `0x`-prefixed hex.

use super::address::{decode_hex, encode_hex, ParseError};
use alloy_primitives::U256;

/// Parse a decimal (or `0x` hex) string into a `U256`
pub fn parse_u256(input: &str) -> Result<U256, ParseError> {
    let trimmed = input.trim();
    let (digits, radix) = match trimmed.strip_prefix("0x") {
        Some(hex_digits) => (hex_digits, 16),
        None => (trimmed, 10),
    };
    U256::from_str_radix(digits, radix).map_err(|_| ParseError::InvalidInteger(input.to_string()))
}

/// Narrow a `U256` to `u64`, `None` when it does not fit
pub fn u256_to_u64(value: &U256) -> Option<u64> {
    if *value > U256::from(u64::MAX) {
        return None;
    }
    Some(value.as_limbs()[0])
}

/// `U256` as a decimal string
pub mod u256_dec {
    use super::parse_u256;
    use alloy_primitives::U256;
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        deserializer.deserialize_any(U256Visitor)
    }

    struct U256Visitor;

    impl<'de> Visitor<'de> for U256Visitor {
        type Value = U256;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a decimal string or a non-negative integer")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<U256, E> {
            Ok(U256::from(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<U256, E> {
            u64::try_from(v)
                .map(U256::from)
                .map_err(|_| E::custom(format!("negative integer {}", v)))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<U256, E> {
            parse_u256(v).map_err(E::custom)
        }
    }
}

/// `Vec<u8>` as `0x` hex
pub mod hex_bytes {
    use super::{decode_hex, encode_hex};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode_hex(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        decode_hex(&s).map_err(serde::de::Error::custom)
    }
}
