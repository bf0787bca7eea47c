//! Fixed-width identifiers: account addresses and transaction hashes
//!
//! Both come from `alloy-primitives`. `Address` ordering is numeric
//! (big-endian byte order), which is the order the authority expects
//! signatures to be presented in.

use alloy_primitives::address;
use thiserror::Error;

pub use alloy_primitives::{Address, B256};

/// A 32-byte transaction identifier
pub type TxHash = B256;

/// Reserved owner-list head marker used by the authority
pub const SENTINEL_OWNERS: Address = address!("0000000000000000000000000000000000000001");

/// Errors produced when parsing hex payloads
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),
    #[error("Invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("Invalid integer: {0}")]
    InvalidInteger(String),
}

/// Decode an optionally `0x`-prefixed hex string
pub fn decode_hex(input: &str) -> Result<Vec<u8>, ParseError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    hex::decode(digits).map_err(|_| ParseError::InvalidHex(input.to_string()))
}

/// Encode bytes as `0x`-prefixed lowercase hex
pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}
