//! Keccak-256 hashing utilities
//!
//! Provides the Keccak-256 digest used for Ethereum addresses, devnet
//! identifiers and the `eth_sign` prefix scheme.

use alloy_primitives::{eip191_hash_message, Keccak256};

/// Computes Keccak-256 hash of the input data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    alloy_primitives::keccak256(data).0
}

/// Computes Keccak-256 over several byte slices as if they were concatenated
pub fn keccak256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().0
}

/// Computes Keccak-256 hash and returns it as a hex string
pub fn keccak256_hex(data: &[u8]) -> String {
    hex::encode(keccak256(data))
}

/// Digest an `eth_sign` signer actually signs for a 32-byte hash
pub fn eth_signed_message_hash(hash: &[u8; 32]) -> [u8; 32] {
    eip191_hash_message(hash).0
}
