//! Cryptographic utilities
//!
//! This module provides:
//! - Keccak-256 hashing and the `eth_sign` prefix digest
//! - ECDSA key management (secp256k1) with signer recovery

pub mod hash;
pub mod keys;

pub use hash::{eth_signed_message_hash, keccak256, keccak256_concat, keccak256_hex};
pub use keys::{public_key_to_address, recover_address, sign_recoverable, KeyError, KeyPair};
