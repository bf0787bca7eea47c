//! ECDSA key management for signers
//!
//! Provides key pair generation, recoverable signing and signer recovery
//! using the secp256k1 elliptic curve. Addresses are Ethereum-style: the
//! last 20 bytes of the Keccak-256 of the uncompressed public key.

use rand::rngs::OsRng;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

use super::hash::keccak256;
use crate::core::Address;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key (`0x` optional)
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = crate::core::decode_hex(hex_key).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Get the public key as a hex string (compressed format)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// Ethereum-style address of this key
    pub fn address(&self) -> Address {
        public_key_to_address(&self.public_key)
    }

    /// Sign a 32-byte digest, returning `r || s || v` with `v` in {27, 28}
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<[u8; 65], KeyError> {
        sign_recoverable(&self.secret_key, digest)
    }
}

/// Convert a public key to an Ethereum-style address
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    let uncompressed = public_key.serialize_uncompressed();
    // Skip the 0x04 prefix
    let hash = keccak256(&uncompressed[1..]);
    Address::from_slice(&hash[12..])
}

/// Sign a digest with a secret key, producing a 65-byte recoverable signature
pub fn sign_recoverable(secret_key: &SecretKey, digest: &[u8; 32]) -> Result<[u8; 65], KeyError> {
    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(digest)?;
    let signature = secp.sign_ecdsa_recoverable(&message, secret_key);
    let (recovery_id, compact) = signature.serialize_compact();

    let mut out = [0u8; 65];
    out[..64].copy_from_slice(&compact);
    out[64] = 27 + recovery_id.to_i32() as u8;
    Ok(out)
}

/// Recover the signer address of a 65-byte `r || s || v` signature
///
/// `v` may be 27/28 or the raw recovery id 0/1.
pub fn recover_address(digest: &[u8; 32], signature: &[u8]) -> Result<Address, KeyError> {
    if signature.len() != 65 {
        return Err(KeyError::InvalidSignature);
    }
    let v = signature[64];
    let recovery = match v {
        27 | 28 => v - 27,
        0 | 1 => v,
        _ => return Err(KeyError::InvalidSignature),
    };
    let recovery_id =
        RecoveryId::from_i32(recovery as i32).map_err(|_| KeyError::InvalidSignature)?;
    let signature = RecoverableSignature::from_compact(&signature[..64], recovery_id)
        .map_err(|_| KeyError::InvalidSignature)?;

    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(digest)?;
    let public_key = secp
        .recover_ecdsa(&message, &signature)
        .map_err(|_| KeyError::InvalidSignature)?;
    Ok(public_key_to_address(&public_key))
}
