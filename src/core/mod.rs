//! Core data model
//!
//! This module contains the value types shared by every component:
//! - Addresses and transaction hashes (fixed-width, hex on the wire)
//! - Safe transaction fields and operations
//! - Proposals, signatures and execution records
//! - ABI calldata for owner management and proxy upgrades
//! - Serde helpers (decimal-string `U256`, hex bytes)

pub mod abi;
pub mod address;
pub mod encoding;
pub mod proposal;
pub mod transaction;

pub use abi::{decode_owner_call, AbiError, OwnerCall};
pub use address::{decode_hex, encode_hex, Address, ParseError, TxHash, SENTINEL_OWNERS};
pub use encoding::{parse_u256, u256_to_u64};
pub use proposal::{ExecutionRecord, Proposal, Signature, SignatureKind, SIGNATURE_LEN};
pub use transaction::{Operation, SafeTransaction};
pub use alloy_primitives::U256;
