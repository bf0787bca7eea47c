//! Proposal records
//!
//! A proposal is the off-chain record of one candidate multisig transaction:
//! its immutable fields, the identifier the authority computed for them, and
//! the signatures collected so far.

use super::address::{Address, ParseError, TxHash};
use super::encoding::{hex_bytes, u256_dec};
use super::transaction::SafeTransaction;
use chrono::{DateTime, Utc};
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// Length of one `r || s || v` signature entry
pub const SIGNATURE_LEN: usize = 65;

/// How a signature entry authorizes the hash, keyed by its `v` byte
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureKind {
    /// `v == 0`: contract signature (EIP-1271)
    Contract,
    /// `v == 1`: hash approved on-chain via `approveHash`
    ApprovedHash,
    /// `v > 30`: `eth_sign` prefixed message signature
    EthSign,
    /// `v` of 27 or 28: plain ECDSA over the hash
    Ecdsa,
}

/// One signer's authorization over a proposal hash
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    /// Address of the signer
    pub signer: Address,
    /// Opaque 65-byte payload (`r || s || v`)
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    /// When the signature was collected
    pub signed_at: DateTime<Utc>,
}

impl Signature {
    /// Wrap a raw payload, checking only its length
    pub fn new(signer: Address, data: Vec<u8>) -> Result<Self, ParseError> {
        if data.len() != SIGNATURE_LEN {
            return Err(ParseError::InvalidLength {
                expected: SIGNATURE_LEN,
                got: data.len(),
            });
        }
        Ok(Self {
            signer,
            data,
            signed_at: Utc::now(),
        })
    }

    /// Pre-validated signature for a signer that called `approveHash`
    ///
    /// `r` carries the signer address, `s` is unused and `v` is 1.
    pub fn approved_hash(signer: Address) -> Self {
        let mut data = Vec::with_capacity(SIGNATURE_LEN);
        data.extend_from_slice(signer.into_word().as_slice());
        data.extend_from_slice(&[0u8; 32]);
        data.push(1);
        Self {
            signer,
            data,
            signed_at: Utc::now(),
        }
    }

    /// The `v` byte
    pub fn v(&self) -> u8 {
        self.data.last().copied().unwrap_or_default()
    }

    pub fn kind(&self) -> SignatureKind {
        match self.v() {
            0 => SignatureKind::Contract,
            1 => SignatureKind::ApprovedHash,
            v if v > 30 => SignatureKind::EthSign,
            _ => SignatureKind::Ecdsa,
        }
    }
}

/// Outcome recorded once the authority confirms execution
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    /// Success flag reported by the authority
    pub success: bool,
    /// Confirmation identifier of the submitted transaction
    pub transaction_id: TxHash,
    pub executed_at: DateTime<Utc>,
}

/// An off-chain record of a candidate transaction awaiting quorum
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    /// Identifier computed by the authority
    #[serde(rename = "proposal")]
    pub hash: TxHash,
    #[serde(flatten)]
    pub transaction: SafeTransaction,
    /// Authority nonce the hash was computed with
    #[serde(with = "u256_dec")]
    pub nonce: U256,
    /// Chain identifier from the chain registry
    pub chain: String,
    /// Free-text annotation
    pub remark: String,
    /// Logical contract name for upgrade proposals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,
    /// Collected signatures, in arrival order
    #[serde(default)]
    pub signatures: Vec<Signature>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionRecord>,
}

impl Proposal {
    /// Create a proposal with no signatures
    pub fn new(
        hash: TxHash,
        transaction: SafeTransaction,
        nonce: U256,
        chain: &str,
        remark: &str,
    ) -> Self {
        Self {
            hash,
            transaction,
            nonce,
            chain: chain.to_string(),
            remark: remark.to_string(),
            contract: None,
            signatures: Vec::new(),
            created_at: Utc::now(),
            execution: None,
        }
    }

    /// Tag the proposal with the contract it upgrades
    pub fn with_contract(mut self, contract: &str) -> Self {
        self.contract = Some(contract.to_string());
        self
    }

    /// Number of signatures collected
    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }

    /// Whether `signer` already has a signature on this proposal
    pub fn has_signed(&self, signer: &Address) -> bool {
        self.signatures.iter().any(|s| &s.signer == signer)
    }

    /// Signers in arrival order
    pub fn signed_by(&self) -> Vec<Address> {
        self.signatures.iter().map(|s| s.signer).collect()
    }

    pub fn is_executed(&self) -> bool {
        self.execution.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_proposal() -> Proposal {
        let safe: Address = "0x5afe5afe5afe5afe5afe5afe5afe5afe5afe5afe".parse().unwrap();
        let mut tx = SafeTransaction::call(safe, vec![0x0d, 0x58, 0x2f, 0x13]);
        tx.value = U256::MAX;
        Proposal::new(
            TxHash::repeat_byte(9u8),
            tx,
            U256::from(u64::MAX) + U256::from(1u64),
            "sepolia",
            "add treasury signer",
        )
    }

    #[test]
    fn test_approved_hash_layout() {
        let signer: Address = "0x00000000000000000000000000000000000000aa".parse().unwrap();
        let sig = Signature::approved_hash(signer);
        assert_eq!(sig.data.len(), SIGNATURE_LEN);
        assert_eq!(sig.data[31], 0xaa);
        assert_eq!(sig.v(), 1);
        assert_eq!(sig.kind(), SignatureKind::ApprovedHash);
    }

    #[test]
    fn test_signature_length_checked() {
        let signer = Address::ZERO;
        assert!(Signature::new(signer, vec![0u8; 64]).is_err());
        let mut payload = vec![0u8; 65];
        payload[64] = 27;
        let sig = Signature::new(signer, payload).unwrap();
        assert_eq!(sig.kind(), SignatureKind::Ecdsa);
    }

    #[test]
    fn test_proposal_json_layout() {
        let proposal = sample_proposal();
        let json = serde_json::to_value(&proposal).unwrap();

        assert_eq!(json["proposal"], TxHash::repeat_byte(9u8).to_string());
        assert_eq!(json["nonce"], "18446744073709551616");
        assert_eq!(json["value"], U256::MAX.to_string());
        assert_eq!(json["chain"], "sepolia");
        assert_eq!(json["operation"], 0);
        assert!(json.get("contract").is_none());
        assert!(json.get("execution").is_none());
    }

    #[test]
    fn test_proposal_roundtrip_preserves_large_values() {
        let mut proposal = sample_proposal().with_contract("vault");
        proposal
            .signatures
            .push(Signature::approved_hash(Address::repeat_byte(3u8)));

        let json = serde_json::to_string_pretty(&vec![proposal.clone()]).unwrap();
        let back: Vec<Proposal> = serde_json::from_str(&json).unwrap();

        assert_eq!(back.len(), 1);
        assert_eq!(back[0], proposal);
        assert_eq!(back[0].transaction.value, U256::MAX);
    }

    #[test]
    fn test_has_signed() {
        let mut proposal = sample_proposal();
        let signer = Address::repeat_byte(4u8);
        assert!(!proposal.has_signed(&signer));
        proposal.signatures.push(Signature::approved_hash(signer));
        assert!(proposal.has_signed(&signer));
        assert_eq!(proposal.signed_by(), vec![signer]);
    }
}
