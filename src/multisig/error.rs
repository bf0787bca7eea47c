//! Errors raised by the multisig workflow

use crate::authority::AuthorityError;
use crate::config::ConfigError;
use crate::core::{Address, TxHash, U256};
use crate::crypto::KeyError;
use crate::storage::StorageError;
use thiserror::Error;

/// Errors related to proposal coordination
#[derive(Error, Debug)]
pub enum MultisigError {
    #[error("Missing input: {0}")]
    InputMissing(String),
    #[error("Proposal not found: {0}")]
    NotFound(TxHash),
    #[error("Signer not authorized: {0}")]
    UnauthorizedSigner(Address),
    #[error("Already signed by {0}")]
    DuplicateSigner(Address),
    #[error("Proposal already exists: {0}")]
    DuplicateProposal(TxHash),
    #[error("Insufficient signatures: have {have}, need {need}")]
    ThresholdNotMet { have: usize, need: u64 },
    #[error("Not an owner: {0}")]
    NotAnOwner(Address),
    #[error("{operation} failed on {chain}: {source}")]
    AuthorityCallFailed {
        operation: String,
        chain: String,
        #[source]
        source: AuthorityError,
    },
    #[error("Proposal already executed: {0}")]
    AlreadyExecuted(TxHash),
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),
    #[error("Stale nonce: proposal uses {proposal}, authority is at {current}")]
    StaleNonce { proposal: U256, current: U256 },
    #[error("Storage error: {0}")]
    Storage(StorageError),
    #[error("Crypto error: {0}")]
    CryptoError(#[from] KeyError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl From<StorageError> for MultisigError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(hash) => MultisigError::NotFound(hash),
            StorageError::DuplicateSigner { signer, .. } => MultisigError::DuplicateSigner(signer),
            StorageError::AlreadyExecuted(hash) => MultisigError::AlreadyExecuted(hash),
            other => MultisigError::Storage(other),
        }
    }
}

/// Wrap an authority failure with the call name and chain
pub(crate) fn authority_failed<'a>(
    operation: &'static str,
    chain: &'a str,
) -> impl FnOnce(AuthorityError) -> MultisigError + 'a {
    move |source| {
        log::warn!("{} failed on {}: {}", operation, chain, source);
        MultisigError::AuthorityCallFailed {
            operation: operation.to_string(),
            chain: chain.to_string(),
            source,
        }
    }
}
