//! Authority boundary
//!
//! The authority is the on-chain Safe that owns the canonical owner list,
//! threshold and nonce, computes transaction hashes and finally executes
//! transactions. Everything the coordinator knows about it comes through the
//! [`SafeAuthority`] trait.
//!
//! This module provides:
//! - The `SafeAuthority` trait and its error type
//! - EIP-712 transaction hashing as the Safe computes it
//! - `RetryingAuthority`, which retries idempotent reads only
//! - `LocalSafe`, an in-process authority for devnets and tests

pub mod eip712;
pub mod local;
pub mod retry;

use crate::config::{ChainConfig, CoordinatorConfig};
use crate::core::{Address, SafeTransaction, TxHash, U256};
use std::io;
use std::time::Duration;
use thiserror::Error;

pub use eip712::{domain_separator, safe_tx_hash, transaction_hash};
pub use local::{LocalSafe, SafeState};
pub use retry::{RetryPolicy, RetryingAuthority};

/// URL scheme selecting the file-backed local authority
pub const LOCAL_SCHEME: &str = "local://";

/// Errors reported by an authority
#[derive(Error, Debug)]
pub enum AuthorityError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Call timed out after {0:?}")]
    Timeout(Duration),
    #[error("Execution reverted: {0}")]
    Reverted(String),
    #[error("Unsupported transport: {0}")]
    UnsupportedTransport(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl AuthorityError {
    /// Whether retrying the same idempotent call may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            AuthorityError::Transport(_) | AuthorityError::Timeout(_) => true,
            AuthorityError::IoError(e) => matches!(
                e.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}

/// Confirmation returned by `executeTransaction`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionReceipt {
    /// `false` when the inner call failed but the authority tolerated it
    pub success: bool,
    pub transaction_id: TxHash,
}

/// Calls the coordinator makes on the authority.
///
/// Reads are idempotent and may be retried; `approve_hash` and
/// `execute_transaction` change on-chain state and must be submitted at most
/// once per request.
pub trait SafeAuthority: Send + Sync {
    /// Address of the authority
    fn address(&self) -> Address;

    /// Canonical hash of `transaction` at `nonce`
    fn get_transaction_hash(
        &self,
        transaction: &SafeTransaction,
        nonce: &U256,
    ) -> Result<TxHash, AuthorityError>;

    /// Nonce the next executed transaction must carry
    fn nonce(&self) -> Result<U256, AuthorityError>;

    /// Current owners, in owner-list order
    fn get_owners(&self) -> Result<Vec<Address>, AuthorityError>;

    fn get_threshold(&self) -> Result<u64, AuthorityError>;

    /// Whether `owner` has approved `hash` on-chain (`approvedHashes`)
    fn approved_hashes(&self, owner: Address, hash: &TxHash) -> Result<bool, AuthorityError>;

    /// Record on-chain that `sender` approves `hash`
    fn approve_hash(&mut self, sender: Address, hash: &TxHash) -> Result<(), AuthorityError>;

    /// Submit `transaction` with the packed signature blob and a remark
    fn execute_transaction(
        &mut self,
        sender: Address,
        transaction: &SafeTransaction,
        signatures: &[u8],
        remark: &str,
    ) -> Result<ExecutionReceipt, AuthorityError>;
}

impl<T: SafeAuthority + ?Sized> SafeAuthority for Box<T> {
    fn address(&self) -> Address {
        (**self).address()
    }

    fn get_transaction_hash(
        &self,
        transaction: &SafeTransaction,
        nonce: &U256,
    ) -> Result<TxHash, AuthorityError> {
        (**self).get_transaction_hash(transaction, nonce)
    }

    fn nonce(&self) -> Result<U256, AuthorityError> {
        (**self).nonce()
    }

    fn get_owners(&self) -> Result<Vec<Address>, AuthorityError> {
        (**self).get_owners()
    }

    fn get_threshold(&self) -> Result<u64, AuthorityError> {
        (**self).get_threshold()
    }

    fn approved_hashes(&self, owner: Address, hash: &TxHash) -> Result<bool, AuthorityError> {
        (**self).approved_hashes(owner, hash)
    }

    fn approve_hash(&mut self, sender: Address, hash: &TxHash) -> Result<(), AuthorityError> {
        (**self).approve_hash(sender, hash)
    }

    fn execute_transaction(
        &mut self,
        sender: Address,
        transaction: &SafeTransaction,
        signatures: &[u8],
        remark: &str,
    ) -> Result<ExecutionReceipt, AuthorityError> {
        (**self).execute_transaction(sender, transaction, signatures, remark)
    }
}

/// Authority handle as used by the coordinator
pub type DynAuthority = RetryingAuthority<Box<dyn SafeAuthority>>;

/// Open the authority configured for `chain`, wrapped in the retry policy.
///
/// Only the `local://` transport is built in; it resolves to the devnet
/// state file for the chain under the data directory.
pub fn connect(
    chain: &str,
    chain_config: &ChainConfig,
    config: &CoordinatorConfig,
) -> Result<DynAuthority, AuthorityError> {
    let inner: Box<dyn SafeAuthority> = if chain_config.rpc.starts_with(LOCAL_SCHEME) {
        let local = LocalSafe::open(&config.devnet_path(chain))?;
        if local.address() != chain_config.safe {
            return Err(AuthorityError::Transport(format!(
                "devnet for {} hosts {} but config names {}",
                chain,
                local.address(),
                chain_config.safe
            )));
        }
        Box::new(local)
    } else {
        return Err(AuthorityError::UnsupportedTransport(chain_config.rpc.clone()));
    };

    log::debug!("Connected to authority {} on {}", chain_config.safe, chain);
    Ok(RetryingAuthority::new(inner, config.retry.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn test_transient_classification() {
        assert!(AuthorityError::Transport("reset".into()).is_transient());
        assert!(AuthorityError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(AuthorityError::IoError(io::Error::new(io::ErrorKind::TimedOut, "lock")).is_transient());
        assert!(!AuthorityError::Reverted("GS026".into()).is_transient());
        assert!(!AuthorityError::IoError(io::Error::new(io::ErrorKind::NotFound, "x")).is_transient());
    }

    #[test]
    fn test_connect_rejects_unknown_transport() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = CoordinatorConfig::new(temp_dir.path().to_path_buf());
        let chain = ChainConfig::new("https://rpc.example", Address::repeat_byte(5));

        assert!(matches!(
            connect("mainnet", &chain, &config),
            Err(AuthorityError::UnsupportedTransport(_))
        ));
    }

    #[test]
    fn test_connect_local() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = CoordinatorConfig::new(temp_dir.path().to_path_buf());
        let owners = vec![KeyPair::generate().address(), KeyPair::generate().address()];

        let safe = LocalSafe::create(&config.devnet_path("dev"), "dev", 31337, owners.clone(), 2)
            .unwrap();
        let chain = ChainConfig::new("local://dev", safe.address());

        let authority = connect("dev", &chain, &config).unwrap();
        assert_eq!(authority.get_owners().unwrap(), owners);
        assert_eq!(authority.get_threshold().unwrap(), 2);
        assert_eq!(authority.nonce().unwrap(), U256::ZERO);

        let mismatched = ChainConfig::new("local://dev", Address::repeat_byte(9));
        assert!(connect("dev", &mismatched, &config).is_err());
    }
}
