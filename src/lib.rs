//! Safe Coordinator: off-chain signature coordination for Safe multisig wallets
//!
//! This crate provides:
//! - Proposal hashing that matches the Safe's own EIP-712 hash
//! - A JSON proposal store safe for concurrent processes
//! - Signature collection with owner and ECDSA verification
//! - Threshold and nonce gated execution
//! - Owner-management and proxy-upgrade proposal builders
//! - A local in-process Safe for devnets and tests
//! - A CLI and a REST API over one chain's workflow
//!
//! # Example
//!
//! ```rust
//! use safe_coordinator::authority::{LocalSafe, RetryPolicy, RetryingAuthority, SafeAuthority};
//! use safe_coordinator::config::ChainConfig;
//! use safe_coordinator::crypto::KeyPair;
//! use safe_coordinator::multisig::MultisigCoordinator;
//! use safe_coordinator::storage::{ProposalStore, StoreConfig};
//!
//! let dir = std::env::temp_dir().join(format!("safe-coordinator-doc-{}", std::process::id()));
//! let store = ProposalStore::new(StoreConfig { data_dir: dir.clone(), ..Default::default() }).unwrap();
//!
//! let alice = KeyPair::generate();
//! let safe = LocalSafe::in_memory("dev", 31337, vec![alice.address()], 1).unwrap();
//! let chain_config = ChainConfig::new("local://dev", safe.address());
//! let authority = RetryingAuthority::new(safe, RetryPolicy::none());
//! let mut coordinator = MultisigCoordinator::new("dev", chain_config, store, authority);
//!
//! // Propose, approve and execute a threshold change
//! let hash = coordinator.propose_change_threshold(1, "demo").unwrap().proposal().hash;
//! coordinator.approve(&hash, &alice).unwrap();
//! let outcome = coordinator.execute(&hash, alice.address()).unwrap();
//! assert!(outcome.success);
//! # std::fs::remove_dir_all(&dir).ok();
//! ```

pub mod api;
pub mod authority;
pub mod cli;
pub mod config;
pub mod core;
pub mod crypto;
pub mod multisig;
pub mod storage;

// Re-export commonly used types
pub use api::{create_router, ApiState};
pub use authority::{LocalSafe, RetryPolicy, RetryingAuthority, SafeAuthority};
pub use config::{ChainConfig, ChainRegistry, CoordinatorConfig};
pub use core::{Address, Proposal, SafeTransaction, Signature, TxHash, U256};
pub use crypto::KeyPair;
pub use multisig::{MultisigCoordinator, MultisigError};
pub use storage::{ProposalStore, StoreConfig};
