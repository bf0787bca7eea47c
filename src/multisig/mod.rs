//! Multi-signature proposal coordination
//!
//! A proposal moves through `Proposed -> (approve)* -> Executed`. Whether it
//! has reached the threshold is derived from the authority's current
//! threshold at execution time, never stored.
//!
//! # Example
//!
//! ```ignore
//! use safe_coordinator::config::CoordinatorConfig;
//! use safe_coordinator::multisig::MultisigCoordinator;
//!
//! let config = CoordinatorConfig::default();
//! let mut coordinator = MultisigCoordinator::open("sepolia", &config)?;
//!
//! // Propose adding an owner with threshold 2
//! let outcome = coordinator.propose_add_owner(new_owner, 2, "add treasury signer")?;
//! let hash = outcome.proposal().hash;
//!
//! // Collect signatures
//! coordinator.approve(&hash, &alice)?;
//! coordinator.approve(&hash, &bob)?;
//!
//! // Submit once the threshold is met
//! let result = coordinator.execute(&hash, alice.address())?;
//! ```

pub mod builder;
pub mod collector;
pub mod error;
pub mod executor;
pub mod hasher;
pub mod manager;
pub mod owners;

pub use builder::ProposalBuilder;
pub use collector::{pack_signatures, sign_proposal, verify_signature, ApprovalOutcome, SignatureCollector};
pub use error::MultisigError;
pub use executor::{ExecutionGate, ExecutionOutcome};
pub use hasher::TransactionHasher;
pub use manager::{MultisigCoordinator, ProposalOutcome, SafeStatus};
pub use owners::predecessor_of;
