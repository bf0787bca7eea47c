//! Storage module for proposal persistence

pub mod lock;
pub mod persistence;

pub use lock::StoreLock;
pub use persistence::{ProposalStore, StorageError, StoreConfig};
