//! Owner-list navigation
//!
//! The authority keeps its owners in a singly linked list headed by a
//! sentinel. Removing or swapping an owner requires naming the entry that
//! points at it.

use super::error::MultisigError;
use crate::core::{Address, SENTINEL_OWNERS};

/// The list entry immediately preceding `target`.
///
/// The head of the list is preceded by the sentinel.
pub fn predecessor_of(owners: &[Address], target: &Address) -> Result<Address, MultisigError> {
    match owners.iter().position(|owner| owner == target) {
        Some(0) => Ok(SENTINEL_OWNERS),
        Some(index) => Ok(owners[index - 1]),
        None => Err(MultisigError::NotAnOwner(*target)),
    }
}
