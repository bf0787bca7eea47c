//! Transaction identifiers
//!
//! The identifier of a proposal is whatever the authority's
//! `getTransactionHash` returns for its fields and nonce. It is never derived
//! locally, so an off-chain record can only ever match what the authority
//! will verify signatures against.

use super::error::{authority_failed, MultisigError};
use crate::authority::SafeAuthority;
use crate::core::{Proposal, SafeTransaction, TxHash, U256};

pub struct TransactionHasher<'a, A: ?Sized> {
    authority: &'a A,
    chain: &'a str,
}

impl<'a, A: SafeAuthority + ?Sized> TransactionHasher<'a, A> {
    pub fn new(authority: &'a A, chain: &'a str) -> Self {
        Self { authority, chain }
    }

    /// Identifier of `transaction` at `nonce`
    pub fn hash(&self, transaction: &SafeTransaction, nonce: &U256) -> Result<TxHash, MultisigError> {
        self.authority
            .get_transaction_hash(transaction, nonce)
            .map_err(authority_failed("getTransactionHash", self.chain))
    }

    /// Build a proposal at the authority's current nonce.
    ///
    /// The nonce is fetched fresh on every call.
    pub fn prepare(
        &self,
        transaction: SafeTransaction,
        remark: &str,
    ) -> Result<Proposal, MultisigError> {
        let nonce = self
            .authority
            .nonce()
            .map_err(authority_failed("nonce", self.chain))?;
        let hash = self.hash(&transaction, &nonce)?;

        log::debug!("Prepared {} at nonce {} on {}", hash, nonce, self.chain);
        Ok(Proposal::new(hash, transaction, nonce, self.chain, remark))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::LocalSafe;
    use crate::core::Address;

    fn safe() -> LocalSafe {
        LocalSafe::in_memory("dev", 31337, vec![Address::repeat_byte(0xa)], 1).unwrap()
    }

    #[test]
    fn test_identical_inputs_identical_hash() {
        let safe = safe();
        let hasher = TransactionHasher::new(&safe, "dev");
        let tx = SafeTransaction::call(Address::repeat_byte(1), vec![1, 2, 3]);

        let first = hasher.hash(&tx, &U256::from(4u64)).unwrap();
        let second = hasher.hash(&tx.clone(), &U256::from(4u64)).unwrap();
        assert_eq!(first, second);
        assert_ne!(first, hasher.hash(&tx, &U256::from(5u64)).unwrap());
    }

    #[test]
    fn test_prepare_uses_current_nonce() {
        let safe = safe();
        let hasher = TransactionHasher::new(&safe, "dev");
        let tx = SafeTransaction::call(Address::repeat_byte(1), vec![]);

        let proposal = hasher.prepare(tx.clone(), "fund ops").unwrap();
        assert_eq!(proposal.nonce, U256::ZERO);
        assert_eq!(proposal.hash, hasher.hash(&tx, &U256::ZERO).unwrap());
        assert_eq!(proposal.chain, "dev");
        assert_eq!(proposal.remark, "fund ops");
        assert!(proposal.signatures.is_empty());
    }
}
