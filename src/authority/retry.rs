//! Retry decorator for idempotent authority reads
//!
//! `nonce`, `get_owners`, `get_threshold`, `approved_hashes` and
//! `get_transaction_hash` are retried on transient failures with exponential backoff. `approve_hash` and
//! `execute_transaction` pass straight through: resubmitting either after an
//! ambiguous failure could act twice.

use super::{AuthorityError, ExecutionReceipt, SafeAuthority};
use crate::core::{Address, SafeTransaction, TxHash, U256};
use std::thread;
use std::time::Duration;

/// Backoff settings for read retries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(2),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Delay before retry number `retry` (0-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = self.multiplier.max(1).saturating_pow(retry);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Wraps an authority and retries its idempotent reads
pub struct RetryingAuthority<A> {
    inner: A,
    policy: RetryPolicy,
}

impl<A: SafeAuthority> RetryingAuthority<A> {
    pub fn new(inner: A, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn read<T, F>(&self, operation: &str, call: F) -> Result<T, AuthorityError>
    where
        F: Fn(&A) -> Result<T, AuthorityError>,
    {
        let attempts = self.policy.max_attempts.max(1);
        let mut retry = 0;

        loop {
            match call(&self.inner) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && retry + 1 < attempts => {
                    let delay = self.policy.backoff(retry);
                    log::warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        operation,
                        retry + 1,
                        attempts,
                        e,
                        delay
                    );
                    thread::sleep(delay);
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl<A: SafeAuthority> SafeAuthority for RetryingAuthority<A> {
    fn address(&self) -> Address {
        self.inner.address()
    }

    fn get_transaction_hash(
        &self,
        transaction: &SafeTransaction,
        nonce: &U256,
    ) -> Result<TxHash, AuthorityError> {
        self.read("getTransactionHash", |a| {
            a.get_transaction_hash(transaction, nonce)
        })
    }

    fn nonce(&self) -> Result<U256, AuthorityError> {
        self.read("nonce", |a| a.nonce())
    }

    fn get_owners(&self) -> Result<Vec<Address>, AuthorityError> {
        self.read("getOwners", |a| a.get_owners())
    }

    fn get_threshold(&self) -> Result<u64, AuthorityError> {
        self.read("getThreshold", |a| a.get_threshold())
    }

    fn approved_hashes(&self, owner: Address, hash: &TxHash) -> Result<bool, AuthorityError> {
        self.read("approvedHashes", |a| a.approved_hashes(owner, hash))
    }

    fn approve_hash(&mut self, sender: Address, hash: &TxHash) -> Result<(), AuthorityError> {
        self.inner.approve_hash(sender, hash)
    }

    fn execute_transaction(
        &mut self,
        sender: Address,
        transaction: &SafeTransaction,
        signatures: &[u8],
        remark: &str,
    ) -> Result<ExecutionReceipt, AuthorityError> {
        self.inner
            .execute_transaction(sender, transaction, signatures, remark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails every call `failures` times before succeeding
    struct Flaky {
        failures: u32,
        reads: AtomicU32,
        submissions: u32,
        error: fn() -> AuthorityError,
    }

    impl Flaky {
        fn new(failures: u32, error: fn() -> AuthorityError) -> Self {
            Self {
                failures,
                reads: AtomicU32::new(0),
                submissions: 0,
                error,
            }
        }

        fn attempt(&self) -> Result<(), AuthorityError> {
            let n = self.reads.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err((self.error)())
            } else {
                Ok(())
            }
        }
    }

    impl SafeAuthority for Flaky {
        fn address(&self) -> Address {
            Address::ZERO
        }

        fn get_transaction_hash(
            &self,
            _transaction: &SafeTransaction,
            _nonce: &U256,
        ) -> Result<TxHash, AuthorityError> {
            self.attempt().map(|_| TxHash::repeat_byte(1))
        }

        fn nonce(&self) -> Result<U256, AuthorityError> {
            self.attempt().map(|_| U256::from(7u64))
        }

        fn get_owners(&self) -> Result<Vec<Address>, AuthorityError> {
            self.attempt().map(|_| vec![Address::repeat_byte(1)])
        }

        fn get_threshold(&self) -> Result<u64, AuthorityError> {
            self.attempt().map(|_| 1)
        }

        fn approved_hashes(&self, _owner: Address, _hash: &TxHash) -> Result<bool, AuthorityError> {
            self.attempt().map(|_| true)
        }

        fn approve_hash(&mut self, _sender: Address, _hash: &TxHash) -> Result<(), AuthorityError> {
            self.submissions += 1;
            Err((self.error)())
        }

        fn execute_transaction(
            &mut self,
            _sender: Address,
            _transaction: &SafeTransaction,
            _signatures: &[u8],
            _remark: &str,
        ) -> Result<ExecutionReceipt, AuthorityError> {
            self.submissions += 1;
            Err((self.error)())
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
            multiplier: 2,
        }
    }

    fn transport() -> AuthorityError {
        AuthorityError::Transport("connection reset".to_string())
    }

    fn reverted() -> AuthorityError {
        AuthorityError::Reverted("GS026".to_string())
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(350),
            multiplier: 2,
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(350));
        assert_eq!(policy.backoff(40), Duration::from_millis(350));
    }

    #[test]
    fn test_transient_reads_are_retried() {
        let authority = RetryingAuthority::new(Flaky::new(2, transport), fast_policy(3));
        assert_eq!(authority.nonce().unwrap(), U256::from(7u64));
        assert_eq!(authority.inner().reads.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_retries_are_bounded() {
        let authority = RetryingAuthority::new(Flaky::new(5, transport), fast_policy(3));
        assert!(matches!(
            authority.get_owners(),
            Err(AuthorityError::Transport(_))
        ));
        assert_eq!(authority.inner().reads.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_approval_reads_are_retried() {
        let authority = RetryingAuthority::new(Flaky::new(1, transport), fast_policy(3));
        assert!(authority
            .approved_hashes(Address::repeat_byte(1), &TxHash::repeat_byte(2))
            .unwrap());
        assert_eq!(authority.inner().reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_permanent_errors_not_retried() {
        let authority = RetryingAuthority::new(Flaky::new(5, reverted), fast_policy(3));
        assert!(authority.get_threshold().is_err());
        assert_eq!(authority.inner().reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_submissions_never_retried() {
        let mut authority = RetryingAuthority::new(Flaky::new(0, transport), fast_policy(5));
        let tx = SafeTransaction::call(Address::repeat_byte(2), vec![]);

        assert!(authority
            .execute_transaction(Address::repeat_byte(1), &tx, &[], "")
            .is_err());
        assert!(authority.approve_hash(Address::repeat_byte(1), &TxHash::repeat_byte(3)).is_err());
        assert_eq!(authority.inner().submissions, 2);
    }
}
