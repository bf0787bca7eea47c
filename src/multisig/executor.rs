//! Execution gating
//!
//! A proposal is submitted only once it carries at least `threshold`
//! signatures and its nonce is still the authority's current one. Submission
//! happens at most once per call; an ambiguous failure is reported, never
//! retried.

use super::collector::pack_signatures;
use super::error::{authority_failed, MultisigError};
use crate::authority::SafeAuthority;
use crate::core::{Address, ExecutionRecord, TxHash};
use crate::storage::ProposalStore;
use chrono::Utc;
use serde::Serialize;

/// What the authority reported for a submitted proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
    pub success: bool,
    pub transaction_id: TxHash,
}

pub struct ExecutionGate<'a, A: ?Sized> {
    authority: &'a mut A,
    store: &'a ProposalStore,
    chain: &'a str,
}

impl<'a, A: SafeAuthority + ?Sized> ExecutionGate<'a, A> {
    pub fn new(authority: &'a mut A, store: &'a ProposalStore, chain: &'a str) -> Self {
        Self {
            authority,
            store,
            chain,
        }
    }

    /// Submit the proposal `hash` if it has `threshold` signatures.
    ///
    /// `executor` is the account sending the transaction.
    pub fn execute(
        &mut self,
        hash: &TxHash,
        threshold: u64,
        executor: Address,
    ) -> Result<ExecutionOutcome, MultisigError> {
        let proposal = self.store.find_by_hash(hash)?;
        if proposal.is_executed() {
            return Err(MultisigError::AlreadyExecuted(*hash));
        }

        let have = proposal.signature_count();
        if (have as u64) < threshold {
            log::warn!(
                "Proposal {} has {} of {} required signatures",
                hash,
                have,
                threshold
            );
            return Err(MultisigError::ThresholdNotMet {
                have,
                need: threshold,
            });
        }

        let current = self
            .authority
            .nonce()
            .map_err(authority_failed("nonce", self.chain))?;
        if proposal.nonce < current {
            log::warn!(
                "Proposal {} was built for nonce {} but {} is at {}",
                hash,
                proposal.nonce,
                self.chain,
                current
            );
            return Err(MultisigError::StaleNonce {
                proposal: proposal.nonce,
                current,
            });
        }

        let signatures = pack_signatures(&proposal.signatures);
        log::info!(
            "Submitting {} on {} with {} signature(s)",
            hash,
            self.chain,
            have
        );
        let receipt = self
            .authority
            .execute_transaction(
                executor,
                &proposal.transaction,
                &signatures,
                &proposal.remark,
            )
            .map_err(authority_failed("executeTransaction", self.chain))?;

        let record = ExecutionRecord {
            success: receipt.success,
            transaction_id: receipt.transaction_id,
            executed_at: Utc::now(),
        };
        if let Err(e) = self.store.mark_executed(hash, record) {
            log::error!(
                "{} executed as {} but the record could not be stored: {}",
                hash,
                receipt.transaction_id,
                e
            );
            return Err(e.into());
        }

        log::info!(
            "Executed {} (success: {}, transaction {})",
            hash,
            receipt.success,
            receipt.transaction_id
        );
        Ok(ExecutionOutcome {
            success: receipt.success,
            transaction_id: receipt.transaction_id,
        })
    }
}
