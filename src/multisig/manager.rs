//! Multisig proposal coordinator
//!
//! Ties the proposal store and one chain's authority together: builds and
//! hashes proposals, collects signatures and gates execution.

use super::builder::ProposalBuilder;
use super::collector::{sign_proposal, ApprovalOutcome, SignatureCollector};
use super::error::{authority_failed, MultisigError};
use super::executor::{ExecutionGate, ExecutionOutcome};
use super::hasher::TransactionHasher;
use crate::authority::{connect, DynAuthority, SafeAuthority};
use crate::config::{ChainConfig, CoordinatorConfig};
use crate::core::{Address, Proposal, SafeTransaction, Signature, TxHash, U256};
use crate::crypto::KeyPair;
use crate::storage::ProposalStore;
use serde::Serialize;

/// Result of a propose call
#[derive(Debug, Clone)]
pub enum ProposalOutcome {
    Created(Proposal),
    /// A proposal with identical fields and nonce is already stored
    AlreadyExists(Proposal),
}

impl ProposalOutcome {
    pub fn proposal(&self) -> &Proposal {
        match self {
            ProposalOutcome::Created(p) | ProposalOutcome::AlreadyExists(p) => p,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, ProposalOutcome::Created(_))
    }
}

/// Authority state as seen by the coordinator
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeStatus {
    pub chain: String,
    pub address: Address,
    pub owners: Vec<Address>,
    pub threshold: u64,
    #[serde(with = "crate::core::encoding::u256_dec")]
    pub nonce: U256,
}

/// Per-chain proposal workflow
pub struct MultisigCoordinator<A = DynAuthority> {
    chain: String,
    chain_config: ChainConfig,
    store: ProposalStore,
    authority: A,
}

impl MultisigCoordinator<DynAuthority> {
    /// Open the coordinator for `chain` from the on-disk configuration
    pub fn open(chain: &str, config: &CoordinatorConfig) -> Result<Self, MultisigError> {
        let registry = config.load_chains()?;
        let chain_config = registry.get(chain)?.clone();
        let authority =
            connect(chain, &chain_config, config).map_err(authority_failed("connect", chain))?;
        let store = ProposalStore::new(config.store.clone())?;

        Ok(Self::new(chain, chain_config, store, authority))
    }
}

impl<A: SafeAuthority> MultisigCoordinator<A> {
    pub fn new(chain: &str, chain_config: ChainConfig, store: ProposalStore, authority: A) -> Self {
        Self {
            chain: chain.to_string(),
            chain_config,
            store,
            authority,
        }
    }

    pub fn chain(&self) -> &str {
        &self.chain
    }

    pub fn chain_config(&self) -> &ChainConfig {
        &self.chain_config
    }

    pub fn store(&self) -> &ProposalStore {
        &self.store
    }

    pub fn authority(&self) -> &A {
        &self.authority
    }

    fn builder(&self) -> ProposalBuilder<'_> {
        ProposalBuilder::new(&self.chain, &self.chain_config)
    }

    fn collector(&self) -> SignatureCollector<'_, A> {
        SignatureCollector::new(&self.authority, &self.store, &self.chain)
    }

    fn owners(&self) -> Result<Vec<Address>, MultisigError> {
        self.authority
            .get_owners()
            .map_err(authority_failed("getOwners", &self.chain))
    }

    /// Hash `transaction` at the current nonce and store it once
    pub fn propose(
        &self,
        transaction: SafeTransaction,
        remark: &str,
        contract: Option<&str>,
    ) -> Result<ProposalOutcome, MultisigError> {
        let hasher = TransactionHasher::new(&self.authority, &self.chain);
        let mut proposal = hasher.prepare(transaction, remark)?;
        if let Some(contract) = contract {
            proposal = proposal.with_contract(contract);
        }

        if self.store.insert_if_absent(proposal.clone())? {
            Ok(ProposalOutcome::Created(proposal))
        } else {
            let existing = self.store.find_by_hash(&proposal.hash)?;
            Ok(ProposalOutcome::AlreadyExists(existing))
        }
    }

    pub fn propose_add_owner(
        &self,
        owner: Address,
        threshold: u64,
        remark: &str,
    ) -> Result<ProposalOutcome, MultisigError> {
        let transaction = self.builder().add_owner(owner, threshold)?;
        self.propose(transaction, remark, None)
    }

    pub fn propose_remove_owner(
        &self,
        owner: Address,
        threshold: u64,
        remark: &str,
    ) -> Result<ProposalOutcome, MultisigError> {
        let owners = self.owners()?;
        let transaction = self.builder().remove_owner(&owners, owner, threshold)?;
        self.propose(transaction, remark, None)
    }

    pub fn propose_swap_owner(
        &self,
        old_owner: Address,
        new_owner: Address,
        remark: &str,
    ) -> Result<ProposalOutcome, MultisigError> {
        let owners = self.owners()?;
        let transaction = self.builder().swap_owner(&owners, old_owner, new_owner)?;
        self.propose(transaction, remark, None)
    }

    pub fn propose_change_threshold(
        &self,
        threshold: u64,
        remark: &str,
    ) -> Result<ProposalOutcome, MultisigError> {
        let transaction = self.builder().change_threshold(threshold)?;
        self.propose(transaction, remark, None)
    }

    pub fn propose_upgrade(
        &self,
        contract: &str,
        implementation: Address,
        remark: &str,
    ) -> Result<ProposalOutcome, MultisigError> {
        let transaction = self.builder().upgrade(contract, implementation)?;
        self.propose(transaction, remark, Some(contract))
    }

    /// Sign the proposal with `key` and record the signature
    pub fn approve(&self, hash: &TxHash, key: &KeyPair) -> Result<ApprovalOutcome, MultisigError> {
        let signature = sign_proposal(hash, key)?;
        self.collector().approve(hash, signature)
    }

    /// Record an externally produced signature
    pub fn submit_signature(
        &self,
        hash: &TxHash,
        signature: Signature,
    ) -> Result<ApprovalOutcome, MultisigError> {
        self.collector().approve(hash, signature)
    }

    /// Approve the hash on-chain, then record a pre-approved-hash signature
    pub fn approve_onchain(
        &mut self,
        hash: &TxHash,
        key: &KeyPair,
    ) -> Result<ApprovalOutcome, MultisigError> {
        let signer = key.address();
        let proposal = self.store.find_by_hash(hash)?;
        if proposal.is_executed() {
            return Err(MultisigError::AlreadyExecuted(*hash));
        }
        self.collector().ensure_owner(&signer)?;
        if proposal.has_signed(&signer) {
            log::info!("{} already signed {}", signer, hash);
            return Ok(ApprovalOutcome::AlreadySigned);
        }

        self.authority
            .approve_hash(signer, hash)
            .map_err(authority_failed("approveHash", &self.chain))?;
        log::info!("{} approved {} on {}", signer, hash, self.chain);

        self.collector()
            .approve(hash, Signature::approved_hash(signer))
    }

    /// Submit the proposal if it meets the authority's current threshold
    pub fn execute(
        &mut self,
        hash: &TxHash,
        executor: Address,
    ) -> Result<ExecutionOutcome, MultisigError> {
        let threshold = self
            .authority
            .get_threshold()
            .map_err(authority_failed("getThreshold", &self.chain))?;

        ExecutionGate::new(&mut self.authority, &self.store, &self.chain)
            .execute(hash, threshold, executor)
    }

    /// Every stored proposal for this chain, in creation order
    pub fn proposals(&self) -> Result<Vec<Proposal>, MultisigError> {
        Ok(self
            .store
            .load()?
            .into_iter()
            .filter(|p| p.chain == self.chain)
            .collect())
    }

    /// Proposals for this chain that have not been executed
    pub fn pending(&self) -> Result<Vec<Proposal>, MultisigError> {
        Ok(self.store.pending(Some(self.chain.as_str()))?)
    }

    pub fn proposal(&self, hash: &TxHash) -> Result<Proposal, MultisigError> {
        Ok(self.store.find_by_hash(hash)?)
    }

    /// Owners, threshold and nonce as the authority reports them now
    pub fn safe_status(&self) -> Result<SafeStatus, MultisigError> {
        let owners = self.owners()?;
        let threshold = self
            .authority
            .get_threshold()
            .map_err(authority_failed("getThreshold", &self.chain))?;
        let nonce = self
            .authority
            .nonce()
            .map_err(authority_failed("nonce", &self.chain))?;

        Ok(SafeStatus {
            chain: self.chain.clone(),
            address: self.authority.address(),
            owners,
            threshold,
            nonce,
        })
    }
}
