//! In-process Safe for devnets and tests
//!
//! `LocalSafe` keeps the owner list, threshold, nonce and approved hashes of
//! one Safe and enforces the same rules the contract does, reporting failures
//! with the contract's `GSxxx` revert codes. State can live in memory or in a
//! JSON file that is reloaded before every call and rewritten under a file
//! lock, so several CLI processes can share one devnet.

use super::eip712::transaction_hash;
use super::{AuthorityError, ExecutionReceipt, SafeAuthority};
use crate::core::encoding::{hex_bytes, u256_dec, u256_to_u64};
use crate::core::{
    decode_owner_call, Address, Operation, OwnerCall, SafeTransaction, TxHash, SENTINEL_OWNERS,
    SIGNATURE_LEN, U256,
};
use crate::crypto::{eth_signed_message_hash, keccak256, keccak256_concat, recover_address};
use crate::storage::StoreLock;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Deterministic Safe address for a devnet chain name
pub fn devnet_address(chain: &str) -> Address {
    let hash = keccak256(format!("safe-coordinator/devnet/{}", chain).as_bytes());
    Address::from_slice(&hash[12..])
}

/// An on-chain `approveHash` entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedHash {
    pub owner: Address,
    pub hash: TxHash,
}

/// A transaction the Safe executed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutedCall {
    #[serde(with = "u256_dec")]
    pub nonce: U256,
    pub safe_tx_hash: TxHash,
    pub transaction_id: TxHash,
    pub to: Address,
    #[serde(with = "u256_dec")]
    pub value: U256,
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    pub operation: Operation,
    /// Free-text annotation submitted with the call
    #[serde(default)]
    pub remark: String,
    pub success: bool,
}

/// Complete state of one local Safe
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeState {
    pub address: Address,
    pub chain_id: u64,
    /// Owners in `getOwners` order
    pub owners: Vec<Address>,
    pub threshold: u64,
    #[serde(with = "u256_dec")]
    pub nonce: U256,
    #[serde(default)]
    pub approved_hashes: Vec<ApprovedHash>,
    #[serde(default)]
    pub executed: Vec<ExecutedCall>,
}

impl SafeState {
    /// Initial state, validated the way `setup` validates it
    pub fn setup(
        address: Address,
        chain_id: u64,
        owners: Vec<Address>,
        threshold: u64,
    ) -> Result<Self, AuthorityError> {
        let mut state = Self {
            address,
            chain_id,
            owners: Vec::with_capacity(owners.len()),
            threshold: 0,
            nonce: U256::ZERO,
            approved_hashes: Vec::new(),
            executed: Vec::new(),
        };

        if threshold > owners.len() as u64 {
            return Err(revert("GS201"));
        }
        if threshold == 0 {
            return Err(revert("GS202"));
        }
        for owner in owners {
            state.check_new_owner(&owner).map_err(revert)?;
            state.owners.push(owner);
        }
        state.threshold = threshold;
        Ok(state)
    }

    pub fn is_owner(&self, address: &Address) -> bool {
        address != &SENTINEL_OWNERS && self.owners.contains(address)
    }

    /// Entry pointing at `owner` in the owner list
    fn predecessor(&self, owner: &Address) -> Option<Address> {
        let index = self.owners.iter().position(|o| o == owner)?;
        Some(if index == 0 {
            SENTINEL_OWNERS
        } else {
            self.owners[index - 1]
        })
    }

    fn is_approved(&self, owner: &Address, hash: &TxHash) -> bool {
        self.approved_hashes
            .iter()
            .any(|a| &a.owner == owner && &a.hash == hash)
    }

    fn check_new_owner(&self, owner: &Address) -> Result<(), &'static str> {
        if owner.is_zero() || owner == &SENTINEL_OWNERS || owner == &self.address {
            return Err("GS203");
        }
        if self.owners.contains(owner) {
            return Err("GS204");
        }
        Ok(())
    }

    fn change_threshold(&mut self, threshold: U256) -> Result<(), &'static str> {
        if threshold > U256::from(self.owners.len()) {
            return Err("GS201");
        }
        if threshold.is_zero() {
            return Err("GS202");
        }
        self.threshold = u256_to_u64(&threshold).ok_or("GS201")?;
        Ok(())
    }

    fn apply_owner_call(&mut self, call: OwnerCall) -> Result<(), &'static str> {
        match call {
            OwnerCall::AddOwnerWithThreshold { owner, threshold } => {
                self.check_new_owner(&owner)?;
                self.owners.insert(0, owner);
                self.change_threshold(threshold)
            }
            OwnerCall::RemoveOwner {
                prev_owner,
                owner,
                threshold,
            } => {
                if U256::from(self.owners.len().saturating_sub(1)) < threshold {
                    return Err("GS201");
                }
                if owner.is_zero() || owner == SENTINEL_OWNERS {
                    return Err("GS203");
                }
                if self.predecessor(&owner) != Some(prev_owner) {
                    return Err("GS205");
                }
                self.owners.retain(|o| o != &owner);
                self.change_threshold(threshold)
            }
            OwnerCall::SwapOwner {
                prev_owner,
                old_owner,
                new_owner,
            } => {
                self.check_new_owner(&new_owner)?;
                if old_owner.is_zero() || old_owner == SENTINEL_OWNERS {
                    return Err("GS203");
                }
                if self.predecessor(&old_owner) != Some(prev_owner) {
                    return Err("GS205");
                }
                if let Some(slot) = self.owners.iter_mut().find(|o| **o == old_owner) {
                    *slot = new_owner;
                }
                Ok(())
            }
            OwnerCall::ChangeThreshold { threshold } => self.change_threshold(threshold),
        }
    }

    /// Verify the first `threshold` signatures of a packed blob
    fn check_signatures(
        &self,
        hash: &TxHash,
        sender: &Address,
        signatures: &[u8],
    ) -> Result<(), &'static str> {
        if self.threshold == 0 {
            return Err("GS001");
        }
        let required = self.threshold as usize;
        if signatures.len() < required * SIGNATURE_LEN {
            return Err("GS020");
        }

        let mut last_owner = Address::ZERO;
        for entry in signatures.chunks_exact(SIGNATURE_LEN).take(required) {
            let r = TxHash::from_slice(&entry[..32]);
            let v = entry[64];

            let current = match v {
                // Contract signatures (EIP-1271) need a code-executing backend
                0 => return Err("GS021"),
                1 => {
                    let owner = Address::from_word(r);
                    if &owner != sender && !self.is_approved(&owner, hash) {
                        return Err("GS025");
                    }
                    owner
                }
                v if v > 30 => {
                    let digest = eth_signed_message_hash(&hash.0);
                    let mut adjusted = entry.to_vec();
                    adjusted[64] = v - 4;
                    recover_address(&digest, &adjusted).unwrap_or(Address::ZERO)
                }
                _ => recover_address(&hash.0, entry).unwrap_or(Address::ZERO),
            };

            if current <= last_owner || !self.is_owner(&current) {
                return Err("GS026");
            }
            last_owner = current;
        }
        Ok(())
    }

    /// Run the inner call of an executed transaction
    fn perform(&mut self, transaction: &SafeTransaction) -> Result<(), &'static str> {
        let self_call =
            transaction.to == self.address && transaction.operation == Operation::Call;
        if !self_call || transaction.data.is_empty() {
            return Ok(());
        }
        let call = decode_owner_call(&transaction.data).map_err(|_| "unknown selector")?;
        self.apply_owner_call(call)
    }

    fn execute(
        &mut self,
        sender: Address,
        transaction: &SafeTransaction,
        signatures: &[u8],
        remark: &str,
    ) -> Result<ExecutionReceipt, AuthorityError> {
        let hash = transaction_hash(self.chain_id, &self.address, transaction, &self.nonce);
        self.check_signatures(&hash, &sender, signatures)
            .map_err(revert)?;

        let nonce = self.nonce;
        self.nonce = nonce + U256::from(1u64);

        // The inner call runs on a copy so a failure leaves no partial change
        let mut inner = self.clone();
        let success = match inner.perform(transaction) {
            Ok(()) => {
                *self = inner;
                true
            }
            Err(reason) => {
                if !transaction.tolerates_failure() {
                    return Err(revert("GS013"));
                }
                log::debug!("Inner call of {} failed: {}", hash, reason);
                false
            }
        };

        let transaction_id = TxHash::from(keccak256_concat(&[
            hash.as_slice(),
            &nonce.to_be_bytes::<32>()[..],
            sender.into_word().as_slice(),
        ]));
        self.executed.push(ExecutedCall {
            nonce,
            safe_tx_hash: hash,
            transaction_id,
            to: transaction.to,
            value: transaction.value,
            data: transaction.data.clone(),
            operation: transaction.operation,
            remark: remark.to_string(),
            success,
        });

        Ok(ExecutionReceipt {
            success,
            transaction_id,
        })
    }
}

fn revert(code: &str) -> AuthorityError {
    AuthorityError::Reverted(code.to_string())
}

/// A Safe simulated in-process
#[derive(Debug)]
pub struct LocalSafe {
    state: SafeState,
    /// State file, when shared between processes
    backing: Option<PathBuf>,
    lock_timeout: Duration,
}

impl LocalSafe {
    /// In-memory Safe
    pub fn new(state: SafeState) -> Self {
        Self {
            state,
            backing: None,
            lock_timeout: Duration::from_secs(10),
        }
    }

    /// In-memory Safe at the devnet address for `chain`
    pub fn in_memory(
        chain: &str,
        chain_id: u64,
        owners: Vec<Address>,
        threshold: u64,
    ) -> Result<Self, AuthorityError> {
        let state = SafeState::setup(devnet_address(chain), chain_id, owners, threshold)?;
        Ok(Self::new(state))
    }

    /// Set up a file-backed Safe, refusing to overwrite an existing one
    pub fn create(
        path: &Path,
        chain: &str,
        chain_id: u64,
        owners: Vec<Address>,
        threshold: u64,
    ) -> Result<Self, AuthorityError> {
        let state = SafeState::setup(devnet_address(chain), chain_id, owners, threshold)?;

        let _lock = StoreLock::acquire(&lock_path(path), Duration::from_secs(10))?;
        if path.exists() {
            return Err(AuthorityError::IoError(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("devnet state already exists at {}", path.display()),
            )));
        }
        save_state(path, &state)?;

        log::info!(
            "Set up devnet Safe {} with {} owner(s), threshold {}",
            state.address,
            state.owners.len(),
            state.threshold
        );
        Ok(Self {
            state,
            backing: Some(path.to_path_buf()),
            lock_timeout: Duration::from_secs(10),
        })
    }

    /// Open a file-backed Safe
    pub fn open(path: &Path) -> Result<Self, AuthorityError> {
        let state = load_state(path)?;
        Ok(Self {
            state,
            backing: Some(path.to_path_buf()),
            lock_timeout: Duration::from_secs(10),
        })
    }

    /// Current state (re-read from disk when file-backed)
    pub fn state(&self) -> Result<SafeState, AuthorityError> {
        Ok(self.current()?.into_owned())
    }

    fn current(&self) -> Result<Cow<'_, SafeState>, AuthorityError> {
        match &self.backing {
            Some(path) => Ok(Cow::Owned(load_state(path)?)),
            None => Ok(Cow::Borrowed(&self.state)),
        }
    }

    /// Apply a state change atomically; nothing is kept if `change` fails
    fn transact<T, F>(&mut self, change: F) -> Result<T, AuthorityError>
    where
        F: FnOnce(&mut SafeState) -> Result<T, AuthorityError>,
    {
        match self.backing.clone() {
            Some(path) => {
                let _lock = StoreLock::acquire(&lock_path(&path), self.lock_timeout)?;
                let mut next = load_state(&path)?;
                let result = change(&mut next)?;
                save_state(&path, &next)?;
                self.state = next;
                Ok(result)
            }
            None => {
                let mut next = self.state.clone();
                let result = change(&mut next)?;
                self.state = next;
                Ok(result)
            }
        }
    }
}

impl SafeAuthority for LocalSafe {
    fn address(&self) -> Address {
        self.state.address
    }

    fn get_transaction_hash(
        &self,
        transaction: &SafeTransaction,
        nonce: &U256,
    ) -> Result<TxHash, AuthorityError> {
        let state = self.current()?;
        Ok(transaction_hash(state.chain_id, &state.address, transaction, nonce))
    }

    fn nonce(&self) -> Result<U256, AuthorityError> {
        Ok(self.current()?.nonce)
    }

    fn get_owners(&self) -> Result<Vec<Address>, AuthorityError> {
        Ok(self.current()?.owners.clone())
    }

    fn get_threshold(&self) -> Result<u64, AuthorityError> {
        Ok(self.current()?.threshold)
    }

    fn approved_hashes(&self, owner: Address, hash: &TxHash) -> Result<bool, AuthorityError> {
        Ok(self.current()?.is_approved(&owner, hash))
    }

    fn approve_hash(&mut self, sender: Address, hash: &TxHash) -> Result<(), AuthorityError> {
        log::debug!("approveHash({}) from {}", hash, sender);
        self.transact(|state| {
            if !state.is_owner(&sender) {
                return Err(revert("GS030"));
            }
            if !state.is_approved(&sender, hash) {
                state.approved_hashes.push(ApprovedHash {
                    owner: sender,
                    hash: *hash,
                });
            }
            Ok(())
        })
    }

    fn execute_transaction(
        &mut self,
        sender: Address,
        transaction: &SafeTransaction,
        signatures: &[u8],
        remark: &str,
    ) -> Result<ExecutionReceipt, AuthorityError> {
        log::debug!(
            "execTransaction to {} from {} with {} signature byte(s), remark {:?}",
            transaction.to,
            sender,
            signatures.len(),
            remark
        );
        self.transact(|state| state.execute(sender, transaction, signatures, remark))
    }
}

fn lock_path(path: &Path) -> PathBuf {
    path.with_extension("json.lock")
}

fn load_state(path: &Path) -> Result<SafeState, AuthorityError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

fn save_state(path: &Path, state: &SafeState) -> Result<(), AuthorityError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp_path = path.with_extension("json.tmp");
    {
        let file = fs::File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, state)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
    }
    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::abi::{
        encode_add_owner_with_threshold, encode_change_threshold, encode_remove_owner,
        encode_swap_owner,
    };
    use crate::crypto::KeyPair;

    /// Owners sorted ascending by address
    fn sorted_keys(n: usize) -> Vec<KeyPair> {
        let mut keys: Vec<KeyPair> = (0..n).map(|_| KeyPair::generate()).collect();
        keys.sort_by_key(|k| k.address());
        keys
    }

    fn safe_with(keys: &[KeyPair], threshold: u64) -> LocalSafe {
        let owners = keys.iter().map(|k| k.address()).collect();
        LocalSafe::in_memory("dev", 31337, owners, threshold).unwrap()
    }

    fn blob(safe: &LocalSafe, tx: &SafeTransaction, signers: &[&KeyPair]) -> Vec<u8> {
        let hash = safe.get_transaction_hash(tx, &safe.nonce().unwrap()).unwrap();
        signers
            .iter()
            .flat_map(|k| k.sign_digest(&hash.0).unwrap().to_vec())
            .collect()
    }

    fn assert_reverted<T: std::fmt::Debug>(result: Result<T, AuthorityError>, code: &str) {
        match result {
            Err(AuthorityError::Reverted(reason)) => assert_eq!(reason, code),
            other => panic!("expected revert {}, got {:?}", code, other),
        }
    }

    #[test]
    fn test_setup_validation() {
        let a = Address::repeat_byte(0xa);
        let b = Address::repeat_byte(0xb);
        let safe = devnet_address("dev");

        assert_reverted(SafeState::setup(safe, 1, vec![a], 2), "GS201");
        assert_reverted(SafeState::setup(safe, 1, vec![a], 0), "GS202");
        assert_reverted(SafeState::setup(safe, 1, vec![a, a], 1), "GS204");
        assert_reverted(SafeState::setup(safe, 1, vec![SENTINEL_OWNERS], 1), "GS203");
        assert_reverted(SafeState::setup(safe, 1, vec![safe], 1), "GS203");

        let state = SafeState::setup(safe, 1, vec![a, b], 2).unwrap();
        assert_eq!(state.owners, vec![a, b]);
        assert_eq!(state.threshold, 2);
    }

    #[test]
    fn test_add_owner_executes_and_bumps_nonce() {
        let keys = sorted_keys(2);
        let mut safe = safe_with(&keys, 2);
        let new_owner = Address::repeat_byte(0x77);
        let tx = SafeTransaction::call(safe.address(), encode_add_owner_with_threshold(new_owner, 2));

        let signatures = blob(&safe, &tx, &[&keys[0], &keys[1]]);
        let receipt = safe
            .execute_transaction(keys[0].address(), &tx, &signatures, "add ops signer")
            .unwrap();

        assert!(receipt.success);
        let state = safe.state().unwrap();
        assert_eq!(state.executed[0].remark, "add ops signer");
        assert_eq!(state.owners[0], new_owner);
        assert_eq!(state.owners.len(), 3);
        assert_eq!(state.nonce, U256::from(1u64));
        assert_eq!(state.executed.len(), 1);
        assert_eq!(state.executed[0].transaction_id, receipt.transaction_id);
    }

    #[test]
    fn test_unsorted_signatures_rejected() {
        let keys = sorted_keys(2);
        let mut safe = safe_with(&keys, 2);
        let tx = SafeTransaction::call(safe.address(), encode_change_threshold(1));

        let signatures = blob(&safe, &tx, &[&keys[1], &keys[0]]);
        assert_reverted(
            safe.execute_transaction(keys[0].address(), &tx, &signatures, ""),
            "GS026",
        );
        assert_eq!(safe.nonce().unwrap(), U256::ZERO);
    }

    #[test]
    fn test_too_few_signatures() {
        let keys = sorted_keys(2);
        let mut safe = safe_with(&keys, 2);
        let tx = SafeTransaction::call(safe.address(), encode_change_threshold(1));

        let signatures = blob(&safe, &tx, &[&keys[0]]);
        assert_reverted(
            safe.execute_transaction(keys[0].address(), &tx, &signatures, ""),
            "GS020",
        );
    }

    #[test]
    fn test_non_owner_signature_rejected() {
        let keys = sorted_keys(1);
        let mut safe = safe_with(&keys, 1);
        let stranger = KeyPair::generate();
        let tx = SafeTransaction::call(Address::repeat_byte(3), vec![]);

        let signatures = blob(&safe, &tx, &[&stranger]);
        assert_reverted(
            safe.execute_transaction(stranger.address(), &tx, &signatures, ""),
            "GS026",
        );
    }

    #[test]
    fn test_approved_hash_signatures() {
        let keys = sorted_keys(2);
        let mut safe = safe_with(&keys, 2);
        let tx = SafeTransaction::call(Address::repeat_byte(3), vec![1, 2]);
        let hash = safe.get_transaction_hash(&tx, &U256::ZERO).unwrap();

        let mut signatures = Vec::new();
        for key in &keys {
            signatures.extend_from_slice(key.address().into_word().as_slice());
            signatures.extend_from_slice(&[0u8; 32]);
            signatures.push(1);
        }

        // Neither owner approved yet and the sender is a third party
        let relayer = Address::repeat_byte(0xee);
        assert_reverted(
            safe.execute_transaction(relayer, &tx, &signatures, ""),
            "GS025",
        );

        assert!(!safe.approved_hashes(keys[0].address(), &hash).unwrap());
        safe.approve_hash(keys[0].address(), &hash).unwrap();
        safe.approve_hash(keys[1].address(), &hash).unwrap();
        assert!(safe.approved_hashes(keys[0].address(), &hash).unwrap());
        assert!(!safe.approved_hashes(keys[0].address(), &TxHash::repeat_byte(1)).unwrap());
        let receipt = safe.execute_transaction(relayer, &tx, &signatures, "").unwrap();
        assert!(receipt.success);
        assert_eq!(safe.state().unwrap().executed[0].to, Address::repeat_byte(3));
    }

    #[test]
    fn test_approve_hash_requires_owner() {
        let keys = sorted_keys(1);
        let mut safe = safe_with(&keys, 1);
        assert_reverted(safe.approve_hash(Address::repeat_byte(9), &TxHash::repeat_byte(1)), "GS030");
    }

    #[test]
    fn test_eth_sign_signature() {
        let keys = sorted_keys(1);
        let mut safe = safe_with(&keys, 1);
        let tx = SafeTransaction::call(Address::repeat_byte(3), vec![]);
        let hash = safe.get_transaction_hash(&tx, &U256::ZERO).unwrap();

        let digest = eth_signed_message_hash(&hash.0);
        let mut signature = keys[0].sign_digest(&digest).unwrap();
        signature[64] += 4;

        assert!(safe
            .execute_transaction(keys[0].address(), &tx, &signature, "")
            .unwrap()
            .success);
    }

    #[test]
    fn test_failed_owner_call_reverts_without_gas_settings() {
        let keys = sorted_keys(2);
        let mut safe = safe_with(&keys, 1);
        // Wrong predecessor for the second owner
        let tx = SafeTransaction::call(
            safe.address(),
            encode_remove_owner(SENTINEL_OWNERS, keys[1].address(), 1),
        );

        let signatures = blob(&safe, &tx, &[&keys[0]]);
        assert_reverted(
            safe.execute_transaction(keys[0].address(), &tx, &signatures, ""),
            "GS013",
        );
        let state = safe.state().unwrap();
        assert_eq!(state.nonce, U256::ZERO);
        assert_eq!(state.owners.len(), 2);
    }

    #[test]
    fn test_failed_call_tolerated_with_safe_tx_gas() {
        let keys = sorted_keys(2);
        let mut safe = safe_with(&keys, 1);
        let mut tx = SafeTransaction::call(
            safe.address(),
            encode_remove_owner(SENTINEL_OWNERS, keys[1].address(), 1),
        );
        tx.safe_tx_gas = U256::from(100_000u64);

        let signatures = blob(&safe, &tx, &[&keys[0]]);
        let receipt = safe
            .execute_transaction(keys[0].address(), &tx, &signatures, "")
            .unwrap();

        assert!(!receipt.success);
        let state = safe.state().unwrap();
        assert_eq!(state.nonce, U256::from(1u64));
        assert_eq!(state.owners.len(), 2);
    }

    #[test]
    fn test_owner_calls() {
        let a = Address::repeat_byte(0xa);
        let b = Address::repeat_byte(0xb);
        let c = Address::repeat_byte(0xc);
        let mut state = SafeState::setup(devnet_address("dev"), 1, vec![a, b, c], 2).unwrap();

        assert_eq!(
            state.apply_owner_call(OwnerCall::RemoveOwner {
                prev_owner: a,
                owner: b,
                threshold: U256::from(3u64),
            }),
            Err("GS201")
        );
        state
            .apply_owner_call(OwnerCall::RemoveOwner {
                prev_owner: a,
                owner: b,
                threshold: U256::from(2u64),
            })
            .unwrap();
        assert_eq!(state.owners, vec![a, c]);

        let d = Address::repeat_byte(0xd);
        state
            .apply_owner_call(decode_owner_call(&encode_swap_owner(SENTINEL_OWNERS, a, d)).unwrap())
            .unwrap();
        assert_eq!(state.owners, vec![d, c]);

        assert_eq!(
            state.apply_owner_call(OwnerCall::ChangeThreshold { threshold: U256::ZERO }),
            Err("GS202")
        );
        assert_eq!(
            state.apply_owner_call(OwnerCall::ChangeThreshold { threshold: U256::from(3u64) }),
            Err("GS201")
        );
        assert_eq!(
            state.apply_owner_call(OwnerCall::AddOwnerWithThreshold {
                owner: c,
                threshold: U256::from(1u64),
            }),
            Err("GS204")
        );
    }

    #[test]
    fn test_file_backed_state_is_shared() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("devnet").join("dev.json");
        let keys = sorted_keys(1);
        let owners = vec![keys[0].address()];

        let mut first = LocalSafe::create(&path, "dev", 31337, owners.clone(), 1).unwrap();
        assert!(LocalSafe::create(&path, "dev", 31337, owners, 1).is_err());
        let second = LocalSafe::open(&path).unwrap();

        let tx = SafeTransaction::call(first.address(), encode_change_threshold(1));
        let signatures = blob(&first, &tx, &[&keys[0]]);
        first
            .execute_transaction(keys[0].address(), &tx, &signatures, "")
            .unwrap();

        // The second handle sees the nonce consumed through the first
        assert_eq!(second.nonce().unwrap(), U256::from(1u64));
        assert_eq!(second.state().unwrap().executed.len(), 1);
    }
}
