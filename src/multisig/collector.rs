//! Signature collection
//!
//! Signers authorize a proposal one at a time. Each authorization is checked
//! against the authority's current owner list, rejected if the signer already
//! signed, verified locally and then appended to the stored proposal.

use super::error::{authority_failed, MultisigError};
use crate::authority::SafeAuthority;
use crate::core::{Address, Signature, SignatureKind, TxHash, SIGNATURE_LEN};
use crate::crypto::{eth_signed_message_hash, recover_address, KeyPair};
use crate::storage::{ProposalStore, StorageError};
use serde::Serialize;

/// Result of an approval attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ApprovalOutcome {
    /// Signature appended; `collected` signatures are now on record
    Added { collected: usize },
    /// The signer had already signed; nothing changed
    AlreadySigned,
}

pub struct SignatureCollector<'a, A: ?Sized> {
    authority: &'a A,
    store: &'a ProposalStore,
    chain: &'a str,
}

impl<'a, A: SafeAuthority + ?Sized> SignatureCollector<'a, A> {
    pub fn new(authority: &'a A, store: &'a ProposalStore, chain: &'a str) -> Self {
        Self {
            authority,
            store,
            chain,
        }
    }

    /// Record `signature` on the proposal identified by `hash`
    pub fn approve(
        &self,
        hash: &TxHash,
        signature: Signature,
    ) -> Result<ApprovalOutcome, MultisigError> {
        let proposal = self.store.find_by_hash(hash)?;
        if proposal.is_executed() {
            return Err(MultisigError::AlreadyExecuted(*hash));
        }

        let signer = signature.signer;
        self.ensure_owner(&signer)?;

        if proposal.has_signed(&signer) {
            log::info!("{} already signed {}", signer, hash);
            return Ok(ApprovalOutcome::AlreadySigned);
        }

        self.verify(hash, &signature)?;

        match self.store.append_signature(hash, signature) {
            Ok(updated) => Ok(ApprovalOutcome::Added {
                collected: updated.signature_count(),
            }),
            // Another process signed for the same signer in between
            Err(StorageError::DuplicateSigner { .. }) => Ok(ApprovalOutcome::AlreadySigned),
            Err(e) => Err(e.into()),
        }
    }

    /// Verify `signature`, consulting the authority for `v == 1` payloads
    fn verify(&self, hash: &TxHash, signature: &Signature) -> Result<(), MultisigError> {
        if signature.data.len() != SIGNATURE_LEN || signature.kind() != SignatureKind::ApprovedHash {
            return verify_signature(hash, signature);
        }

        let named = Address::from_word(TxHash::from_slice(&signature.data[..32]));
        if named != signature.signer {
            return Err(MultisigError::InvalidSignature);
        }
        let approved = self
            .authority
            .approved_hashes(signature.signer, hash)
            .map_err(authority_failed("approvedHashes", self.chain))?;
        if !approved {
            log::warn!(
                "{} has not approved {} on {}",
                signature.signer,
                hash,
                self.chain
            );
            return Err(MultisigError::InvalidSignature);
        }
        Ok(())
    }

    /// Fail with `UnauthorizedSigner` unless `signer` is a current owner
    pub fn ensure_owner(&self, signer: &Address) -> Result<(), MultisigError> {
        let owners = self
            .authority
            .get_owners()
            .map_err(authority_failed("getOwners", self.chain))?;

        if !owners.contains(signer) {
            log::warn!("Rejected signature from non-owner {} on {}", signer, self.chain);
            return Err(MultisigError::UnauthorizedSigner(*signer));
        }
        Ok(())
    }
}

/// Check that a payload authorizes `hash` for its claimed signer
///
/// Only signed payloads can be checked offline. A `v == 1` payload stands
/// for an on-chain approval and is rejected here; `SignatureCollector`
/// verifies those against the authority.
pub fn verify_signature(hash: &TxHash, signature: &Signature) -> Result<(), MultisigError> {
    if signature.data.len() != SIGNATURE_LEN {
        return Err(MultisigError::InvalidSignature);
    }
    let recovered = match signature.kind() {
        SignatureKind::Ecdsa => recover_address(&hash.0, &signature.data)
            .map_err(|_| MultisigError::InvalidSignature)?,
        SignatureKind::EthSign => {
            let digest = eth_signed_message_hash(&hash.0);
            let mut adjusted = signature.data.clone();
            adjusted[64] -= 4;
            recover_address(&digest, &adjusted).map_err(|_| MultisigError::InvalidSignature)?
        }
        SignatureKind::ApprovedHash | SignatureKind::Contract => {
            return Err(MultisigError::InvalidSignature)
        }
    };

    if recovered != signature.signer {
        return Err(MultisigError::InvalidSignature);
    }
    Ok(())
}

/// Sign a proposal hash with a private key
pub fn sign_proposal(hash: &TxHash, key: &KeyPair) -> Result<Signature, MultisigError> {
    let payload = key.sign_digest(&hash.0)?;
    Signature::new(key.address(), payload.to_vec()).map_err(|_| MultisigError::InvalidSignature)
}

/// Concatenate signatures in ascending signer order
pub fn pack_signatures(signatures: &[Signature]) -> Vec<u8> {
    let mut ordered: Vec<&Signature> = signatures.iter().collect();
    ordered.sort_by_key(|s| s.signer);
    ordered
        .into_iter()
        .flat_map(|s| s.data.iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::LocalSafe;
    use crate::core::{Proposal, SafeTransaction, U256};
    use crate::multisig::executor::ExecutionGate;
    use crate::storage::StoreConfig;

    struct Fixture {
        _temp_dir: tempfile::TempDir,
        keys: Vec<KeyPair>,
        safe: LocalSafe,
        store: ProposalStore,
        hash: TxHash,
    }

    fn fixture() -> Fixture {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = ProposalStore::new(StoreConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap();
        let keys: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
        let owners = keys.iter().map(|k| k.address()).collect();
        let safe = LocalSafe::in_memory("dev", 31337, owners, 2).unwrap();

        let tx = SafeTransaction::call(Address::repeat_byte(1), vec![]);
        let hash = safe.get_transaction_hash(&tx, &U256::ZERO).unwrap();
        store
            .insert_if_absent(Proposal::new(hash, tx, U256::ZERO, "dev", ""))
            .unwrap();

        Fixture {
            _temp_dir: temp_dir,
            keys,
            safe,
            store,
            hash,
        }
    }

    #[test]
    fn test_owner_signature_added() {
        let f = fixture();
        let collector = SignatureCollector::new(&f.safe, &f.store, "dev");

        let signature = sign_proposal(&f.hash, &f.keys[0]).unwrap();
        assert_eq!(
            collector.approve(&f.hash, signature).unwrap(),
            ApprovalOutcome::Added { collected: 1 }
        );
        let signature = sign_proposal(&f.hash, &f.keys[1]).unwrap();
        assert_eq!(
            collector.approve(&f.hash, signature).unwrap(),
            ApprovalOutcome::Added { collected: 2 }
        );
    }

    #[test]
    fn test_non_owner_rejected() {
        let f = fixture();
        let collector = SignatureCollector::new(&f.safe, &f.store, "dev");
        let stranger = KeyPair::generate();

        let signature = sign_proposal(&f.hash, &stranger).unwrap();
        assert!(matches!(
            collector.approve(&f.hash, signature),
            Err(MultisigError::UnauthorizedSigner(addr)) if addr == stranger.address()
        ));
        assert_eq!(f.store.find_by_hash(&f.hash).unwrap().signature_count(), 0);
    }

    #[test]
    fn test_second_signature_is_benign() {
        let f = fixture();
        let collector = SignatureCollector::new(&f.safe, &f.store, "dev");

        collector
            .approve(&f.hash, sign_proposal(&f.hash, &f.keys[0]).unwrap())
            .unwrap();
        assert_eq!(
            collector
                .approve(&f.hash, sign_proposal(&f.hash, &f.keys[0]).unwrap())
                .unwrap(),
            ApprovalOutcome::AlreadySigned
        );
        assert_eq!(f.store.find_by_hash(&f.hash).unwrap().signature_count(), 1);
    }

    #[test]
    fn test_forged_signature_rejected() {
        let f = fixture();
        let collector = SignatureCollector::new(&f.safe, &f.store, "dev");

        // Signed by one owner, claimed by another
        let mut signature = sign_proposal(&f.hash, &f.keys[0]).unwrap();
        signature.signer = f.keys[1].address();
        assert!(matches!(
            collector.approve(&f.hash, signature),
            Err(MultisigError::InvalidSignature)
        ));
    }

    #[test]
    fn test_unknown_proposal() {
        let f = fixture();
        let collector = SignatureCollector::new(&f.safe, &f.store, "dev");
        let missing = TxHash::repeat_byte(0xee);

        let signature = sign_proposal(&missing, &f.keys[0]).unwrap();
        assert!(matches!(
            collector.approve(&missing, signature),
            Err(MultisigError::NotFound(_))
        ));
    }

    #[test]
    fn test_unapproved_hash_payload_rejected() {
        let mut f = fixture();

        // A v = 1 entry for an owner who never called approveHash
        let unbacked = Signature::approved_hash(f.keys[0].address());
        let collector = SignatureCollector::new(&f.safe, &f.store, "dev");
        assert!(matches!(
            collector.approve(&f.hash, unbacked),
            Err(MultisigError::InvalidSignature)
        ));
        assert_eq!(f.store.find_by_hash(&f.hash).unwrap().signature_count(), 0);

        // Nothing was recorded, so execution cannot be attempted either
        let mut gate = ExecutionGate::new(&mut f.safe, &f.store, "dev");
        assert!(matches!(
            gate.execute(&f.hash, 1, f.keys[0].address()),
            Err(MultisigError::ThresholdNotMet { have: 0, need: 1 })
        ));
        assert!(f.safe.state().unwrap().executed.is_empty());
    }

    #[test]
    fn test_approved_hash_payload_accepted_after_approval() {
        let mut f = fixture();
        f.safe.approve_hash(f.keys[1].address(), &f.hash).unwrap();

        let collector = SignatureCollector::new(&f.safe, &f.store, "dev");
        assert_eq!(
            collector
                .approve(&f.hash, Signature::approved_hash(f.keys[1].address()))
                .unwrap(),
            ApprovalOutcome::Added { collected: 1 }
        );

        // The approval belongs to keys[1]; keys[2] cannot borrow it
        let mut borrowed = Signature::approved_hash(f.keys[1].address());
        borrowed.signer = f.keys[2].address();
        assert!(matches!(
            collector.approve(&f.hash, borrowed),
            Err(MultisigError::InvalidSignature)
        ));
    }

    #[test]
    fn test_offline_check_refuses_approved_hash_payload() {
        let hash = TxHash::repeat_byte(1);
        let signature = Signature::approved_hash(Address::repeat_byte(0xab));
        assert!(matches!(
            verify_signature(&hash, &signature),
            Err(MultisigError::InvalidSignature)
        ));
    }

    #[test]
    fn test_pack_orders_by_signer() {
        let low = Signature::approved_hash(Address::repeat_byte(0x01));
        let mid = Signature::approved_hash(Address::repeat_byte(0x7f));
        let high = Signature::approved_hash(Address::repeat_byte(0xf0));

        let packed = pack_signatures(&[high.clone(), low.clone(), mid.clone()]);
        assert_eq!(packed.len(), 3 * SIGNATURE_LEN);
        assert_eq!(&packed[..SIGNATURE_LEN], low.data.as_slice());
        assert_eq!(&packed[SIGNATURE_LEN..2 * SIGNATURE_LEN], mid.data.as_slice());
        assert_eq!(&packed[2 * SIGNATURE_LEN..], high.data.as_slice());
    }
}
