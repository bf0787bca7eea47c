//! CLI commands for the coordinator
//!
//! Implements all command handlers for the CLI interface.

use crate::authority::{LocalSafe, SafeAuthority};
use crate::config::{ChainConfig, CoordinatorConfig};
use crate::core::{Address, Proposal, TxHash};
use crate::crypto::KeyPair;
use crate::multisig::{ApprovalOutcome, MultisigCoordinator, ProposalOutcome};
use crate::storage::ProposalStore;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Default EIP-155 chain id for devnet Safes
pub const DEVNET_CHAIN_ID: u64 = 31337;

/// Generate a new signing key
pub fn cmd_keygen() -> CliResult<()> {
    let key = KeyPair::generate();

    println!("🔐 New signing key generated!");
    println!("   📍 Address: {}", key.address());
    println!("   🔑 Private key: {}", key.private_key_hex());
    println!("\n   ⚠️  IMPORTANT: The private key is not stored anywhere.");
    println!("   Keep it safe; it is needed to approve proposals.");

    Ok(())
}

/// Set up a file-backed devnet Safe and register it as a chain
pub fn cmd_devnet_setup(
    config: &CoordinatorConfig,
    chain: &str,
    owners: Vec<Address>,
    threshold: u64,
    chain_id: u64,
) -> CliResult<()> {
    let mut registry = config.load_chains()?;
    if registry.get(chain).is_ok() {
        println!("⚠️  Chain '{}' is already configured", chain);
        println!("   Use 'chain show --chain {}' to inspect it", chain);
        return Ok(());
    }

    let owner_count = owners.len();
    let safe = LocalSafe::create(&config.devnet_path(chain), chain, chain_id, owners, threshold)?;
    let address = safe.address();

    let mut chain_config = ChainConfig::new(&format!("local://{}", chain), address);
    chain_config.chain_id = Some(chain_id);
    registry.insert(chain, chain_config);
    registry.save(&config.chain_config_path())?;

    println!("✅ Devnet Safe created!");
    println!("   ⛓️  Chain: {} (id {})", chain, chain_id);
    println!("   📍 Safe: {}", address);
    println!("   👥 Owners: {}", owner_count);
    println!("   🔏 Threshold: {}", threshold);

    Ok(())
}

/// Register (or replace) a chain record
pub fn cmd_chain_add(
    config: &CoordinatorConfig,
    chain: &str,
    rpc: &str,
    safe: Address,
    chain_id: Option<u64>,
) -> CliResult<()> {
    let mut registry = config.load_chains()?;
    let mut chain_config = ChainConfig::new(rpc, safe);
    chain_config.chain_id = chain_id;
    registry.insert(chain, chain_config);
    registry.save(&config.chain_config_path())?;

    println!("✅ Chain '{}' registered", chain);
    println!("   🌐 RPC: {}", rpc);
    println!("   📍 Safe: {}", safe);

    Ok(())
}

/// Record the proxy admin and proxy of an upgradeable contract
pub fn cmd_chain_set_proxy(
    config: &CoordinatorConfig,
    chain: &str,
    contract: &str,
    admin: Address,
    proxy: Address,
) -> CliResult<()> {
    let mut registry = config.load_chains()?;
    registry.get_mut(chain)?.set_proxy(contract, admin, proxy);
    registry.save(&config.chain_config_path())?;

    println!("✅ Proxy for '{}' registered on {}", contract, chain);
    println!("   ├─ Admin: {}", admin);
    println!("   └─ Proxy: {}", proxy);

    Ok(())
}

/// Display a chain record
pub fn cmd_chain_show(config: &CoordinatorConfig, chain: &str) -> CliResult<()> {
    let registry = config.load_chains()?;
    let chain_config = registry.get(chain)?;

    println!("⛓️  Chain {}", chain);
    println!("   ├─ RPC: {}", chain_config.rpc);
    match chain_config.chain_id {
        Some(id) => println!("   ├─ Chain id: {}", id),
        None => println!("   ├─ Chain id: -"),
    }
    for (key, value) in &chain_config.extra {
        println!("   ├─ {}: {}", key, value);
    }
    println!("   └─ Safe: {}", chain_config.safe);

    Ok(())
}

/// Print the result of a propose call
pub fn report_proposal(outcome: &ProposalOutcome) {
    let proposal = outcome.proposal();
    if outcome.is_new() {
        println!("📝 Proposal created!");
    } else {
        println!("ℹ️  An identical proposal already exists");
    }
    println!("   ├─ Hash: {}", proposal.hash);
    println!("   ├─ To: {}", proposal.transaction.to);
    println!("   ├─ Nonce: {}", proposal.nonce);
    println!("   └─ Signatures: {}", proposal.signature_count());
}

/// Propose `addOwnerWithThreshold`
pub fn cmd_propose_add_owner(
    config: &CoordinatorConfig,
    chain: &str,
    owner: Address,
    threshold: u64,
    remark: &str,
) -> CliResult<()> {
    let coordinator = MultisigCoordinator::open(chain, config)?;
    report_proposal(&coordinator.propose_add_owner(owner, threshold, remark)?);
    Ok(())
}

/// Propose `removeOwner`
pub fn cmd_propose_remove_owner(
    config: &CoordinatorConfig,
    chain: &str,
    owner: Address,
    threshold: u64,
    remark: &str,
) -> CliResult<()> {
    let coordinator = MultisigCoordinator::open(chain, config)?;
    report_proposal(&coordinator.propose_remove_owner(owner, threshold, remark)?);
    Ok(())
}

/// Propose `swapOwner`
pub fn cmd_propose_swap_owner(
    config: &CoordinatorConfig,
    chain: &str,
    old_owner: Address,
    new_owner: Address,
    remark: &str,
) -> CliResult<()> {
    let coordinator = MultisigCoordinator::open(chain, config)?;
    report_proposal(&coordinator.propose_swap_owner(old_owner, new_owner, remark)?);
    Ok(())
}

/// Propose `changeThreshold`
pub fn cmd_propose_threshold(
    config: &CoordinatorConfig,
    chain: &str,
    threshold: u64,
    remark: &str,
) -> CliResult<()> {
    let coordinator = MultisigCoordinator::open(chain, config)?;
    report_proposal(&coordinator.propose_change_threshold(threshold, remark)?);
    Ok(())
}

/// Propose a proxy upgrade
pub fn cmd_propose_upgrade(
    config: &CoordinatorConfig,
    chain: &str,
    contract: &str,
    implementation: Address,
    remark: &str,
) -> CliResult<()> {
    let coordinator = MultisigCoordinator::open(chain, config)?;
    report_proposal(&coordinator.propose_upgrade(contract, implementation, remark)?);
    Ok(())
}

/// Approve a proposal, off-chain by signature or on-chain via `approveHash`
pub fn cmd_approve(
    config: &CoordinatorConfig,
    chain: &str,
    hash: &TxHash,
    private_key: &str,
    onchain: bool,
) -> CliResult<()> {
    let key = KeyPair::from_private_key_hex(private_key)?;
    let mut coordinator = MultisigCoordinator::open(chain, config)?;

    let outcome = if onchain {
        coordinator.approve_onchain(hash, &key)?
    } else {
        coordinator.approve(hash, &key)?
    };

    match outcome {
        ApprovalOutcome::Added { collected } => {
            println!("✍️  Approved by {}", key.address());
            println!("   └─ Signatures collected: {}", collected);
        }
        ApprovalOutcome::AlreadySigned => {
            println!("ℹ️  {} has already approved {}", key.address(), hash);
        }
    }

    Ok(())
}

/// Execute a proposal once enough signatures are collected
pub fn cmd_execute(
    config: &CoordinatorConfig,
    chain: &str,
    hash: &TxHash,
    private_key: &str,
) -> CliResult<()> {
    let key = KeyPair::from_private_key_hex(private_key)?;
    let mut coordinator = MultisigCoordinator::open(chain, config)?;

    let outcome = coordinator.execute(hash, key.address())?;
    if outcome.success {
        println!("🚀 Proposal executed!");
    } else {
        println!("⚠️  Proposal submitted but the inner call failed");
    }
    println!("   └─ Transaction: {}", outcome.transaction_id);

    Ok(())
}

/// List stored proposals
pub fn cmd_list(config: &CoordinatorConfig, chain: Option<&str>, pending: bool) -> CliResult<()> {
    let store = ProposalStore::new(config.store.clone())?;
    let proposals: Vec<Proposal> = if pending {
        store.pending(chain)?
    } else {
        store
            .load()?
            .into_iter()
            .filter(|p| chain.map_or(true, |c| p.chain == c))
            .collect()
    };

    if proposals.is_empty() {
        println!("📭 No proposals found.");
        return Ok(());
    }

    println!("📋 Proposals:");
    for proposal in &proposals {
        let status = if proposal.is_executed() {
            "executed"
        } else {
            "pending"
        };
        println!(
            "   {} [{}] nonce {} - {} signature(s), {}",
            proposal.hash,
            proposal.chain,
            proposal.nonce,
            proposal.signature_count(),
            status
        );
        if !proposal.remark.is_empty() {
            println!("   └─ {}", proposal.remark);
        }
    }

    Ok(())
}

/// Show one proposal as JSON
pub fn cmd_show(config: &CoordinatorConfig, hash: &TxHash) -> CliResult<()> {
    let store = ProposalStore::new(config.store.clone())?;
    let proposal = store.find_by_hash(hash)?;

    println!("{}", serde_json::to_string_pretty(&proposal)?);

    Ok(())
}

/// Show owners, threshold and nonce as the authority reports them
pub fn cmd_owners(config: &CoordinatorConfig, chain: &str) -> CliResult<()> {
    let coordinator = MultisigCoordinator::open(chain, config)?;
    let status = coordinator.safe_status()?;

    println!("👥 Safe {} on {}", status.address, status.chain);
    println!("   ├─ Threshold: {}", status.threshold);
    println!("   ├─ Nonce: {}", status.nonce);
    for (i, owner) in status.owners.iter().enumerate() {
        let branch = if i + 1 == status.owners.len() {
            "└─"
        } else {
            "├─"
        };
        println!("   {} {}", branch, owner);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::RetryPolicy;
    use crate::core::U256;

    fn test_config(temp_dir: &tempfile::TempDir) -> CoordinatorConfig {
        let mut config = CoordinatorConfig::new(temp_dir.path().to_path_buf());
        config.retry = RetryPolicy::none();
        config
    }

    #[test]
    fn test_devnet_setup_registers_chain() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = test_config(&temp_dir);
        let keys: Vec<KeyPair> = (0..2).map(|_| KeyPair::generate()).collect();

        cmd_devnet_setup(
            &config,
            "dev",
            keys.iter().map(|k| k.address()).collect(),
            2,
            DEVNET_CHAIN_ID,
        )
        .unwrap();

        let registry = config.load_chains().unwrap();
        let chain = registry.get("dev").unwrap();
        assert_eq!(chain.rpc, "local://dev");
        assert_eq!(chain.chain_id, Some(DEVNET_CHAIN_ID));

        let safe = LocalSafe::open(&config.devnet_path("dev")).unwrap();
        assert_eq!(safe.address(), chain.safe);
        assert_eq!(safe.get_threshold().unwrap(), 2);

        // A second setup leaves the existing Safe alone
        cmd_devnet_setup(&config, "dev", vec![keys[0].address()], 1, 1).unwrap();
        assert_eq!(safe.get_threshold().unwrap(), 2);
    }

    #[test]
    fn test_command_workflow() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = test_config(&temp_dir);
        let keys: Vec<KeyPair> = (0..2).map(|_| KeyPair::generate()).collect();
        cmd_devnet_setup(
            &config,
            "dev",
            keys.iter().map(|k| k.address()).collect(),
            2,
            DEVNET_CHAIN_ID,
        )
        .unwrap();

        cmd_propose_threshold(&config, "dev", 1, "relax").unwrap();
        let store = ProposalStore::new(config.store.clone()).unwrap();
        let hash = store.load().unwrap()[0].hash;

        // Too few signatures
        cmd_approve(&config, "dev", &hash, &keys[0].private_key_hex(), false).unwrap();
        assert!(cmd_execute(&config, "dev", &hash, &keys[0].private_key_hex()).is_err());

        cmd_approve(&config, "dev", &hash, &keys[1].private_key_hex(), true).unwrap();
        cmd_execute(&config, "dev", &hash, &keys[0].private_key_hex()).unwrap();

        assert!(store.find_by_hash(&hash).unwrap().is_executed());
        assert!(store.pending(Some("dev")).unwrap().is_empty());

        let safe = LocalSafe::open(&config.devnet_path("dev")).unwrap();
        assert_eq!(safe.get_threshold().unwrap(), 1);
        assert_eq!(safe.nonce().unwrap(), U256::from(1u64));

        cmd_list(&config, Some("dev"), false).unwrap();
        cmd_show(&config, &hash).unwrap();
        cmd_owners(&config, "dev").unwrap();
    }

    #[test]
    fn test_unknown_chain_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = test_config(&temp_dir);

        assert!(cmd_owners(&config, "nowhere").is_err());
        assert!(cmd_chain_show(&config, "nowhere").is_err());
    }

    #[test]
    fn test_set_proxy_enables_upgrade() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = test_config(&temp_dir);
        let key = KeyPair::generate();
        cmd_devnet_setup(&config, "dev", vec![key.address()], 1, DEVNET_CHAIN_ID).unwrap();

        let implementation = Address::repeat_byte(0x11);
        assert!(cmd_propose_upgrade(&config, "dev", "vault", implementation, "").is_err());

        cmd_chain_set_proxy(&config, "dev", "vault", Address::repeat_byte(0xad), Address::repeat_byte(0xb0))
            .unwrap();
        cmd_propose_upgrade(&config, "dev", "vault", implementation, "v2").unwrap();

        let store = ProposalStore::new(config.store.clone()).unwrap();
        let proposals = store.load().unwrap();
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].transaction.to, Address::repeat_byte(0xad));
        assert_eq!(proposals[0].contract.as_deref(), Some("vault"));
    }
}
