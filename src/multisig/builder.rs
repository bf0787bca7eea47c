//! Transaction fields for the supported proposal kinds
//!
//! Owner-management calls target the Safe itself; upgrades target the proxy
//! admin registered for the contract in the chain configuration. Every
//! transaction is a plain call with no value and no gas refund settings.

use super::error::MultisigError;
use super::owners::predecessor_of;
use crate::config::{ChainConfig, ConfigError};
use crate::core::abi::{
    encode_add_owner_with_threshold, encode_change_threshold, encode_remove_owner,
    encode_swap_owner, encode_upgrade_and_call,
};
use crate::core::{Address, SafeTransaction};

pub struct ProposalBuilder<'a> {
    chain: &'a str,
    config: &'a ChainConfig,
}

impl<'a> ProposalBuilder<'a> {
    pub fn new(chain: &'a str, config: &'a ChainConfig) -> Self {
        Self { chain, config }
    }

    /// `addOwnerWithThreshold(owner, threshold)`
    pub fn add_owner(&self, owner: Address, threshold: u64) -> Result<SafeTransaction, MultisigError> {
        check_threshold(threshold)?;
        Ok(self.safe_call(encode_add_owner_with_threshold(owner, threshold)))
    }

    /// `removeOwner(prev, owner, threshold)` against the given owner list
    pub fn remove_owner(
        &self,
        owners: &[Address],
        owner: Address,
        threshold: u64,
    ) -> Result<SafeTransaction, MultisigError> {
        check_threshold(threshold)?;
        let prev = predecessor_of(owners, &owner)?;
        Ok(self.safe_call(encode_remove_owner(prev, owner, threshold)))
    }

    /// `swapOwner(prev, old, new)` against the given owner list
    pub fn swap_owner(
        &self,
        owners: &[Address],
        old_owner: Address,
        new_owner: Address,
    ) -> Result<SafeTransaction, MultisigError> {
        let prev = predecessor_of(owners, &old_owner)?;
        Ok(self.safe_call(encode_swap_owner(prev, old_owner, new_owner)))
    }

    /// `changeThreshold(threshold)`
    pub fn change_threshold(&self, threshold: u64) -> Result<SafeTransaction, MultisigError> {
        check_threshold(threshold)?;
        Ok(self.safe_call(encode_change_threshold(threshold)))
    }

    /// `upgradeAndCall(proxy, implementation, 0x)` on the contract's proxy admin
    pub fn upgrade(
        &self,
        contract: &str,
        implementation: Address,
    ) -> Result<SafeTransaction, MultisigError> {
        let admin = self
            .config
            .proxy_admin(self.chain, contract)
            .map_err(missing_input)?;
        let proxy = self
            .config
            .proxy_address(self.chain, contract)
            .map_err(missing_input)?;

        Ok(SafeTransaction::call(
            admin,
            encode_upgrade_and_call(proxy, implementation, &[]),
        ))
    }

    fn safe_call(&self, data: Vec<u8>) -> SafeTransaction {
        SafeTransaction::call(self.config.safe, data)
    }
}

fn check_threshold(threshold: u64) -> Result<(), MultisigError> {
    if threshold == 0 {
        return Err(MultisigError::InvalidThreshold(
            "threshold must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn missing_input(e: ConfigError) -> MultisigError {
    match e {
        ConfigError::MissingKey { chain, key } => {
            MultisigError::InputMissing(format!("{} for chain {}", key, chain))
        }
        other => MultisigError::Config(other),
    }
}
