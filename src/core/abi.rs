//! ABI calldata for owner management and proxy upgrades

use super::address::Address;
use alloy_primitives::{Bytes, U256};
use alloy_sol_types::{sol, SolCall, SolInterface};
use thiserror::Error;

sol! {
    interface IOwnerManager {
        function addOwnerWithThreshold(address owner, uint256 threshold) external;
        function removeOwner(address prevOwner, address owner, uint256 threshold) external;
        function swapOwner(address prevOwner, address oldOwner, address newOwner) external;
        function changeThreshold(uint256 threshold) external;
    }

    interface IProxyAdmin {
        function upgradeAndCall(address proxy, address implementation, bytes data) external payable;
    }
}

use IOwnerManager::IOwnerManagerCalls;

/// Calldata decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("Calldata too short: {0} bytes")]
    TooShort(usize),
    #[error("Unknown selector: 0x{0}")]
    UnknownSelector(String),
    #[error("Malformed arguments: {0}")]
    MalformedArguments(String),
}

/// A decoded call understood by the owner manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerCall {
    AddOwnerWithThreshold {
        owner: Address,
        threshold: U256,
    },
    RemoveOwner {
        prev_owner: Address,
        owner: Address,
        threshold: U256,
    },
    SwapOwner {
        prev_owner: Address,
        old_owner: Address,
        new_owner: Address,
    },
    ChangeThreshold {
        threshold: U256,
    },
}

impl From<IOwnerManagerCalls> for OwnerCall {
    fn from(call: IOwnerManagerCalls) -> Self {
        match call {
            IOwnerManagerCalls::addOwnerWithThreshold(c) => OwnerCall::AddOwnerWithThreshold {
                owner: c.owner,
                threshold: c.threshold,
            },
            IOwnerManagerCalls::removeOwner(c) => OwnerCall::RemoveOwner {
                prev_owner: c.prevOwner,
                owner: c.owner,
                threshold: c.threshold,
            },
            IOwnerManagerCalls::swapOwner(c) => OwnerCall::SwapOwner {
                prev_owner: c.prevOwner,
                old_owner: c.oldOwner,
                new_owner: c.newOwner,
            },
            IOwnerManagerCalls::changeThreshold(c) => OwnerCall::ChangeThreshold {
                threshold: c.threshold,
            },
        }
    }
}

pub fn encode_add_owner_with_threshold(owner: Address, threshold: u64) -> Vec<u8> {
    IOwnerManager::addOwnerWithThresholdCall {
        owner,
        threshold: U256::from(threshold),
    }
    .abi_encode()
}

pub fn encode_remove_owner(prev_owner: Address, owner: Address, threshold: u64) -> Vec<u8> {
    IOwnerManager::removeOwnerCall {
        prevOwner: prev_owner,
        owner,
        threshold: U256::from(threshold),
    }
    .abi_encode()
}

pub fn encode_swap_owner(prev_owner: Address, old_owner: Address, new_owner: Address) -> Vec<u8> {
    IOwnerManager::swapOwnerCall {
        prevOwner: prev_owner,
        oldOwner: old_owner,
        newOwner: new_owner,
    }
    .abi_encode()
}

pub fn encode_change_threshold(threshold: u64) -> Vec<u8> {
    IOwnerManager::changeThresholdCall {
        threshold: U256::from(threshold),
    }
    .abi_encode()
}

/// `upgradeAndCall(proxy, implementation, data)` on a proxy admin
pub fn encode_upgrade_and_call(proxy: Address, implementation: Address, data: &[u8]) -> Vec<u8> {
    IProxyAdmin::upgradeAndCallCall {
        proxy,
        implementation,
        data: Bytes::copy_from_slice(data),
    }
    .abi_encode()
}

/// Decode calldata addressed to the authority's owner manager
pub fn decode_owner_call(data: &[u8]) -> Result<OwnerCall, AbiError> {
    if data.len() < 4 {
        return Err(AbiError::TooShort(data.len()));
    }
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&data[..4]);
    if !IOwnerManagerCalls::valid_selector(selector) {
        return Err(AbiError::UnknownSelector(hex::encode(selector)));
    }

    IOwnerManagerCalls::abi_decode(data)
        .map(OwnerCall::from)
        .map_err(|e| AbiError::MalformedArguments(e.to_string()))
}
