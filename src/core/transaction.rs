//! Safe transaction fields
//!
//! The immutable part of a proposal: everything the authority hashes
//! together with the nonce.

use super::address::Address;
use super::encoding::{hex_bytes, u256_dec};
use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Call type executed by the authority
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Operation {
    #[default]
    Call,
    DelegateCall,
}

impl Operation {
    pub fn as_u8(&self) -> u8 {
        match self {
            Operation::Call => 0,
            Operation::DelegateCall => 1,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Operation::Call),
            1 => Some(Operation::DelegateCall),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Call => write!(f, "call"),
            Operation::DelegateCall => write!(f, "delegatecall"),
        }
    }
}

// Stored as the numeric enum value the authority uses
impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Operation::from_u8(value)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown operation {}", value)))
    }
}

/// The hashed, immutable fields of a multisig transaction (without nonce)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeTransaction {
    /// Target address
    pub to: Address,
    /// Native-currency amount
    #[serde(with = "u256_dec")]
    pub value: U256,
    /// Call payload
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    pub operation: Operation,
    #[serde(with = "u256_dec")]
    pub safe_tx_gas: U256,
    #[serde(with = "u256_dec")]
    pub base_gas: U256,
    #[serde(with = "u256_dec")]
    pub gas_price: U256,
    pub gas_token: Address,
    pub refund_receiver: Address,
}

impl SafeTransaction {
    /// A plain call with no value and no gas refund settings
    pub fn call(to: Address, data: Vec<u8>) -> Self {
        Self {
            to,
            value: U256::ZERO,
            data,
            operation: Operation::Call,
            safe_tx_gas: U256::ZERO,
            base_gas: U256::ZERO,
            gas_price: U256::ZERO,
            gas_token: Address::ZERO,
            refund_receiver: Address::ZERO,
        }
    }

    /// Set the native-currency amount
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Set the operation type
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    /// Whether the authority may report an inner failure instead of reverting
    pub fn tolerates_failure(&self) -> bool {
        !self.safe_tx_gas.is_zero() || !self.gas_price.is_zero()
    }
}
