//! EIP-712 hashing of Safe transactions
//!
//! `transaction_hash = keccak256(0x19 || 0x01 || domainSeparator || safeTxHash)`
//! where the domain is `(chainId, verifyingContract)` and the struct hash
//! covers every transaction field plus the nonce.

use crate::core::{Address, SafeTransaction, TxHash, U256};
use alloy_primitives::Bytes;
use alloy_sol_types::{sol, Eip712Domain, SolStruct};

sol! {
    struct SafeTx {
        address to;
        uint256 value;
        bytes data;
        uint8 operation;
        uint256 safeTxGas;
        uint256 baseGas;
        uint256 gasPrice;
        address gasToken;
        address refundReceiver;
        uint256 nonce;
    }
}

impl SafeTx {
    fn from_transaction(transaction: &SafeTransaction, nonce: &U256) -> Self {
        Self {
            to: transaction.to,
            value: transaction.value,
            data: Bytes::copy_from_slice(&transaction.data),
            operation: transaction.operation.as_u8(),
            safeTxGas: transaction.safe_tx_gas,
            baseGas: transaction.base_gas,
            gasPrice: transaction.gas_price,
            gasToken: transaction.gas_token,
            refundReceiver: transaction.refund_receiver,
            nonce: *nonce,
        }
    }
}

/// Signing domain of a Safe at `safe` on chain `chain_id`
pub fn domain(chain_id: u64, safe: &Address) -> Eip712Domain {
    Eip712Domain::new(None, None, Some(U256::from(chain_id)), Some(*safe), None)
}

/// Domain separator for a Safe at `safe` on chain `chain_id`
pub fn domain_separator(chain_id: u64, safe: &Address) -> TxHash {
    domain(chain_id, safe).separator()
}

/// Struct hash of a transaction at `nonce`
pub fn safe_tx_hash(transaction: &SafeTransaction, nonce: &U256) -> TxHash {
    SafeTx::from_transaction(transaction, nonce).eip712_hash_struct()
}

/// The hash owners sign and the Safe verifies signatures against
pub fn transaction_hash(
    chain_id: u64,
    safe: &Address,
    transaction: &SafeTransaction,
    nonce: &U256,
) -> TxHash {
    SafeTx::from_transaction(transaction, nonce).eip712_signing_hash(&domain(chain_id, safe))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Operation;
    use crate::crypto::{keccak256, keccak256_concat};

    fn tx() -> SafeTransaction {
        SafeTransaction::call(Address::repeat_byte(0x11), vec![0xde, 0xad])
    }

    #[test]
    fn test_type_strings() {
        assert_eq!(
            SafeTx::eip712_encode_type(),
            "SafeTx(address to,uint256 value,bytes data,uint8 operation,uint256 safeTxGas,uint256 baseGas,uint256 gasPrice,address gasToken,address refundReceiver,uint256 nonce)"
        );
        assert_eq!(
            hex::encode(SafeTx::from_transaction(&tx(), &U256::ZERO).eip712_type_hash()),
            "bb8310d486368db6bd6f849402fdd73ad53d316b5a4b2644ad6efe0f941286d8"
        );
    }

    #[test]
    fn test_domain_separator_layout() {
        let safe = Address::repeat_byte(0x5a);
        let type_hash = keccak256(b"EIP712Domain(uint256 chainId,address verifyingContract)");
        assert_eq!(
            hex::encode(type_hash),
            "47e79534a245952e8b16893a336b85a3d9ea9fa8c573f3d803afb92a79469218"
        );

        let chain_word = U256::from(5u64).to_be_bytes::<32>();
        let expected = keccak256_concat(&[&type_hash[..], &chain_word[..], safe.into_word().as_slice()]);
        assert_eq!(domain_separator(5, &safe).0, expected);
    }

    #[test]
    fn test_final_hash_layout() {
        let safe = Address::repeat_byte(0x5a);
        let nonce = U256::from(3u64);
        let expected = keccak256_concat(&[
            &[0x19u8, 0x01][..],
            domain_separator(1, &safe).as_slice(),
            safe_tx_hash(&tx(), &nonce).as_slice(),
        ]);
        assert_eq!(transaction_hash(1, &safe, &tx(), &nonce).0, expected);
    }

    #[test]
    fn test_hash_is_deterministic() {
        let safe = Address::repeat_byte(0x5a);
        let a = transaction_hash(1, &safe, &tx(), &U256::from(3u64));
        let b = transaction_hash(1, &safe, &tx(), &U256::from(3u64));
        assert_eq!(a, b);
    }

    #[test]
    fn test_every_input_is_bound() {
        let safe = Address::repeat_byte(0x5a);
        let nonce = U256::from(3u64);
        let base = transaction_hash(1, &safe, &tx(), &nonce);

        assert_ne!(base, transaction_hash(2, &safe, &tx(), &nonce));
        assert_ne!(base, transaction_hash(1, &Address::repeat_byte(0x5b), &tx(), &nonce));
        assert_ne!(base, transaction_hash(1, &safe, &tx(), &U256::from(4u64)));
        assert_ne!(
            base,
            transaction_hash(1, &safe, &tx().with_operation(Operation::DelegateCall), &nonce)
        );
        assert_ne!(
            base,
            transaction_hash(1, &safe, &tx().with_value(U256::from(1u64)), &nonce)
        );

        let mut other_data = tx();
        other_data.data.push(0);
        assert_ne!(base, transaction_hash(1, &safe, &other_data, &nonce));
    }
}
