use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    serde_helpers::{deserialize_maybe_empty, serialize_maybe_empty},
    AccessListItem, Alloc, Environment, Transaction, TransactionError, TransitionToolResult,
};

/// State test fixture.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFixture {
    /// Fixture info, see [`crate::Fixture::with_info`].
    #[serde(default, rename = "_info", skip_serializing_if = "Option::is_none")]
    pub info: Option<BTreeMap<String, serde_json::Value>>,

    pub env: FixtureEnvironment,
    pub pre: Alloc,
    pub transaction: FixtureTransaction,
    /// Post results keyed by network name.
    pub post: BTreeMap<String, Vec<FixtureForkPost>>,
}

/// Environment variables.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureEnvironment {
    pub current_coinbase: Address,
    pub current_gas_limit: U256,
    pub current_number: U256,
    pub current_timestamp: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_random: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_difficulty: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_base_fee: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_excess_blob_gas: Option<U256>,
}

impl From<&Environment> for FixtureEnvironment {
    fn from(env: &Environment) -> Self {
        Self {
            current_coinbase: env.coinbase,
            current_gas_limit: U256::from(env.gas_limit),
            current_number: U256::from(env.number),
            current_timestamp: U256::from(env.timestamp),
            current_random: env.prev_randao,
            current_difficulty: env.difficulty,
            current_base_fee: env.base_fee.map(U256::from),
            current_excess_blob_gas: env.excess_blob_gas.map(U256::from),
        }
    }
}

/// Transaction parts.
///
/// The state test format allows several data, gas and value variants; a filled fixture always
/// has exactly one of each.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureTransaction {
    pub data: Vec<Bytes>,
    pub gas_limit: Vec<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    pub nonce: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<Address>,
    /// Empty string for contract creation.
    #[serde(
        default,
        deserialize_with = "deserialize_maybe_empty",
        serialize_with = "serialize_maybe_empty"
    )]
    pub to: Option<Address>,
    pub value: Vec<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_lists: Option<Vec<Vec<AccessListItem>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_versioned_hashes: Option<Vec<B256>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_blob_gas: Option<U256>,
}

impl From<&Transaction> for FixtureTransaction {
    fn from(tx: &Transaction) -> Self {
        Self {
            data: vec![tx.data.clone()],
            gas_limit: vec![U256::from(tx.gas_limit)],
            gas_price: tx.gas_price.map(U256::from),
            nonce: U256::from(tx.nonce),
            secret_key: tx.secret_key,
            sender: tx.sender,
            to: tx.to,
            value: vec![tx.value],
            max_fee_per_gas: tx.max_fee_per_gas.map(U256::from),
            max_priority_fee_per_gas: tx.max_priority_fee_per_gas.map(U256::from),
            access_lists: tx.access_list.clone().map(|list| vec![list]),
            blob_versioned_hashes: tx.blob_versioned_hashes.clone(),
            max_fee_per_blob_gas: tx.max_fee_per_blob_gas.map(U256::from),
        }
    }
}

/// Transaction part indices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TxPartIndices {
    pub data: usize,
    pub gas: usize,
    pub value: usize,
}

/// Post state result for one fork.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureForkPost {
    /// Post state hash
    pub hash: B256,
    /// Logs root
    pub logs: B256,
    /// Tx bytes
    pub txbytes: Bytes,
    /// Indexes
    pub indexes: TxPartIndices,
    /// Expected exception for this test case, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_exception: Option<String>,
}

impl FixtureForkPost {
    /// Collects the post entry from the transition tool result and the signed transaction.
    pub fn collect(
        result: &TransitionToolResult,
        transaction: &Transaction,
    ) -> Result<Self, TransactionError> {
        Ok(Self {
            hash: result.state_root,
            logs: result.logs_hash,
            txbytes: transaction.rlp()?,
            indexes: TxPartIndices::default(),
            expect_exception: transaction.error.clone(),
        })
    }
}
