use alloy_primitives::{address, Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::serde_helpers::quantity;

/// Block context in which the state test transaction executes.
///
/// Serializes to the transition tool `env` input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    #[serde(rename = "currentCoinbase")]
    pub coinbase: Address,
    #[serde(rename = "currentGasLimit", with = "quantity")]
    pub gas_limit: u64,
    #[serde(rename = "currentNumber", with = "quantity")]
    pub number: u64,
    #[serde(rename = "currentTimestamp", with = "quantity")]
    pub timestamp: u64,
    /// Pre-merge difficulty.
    #[serde(
        rename = "currentDifficulty",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub difficulty: Option<U256>,
    /// Post-merge randomness, replaces the difficulty.
    #[serde(
        rename = "currentRandom",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub prev_randao: Option<B256>,
    #[serde(
        rename = "currentBaseFee",
        default,
        with = "quantity::opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub base_fee: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_difficulty: Option<U256>,
    #[serde(default, with = "quantity::opt", skip_serializing_if = "Option::is_none")]
    pub parent_timestamp: Option<u64>,
    #[serde(default, with = "quantity::opt", skip_serializing_if = "Option::is_none")]
    pub parent_base_fee: Option<u64>,
    #[serde(default, with = "quantity::opt", skip_serializing_if = "Option::is_none")]
    pub parent_gas_used: Option<u64>,
    #[serde(default, with = "quantity::opt", skip_serializing_if = "Option::is_none")]
    pub parent_gas_limit: Option<u64>,
    #[serde(
        rename = "parentUncleHash",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_ommers_hash: Option<B256>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub block_hashes: BTreeMap<u64, B256>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ommers: Vec<Ommer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdrawals: Option<Vec<Withdrawal>>,
    #[serde(
        rename = "parentBeaconBlockRoot",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub beacon_root: Option<B256>,

    #[serde(
        rename = "currentExcessBlobGas",
        default,
        with = "quantity::opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub excess_blob_gas: Option<u64>,
    #[serde(default, with = "quantity::opt", skip_serializing_if = "Option::is_none")]
    pub parent_excess_blob_gas: Option<u64>,
    #[serde(default, with = "quantity::opt", skip_serializing_if = "Option::is_none")]
    pub parent_blob_gas_used: Option<u64>,
    #[serde(
        rename = "currentBlobGasUsed",
        default,
        with = "quantity::opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub blob_gas_used: Option<u64>,

    /// Header extra data. Not part of the transition tool input.
    #[serde(skip)]
    pub extra_data: Bytes,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            coinbase: address!("2adc25665018aa1fe0e6bc666dac8fc2697ff9ba"),
            gas_limit: 100_000_000_000_000_000,
            number: 1,
            timestamp: 1_000,
            difficulty: None,
            prev_randao: None,
            base_fee: None,
            parent_difficulty: None,
            parent_timestamp: None,
            parent_base_fee: None,
            parent_gas_used: None,
            parent_gas_limit: None,
            parent_ommers_hash: None,
            block_hashes: BTreeMap::new(),
            ommers: Vec::new(),
            withdrawals: None,
            beacon_root: None,
            excess_blob_gas: None,
            parent_excess_blob_gas: None,
            parent_blob_gas_used: None,
            blob_gas_used: None,
            extra_data: Bytes::new(),
        }
    }
}

/// Ommer included in the block, relative to the current block number.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ommer {
    /// Distance to the current block.
    #[serde(with = "quantity")]
    pub delta: u64,
    /// Ommer beneficiary.
    pub address: Address,
}

/// Withdrawal structure
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    /// Withdrawal index
    #[serde(with = "quantity")]
    pub index: u64,
    /// Validator index
    #[serde(with = "quantity")]
    pub validator_index: u64,
    /// Withdrawal recipient address
    pub address: Address,
    /// Withdrawal amount in gwei
    #[serde(with = "quantity")]
    pub amount: u64,
}
