use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

use crate::{serde_helpers::quantity, Alloc};

/// Everything a transition tool returns for one evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionToolOutput {
    /// Post-state allocation.
    pub alloc: Alloc,
    /// Execution result record.
    pub result: TransitionToolResult,
    /// RLP of the transactions included in the block, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Bytes>,
}

/// Execution result record produced by the transition tool.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionToolResult {
    /// State root after execution
    pub state_root: B256,
    /// Transactions trie root
    pub tx_root: B256,
    /// Receipts trie root
    pub receipts_root: B256,
    /// Hash of the RLP-encoded logs
    pub logs_hash: B256,
    /// Bloom filter of all logs
    pub logs_bloom: Bytes,
    /// One receipt per included transaction
    #[serde(default)]
    pub receipts: Vec<Receipt>,
    /// Transactions that were not included
    #[serde(default)]
    pub rejected: Vec<RejectedTransaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_difficulty: Option<U256>,
    /// Total gas used by the included transactions
    #[serde(with = "quantity")]
    pub gas_used: u64,
    #[serde(default, with = "quantity::opt", skip_serializing_if = "Option::is_none")]
    pub current_base_fee: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdrawals_root: Option<B256>,
    #[serde(default, with = "quantity::opt", skip_serializing_if = "Option::is_none")]
    pub current_excess_blob_gas: Option<u64>,
    #[serde(default, with = "quantity::opt", skip_serializing_if = "Option::is_none")]
    pub blob_gas_used: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_hash: Option<B256>,
}

/// Transaction receipt
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    #[serde(rename = "type", default, with = "quantity::opt", skip_serializing_if = "Option::is_none")]
    pub ty: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<Bytes>,
    #[serde(default, with = "quantity::opt", skip_serializing_if = "Option::is_none")]
    pub status: Option<u64>,
    #[serde(with = "quantity")]
    pub cumulative_gas_used: u64,
    pub logs_bloom: Bytes,
    #[serde(default)]
    pub logs: Option<Vec<Log>>,
    pub transaction_hash: B256,
    #[serde(default)]
    pub contract_address: Address,
    #[serde(with = "quantity")]
    pub gas_used: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<B256>,
    #[serde(with = "quantity")]
    pub transaction_index: u64,
}

/// Log emitted by a transaction
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    #[serde(default, with = "quantity::opt", skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,
    #[serde(default, with = "quantity::opt", skip_serializing_if = "Option::is_none")]
    pub transaction_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<B256>,
    #[serde(default, with = "quantity::opt", skip_serializing_if = "Option::is_none")]
    pub log_index: Option<u64>,
    #[serde(default)]
    pub removed: bool,
}

/// Transaction rejected by the transition tool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedTransaction {
    /// Index in the input transaction list.
    pub index: u64,
    /// Reason reported by the tool.
    pub error: String,
}
