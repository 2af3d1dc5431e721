//! Blockchain test fixture types.
//!
//! This module contains the serializable structures of the blockchain test fixture format, the
//! output of a chain-test generator.

use crate::{Alloc, ForkName, Transaction, Withdrawal};
use alloy_primitives::{Address, Bytes, FixedBytes, B256, U256};
use serde::{Deserialize, Serialize};

/// Filled blockchain test.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainFixture {
    /// Header of the parent block of the first test block.
    pub genesis_block_header: BlockHeader,
    /// Encoded genesis block, when the generator produces one.
    #[serde(rename = "genesisRLP", default, skip_serializing_if = "Option::is_none")]
    pub genesis_rlp: Option<Bytes>,
    /// Test blocks, in import order.
    pub blocks: Vec<FixtureBlock>,
    /// State after the last valid block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_state: Option<Alloc>,
    /// Genesis state.
    pub pre: Alloc,
    /// Hash of the head after importing every block.
    pub lastblockhash: B256,
    /// Fork the chain runs.
    pub network: ForkName,
    /// Seal check applied by the consumer.
    #[serde(default)]
    pub seal_engine: SealEngine,
}

/// Header as written in blockchain fixtures. Quantities are hex strings.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    /// Logs bloom.
    pub bloom: Bytes,
    /// Fee recipient.
    pub coinbase: Address,
    /// Zero after the merge.
    pub difficulty: U256,
    /// Extra data.
    pub extra_data: Bytes,
    /// Gas limit.
    pub gas_limit: U256,
    /// Gas spent by the block transactions.
    pub gas_used: U256,
    /// Hash of the sealed header.
    pub hash: B256,
    /// `prev_randao` after the merge.
    pub mix_hash: B256,
    /// Zero after the merge.
    pub nonce: FixedBytes<8>,
    /// Number.
    pub number: U256,
    /// Hash of the parent header.
    pub parent_hash: B256,
    /// Receipts root.
    pub receipt_trie: B256,
    /// State root after the block.
    pub state_root: B256,
    /// Timestamp.
    pub timestamp: U256,
    /// Transactions root.
    pub transactions_trie: B256,
    /// Ommers hash.
    pub uncle_hash: B256,
    /// London and later.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_fee_per_gas: Option<U256>,
    /// Shanghai and later.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdrawals_root: Option<B256>,
    /// Cancun and later.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_gas_used: Option<U256>,
    /// Cancun and later.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excess_blob_gas: Option<U256>,
    /// Cancun and later.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_beacon_block_root: Option<B256>,
    /// Prague and later.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_hash: Option<B256>,
}

/// One block of a blockchain fixture.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FixtureBlock {
    /// Absent when the block is expected to be rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_header: Option<BlockHeader>,
    /// Encoded block.
    pub rlp: Bytes,
    /// Reason the block is rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_exception: Option<String>,
    /// Signed transactions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<Transaction>>,
    /// Ommer headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncle_headers: Option<Vec<BlockHeader>>,
    /// Shanghai and later.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdrawals: Option<Vec<Withdrawal>>,
}

/// Consensus check the consumer applies to imported blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SealEngine {
    /// Seal is not verified.
    #[default]
    NoProof,
    /// Ethash proof of work.
    Ethash,
}
