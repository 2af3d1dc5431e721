//! Test doubles for the filler collaborators.
//!
//! [`MockTransitionTool`] executes plain value transfers and the beacon roots system call,
//! [`TestFork`] extends a mainnet fork with extra pre-allocated accounts and
//! [`SingleBlockGenerator`] fills a blockchain test made of one block.

use alloy_primitives::{keccak256, Bytes, B256, U256};
use statefill_types::{
    blockchain::{BlockHeader, BlockchainFixture, FixtureBlock, SealEngine},
    Alloc, Environment, ForkName, Receipt, RejectedTransaction, Transaction,
    TransitionToolOutput, TransitionToolResult,
};
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};
use t8n::{EvaluateRequest, TransactionTraces, TransitionTool, TransitionToolError};

use crate::{
    fork::fork_id, verify_post_alloc, BlockchainTest, BlockchainTestGenerator, FillError, Fork,
    MainnetFork, BEACON_ROOTS_ADDRESS, TARGET_BLOB_GAS_PER_BLOCK,
};

/// Length of the beacon roots ring buffer.
const HISTORY_BUFFER_LENGTH: u64 = 8191;

/// Gas charged for every transaction.
const TX_GAS: u64 = 21_000;

/// A transition tool call recorded by [`MockTransitionTool`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedCall {
    /// Pre-state.
    pub alloc: Alloc,
    /// Transactions.
    pub txs: Vec<Transaction>,
    /// Environment.
    pub env: Environment,
    /// Fork identifier.
    pub fork_name: String,
    /// Chain id.
    pub chain_id: u64,
    /// Block reward.
    pub reward: i64,
    /// Extra EIPs.
    pub eips: Vec<u64>,
    /// Debug output directory.
    pub debug_output_path: Option<PathBuf>,
}

/// In-process transition tool that only knows value transfers.
///
/// The state root is the keccak hash of the JSON post-state, which makes results
/// deterministic for equal inputs.
#[derive(Debug, Default)]
pub struct MockTransitionTool {
    calls: Mutex<Vec<RecordedCall>>,
    traces: Option<Vec<TransactionTraces>>,
    failure: Option<String>,
    trace_requests: AtomicUsize,
    last_state_root: Mutex<Option<B256>>,
}

impl MockTransitionTool {
    /// Version reported by [`TransitionTool::version`].
    pub const VERSION: &'static str = "mock-t8n/1.0.0";

    /// Returns these traces from [`TransitionTool::get_traces`].
    pub fn with_traces(mut self, traces: Vec<TransactionTraces>) -> Self {
        self.traces = Some(traces);
        self
    }

    /// Fails every evaluation with `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Calls made so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of [`TransitionTool::get_traces`] calls.
    pub fn trace_requests(&self) -> usize {
        self.trace_requests.load(Ordering::Relaxed)
    }

    /// State root of the last successful evaluation.
    pub fn last_state_root(&self) -> Option<B256> {
        *self.last_state_root.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Executes the transactions on top of `alloc`.
    pub fn execute(
        alloc: &Alloc,
        txs: &[Transaction],
        env: &Environment,
    ) -> Result<TransitionToolOutput, TransitionToolError> {
        let mut alloc = alloc.clone();

        if let Some(beacon_root) = env.beacon_root {
            if let Some(account) = alloc.0.get_mut(&BEACON_ROOTS_ADDRESS) {
                let storage = account.storage.get_or_insert_with(Default::default);
                let timestamp_slot = U256::from(env.timestamp % HISTORY_BUFFER_LENGTH);
                storage.insert(timestamp_slot, U256::from(env.timestamp));
                storage.insert(
                    timestamp_slot + U256::from(HISTORY_BUFFER_LENGTH),
                    U256::from_be_bytes(beacon_root.0),
                );
            }
        }

        let mut receipts = Vec::new();
        let mut rejected = Vec::new();
        let mut gas_used = 0;
        for (index, tx) in txs.iter().enumerate() {
            let sender = tx
                .sender
                .ok_or_else(|| TransitionToolError::Custom(format!("tx {index} has no sender")))?;
            let hash = tx
                .hash()
                .map_err(|err| TransitionToolError::Custom(err.to_string()))?;

            let from = alloc.0.entry(sender).or_default();
            let nonce = from.nonce.unwrap_or_default();
            let balance = from.balance.unwrap_or_default();
            if tx.nonce != nonce {
                rejected.push(RejectedTransaction {
                    index: index as u64,
                    error: format!("nonce mismatch: want {nonce}, got {}", tx.nonce),
                });
                continue;
            }
            if balance < tx.value {
                rejected.push(RejectedTransaction {
                    index: index as u64,
                    error: "insufficient funds for transfer".to_string(),
                });
                continue;
            }
            from.nonce = Some(nonce + 1);
            from.balance = Some(balance - tx.value);
            if let Some(to) = tx.to {
                let recipient = alloc.0.entry(to).or_default();
                recipient.balance = Some(recipient.balance.unwrap_or_default() + tx.value);
            }

            gas_used += TX_GAS;
            receipts.push(Receipt {
                status: Some(1),
                cumulative_gas_used: gas_used,
                logs_bloom: Bytes::from(vec![0; 256]),
                transaction_hash: hash,
                gas_used: TX_GAS,
                transaction_index: index as u64,
                ..Default::default()
            });
        }

        let result = TransitionToolResult {
            state_root: keccak256(serde_json::to_vec(&alloc)?),
            receipts_root: keccak256(serde_json::to_vec(&receipts)?),
            // keccak of the RLP empty list
            logs_hash: keccak256([0xc0]),
            logs_bloom: Bytes::from(vec![0; 256]),
            receipts,
            rejected,
            gas_used,
            current_difficulty: env.difficulty,
            current_base_fee: env.base_fee,
            current_excess_blob_gas: env.excess_blob_gas,
            blob_gas_used: env.excess_blob_gas.map(|_| 0),
            ..Default::default()
        };
        Ok(TransitionToolOutput {
            alloc,
            result,
            body: None,
        })
    }
}

impl TransitionTool for MockTransitionTool {
    fn evaluate(
        &self,
        request: EvaluateRequest<'_>,
    ) -> Result<TransitionToolOutput, TransitionToolError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall {
                alloc: request.alloc.clone(),
                txs: request.txs.to_vec(),
                env: request.env.clone(),
                fork_name: request.fork_name.to_string(),
                chain_id: request.chain_id,
                reward: request.reward,
                eips: request.eips.to_vec(),
                debug_output_path: request.debug_output_path.map(PathBuf::from),
            });
        if let Some(failure) = &self.failure {
            return Err(TransitionToolError::Custom(failure.clone()));
        }

        let output = Self::execute(request.alloc, request.txs, request.env)?;
        *self.last_state_root.lock().unwrap_or_else(|e| e.into_inner()) =
            Some(output.result.state_root);
        Ok(output)
    }

    fn get_traces(&self) -> Option<Vec<TransactionTraces>> {
        self.trace_requests.fetch_add(1, Ordering::Relaxed);
        self.traces.clone()
    }

    fn version(&self) -> Result<String, TransitionToolError> {
        Ok(Self::VERSION.to_string())
    }
}

/// Mainnet fork with extra pre-allocated accounts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestFork {
    fork: MainnetFork,
    pre_allocation: Alloc,
}

impl TestFork {
    /// Creates a fork without extra accounts.
    pub fn new(name: ForkName) -> Self {
        Self {
            fork: MainnetFork(name),
            pre_allocation: Alloc::new(),
        }
    }

    /// Adds accounts on top of the mainnet pre-allocation.
    pub fn with_pre_allocation(mut self, alloc: Alloc) -> Self {
        self.pre_allocation = alloc;
        self
    }
}

impl Fork for TestFork {
    fn transition_tool_name(&self, block_number: u64, timestamp: u64) -> String {
        self.fork.transition_tool_name(block_number, timestamp)
    }

    fn blockchain_test_network_name(&self) -> String {
        self.fork.blockchain_test_network_name()
    }

    fn fork_at(&self, block_number: u64, timestamp: u64) -> Self {
        Self {
            fork: self.fork.fork_at(block_number, timestamp),
            pre_allocation: self.pre_allocation.clone(),
        }
    }

    fn pre_allocation(&self, block_number: u64, timestamp: u64) -> Alloc {
        self.fork
            .pre_allocation(block_number, timestamp)
            .merge(&self.pre_allocation)
    }

    fn is_enabled_at(&self, milestone: ForkName, block_number: u64, timestamp: u64) -> bool {
        self.fork.is_enabled_at(milestone, block_number, timestamp)
    }

    fn is_enabled_in(&self, milestone: ForkName) -> bool {
        self.fork.is_enabled_in(milestone)
    }
}

/// Blockchain test generator for tests made of a single block.
///
/// Headers are not RLP-encoded; block hashes are the keccak hash of the JSON header.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleBlockGenerator;

impl SingleBlockGenerator {
    fn seal(mut header: BlockHeader) -> Result<BlockHeader, FillError> {
        header.hash = B256::ZERO;
        header.hash = keccak256(serde_json::to_vec(&header)?);
        Ok(header)
    }
}

impl BlockchainTestGenerator for SingleBlockGenerator {
    fn generate<T, F>(
        &self,
        test: &BlockchainTest,
        t8n: &T,
        fork: &F,
        eips: &[u64],
    ) -> Result<BlockchainFixture, FillError>
    where
        T: TransitionTool,
        F: Fork,
    {
        let [block] = test.blocks.as_slice() else {
            return Err(FillError::Generator(format!(
                "expected a single block, got {}",
                test.blocks.len()
            )));
        };
        let network = fork
            .blockchain_test_network_name()
            .parse::<ForkName>()
            .map_err(|err| FillError::Generator(err.to_string()))?;

        let genesis_env = &test.genesis_environment;
        let genesis_fork = fork.fork_at(genesis_env.number, genesis_env.timestamp);
        let genesis_env = genesis_fork.set_fork_requirements(genesis_env);
        let pre = genesis_fork
            .pre_allocation(genesis_env.number, genesis_env.timestamp)
            .merge(&test.pre);
        let genesis_header = Self::seal(BlockHeader {
            coinbase: genesis_env.coinbase,
            difficulty: genesis_env.difficulty.unwrap_or_default(),
            extra_data: genesis_env.extra_data.clone(),
            gas_limit: U256::from(genesis_env.gas_limit),
            mix_hash: genesis_env.prev_randao.unwrap_or_default(),
            number: U256::from(genesis_env.number),
            state_root: keccak256(serde_json::to_vec(&pre)?),
            timestamp: U256::from(genesis_env.timestamp),
            base_fee_per_gas: genesis_env.base_fee.map(U256::from),
            excess_blob_gas: genesis_env.excess_blob_gas.map(U256::from),
            blob_gas_used: genesis_env.blob_gas_used.map(U256::from),
            ..Default::default()
        })?;

        let mut env = test.genesis_environment.clone();
        env.number = block.number.unwrap_or(genesis_env.number + 1);
        env.timestamp = block.timestamp.unwrap_or(genesis_env.timestamp + 12);
        env.coinbase = block.coinbase.unwrap_or(env.coinbase);
        env.gas_limit = block.gas_limit.unwrap_or(env.gas_limit);
        env.difficulty = block.difficulty;
        env.extra_data = block.extra_data.clone().unwrap_or_default();
        env.withdrawals = block.withdrawals.clone();
        env.beacon_root = block.beacon_root;
        env.excess_blob_gas = genesis_env
            .excess_blob_gas
            .map(|excess| excess.saturating_sub(TARGET_BLOB_GAS_PER_BLOCK));
        let block_fork = fork.fork_at(env.number, env.timestamp);
        let env = block_fork.set_fork_requirements(&env);

        let txs = block
            .txs
            .iter()
            .map(|tx| tx.with_signature_and_sender(false))
            .collect::<Result<Vec<_>, _>>()?;
        let fork_name = fork_id(
            &block_fork.transition_tool_name(env.number, env.timestamp),
            eips,
        );
        let debug_output_path = test.t8n_dump_dir.as_ref().map(|dir| dir.join("0"));
        let output = t8n.evaluate(EvaluateRequest {
            alloc: &pre,
            txs: &txs,
            env: &env,
            fork_name: &fork_name,
            chain_id: test.chain_id,
            reward: 0,
            eips,
            debug_output_path: debug_output_path.as_deref(),
        })?;

        let header = Self::seal(BlockHeader {
            bloom: output.result.logs_bloom.clone(),
            coinbase: env.coinbase,
            difficulty: env.difficulty.unwrap_or_default(),
            extra_data: env.extra_data.clone(),
            gas_limit: U256::from(env.gas_limit),
            gas_used: U256::from(output.result.gas_used),
            mix_hash: env.prev_randao.unwrap_or_default(),
            number: U256::from(env.number),
            parent_hash: genesis_header.hash,
            receipt_trie: output.result.receipts_root,
            state_root: output.result.state_root,
            timestamp: U256::from(env.timestamp),
            transactions_trie: output.result.tx_root,
            base_fee_per_gas: env.base_fee.map(U256::from),
            withdrawals_root: output.result.withdrawals_root,
            blob_gas_used: output.result.blob_gas_used.map(U256::from),
            excess_blob_gas: env.excess_blob_gas.map(U256::from),
            parent_beacon_block_root: env.beacon_root,
            ..Default::default()
        })?;
        if let Some(header_verify) = &block.header_verify {
            header_verify
                .verify(&header)
                .map_err(|err| FillError::Generator(err.to_string()))?;
        }
        let header = match &block.rlp_modifier {
            Some(rlp_modifier) => rlp_modifier.apply(&header),
            None => header,
        };

        let valid = block.exception.is_none();
        if valid {
            verify_post_alloc(&test.post, &output.alloc, t8n)?;
        }
        let lastblockhash = if valid {
            header.hash
        } else {
            genesis_header.hash
        };
        let post_state = if valid { output.alloc } else { pre.clone() };

        Ok(BlockchainFixture {
            genesis_block_header: genesis_header,
            genesis_rlp: None,
            blocks: vec![FixtureBlock {
                block_header: valid.then_some(header),
                rlp: output.body.unwrap_or_default(),
                expect_exception: block.exception.clone(),
                transactions: Some(txs),
                uncle_headers: Some(Vec::new()),
                withdrawals: env.withdrawals.clone(),
            }],
            post_state: Some(post_state),
            pre,
            lastblockhash,
            network,
            seal_engine: SealEngine::NoProof,
        })
    }
}

