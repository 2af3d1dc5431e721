//! Fork collaborator used while filling.

use alloy_primitives::{address, bytes, Address, Bytes, B256, U256};
use statefill_types::{Account, Alloc, Environment, ForkName};
use std::fmt;

/// EIP-4788 beacon roots contract address.
pub const BEACON_ROOTS_ADDRESS: Address = address!("000f3df6d732807ef1319fb7b8bb8522d0beac02");

/// EIP-4788 beacon roots contract code.
pub const BEACON_ROOTS_CODE: Bytes = bytes!("3373fffffffffffffffffffffffffffffffffffffffe14604d57602036146024575f5ffd5b5f35801560495762001fff810690815414603c575f5ffd5b62001fff01545f5260205ff35b5f5ffd5b62001fff42064281555f359062001fff015500");

/// Base fee used when a London+ environment sets none.
pub const DEFAULT_BASE_FEE: u64 = 7;

/// Difficulty used when a pre-merge environment sets none.
pub const DEFAULT_DIFFICULTY: u64 = 0x20000;

/// Fork metadata needed to fill a test.
///
/// All block-dependent queries take the block number and timestamp so that transition forks
/// can answer for the fork active at that block.
pub trait Fork: fmt::Debug {
    /// Fork name, as passed to the transition tool, at the given block.
    fn transition_tool_name(&self, block_number: u64, timestamp: u64) -> String;

    /// Name used for the `network` of blockchain fixtures and as the post key of state fixtures.
    fn blockchain_test_network_name(&self) -> String;

    /// Fork active at the given block.
    fn fork_at(&self, block_number: u64, timestamp: u64) -> Self
    where
        Self: Sized;

    /// Accounts that exist at the given block before any test account is added.
    fn pre_allocation(&self, block_number: u64, timestamp: u64) -> Alloc;

    /// Returns `true` if the rules of `milestone` are active at the given block.
    fn is_enabled_at(&self, milestone: ForkName, block_number: u64, timestamp: u64) -> bool;

    /// Returns `true` if the fork includes the rules of `milestone` at every block.
    fn is_enabled_in(&self, milestone: ForkName) -> bool;

    /// Header has a `prev_randao` (mix hash) value and zero difficulty.
    fn header_prev_randao_required(&self, block_number: u64, timestamp: u64) -> bool {
        self.is_enabled_at(ForkName::Paris, block_number, timestamp)
    }

    /// Header has a base fee.
    fn header_base_fee_required(&self, block_number: u64, timestamp: u64) -> bool {
        self.is_enabled_at(ForkName::London, block_number, timestamp)
    }

    /// Header has a withdrawals root.
    fn header_withdrawals_required(&self, block_number: u64, timestamp: u64) -> bool {
        self.is_enabled_at(ForkName::Shanghai, block_number, timestamp)
    }

    /// Header has blob gas fields and a parent beacon block root.
    fn header_blob_gas_required(&self, block_number: u64, timestamp: u64) -> bool {
        self.is_enabled_at(ForkName::Cancun, block_number, timestamp)
    }

    /// Fills the environment fields the fork requires. Values already set are kept.
    fn set_fork_requirements(&self, env: &Environment) -> Environment {
        let (number, timestamp) = (env.number, env.timestamp);
        let mut env = env.clone();

        if self.header_prev_randao_required(number, timestamp) {
            env.prev_randao = env.prev_randao.or(Some(B256::ZERO));
            env.difficulty = env.difficulty.or(Some(U256::ZERO));
        } else if env.difficulty.is_none() && env.parent_difficulty.is_none() {
            env.difficulty = Some(U256::from(DEFAULT_DIFFICULTY));
        }
        if self.header_base_fee_required(number, timestamp)
            && env.base_fee.is_none()
            && env.parent_base_fee.is_none()
        {
            env.base_fee = Some(DEFAULT_BASE_FEE);
        }
        if self.header_withdrawals_required(number, timestamp) {
            env.withdrawals = env.withdrawals.or_else(|| Some(Vec::new()));
        }
        if self.header_blob_gas_required(number, timestamp) {
            if env.excess_blob_gas.is_none() && env.parent_excess_blob_gas.is_none() {
                env.excess_blob_gas = Some(0);
            }
            if env.blob_gas_used.is_none() && env.parent_blob_gas_used.is_none() {
                env.blob_gas_used = Some(0);
            }
            env.beacon_root = env.beacon_root.or(Some(B256::ZERO));
        }
        env
    }
}

/// Fork name followed by the extra EIPs, joined with `+`.
pub(crate) fn fork_id(transition_tool_name: &str, eips: &[u64]) -> String {
    let mut fork_id = transition_tool_name.to_string();
    for eip in eips {
        fork_id.push('+');
        fork_id.push_str(&eip.to_string());
    }
    fork_id
}

/// Mainnet fork schedule, including the transition forks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MainnetFork(pub ForkName);

impl From<ForkName> for MainnetFork {
    fn from(name: ForkName) -> Self {
        Self(name)
    }
}

impl Fork for MainnetFork {
    fn transition_tool_name(&self, block_number: u64, timestamp: u64) -> String {
        self.0.transition_tool_name(block_number, timestamp).to_string()
    }

    fn blockchain_test_network_name(&self) -> String {
        self.0.as_str().to_string()
    }

    fn fork_at(&self, block_number: u64, timestamp: u64) -> Self {
        Self(self.0.fork_at(block_number, timestamp))
    }

    fn pre_allocation(&self, block_number: u64, timestamp: u64) -> Alloc {
        let mut alloc = Alloc::new();
        if self.is_enabled_at(ForkName::Cancun, block_number, timestamp) {
            alloc.insert(
                BEACON_ROOTS_ADDRESS,
                Account::default()
                    .with_nonce(1)
                    .with_code(BEACON_ROOTS_CODE),
            );
        }
        alloc
    }

    fn is_enabled_at(&self, milestone: ForkName, block_number: u64, timestamp: u64) -> bool {
        self.0
            .fork_at(block_number, timestamp)
            .is_enabled_in(milestone)
    }

    fn is_enabled_in(&self, milestone: ForkName) -> bool {
        match self.0.transition() {
            Some(transition) => transition.from.is_enabled_in(milestone),
            None => self.0.is_enabled_in(milestone),
        }
    }
}
