use statefill_types::{
    Account, Alloc, EngineApiError, Environment, Fixture, FixtureEnvironment, FixtureForkPost,
    FixtureFormat, FixtureInfo, FixtureTransaction, ForkName, HeaderOverrides, PostState,
    StateFixture, Transaction,
};
use std::{
    collections::BTreeMap,
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
};
use t8n::{EvaluateRequest, TransitionTool};
use tracing::{debug, info};

use crate::{
    fork::fork_id, genesis_environment, synthesize_blocks, verify_post_alloc, BlockchainTest,
    BlockchainTestGenerator, FillError, Fork, BEACON_ROOTS_ADDRESS,
};

/// Set of fixture formats a state test may be filled into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StateTestKind {
    /// State test and both blockchain test formats.
    #[default]
    StateTest,
    /// State test format only.
    StateTestOnly,
}

impl StateTestKind {
    /// Formats this kind can produce.
    pub const fn fixture_formats(&self) -> &'static [FixtureFormat] {
        match self {
            Self::StateTest => &[
                FixtureFormat::BlockchainTest,
                FixtureFormat::BlockchainTestHive,
                FixtureFormat::StateTest,
            ],
            Self::StateTestOnly => &[FixtureFormat::StateTest],
        }
    }
}

/// Test of a single transaction over the period of a single block.
#[derive(Debug)]
pub struct StateTest {
    /// Environment of the block executing the transaction.
    pub env: Environment,
    /// Pre-state.
    pub pre: Alloc,
    /// Expected post-state.
    pub post: PostState,
    /// Transaction under test.
    pub tx: Transaction,
    /// Error code the engine API must return for the block.
    pub engine_api_error_code: Option<EngineApiError>,
    /// Header fields the blockchain test block must have.
    pub blockchain_test_header_verify: Option<HeaderOverrides>,
    /// Header fields replaced in the blockchain test block RLP.
    pub blockchain_test_rlp_modifier: Option<HeaderOverrides>,
    /// Tag recorded in the fixture info.
    pub tag: Option<String>,
    /// Comment recorded in the fixture info.
    pub comment: Option<String>,
    /// Chain id.
    pub chain_id: u64,
    /// Allowed formats.
    pub kind: StateTestKind,
    /// Directory for the transition tool debug output, one sub-directory per call.
    pub t8n_dump_dir: Option<PathBuf>,
    t8n_call_counter: AtomicUsize,
}

impl StateTest {
    /// Creates a state test on chain id 1 that can be filled into every format.
    pub fn new(env: Environment, pre: Alloc, post: PostState, tx: Transaction) -> Self {
        Self {
            env,
            pre,
            post,
            tx,
            engine_api_error_code: None,
            blockchain_test_header_verify: None,
            blockchain_test_rlp_modifier: None,
            tag: None,
            comment: None,
            chain_id: 1,
            kind: StateTestKind::StateTest,
            t8n_dump_dir: None,
            t8n_call_counter: AtomicUsize::new(0),
        }
    }

    /// Restricts the test to the state test format.
    pub fn only_state_test(mut self) -> Self {
        self.kind = StateTestKind::StateTestOnly;
        self
    }

    /// Sets the chain id.
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Sets the tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Sets the comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Sets the expected engine API error code.
    pub fn with_engine_api_error_code(mut self, code: EngineApiError) -> Self {
        self.engine_api_error_code = Some(code);
        self
    }

    /// Sets the header fields to verify in the blockchain test.
    pub fn with_header_verify(mut self, header_verify: HeaderOverrides) -> Self {
        self.blockchain_test_header_verify = Some(header_verify);
        self
    }

    /// Sets the header fields to modify in the blockchain test.
    pub fn with_rlp_modifier(mut self, rlp_modifier: HeaderOverrides) -> Self {
        self.blockchain_test_rlp_modifier = Some(rlp_modifier);
        self
    }

    /// Sets the transition tool debug output directory.
    pub fn with_t8n_dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.t8n_dump_dir = Some(dir.into());
        self
    }

    /// Returns `<t8n_dump_dir>/<n>` where `n` counts the calls, starting at 0.
    pub fn next_t8n_output_path(&self) -> Option<PathBuf> {
        let dir = self.t8n_dump_dir.as_ref()?;
        let call = self.t8n_call_counter.fetch_add(1, Ordering::Relaxed);
        Some(dir.join(call.to_string()))
    }

    /// Builds the equivalent single block blockchain test.
    pub fn generate_blockchain_test(
        &self,
        fixture_format: FixtureFormat,
    ) -> Result<BlockchainTest, FillError> {
        Ok(BlockchainTest {
            genesis_environment: genesis_environment(&self.env)?,
            pre: self.pre.clone(),
            post: self.post.clone(),
            blocks: synthesize_blocks(self),
            fixture_format,
            chain_id: self.chain_id,
            t8n_dump_dir: self.t8n_dump_dir.clone(),
        })
    }

    /// Fills the state test fixture for a non-transition fork.
    pub fn make_state_test_fixture<T, F>(
        &self,
        t8n: &T,
        fork: &F,
        eips: &[u64],
    ) -> Result<StateFixture, FillError>
    where
        T: TransitionTool,
        F: Fork,
    {
        let env = fork.set_fork_requirements(&self.env);
        let tx = self.tx.with_signature_and_sender(true)?;

        let mut pre = fork
            .pre_allocation(env.number, env.timestamp)
            .merge(&self.pre);
        let empty_accounts = pre.empty_accounts();
        if !empty_accounts.is_empty() {
            return Err(FillError::EmptyAccounts(empty_accounts));
        }

        let fork_name = fork_id(
            &fork.transition_tool_name(self.env.number, self.env.timestamp),
            eips,
        );
        let debug_output_path = self.next_t8n_output_path();
        let output = t8n.evaluate(EvaluateRequest {
            alloc: &pre,
            txs: std::slice::from_ref(&tx),
            env: &env,
            fork_name: &fork_name,
            chain_id: self.chain_id,
            // state tests never pay a block reward
            reward: 0,
            eips,
            debug_output_path: debug_output_path.as_deref(),
        })?;

        verify_post_alloc(&self.post, &output.alloc, t8n)?;

        // State test consumers skip the beacon roots system call, so its storage goes into pre.
        if fork.is_enabled_in(ForkName::Cancun) {
            let storage = output
                .alloc
                .get(&BEACON_ROOTS_ADDRESS)
                .and_then(|account| account.storage.as_ref())
                .filter(|storage| !storage.is_empty());
            if let Some(storage) = storage {
                debug!(target: "statefill", slots = storage.len(), "patching beacon roots storage");
                pre = pre.merge(&Alloc::from([(
                    BEACON_ROOTS_ADDRESS,
                    Account::default().with_storage(storage.clone()),
                )]));
            }
        }

        let post = FixtureForkPost::collect(&output.result, &tx.with_signature_and_sender(false)?)?;
        Ok(StateFixture {
            info: None,
            env: FixtureEnvironment::from(&env),
            pre,
            transaction: FixtureTransaction::from(&tx),
            post: BTreeMap::from([(fork.blockchain_test_network_name(), vec![post])]),
        })
    }

    /// Fills the test into `fixture_format`.
    ///
    /// Blockchain formats go through `generator`; the state test format is filled for the fork
    /// active at the block of the test.
    pub fn generate<T, F, G>(
        &self,
        t8n: &T,
        fork: &F,
        fixture_format: FixtureFormat,
        eips: &[u64],
        generator: &G,
    ) -> Result<Fixture, FillError>
    where
        T: TransitionTool,
        F: Fork,
        G: BlockchainTestGenerator,
    {
        if !self.kind.fixture_formats().contains(&fixture_format) {
            return Err(FillError::UnsupportedFixtureFormat(fixture_format));
        }
        info!(target: "statefill", %fixture_format, ?fork, ?eips, "filling state test");

        if fixture_format.is_blockchain() {
            let test = self.generate_blockchain_test(fixture_format)?;
            return Ok(generator.generate(&test, t8n, fork, eips)?.into());
        }
        // A state fixture cannot name a transition fork.
        let fork = fork.fork_at(self.env.number, self.env.timestamp);
        Ok(self.make_state_test_fixture(t8n, &fork, eips)?.into())
    }

    /// Same as [`StateTest::generate`], with the format given by name.
    pub fn generate_named<T, F, G>(
        &self,
        t8n: &T,
        fork: &F,
        fixture_format: &str,
        eips: &[u64],
        generator: &G,
    ) -> Result<Fixture, FillError>
    where
        T: TransitionTool,
        F: Fork,
        G: BlockchainTestGenerator,
    {
        self.generate(t8n, fork, fixture_format.parse::<FixtureFormat>()?, eips, generator)
    }

    /// Adds the `_info` section: transition tool version, tag, comment and fixture hash.
    pub fn fill_info<T>(&self, fixture: Fixture, t8n: &T) -> Result<Fixture, FillError>
    where
        T: TransitionTool,
    {
        let info = FixtureInfo {
            t8n_version: t8n.version()?,
            comment: self.comment.clone(),
            tag: self.tag.clone(),
        };
        Ok(fixture.with_info(&info)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test_utils::{MockTransitionTool, SingleBlockGenerator, TestFork},
        MainnetFork,
    };
    use alloy_primitives::{address, Address, B256, U256};
    use rstest::rstest;
    use statefill_types::{Storage, TEST_ADDRESS};

    const RECIPIENT: Address = address!("00000000000000000000000000000000000000aa");

    fn transfer_test(env: Environment) -> StateTest {
        let pre = Alloc::from([(
            TEST_ADDRESS,
            Account::default().with_balance(U256::from(1_000_000_000_000u64)),
        )]);
        let post = PostState::from_iter([
            (RECIPIENT, Some(Account::default().with_balance(U256::from(5)))),
            (TEST_ADDRESS, Some(Account::default().with_nonce(1))),
        ]);
        let tx = Transaction {
            value: U256::from(5),
            ..Default::default()
        };
        StateTest::new(env, pre, post, tx)
    }

    #[test]
    fn state_fixture_has_one_post_entry() {
        let test = transfer_test(Environment::default());
        let t8n = MockTransitionTool::default();
        let fixture = test
            .make_state_test_fixture(&t8n, &MainnetFork(ForkName::Shanghai), &[])
            .unwrap();

        assert_eq!(fixture.post.len(), 1);
        let posts = &fixture.post["Shanghai"];
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].hash, t8n.last_state_root().unwrap());
        assert!(fixture.transaction.secret_key.is_some());
        assert_eq!(fixture.transaction.sender, Some(TEST_ADDRESS));
        assert_eq!(fixture.env.current_base_fee, Some(U256::from(7)));

        let call = t8n.calls().pop().unwrap();
        assert_eq!(call.fork_name, "Shanghai");
        assert_eq!(call.reward, 0);
        assert_eq!(call.chain_id, 1);
        assert_eq!(call.txs[0].secret_key, test.tx.secret_key);
        assert_eq!(call.txs[0].ty, Some(0));
    }

    #[test]
    fn test_pre_wins_over_fork_pre_allocation() {
        let overridden = Account::default().with_balance(U256::from(1));
        let fork = TestFork::new(ForkName::Shanghai).with_pre_allocation(Alloc::from([
            (RECIPIENT, overridden.clone().with_nonce(3)),
            (address!("00000000000000000000000000000000000000bb"), overridden.clone()),
        ]));
        let mut test = transfer_test(Environment::default());
        test.pre.insert(RECIPIENT, Account::default().with_nonce(7));
        test.post = PostState::default();

        let fixture = test
            .make_state_test_fixture(&MockTransitionTool::default(), &fork, &[])
            .unwrap();
        let recipient = fixture.pre.get(&RECIPIENT).unwrap();
        assert_eq!(recipient.nonce, Some(7));
        assert_eq!(recipient.balance, Some(U256::from(1)));
        assert!(fixture
            .pre
            .contains(&address!("00000000000000000000000000000000000000bb")));
    }

    #[test]
    fn empty_account_is_rejected_before_evaluation() {
        let mut test = transfer_test(Environment::default());
        test.pre.insert(RECIPIENT, Account::default().with_storage(Storage::from([(
            U256::from(1),
            U256::from(1),
        )])));
        let t8n = MockTransitionTool::default();

        let err = test
            .make_state_test_fixture(&t8n, &MainnetFork(ForkName::Cancun), &[])
            .unwrap_err();
        assert!(matches!(err, FillError::EmptyAccounts(ref addresses) if addresses == &[RECIPIENT]));
        assert!(t8n.calls().is_empty());
    }

    #[test]
    fn beacon_roots_storage_is_patched_from_cancun() {
        let beacon_root = B256::with_last_byte(0x42);
        let env = Environment {
            beacon_root: Some(beacon_root),
            ..Default::default()
        };
        let test = transfer_test(env.clone());
        let t8n = MockTransitionTool::default();

        let fixture = test
            .make_state_test_fixture(&t8n, &MainnetFork(ForkName::Cancun), &[])
            .unwrap();
        let beacon_roots = fixture.pre.get(&BEACON_ROOTS_ADDRESS).unwrap();
        let timestamp_slot = U256::from(env.timestamp % 8191);
        let root_slot = timestamp_slot + U256::from(8191);
        let storage = beacon_roots.storage.as_ref().unwrap();
        assert_eq!(storage[&timestamp_slot], U256::from(env.timestamp));
        assert_eq!(storage[&root_slot], U256::from_be_bytes(beacon_root.0));
        assert_eq!(beacon_roots.nonce, Some(1));
        assert!(beacon_roots.code.is_some());
    }

    #[test]
    fn no_beacon_roots_patch_before_cancun() {
        let beacon_roots = Account::default()
            .with_nonce(1)
            .with_code(crate::fork::BEACON_ROOTS_CODE);
        let mut test = transfer_test(Environment {
            beacon_root: Some(B256::with_last_byte(1)),
            ..Default::default()
        });
        test.pre.insert(BEACON_ROOTS_ADDRESS, beacon_roots.clone());

        let fixture = test
            .make_state_test_fixture(
                &MockTransitionTool::default(),
                &MainnetFork(ForkName::Shanghai),
                &[],
            )
            .unwrap();
        assert_eq!(fixture.pre.get(&BEACON_ROOTS_ADDRESS), Some(&beacon_roots));
    }

    #[test]
    fn verification_failure_prints_traces() {
        let mut test = transfer_test(Environment::default());
        test.post = PostState::from_iter([(RECIPIENT, None)]);
        let t8n = MockTransitionTool::default().with_traces(Vec::new());

        let err = test
            .make_state_test_fixture(&t8n, &MainnetFork(ForkName::Cancun), &[])
            .unwrap_err();
        assert!(matches!(err, FillError::PostVerification(_)));
        assert_eq!(t8n.trace_requests(), 1);
    }

    #[test]
    fn evaluator_failure_is_propagated() {
        let test = transfer_test(Environment::default());
        let t8n = MockTransitionTool::default().failing("boom");
        let err = test
            .make_state_test_fixture(&t8n, &MainnetFork(ForkName::Cancun), &[])
            .unwrap_err();
        assert!(matches!(err, FillError::TransitionTool(_)));
        assert_eq!(t8n.calls().len(), 1);
    }

    #[test]
    fn state_format_resolves_transition_fork() {
        let test = transfer_test(Environment {
            timestamp: 15_000,
            ..Default::default()
        });
        let t8n = MockTransitionTool::default();
        let fixture = test
            .generate(
                &t8n,
                &MainnetFork(ForkName::ShanghaiToCancunAtTime15k),
                FixtureFormat::StateTest,
                &[7702],
                &SingleBlockGenerator,
            )
            .unwrap();

        let fixture = fixture.as_state().unwrap();
        assert!(fixture.post.contains_key("Cancun"));
        assert_eq!(t8n.calls()[0].fork_name, "Cancun+7702");
    }

    #[rstest]
    #[case(FixtureFormat::BlockchainTest)]
    #[case(FixtureFormat::BlockchainTestHive)]
    fn state_test_only_rejects_blockchain_formats(#[case] format: FixtureFormat) {
        let test = transfer_test(Environment::default()).only_state_test();
        let t8n = MockTransitionTool::default();
        let err = test
            .generate(
                &t8n,
                &MainnetFork(ForkName::Cancun),
                format,
                &[],
                &SingleBlockGenerator,
            )
            .unwrap_err();
        assert!(matches!(err, FillError::UnsupportedFixtureFormat(f) if f == format));
        assert!(err.to_string().contains(format.as_str()));
        assert!(t8n.calls().is_empty());
    }

    #[test]
    fn unknown_format_name() {
        let test = transfer_test(Environment::default());
        let t8n = MockTransitionTool::default();
        let err = test
            .generate_named(
                &t8n,
                &MainnetFork(ForkName::Cancun),
                "eof_test",
                &[],
                &SingleBlockGenerator,
            )
            .unwrap_err();
        assert!(matches!(err, FillError::UnknownFixtureFormat(_)));
        assert!(err.to_string().contains("eof_test"));
        assert!(t8n.calls().is_empty());
    }

    #[test]
    fn blockchain_format_goes_through_generator() {
        let test = transfer_test(Environment {
            number: 3,
            excess_blob_gas: Some(100),
            ..Default::default()
        });
        let t8n = MockTransitionTool::default();
        let fixture = test
            .generate(
                &t8n,
                &MainnetFork(ForkName::Cancun),
                FixtureFormat::BlockchainTest,
                &[],
                &SingleBlockGenerator,
            )
            .unwrap();

        let fixture = fixture.as_blockchain().unwrap();
        assert_eq!(fixture.genesis_block_header.number, U256::from(2));
        assert_eq!(
            fixture.genesis_block_header.excess_blob_gas,
            Some(U256::from(100 + crate::TARGET_BLOB_GAS_PER_BLOCK))
        );
        assert_eq!(fixture.blocks.len(), 1);
        assert_eq!(t8n.calls()[0].env.number, 3);
        assert_eq!(t8n.calls()[0].env.excess_blob_gas, Some(100));
    }

    #[test]
    fn dump_dir_per_call() {
        let dir = tempfile::tempdir().unwrap();
        let test = transfer_test(Environment::default()).with_t8n_dump_dir(dir.path());
        let t8n = MockTransitionTool::default();
        let fork = MainnetFork(ForkName::Cancun);

        test.make_state_test_fixture(&t8n, &fork, &[]).unwrap();
        test.make_state_test_fixture(&t8n, &fork, &[]).unwrap();

        let paths: Vec<_> = t8n
            .calls()
            .into_iter()
            .map(|call| call.debug_output_path)
            .collect();
        assert_eq!(
            paths,
            vec![Some(dir.path().join("0")), Some(dir.path().join("1"))]
        );
        assert_eq!(
            transfer_test(Environment::default()).next_t8n_output_path(),
            None
        );
    }

    #[test]
    fn fill_info_records_version_and_tag() {
        let test = transfer_test(Environment::default())
            .with_tag("transfer")
            .with_comment("plain value transfer");
        let t8n = MockTransitionTool::default();
        let fixture = test
            .make_state_test_fixture(&t8n, &MainnetFork(ForkName::Cancun), &[])
            .unwrap();
        let fixture = test.fill_info(fixture.into(), &t8n).unwrap();

        let info = fixture.as_state().unwrap().info.as_ref().unwrap();
        assert_eq!(info["filling-transition-tool"], MockTransitionTool::VERSION);
        assert_eq!(info["tag"], "transfer");
        assert_eq!(info["comment"], "plain value transfer");
        assert!(info.contains_key("hash"));
    }

    #[test]
    fn chain_id_is_passed_through() {
        let mut test = transfer_test(Environment::default()).with_chain_id(5);
        test.tx.chain_id = 5;
        let t8n = MockTransitionTool::default();
        test.make_state_test_fixture(&t8n, &MainnetFork(ForkName::Cancun), &[])
            .unwrap();
        assert_eq!(t8n.calls()[0].chain_id, 5);
    }
}
