use std::path::PathBuf;

use alloy_primitives::{address, Address, B256, U256};
use rstest::rstest;
use statefill::{
    test_utils::{MockTransitionTool, SingleBlockGenerator},
    types::{
        Account, Alloc, Environment, Fixture, FixtureFormat, ForkName, PostState, Transaction,
        TEST_ADDRESS,
    },
    FillError, MainnetFork, StateTest, StateTestKind,
};

use crate::TestdataConfig;

const TESTS_TESTDATA: &str = "tests/state_testdata";

fn state_testdata_config() -> TestdataConfig {
    TestdataConfig {
        testdata_dir: PathBuf::from(TESTS_TESTDATA),
    }
}

fn compare_or_save_state_testdata<T>(filename: &str, output: &T)
where
    T: serde::Serialize + for<'a> serde::Deserialize<'a> + PartialEq + std::fmt::Debug,
{
    crate::compare_or_save_testdata_with_config(filename, output, state_testdata_config());
}

const RECIPIENT: Address = address!("00000000000000000000000000000000000000aa");

fn value_transfer(env: Environment) -> StateTest {
    let pre = Alloc::from([(
        TEST_ADDRESS,
        Account::default().with_balance(U256::from(1_000_000_000_000u64)),
    )]);
    let post = PostState::from_iter([
        (
            RECIPIENT,
            Some(Account::default().with_balance(U256::from(1_000))),
        ),
        (TEST_ADDRESS, Some(Account::default().with_nonce(1))),
    ]);
    let tx = Transaction {
        to: Some(RECIPIENT),
        value: U256::from(1_000),
        ..Default::default()
    };
    StateTest::new(env, pre, post, tx)
}

fn fill(test: &StateTest, fork: ForkName, format: FixtureFormat) -> Result<Fixture, FillError> {
    test.generate(
        &MockTransitionTool::default(),
        &MainnetFork(fork),
        format,
        &[],
        &SingleBlockGenerator,
    )
}

#[test]
fn test_state_and_blockchain_fixtures_agree() {
    let test = value_transfer(Environment {
        number: 5,
        beacon_root: Some(B256::with_last_byte(0x11)),
        ..Default::default()
    });

    let state = fill(&test, ForkName::Cancun, FixtureFormat::StateTest).unwrap();
    let blockchain = fill(&test, ForkName::Cancun, FixtureFormat::BlockchainTest).unwrap();

    let state = state.as_state().unwrap();
    let blockchain = blockchain.as_blockchain().unwrap();
    let header = blockchain.blocks[0].block_header.as_ref().unwrap();
    assert_eq!(state.post["Cancun"][0].hash, header.state_root);
    assert_eq!(blockchain.genesis_block_header.number, U256::from(4));
    assert_eq!(header.number, U256::from(5));
    assert_eq!(blockchain.lastblockhash, header.hash);

    let post_state = blockchain.post_state.as_ref().unwrap();
    test.post.verify(post_state).unwrap();
}

#[test]
fn test_hive_format_uses_the_same_block() {
    let test = value_transfer(Environment::default());
    let fixture = fill(&test, ForkName::Shanghai, FixtureFormat::BlockchainTestHive).unwrap();
    let fixture = fixture.as_blockchain().unwrap();
    assert_eq!(fixture.network, ForkName::Shanghai);
    assert_eq!(fixture.blocks.len(), 1);
    assert_eq!(fixture.blocks[0].transactions.as_ref().unwrap().len(), 1);
}

#[rstest]
#[case(FixtureFormat::StateTest, true)]
#[case(FixtureFormat::BlockchainTest, false)]
#[case(FixtureFormat::BlockchainTestHive, false)]
fn test_state_test_only(#[case] format: FixtureFormat, #[case] supported: bool) {
    let test = value_transfer(Environment::default()).only_state_test();
    assert_eq!(test.kind, StateTestKind::StateTestOnly);

    let result = fill(&test, ForkName::Shanghai, format);
    if supported {
        assert!(result.unwrap().as_state().is_some());
    } else {
        assert!(matches!(result, Err(FillError::UnsupportedFixtureFormat(f)) if f == format));
    }
}

#[test]
fn test_cancun_value_transfer_fixture() {
    let test = value_transfer(Environment {
        beacon_root: Some(B256::with_last_byte(0x11)),
        ..Default::default()
    })
    .with_tag("value-transfer");
    let t8n = MockTransitionTool::default();

    let fixture = test
        .generate(
            &t8n,
            &MainnetFork(ForkName::Cancun),
            FixtureFormat::StateTest,
            &[],
            &SingleBlockGenerator,
        )
        .unwrap();
    let fixture = test.fill_info(fixture, &t8n).unwrap();

    compare_or_save_state_testdata("test_cancun_value_transfer_fixture.json", &fixture);
}
