use statefill_types::Block;

use crate::StateTest;

/// Wraps the state test transaction into the single block of the equivalent blockchain test.
///
/// Header fields are copied verbatim from the state test environment. The expected transaction
/// error becomes the block exception.
pub fn synthesize_blocks(test: &StateTest) -> Vec<Block> {
    let env = &test.env;
    vec![Block {
        number: Some(env.number),
        timestamp: Some(env.timestamp),
        coinbase: Some(env.coinbase),
        difficulty: env.difficulty,
        gas_limit: Some(env.gas_limit),
        extra_data: Some(env.extra_data.clone()),
        withdrawals: env.withdrawals.clone(),
        beacon_root: env.beacon_root,
        txs: vec![test.tx.clone()],
        ommers: Vec::new(),
        exception: test.tx.error.clone(),
        engine_api_error_code: test.engine_api_error_code,
        header_verify: test.blockchain_test_header_verify.clone(),
        rlp_modifier: test.blockchain_test_rlp_modifier.clone(),
    }]
}
