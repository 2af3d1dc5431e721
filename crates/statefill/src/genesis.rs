use statefill_types::Environment;

use crate::FillError;

/// Blob gas target per block, subtracted from the excess blob gas by every block.
pub const TARGET_BLOB_GAS_PER_BLOCK: u64 = 393_216;

/// Derives the genesis environment of the single block blockchain test.
///
/// The genesis block is the parent of the block executing the transaction: its number is one
/// less, it has no withdrawals nor beacon root, and its excess blob gas is raised by one block
/// target so that the first block computes the state test value.
pub fn genesis_environment(env: &Environment) -> Result<Environment, FillError> {
    let mut genesis = env.clone();
    genesis.withdrawals = None;
    genesis.beacon_root = None;
    genesis.number = env
        .number
        .checked_sub(1)
        .ok_or(FillError::NegativeGenesisNumber)?;
    if let Some(excess_blob_gas) = env.excess_blob_gas {
        genesis.excess_blob_gas = Some(
            excess_blob_gas
                .checked_add(TARGET_BLOB_GAS_PER_BLOCK)
                .ok_or(FillError::ExcessBlobGasOverflow(excess_blob_gas))?,
        );
    }
    Ok(genesis)
}
