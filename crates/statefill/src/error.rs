use alloy_primitives::Address;
use statefill_types::{AccountCheckError, FixtureFormat, TransactionError, UnknownFixtureFormat};
use t8n::TransitionToolError;
use thiserror::Error;

/// Errors that can occur while filling a test.
#[derive(Debug, Error)]
pub enum FillError {
    /// The pre-state contains accounts with zero nonce, zero balance and no code.
    #[error("empty accounts in pre state: {0:?}")]
    EmptyAccounts(Vec<Address>),
    /// The state test starts at block 0, which leaves no room for a genesis block.
    #[error("genesis block number cannot be negative, set state test env.number to 1")]
    NegativeGenesisNumber,
    /// Excess blob gas of the genesis block does not fit in 64 bits.
    #[error("genesis excess blob gas overflows: {0}")]
    ExcessBlobGasOverflow(u64),
    /// Post-state does not match the expectation.
    #[error("post state verification failed: {0}")]
    PostVerification(#[from] AccountCheckError),
    /// The filler does not produce the requested format.
    #[error("unsupported fixture format: {0}")]
    UnsupportedFixtureFormat(FixtureFormat),
    /// Format name that is not known.
    #[error(transparent)]
    UnknownFixtureFormat(#[from] UnknownFixtureFormat),
    /// Transition tool failure.
    #[error("transition tool failed: {0}")]
    TransitionTool(#[from] TransitionToolError),
    /// Signing or encoding of the transaction failed.
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    /// Fixture serialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Error reported by the blockchain test generator.
    #[error("blockchain test generation failed: {0}")]
    Generator(String),
}
