use alloy_primitives::{Address, Bytes, B256, U256};
use thiserror::Error;

/// Errors that can occur while signing or encoding a transaction.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// Unknown private key.
    #[error("unknown private key: {0:?}")]
    UnknownPrivateKey(B256),
    /// Neither a secret key nor a full signature is present.
    #[error("transaction has neither a secret key nor a signature")]
    MissingSecretKey,
    /// The transaction has no `v`, `r`, `s` values.
    #[error("transaction is not signed")]
    MissingSignature,
    /// The signature values do not describe a recoverable signature.
    #[error("invalid signature: v={v}, r={r}, s={s}")]
    InvalidSignature {
        /// `v` value.
        v: U256,
        /// `r` value.
        r: U256,
        /// `s` value.
        s: U256,
    },
    /// Invalid transaction type.
    #[error("unsupported transaction type: {0}")]
    UnsupportedType(u8),
    /// Error from the signer.
    #[error(transparent)]
    Ecdsa(#[from] k256::ecdsa::Error),
}

/// Mismatch between an expected account and the account found in a post state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountCheckError {
    /// Expected account is missing.
    #[error("expected account not found: {0}")]
    NotFound(Address),
    /// Account that must not exist was found.
    #[error("found unexpected account: {0}")]
    Unexpected(Address),
    /// Nonce mismatch.
    #[error("nonce mismatch for {address}: want {want}, got {got}")]
    Nonce {
        /// Account address.
        address: Address,
        /// Expected nonce.
        want: u64,
        /// Actual nonce.
        got: u64,
    },
    /// Balance mismatch.
    #[error("balance mismatch for {address}: want {want}, got {got}")]
    Balance {
        /// Account address.
        address: Address,
        /// Expected balance.
        want: U256,
        /// Actual balance.
        got: U256,
    },
    /// Code mismatch.
    #[error("code mismatch for {address}: want {want}, got {got}")]
    Code {
        /// Account address.
        address: Address,
        /// Expected code.
        want: Bytes,
        /// Actual code.
        got: Bytes,
    },
    /// Storage slot mismatch.
    #[error("storage mismatch for {address} at key {key:#x}: want {want:#x}, got {got:#x}")]
    Storage {
        /// Account address.
        address: Address,
        /// Storage key.
        key: U256,
        /// Expected value.
        want: U256,
        /// Actual value.
        got: U256,
    },
}
