use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

use crate::{blockchain::BlockHeader, HeaderOverrides, Transaction, Withdrawal};

/// Engine API error codes a client is expected to return for an invalid payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
#[repr(i32)]
pub enum EngineApiError {
    /// Invalid JSON was received by the server.
    ParseError = -32700,
    /// The JSON sent is not a valid request object.
    InvalidRequest = -32600,
    /// The method does not exist / is not available.
    MethodNotFound = -32601,
    /// Invalid method parameter(s).
    InvalidParams = -32602,
    /// Internal JSON-RPC error.
    InternalError = -32603,
    /// Generic client error while processing request.
    ServerError = -32000,
    /// Payload does not exist / is not available.
    UnknownPayload = -38001,
    /// Forkchoice state is invalid / inconsistent.
    InvalidForkchoiceState = -38002,
    /// Payload attributes are invalid / inconsistent.
    InvalidPayloadAttributes = -38003,
    /// Number of requested entities is too large.
    TooLargeRequest = -38004,
    /// Payload belongs to a fork that is not supported.
    UnsupportedFork = -38005,
}

impl From<EngineApiError> for i32 {
    fn from(error: EngineApiError) -> Self {
        error as i32
    }
}

impl TryFrom<i32> for EngineApiError {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Ok(match code {
            -32700 => Self::ParseError,
            -32600 => Self::InvalidRequest,
            -32601 => Self::MethodNotFound,
            -32602 => Self::InvalidParams,
            -32603 => Self::InternalError,
            -32000 => Self::ServerError,
            -38001 => Self::UnknownPayload,
            -38002 => Self::InvalidForkchoiceState,
            -38003 => Self::InvalidPayloadAttributes,
            -38004 => Self::TooLargeRequest,
            -38005 => Self::UnsupportedFork,
            _ => return Err(format!("unknown engine API error code: {code}")),
        })
    }
}

/// A block to be built by a chain-test generator.
///
/// Unset header fields are filled by the generator from the parent block and the transition
/// tool result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Block {
    pub number: Option<u64>,
    pub timestamp: Option<u64>,
    pub coinbase: Option<Address>,
    pub difficulty: Option<U256>,
    pub gas_limit: Option<u64>,
    pub extra_data: Option<Bytes>,
    pub withdrawals: Option<Vec<Withdrawal>>,
    pub beacon_root: Option<B256>,
    /// Transactions included in the block.
    pub txs: Vec<Transaction>,
    /// Ommer headers.
    pub ommers: Vec<BlockHeader>,
    /// Exception the block is expected to raise; the block is then invalid.
    pub exception: Option<String>,
    /// Error code expected from the engine API when the block is sent as a payload.
    pub engine_api_error_code: Option<EngineApiError>,
    /// Header fields the produced header must match.
    pub header_verify: Option<HeaderOverrides>,
    /// Header fields replaced before RLP encoding, producing a malformed block.
    pub rlp_modifier: Option<HeaderOverrides>,
}
