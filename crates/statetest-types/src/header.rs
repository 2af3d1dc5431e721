use alloy_primitives::{Address, Bytes, FixedBytes, B256, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blockchain::BlockHeader;

/// Partial block header.
///
/// Used by negative tests both to assert header fields produced by a client
/// ([`HeaderOverrides::verify`]) and to tamper with a header before it is RLP-encoded
/// ([`HeaderOverrides::apply`]).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_hash: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncle_hash: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coinbase: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_root: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions_trie: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_trie: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bloom: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mix_hash: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<FixedBytes<8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_fee_per_gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdrawals_root: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_gas_used: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excess_blob_gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_beacon_block_root: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_hash: Option<B256>,
}

/// Header field that differs from the expected value.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("header field `{field}` mismatch: want {want}, got {got}")]
pub struct HeaderFieldMismatch {
    /// Field name.
    pub field: &'static str,
    /// Expected value.
    pub want: String,
    /// Value in the header.
    pub got: String,
}

/// Expands `$body!(name, optional)` once per header field.
macro_rules! for_each_field {
    ($body:ident) => {
        $body!(parent_hash, false);
        $body!(uncle_hash, false);
        $body!(coinbase, false);
        $body!(state_root, false);
        $body!(transactions_trie, false);
        $body!(receipt_trie, false);
        $body!(bloom, false);
        $body!(difficulty, false);
        $body!(number, false);
        $body!(gas_limit, false);
        $body!(gas_used, false);
        $body!(timestamp, false);
        $body!(extra_data, false);
        $body!(mix_hash, false);
        $body!(nonce, false);
        $body!(base_fee_per_gas, true);
        $body!(withdrawals_root, true);
        $body!(blob_gas_used, true);
        $body!(excess_blob_gas, true);
        $body!(parent_beacon_block_root, true);
        $body!(requests_hash, true);
    };
}

impl HeaderOverrides {
    /// Returns a copy of `header` with every set field replaced.
    pub fn apply(&self, header: &BlockHeader) -> BlockHeader {
        let mut header = header.clone();
        macro_rules! apply {
            ($field:ident, false) => {
                if let Some(value) = &self.$field {
                    header.$field = value.clone();
                }
            };
            ($field:ident, true) => {
                if let Some(value) = &self.$field {
                    header.$field = Some(value.clone());
                }
            };
        }
        for_each_field!(apply);
        header
    }

    /// Checks that every set field matches `header`.
    pub fn verify(&self, header: &BlockHeader) -> Result<(), HeaderFieldMismatch> {
        macro_rules! verify {
            ($field:ident, false) => {
                if let Some(want) = &self.$field {
                    if *want != header.$field {
                        return Err(HeaderFieldMismatch {
                            field: stringify!($field),
                            want: want.to_string(),
                            got: header.$field.to_string(),
                        });
                    }
                }
            };
            ($field:ident, true) => {
                if let Some(want) = &self.$field {
                    if Some(want) != header.$field.as_ref() {
                        return Err(HeaderFieldMismatch {
                            field: stringify!($field),
                            want: want.to_string(),
                            got: format!("{:?}", header.$field),
                        });
                    }
                }
            };
        }
        for_each_field!(verify);
        Ok(())
    }
}
