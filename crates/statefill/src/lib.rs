//! Fills state tests into fixtures.
//!
//! A [`StateTest`] describes a single transaction executed on top of a pre-state. It can be
//! filled directly into a state test fixture, or turned into an equivalent single block
//! [`BlockchainTest`] that a [`BlockchainTestGenerator`] fills into a blockchain test fixture.
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod blocks;
mod error;
pub mod fork;
mod genesis;
mod state_test;
mod verify;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use blockchain_test::{BlockchainTest, BlockchainTestGenerator};
pub use blocks::synthesize_blocks;
pub use error::FillError;
pub use fork::{Fork, MainnetFork, BEACON_ROOTS_ADDRESS};
pub use genesis::{genesis_environment, TARGET_BLOB_GAS_PER_BLOCK};
pub use state_test::{StateTest, StateTestKind};
pub use verify::verify_post_alloc;

// Reexport dependencies.
pub use statefill_types as types;
pub use t8n;
