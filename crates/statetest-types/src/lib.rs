//! Types shared by the statefill crates.
//!
//! Holds the filler-side data model (environment, allocations, transactions, synthesized
//! blocks), the transition tool result record and the serializable fixture formats.
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod account;
mod alloc;
mod block;
pub mod blockchain;
mod env;
mod error;
mod fixture;
mod header;
mod result;
pub mod serde_helpers;
mod spec;
mod state_fixture;
mod transaction;
pub mod utils;

pub use account::*;
pub use alloc::*;
pub use block::*;
pub use env::*;
pub use error::*;
pub use fixture::*;
pub use header::*;
pub use result::*;
pub use spec::*;
pub use state_fixture::*;
pub use transaction::*;
