//! Transition tool (t8n) interface.
//!
//! A transition tool executes a list of transactions on top of a pre-state and returns the
//! post-state allocation together with the execution result record. [`ExternalTransitionTool`]
//! drives an `evm t8n` compatible binary.
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod error;
mod external;
mod tool;
pub mod traces;

pub use error::TransitionToolError;
pub use external::{ExternalToolConfig, ExternalTransitionTool};
pub use tool::{EvaluateRequest, TransitionTool};
pub use traces::{TraceLine, TransactionTraces};
