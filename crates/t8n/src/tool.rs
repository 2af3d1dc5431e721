use statefill_types::{Alloc, Environment, Transaction, TransitionToolOutput};
use std::path::Path;

use crate::{TransactionTraces, TransitionToolError};

/// Inputs of a single transition tool evaluation.
#[derive(Clone, Copy, Debug)]
pub struct EvaluateRequest<'a> {
    /// Pre-state allocation.
    pub alloc: &'a Alloc,
    /// Signed transactions to execute in order.
    pub txs: &'a [Transaction],
    /// Block environment.
    pub env: &'a Environment,
    /// Fork identifier, including extra EIPs joined with `+` (e.g. `Cancun+7702`).
    pub fork_name: &'a str,
    /// Chain id.
    pub chain_id: u64,
    /// Block reward. Negative disables the reward.
    pub reward: i64,
    /// Extra EIPs enabled on top of the fork.
    pub eips: &'a [u64],
    /// Directory where the tool dumps its inputs and outputs. Must be unique per call.
    pub debug_output_path: Option<&'a Path>,
}

/// State transition evaluator.
pub trait TransitionTool {
    /// Executes the request and returns the post-state and result record.
    ///
    /// A single attempt is made; failures are returned as is.
    fn evaluate(&self, request: EvaluateRequest<'_>)
        -> Result<TransitionToolOutput, TransitionToolError>;

    /// Traces of the last evaluation, one entry per transaction.
    ///
    /// Returns `None` when tracing is disabled.
    fn get_traces(&self) -> Option<Vec<TransactionTraces>>;

    /// Version string of the tool, recorded in the fixture info.
    fn version(&self) -> Result<String, TransitionToolError>;
}

impl<T: TransitionTool + ?Sized> TransitionTool for &T {
    fn evaluate(
        &self,
        request: EvaluateRequest<'_>,
    ) -> Result<TransitionToolOutput, TransitionToolError> {
        (**self).evaluate(request)
    }

    fn get_traces(&self) -> Option<Vec<TransactionTraces>> {
        (**self).get_traces()
    }

    fn version(&self) -> Result<String, TransitionToolError> {
        (**self).version()
    }
}
