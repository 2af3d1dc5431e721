//! [EIP-3155](https://eips.ethereum.org/EIPS/eip-3155) traces produced by a transition tool.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use statefill_types::serde_helpers::quantity;
use tracing::error;

/// One executed operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceLine {
    // Required fields:
    /// Program counter
    pub pc: u64,
    /// OpCode
    pub op: u8,
    /// Gas left before executing this operation
    #[serde(with = "quantity")]
    pub gas: u64,
    /// Gas cost of this operation
    #[serde(with = "quantity")]
    pub gas_cost: u64,
    /// Array of all values on the stack
    #[serde(default)]
    pub stack: Vec<String>,
    /// Depth of the call stack
    pub depth: u64,
    /// Amount of **global** gas refunded
    #[serde(default, with = "quantity")]
    pub refund: u64,
    /// Size of memory array
    #[serde(default, with = "quantity")]
    pub mem_size: u64,

    // Optional fields:
    /// Name of the operation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op_name: Option<String>,
    /// Description of an error (should contain revert reason if supported)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Traces of a single transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionTraces {
    /// Operation lines, in execution order.
    pub lines: Vec<TraceLine>,
    /// Final summary line (output, gas used, error), if the tool wrote one.
    pub summary: Option<Value>,
}

impl TransactionTraces {
    /// Parses a JSON-lines trace file.
    ///
    /// Lines without a program counter are treated as the summary.
    pub fn from_jsonl(content: &str) -> Result<Self, serde_json::Error> {
        let mut traces = Self::default();
        for line in content.lines().filter(|line| !line.trim().is_empty()) {
            let value: Value = serde_json::from_str(line)?;
            if value.get("pc").is_some() {
                traces.lines.push(serde_json::from_value(value)?);
            } else {
                traces.summary = Some(value);
            }
        }
        Ok(traces)
    }
}

/// Logs the traces of every transaction.
pub fn print_traces(traces: &[TransactionTraces]) {
    for (index, tx_traces) in traces.iter().enumerate() {
        error!(target: "t8n", tx = index, lines = tx_traces.lines.len(), "transaction traces");
        for line in &tx_traces.lines {
            error!(
                target: "t8n",
                pc = line.pc,
                op = line.op_name.as_deref().unwrap_or("?"),
                gas = line.gas,
                gas_cost = line.gas_cost,
                depth = line.depth,
                stack = ?line.stack,
                error = line.error.as_deref(),
            );
        }
        if let Some(summary) = &tx_traces.summary {
            error!(target: "t8n", tx = index, %summary, "transaction trace summary");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_geth_trace() {
        let content = r#"
{"pc":0,"op":96,"gas":"0x5f58ef8","gasCost":"0x3","memSize":0,"stack":[],"depth":1,"refund":0,"opName":"PUSH1"}
{"pc":2,"op":0,"gas":"0x5f58ef5","gasCost":"0x0","memSize":0,"stack":["0x1"],"depth":1,"refund":0,"opName":"STOP"}
{"output":"","gasUsed":"0x3"}
"#;
        let traces = TransactionTraces::from_jsonl(content).unwrap();
        assert_eq!(traces.lines.len(), 2);
        assert_eq!(traces.lines[0].gas, 0x5f58ef8);
        assert_eq!(traces.lines[1].stack, vec!["0x1".to_string()]);
        assert_eq!(traces.lines[1].op_name.as_deref(), Some("STOP"));
        assert_eq!(traces.summary.unwrap()["gasUsed"], "0x3");
    }

    #[test]
    fn invalid_line_is_an_error() {
        assert!(TransactionTraces::from_jsonl("{\"pc\": \"nope\"}").is_err());
    }
}
