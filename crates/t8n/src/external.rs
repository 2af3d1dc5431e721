use serde::{Deserialize, Serialize};
use serde_json::json;
use statefill_types::{Transaction, TransitionToolOutput};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::Mutex,
};
use tracing::{debug, trace};

use crate::{EvaluateRequest, TransactionTraces, TransitionTool, TransitionToolError};

/// Configuration of an external `evm t8n` compatible binary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ExternalToolConfig {
    /// Path of the binary.
    pub binary: PathBuf,
    /// Subcommand placed before the t8n arguments.
    pub subcommand: Option<String>,
    /// Arguments appended to every invocation.
    pub extra_args: Vec<String>,
    /// Collect EIP-3155 traces for every transaction.
    pub trace: bool,
}

impl Default for ExternalToolConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("evm"),
            subcommand: Some("t8n".to_string()),
            extra_args: Vec::new(),
            trace: false,
        }
    }
}

impl ExternalToolConfig {
    /// Loads the configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TransitionToolError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Transition tool running an external binary.
///
/// Inputs are passed on stdin and the post-state and result are read from stdout. Each call
/// works in a fresh temporary directory.
#[derive(Debug)]
pub struct ExternalTransitionTool {
    config: ExternalToolConfig,
    traces: Mutex<Option<Vec<TransactionTraces>>>,
}

impl ExternalTransitionTool {
    /// Creates a new tool from the configuration.
    pub fn new(config: ExternalToolConfig) -> Self {
        Self {
            config,
            traces: Mutex::new(None),
        }
    }

    fn command(&self, request: &EvaluateRequest<'_>, basedir: &Path) -> Command {
        let mut command = Command::new(&self.config.binary);
        if let Some(subcommand) = &self.config.subcommand {
            command.arg(subcommand);
        }
        command
            .arg("--input.alloc=stdin")
            .arg("--input.txs=stdin")
            .arg("--input.env=stdin")
            .arg("--output.result=stdout")
            .arg("--output.alloc=stdout")
            .arg("--output.body=stdout")
            .arg(format!("--output.basedir={}", basedir.display()))
            .arg(format!("--state.fork={}", request.fork_name))
            .arg(format!("--state.chainid={}", request.chain_id))
            .arg(format!("--state.reward={}", request.reward));
        if self.config.trace {
            command.arg("--trace");
        }
        command.args(&self.config.extra_args);
        command
    }

    /// Reads `trace-<index>-<hash>.jsonl` files, ordered by transaction index.
    fn read_traces(basedir: &Path) -> Result<Vec<TransactionTraces>, TransitionToolError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(basedir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let Some(rest) = name.strip_prefix("trace-") else {
                continue;
            };
            if !name.ends_with(".jsonl") {
                continue;
            }
            let index: usize = rest
                .split('-')
                .next()
                .and_then(|index| index.parse().ok())
                .unwrap_or(usize::MAX);
            files.push((index, path));
        }
        files.sort();

        files
            .into_iter()
            .map(|(_, path)| -> Result<TransactionTraces, TransitionToolError> {
                let content = fs::read_to_string(path)?;
                Ok(TransactionTraces::from_jsonl(&content)?)
            })
            .collect()
    }
}

impl TransitionTool for ExternalTransitionTool {
    fn evaluate(
        &self,
        request: EvaluateRequest<'_>,
    ) -> Result<TransitionToolOutput, TransitionToolError> {
        let workdir = tempfile::tempdir()?;
        // tools read a missing `type` as legacy
        let txs: Vec<Transaction> = request
            .txs
            .iter()
            .map(|tx| Transaction {
                ty: Some(tx.tx_type()),
                ..tx.clone()
            })
            .collect();
        let input = json!({
            "alloc": request.alloc,
            "txs": txs,
            "env": request.env,
        });
        let mut command = self.command(&request, workdir.path());
        debug!(
            target: "t8n",
            fork = request.fork_name,
            txs = request.txs.len(),
            eips = ?request.eips,
            "running transition tool"
        );
        trace!(target: "t8n", ?command);

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| TransitionToolError::Spawn {
                binary: self.config.binary.clone(),
                source,
            })?;
        if let Some(mut stdin) = child.stdin.take() {
            serde_json::to_writer(&mut stdin, &input)?;
            stdin.flush()?;
        }
        let output = child.wait_with_output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if let Some(path) = request.debug_output_path {
            dump_files(path, &command, &input, &stdout, &stderr)?;
        }

        if !output.status.success() {
            return Err(TransitionToolError::Failed {
                status: output.status.to_string(),
                stderr: stderr.into_owned(),
            });
        }
        let result: TransitionToolOutput = serde_json::from_str(&stdout)?;

        let traces = if self.config.trace {
            Some(Self::read_traces(workdir.path())?)
        } else {
            None
        };
        *self.traces.lock().unwrap_or_else(|e| e.into_inner()) = traces;

        Ok(result)
    }

    fn get_traces(&self) -> Option<Vec<TransactionTraces>> {
        self.traces.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn version(&self) -> Result<String, TransitionToolError> {
        let output = Command::new(&self.config.binary)
            .arg("--version")
            .output()
            .map_err(|source| TransitionToolError::Spawn {
                binary: self.config.binary.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(TransitionToolError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }
}

/// Writes the tool inputs, outputs and a script reproducing the call.
fn dump_files(
    path: &Path,
    command: &Command,
    input: &serde_json::Value,
    stdout: &str,
    stderr: &str,
) -> Result<(), TransitionToolError> {
    fs::create_dir_all(path)?;
    for name in ["alloc", "txs", "env"] {
        fs::write(
            path.join(format!("input_{name}.json")),
            serde_json::to_string_pretty(&input[name])?,
        )?;
    }
    fs::write(path.join("stdin.json"), serde_json::to_string_pretty(input)?)?;
    fs::write(path.join("stdout.txt"), stdout)?;
    fs::write(path.join("stderr.txt"), stderr)?;

    let args: Vec<String> = command
        .get_args()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    let script = format!(
        "#!/bin/sh\n{} {} < stdin.json\n",
        command.get_program().to_string_lossy(),
        args.join(" ")
    );
    fs::write(path.join("t8n.sh"), script)?;
    Ok(())
}
