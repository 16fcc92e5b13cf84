//! # Call Scripts
//!
//! A call script is a JSON array of steps, each naming the calling
//! identity, the target ledger and a call envelope:
//!
//! ```json
//! [
//!   { "caller": "0xf39f...2266", "target": "erc20",
//!     "call": { "method": "transfer", "args": ["0x7099...79c8", 250] } },
//!   { "caller": "0xf39f...2266", "target": "erc721",
//!     "call": { "method": "safeTransferFrom", "args": ["0xf39f...2266", "0xc0c0...c0c0", 1] } }
//! ]
//! ```
//!
//! Steps run strictly in order, one at a time. Each produces exactly one
//! receipt line on the output, reverted or not.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use ys_contracts::dispatch::{Erc20Call, Erc721Call, Receipt};
use ys_contracts::{Erc20Error, Erc721Error};
use ys_protocol::events::{Erc20Event, Erc721Event};
use ys_protocol::Address;

use crate::config::Deployment;

// ---------------------------------------------------------------------------
// Script format
// ---------------------------------------------------------------------------

/// One call in a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub caller: Address,
    #[serde(flatten)]
    pub call: TargetedCall,
}

/// A call envelope together with the ledger it is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", content = "call", rename_all = "lowercase")]
pub enum TargetedCall {
    Erc20(Erc20Call),
    Erc721(Erc721Call),
}

/// Reads and decodes a script file.
pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read call script {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid call script {}", path.display()))
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Receipt of one step, tagged with the ledger that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "lowercase")]
pub enum StepReceipt {
    Erc20(Receipt<Erc20Event, Erc20Error>),
    Erc721(Receipt<Erc721Event, Erc721Error>),
}

impl StepReceipt {
    pub fn is_success(&self) -> bool {
        match self {
            StepReceipt::Erc20(r) => r.outcome.is_success(),
            StepReceipt::Erc721(r) => r.outcome.is_success(),
        }
    }
}

/// Totals for a finished replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub executed: usize,
    pub reverted: usize,
}

impl Deployment {
    /// Executes a single step against the matching ledger.
    pub fn execute(&mut self, step: ScriptStep) -> StepReceipt {
        match step.call {
            TargetedCall::Erc20(call) => StepReceipt::Erc20(self.erc20.execute(step.caller, call)),
            TargetedCall::Erc721(call) => {
                StepReceipt::Erc721(self.erc721.execute(step.caller, call, &mut self.receivers))
            }
        }
    }
}

/// Runs `steps` in order, writing one JSON receipt per line to `out`.
///
/// With `fail_fast`, the first reverted step is still written out, then
/// replay stops with an error.
pub fn replay<W: Write>(
    deployment: &mut Deployment,
    steps: Vec<ScriptStep>,
    out: &mut W,
    fail_fast: bool,
) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for (index, step) in steps.into_iter().enumerate() {
        let receipt = deployment.execute(step);
        summary.executed += 1;

        serde_json::to_writer(&mut *out, &receipt)
            .with_context(|| format!("failed to write receipt for step {index}"))?;
        writeln!(out).context("failed to write receipt separator")?;

        if !receipt.is_success() {
            summary.reverted += 1;
            tracing::warn!(step = index, "call reverted");
            if fail_fast {
                out.flush().context("failed to flush receipts")?;
                bail!("step {index} reverted; stopping (--fail-fast)");
            }
        }
    }

    out.flush().context("failed to flush receipts")?;
    tracing::info!(
        executed = summary.executed,
        reverted = summary.reverted,
        "replay finished"
    );
    Ok(summary)
}
