//! # CLI Interface
//!
//! Command-line shape of `ys-host`, built with `clap` derive. Three
//! subcommands: `deploy`, `replay` and `version`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Local execution host for the YS token ledgers.
///
/// Deploys a fungible ledger and a non-fungible registry in memory and
/// drives them with JSON call scripts, printing one receipt per call.
#[derive(Parser, Debug)]
#[command(
    name = "ys-host",
    about = "Local execution host for the YS token ledgers",
    version,
    propagate_version = true
)]
pub struct YsHostCli {
    /// Log output format.
    #[arg(long, global = true, env = "YS_LOG", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy both ledgers and print their metadata.
    Deploy(DeployArgs),
    /// Deploy both ledgers, then execute a call script against them.
    Replay(ReplayArgs),
    /// Print version information and exit.
    Version,
}

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Deployment configuration (JSON).
    ///
    /// When omitted, every ledger uses its built-in defaults.
    #[arg(long, short = 'c', env = "YS_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Deployment configuration (JSON).
    #[arg(long, short = 'c', env = "YS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Call script: a JSON array of `{caller, target, call}` steps.
    pub script: PathBuf,

    /// Stop at the first reverted call and exit non-zero.
    #[arg(long)]
    pub fail_fast: bool,
}
