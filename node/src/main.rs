// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # YS Ledger Host
//!
//! Entry point for the `ys-host` binary. Parses CLI arguments, initializes
//! logging, deploys both ledgers in memory and drives them.
//!
//! - `deploy`  — deploy from a config and print metadata plus the
//!   construction events
//! - `replay`  — deploy, then execute a call script, one receipt per line
//! - `version` — print build version information

mod cli;
mod config;
mod logging;
mod script;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::io::Write;

use ys_protocol::events::{Erc20Event, Erc721Event};
use ys_protocol::{Address, Amount};

use cli::{Commands, YsHostCli};
use config::{Deployment, DeploymentConfig};

fn main() -> Result<()> {
    let cli = YsHostCli::parse();

    match cli.command {
        Commands::Version => {
            print_version();
            Ok(())
        }
        command => {
            logging::init_logging(logging::DEFAULT_FILTER, cli.log_format);
            match command {
                Commands::Deploy(args) => deploy(args),
                Commands::Replay(args) => replay(args),
                Commands::Version => Ok(()),
            }
        }
    }
}

/// Metadata printed by `deploy`.
#[derive(Debug, Serialize)]
struct DeploymentReport {
    deployer: Address,
    erc20: FungibleReport,
    erc721: RegistryReport,
    receivers: Vec<Address>,
}

#[derive(Debug, Serialize)]
struct FungibleReport {
    name: String,
    symbol: String,
    decimals: u8,
    #[serde(with = "ys_protocol::uint")]
    total_supply: Amount,
    events: Vec<Erc20Event>,
}

#[derive(Debug, Serialize)]
struct RegistryReport {
    name: String,
    symbol: String,
    base_uri: String,
    token_count: usize,
    events: Vec<Erc721Event>,
}

fn deploy(args: cli::DeployArgs) -> Result<()> {
    let config = DeploymentConfig::load(args.config.as_deref())?;
    let receivers: Vec<Address> = config.receivers.keys().copied().collect();
    let mut deployment = Deployment::deploy(config)?;

    let report = DeploymentReport {
        deployer: deployment.deployer,
        erc20: FungibleReport {
            name: deployment.erc20.name().to_string(),
            symbol: deployment.erc20.symbol().to_string(),
            decimals: deployment.erc20.decimals(),
            total_supply: deployment.erc20.total_supply(),
            events: deployment.erc20.take_events(),
        },
        erc721: RegistryReport {
            name: deployment.erc721.name().to_string(),
            symbol: deployment.erc721.symbol().to_string(),
            base_uri: deployment.erc721.base_uri().to_string(),
            token_count: deployment.erc721.token_count(),
            events: deployment.erc721.take_events(),
        },
        receivers,
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &report).context("failed to write deployment report")?;
    writeln!(out).context("failed to write deployment report")?;
    Ok(())
}

fn replay(args: cli::ReplayArgs) -> Result<()> {
    let config = DeploymentConfig::load(args.config.as_deref())?;
    let steps = script::load_script(&args.script)?;
    let mut deployment = Deployment::deploy(config)?;

    tracing::info!(
        script = %args.script.display(),
        steps = steps.len(),
        fail_fast = args.fail_fast,
        "replaying call script"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    script::replay(&mut deployment, steps, &mut out, args.fail_fast)?;
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("ys-host {}", env!("CARGO_PKG_VERSION"));
    println!("rustc   {}", option_env!("RUSTC_VERSION").unwrap_or("unknown"));
}
