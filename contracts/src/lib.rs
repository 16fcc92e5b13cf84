// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # YS Token Contracts
//!
//! The two ledgers of the workspace. They share no state and are deployed
//! independently:
//!
//! - **Fungible Ledger** — ERC20-compatible balances and allowances over a
//!   fixed supply minted to the deployer.
//! - **Non-Fungible Registry** — ERC721-compatible ownership, per-token and
//!   operator approvals, and metadata URIs.
//! - **Receiver** — the acceptance callback safe transfers invoke on
//!   contract-capable receivers.
//! - **Dispatch** — method-name-plus-arguments call envelopes and receipts
//!   for the host that drives the ledgers.
//!
//! ## Design Principles
//!
//! 1. Every check runs before the first write. A rejected call changes
//!    nothing and emits nothing.
//! 2. Balance arithmetic is checked; nothing wraps.
//! 3. The null identity is an explicit sentinel, [`Address::ZERO`], and is
//!    checked first.
//! 4. Errors are structured and carry their operands.
//!
//! [`Address::ZERO`]: ys_protocol::Address::ZERO

pub mod dispatch;
pub mod fungible_ledger;
pub mod non_fungible_registry;
pub mod receiver;

pub use fungible_ledger::{Erc20Error, FungibleConfig, FungibleLedger};
pub use non_fungible_registry::{Erc721Error, NonFungibleRegistry, RegistryConfig};
