// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # YS Ledgers — Protocol Primitives
//!
//! Shared vocabulary for the two token ledgers in this workspace: the
//! fungible ledger (ERC20-compatible) and the non-fungible registry
//! (ERC721-compatible). Nothing in here holds ledger state; these are the
//! types every ledger and every host agrees on.
//!
//! - **address** — 20-byte account identifiers and the null identity.
//! - **interface** — ERC165 interface identifiers and selectors.
//! - **events** — `Transfer` / `Approval` / `ApprovalForAll` events and the
//!   per-instance event log.
//! - **config** — deployment defaults and supply scaling.
//! - **uint** — JSON-safe serde helpers for 128-bit quantities.

pub mod address;
pub mod config;
pub mod events;
pub mod interface;
pub mod uint;

/// Raw fungible token amount, in the smallest unit.
pub type Amount = u128;

/// Non-fungible token identifier.
pub type TokenId = u128;

pub use address::Address;
