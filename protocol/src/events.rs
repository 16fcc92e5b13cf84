//! # Ledger Events
//!
//! Events are the side channel through which external observers learn about
//! state changes. Each ledger appends to its own [`EventLog`] only after an
//! operation has passed every check, so a rejected call never leaves an
//! event behind.
//!
//! Field naming follows the standard event signatures:
//!
//! ```text
//! Transfer(address indexed from, address indexed to, uint256 value)
//! Approval(address indexed owner, address indexed spender, uint256 value)
//! Transfer(address indexed from, address indexed to, uint256 indexed tokenId)
//! Approval(address indexed owner, address indexed approved, uint256 indexed tokenId)
//! ApprovalForAll(address indexed owner, address indexed operator, bool approved)
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::address::Address;
use crate::{Amount, TokenId};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Events emitted by the fungible ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum Erc20Event {
    /// `value` units moved from `from` to `to`. `from` is the null
    /// identity for the construction-time mint.
    Transfer {
        from: Address,
        to: Address,
        #[serde(with = "crate::uint")]
        value: Amount,
    },
    /// `owner` set the allowance of `spender` to `value`.
    Approval {
        owner: Address,
        spender: Address,
        #[serde(with = "crate::uint")]
        value: Amount,
    },
}

/// Events emitted by the non-fungible registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum Erc721Event {
    /// Ownership of `token_id` moved from `from` to `to`.
    Transfer {
        from: Address,
        to: Address,
        #[serde(with = "crate::uint")]
        token_id: TokenId,
    },
    /// `approved` may now move `token_id`. The null identity clears it.
    Approval {
        owner: Address,
        approved: Address,
        #[serde(with = "crate::uint")]
        token_id: TokenId,
    },
    /// `operator` was granted or denied blanket control over `owner`'s tokens.
    ApprovalForAll {
        owner: Address,
        operator: Address,
        approved: bool,
    },
}

// ---------------------------------------------------------------------------
// EventLog
// ---------------------------------------------------------------------------

/// Append-only event buffer owned by a single ledger instance.
///
/// The dispatcher drains what each call emits into that call's receipt.
/// Events emitted outside a dispatched call, such as the construction
/// mint, stay buffered until the host drains them.
#[derive(Debug, Clone)]
pub struct EventLog<E> {
    entries: Vec<E>,
}

impl<E: std::fmt::Debug> EventLog<E> {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends an event.
    pub fn emit(&mut self, event: E) {
        debug!(?event, "event emitted");
        self.entries.push(event);
    }

    /// All events emitted since the last [`drain`](Self::drain).
    pub fn events(&self) -> &[E] {
        &self.entries
    }

    /// Removes and returns every buffered event, oldest first.
    pub fn drain(&mut self) -> Vec<E> {
        std::mem::take(&mut self.entries)
    }

    /// Removes and returns the events emitted after the first `mark`,
    /// leaving the earlier ones buffered.
    pub fn drain_from(&mut self, mark: usize) -> Vec<E> {
        if mark >= self.entries.len() {
            return Vec::new();
        }
        self.entries.split_off(mark)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E: std::fmt::Debug> Default for EventLog<E> {
    fn default() -> Self {
        Self::new()
    }
}
