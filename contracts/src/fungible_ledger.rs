//! # Fungible Ledger (ERC20)
//!
//! Balance and allowance bookkeeping for a single fungible token. The whole
//! supply is minted to the deployer at construction; there is no further
//! minting or burning, so the total supply is fixed for the lifetime of the
//! instance.
//!
//! ## Invariants
//!
//! - **Conservation**: the sum of all balances equals `total_supply`.
//! - **No overdraft**: a debit larger than the balance is rejected before
//!   anything is written.
//! - **Allowances only grow through `approve`**: `transfer_from` can only
//!   consume them.
//!
//! ## Validation order
//!
//! `transfer`: sender, receiver, balance.
//! `transfer_from`: sender, receiver, allowance, balance.
//!
//! Every check runs before the first write, so a failed call leaves no
//! trace: no balance change, no allowance change, no event.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

use ys_protocol::config::{
    scaled_supply, DEFAULT_DECIMALS, DEFAULT_ERC20_NAME, DEFAULT_ERC20_SYMBOL,
    DEFAULT_INITIAL_SUPPLY, UNLIMITED_ALLOWANCE,
};
use ys_protocol::events::{Erc20Event, EventLog};
use ys_protocol::{Address, Amount};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by the fungible ledger. Each carries the offending operands.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Erc20Error {
    /// The receiver is the null identity.
    #[error("invalid receiver: {0}")]
    InvalidReceiver(Address),

    /// The sender is the null identity.
    #[error("invalid sender: {0}")]
    InvalidSender(Address),

    /// The approving owner is the null identity.
    #[error("invalid approver: {0}")]
    InvalidApprover(Address),

    /// The spender being approved is the null identity.
    #[error("invalid spender: {0}")]
    InvalidSpender(Address),

    /// The sender does not hold enough tokens.
    #[error("insufficient balance: {sender} has {balance}, needs {needed}")]
    InsufficientBalance {
        /// Account being debited.
        sender: Address,
        /// Its current balance.
        #[serde(with = "ys_protocol::uint")]
        balance: Amount,
        /// Amount the call tried to move.
        #[serde(with = "ys_protocol::uint")]
        needed: Amount,
    },

    /// The spender's remaining allowance is too small.
    #[error("insufficient allowance: {spender} may spend {allowance}, needs {needed}")]
    InsufficientAllowance {
        /// Account spending on the owner's behalf.
        spender: Address,
        /// Its remaining allowance.
        #[serde(with = "ys_protocol::uint")]
        allowance: Amount,
        /// Amount the call tried to move.
        #[serde(with = "ys_protocol::uint")]
        needed: Amount,
    },

    /// `initial_supply * 10^decimals` does not fit in an [`Amount`].
    #[error("supply overflow: {initial_supply} whole tokens at {decimals} decimals")]
    SupplyOverflow {
        /// Whole tokens requested.
        #[serde(with = "ys_protocol::uint")]
        initial_supply: Amount,
        /// Decimal places requested.
        decimals: u8,
    },

    /// Crediting `account` would overflow its balance.
    #[error("balance overflow: {account} holds {balance}, credit {credit}")]
    BalanceOverflow {
        /// Account being credited.
        account: Address,
        /// Its balance before the credit.
        #[serde(with = "ys_protocol::uint")]
        balance: Amount,
        /// The credit that overflowed.
        #[serde(with = "ys_protocol::uint")]
        credit: Amount,
    },
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Construction-time parameters. Fixed for the lifetime of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FungibleConfig {
    /// Human-readable token name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Number of decimal places used for display.
    pub decimals: u8,
    /// Whole tokens minted to the deployer, before decimal scaling.
    #[serde(with = "ys_protocol::uint")]
    pub initial_supply: Amount,
}

impl Default for FungibleConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_ERC20_NAME.to_string(),
            symbol: DEFAULT_ERC20_SYMBOL.to_string(),
            decimals: DEFAULT_DECIMALS,
            initial_supply: DEFAULT_INITIAL_SUPPLY,
        }
    }
}

// ---------------------------------------------------------------------------
// FungibleLedger
// ---------------------------------------------------------------------------

/// A deployed fungible token instance.
///
/// All mutating methods take the calling identity explicitly; the host is
/// responsible for supplying it and for serializing calls.
#[derive(Debug, Clone)]
pub struct FungibleLedger {
    name: String,
    symbol: String,
    decimals: u8,
    total_supply: Amount,
    /// Per-account balances. Missing entries are zero.
    balances: HashMap<Address, Amount>,
    /// `owner -> (spender -> remaining allowance)`. Missing entries are zero.
    allowances: HashMap<Address, HashMap<Address, Amount>>,
    events: EventLog<Erc20Event>,
}

impl FungibleLedger {
    /// Deploys a new ledger and mints the entire supply to `deployer`.
    ///
    /// Emits `Transfer(0x0, deployer, supply)`.
    ///
    /// # Errors
    ///
    /// Returns [`Erc20Error::SupplyOverflow`] if the scaled supply does not
    /// fit in an [`Amount`], and [`Erc20Error::InvalidReceiver`] if the
    /// deployer is the null identity.
    pub fn new(config: FungibleConfig, deployer: Address) -> Result<Self, Erc20Error> {
        let supply = scaled_supply(config.initial_supply, config.decimals).ok_or(
            Erc20Error::SupplyOverflow {
                initial_supply: config.initial_supply,
                decimals: config.decimals,
            },
        )?;

        if deployer.is_zero() {
            return Err(Erc20Error::InvalidReceiver(deployer));
        }

        let mut ledger = Self {
            name: config.name,
            symbol: config.symbol,
            decimals: config.decimals,
            total_supply: supply,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            events: EventLog::new(),
        };

        ledger.balances.insert(deployer, supply);
        ledger.events.emit(Erc20Event::Transfer {
            from: Address::ZERO,
            to: deployer,
            value: supply,
        });

        info!(
            name = %ledger.name,
            symbol = %ledger.symbol,
            decimals = ledger.decimals,
            total_supply = %supply,
            deployer = %deployer,
            "fungible ledger deployed"
        );

        Ok(ledger)
    }

    // -- Metadata ----------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    // -- Queries -----------------------------------------------------------

    /// Balance of `account`, zero if it never held tokens.
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Remaining amount `spender` may move out of `owner`'s balance.
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Every account with a balance entry, including ones drained to zero.
    pub fn holders(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.balances.iter()
    }

    /// Events emitted since the last [`take_events`](Self::take_events).
    pub fn events(&self) -> &[Erc20Event] {
        self.events.events()
    }

    /// Drains the event buffer.
    pub fn take_events(&mut self) -> Vec<Erc20Event> {
        self.events.drain()
    }

    /// Drains the events emitted after the first `mark`.
    pub(crate) fn take_events_from(&mut self, mark: usize) -> Vec<Erc20Event> {
        self.events.drain_from(mark)
    }

    // -- Operations --------------------------------------------------------

    /// Moves `amount` from the caller to `to`.
    ///
    /// # Errors
    ///
    /// [`Erc20Error::InvalidReceiver`] if `to` is the null identity,
    /// [`Erc20Error::InsufficientBalance`] if the caller holds less than
    /// `amount`.
    pub fn transfer(&mut self, caller: Address, to: Address, amount: Amount) -> Result<(), Erc20Error> {
        self.move_tokens(caller, to, amount)
    }

    /// Moves `amount` from `from` to `to` on behalf of `caller`.
    ///
    /// When `caller == from` the allowance is not consulted; this is the
    /// same as `from` calling [`transfer`](Self::transfer). An allowance of
    /// [`UNLIMITED_ALLOWANCE`] is never decremented.
    ///
    /// # Errors
    ///
    /// In validation order: [`Erc20Error::InvalidSender`],
    /// [`Erc20Error::InvalidReceiver`], [`Erc20Error::InsufficientAllowance`],
    /// [`Erc20Error::InsufficientBalance`].
    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), Erc20Error> {
        if from.is_zero() {
            return Err(Erc20Error::InvalidSender(from));
        }
        if to.is_zero() {
            return Err(Erc20Error::InvalidReceiver(to));
        }

        // Allowance is checked up front but only written once the balance
        // move has succeeded.
        let remaining = if caller == from {
            None
        } else {
            let current = self.allowance(&from, &caller);
            if current < amount {
                debug!(spender = %caller, owner = %from, allowance = %current, needed = %amount, "transferFrom rejected");
                return Err(Erc20Error::InsufficientAllowance {
                    spender: caller,
                    allowance: current,
                    needed: amount,
                });
            }
            (current != UNLIMITED_ALLOWANCE).then(|| current - amount)
        };

        self.move_tokens(from, to, amount)?;

        if let Some(remaining) = remaining {
            self.allowances
                .entry(from)
                .or_default()
                .insert(caller, remaining);
        }

        Ok(())
    }

    /// Sets the allowance of `spender` over the caller's tokens to exactly
    /// `amount`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// [`Erc20Error::InvalidSpender`] if `spender` is the null identity.
    pub fn approve(&mut self, caller: Address, spender: Address, amount: Amount) -> Result<(), Erc20Error> {
        if caller.is_zero() {
            return Err(Erc20Error::InvalidApprover(caller));
        }
        if spender.is_zero() {
            return Err(Erc20Error::InvalidSpender(spender));
        }

        self.allowances
            .entry(caller)
            .or_default()
            .insert(spender, amount);
        self.events.emit(Erc20Event::Approval {
            owner: caller,
            spender,
            value: amount,
        });

        debug!(owner = %caller, spender = %spender, amount = %amount, "allowance set");
        Ok(())
    }

    // -- Internals ---------------------------------------------------------

    /// Debits `from`, credits `to`, emits `Transfer`. Nothing is written
    /// unless every check passes.
    fn move_tokens(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), Erc20Error> {
        if from.is_zero() {
            return Err(Erc20Error::InvalidSender(from));
        }
        if to.is_zero() {
            return Err(Erc20Error::InvalidReceiver(to));
        }

        let from_balance = self.balance_of(&from);
        let debited = from_balance
            .checked_sub(amount)
            .ok_or(Erc20Error::InsufficientBalance {
                sender: from,
                balance: from_balance,
                needed: amount,
            })?;

        if from != to {
            let to_balance = self.balance_of(&to);
            let credited = to_balance
                .checked_add(amount)
                .ok_or(Erc20Error::BalanceOverflow {
                    account: to,
                    balance: to_balance,
                    credit: amount,
                })?;
            self.balances.insert(from, debited);
            self.balances.insert(to, credited);
        }

        self.events.emit(Erc20Event::Transfer {
            from,
            to,
            value: amount,
        });

        debug!(from = %from, to = %to, amount = %amount, "transfer committed");
        Ok(())
    }
}
