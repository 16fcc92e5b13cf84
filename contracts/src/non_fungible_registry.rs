//! # Non-Fungible Registry (ERC721)
//!
//! Ownership and approval bookkeeping for a collection of unique tokens.
//! One token ([`FIRST_TOKEN_ID`]) is minted to the deployer at construction;
//! no further minting or burning is exposed, so a token moves through
//! exactly two kinds of state:
//!
//! ```text
//! Nonexistent --mint--> Owned(a) --transfer--> Owned(b) --transfer--> ...
//! ```
//!
//! ## Authorization
//!
//! A token may be moved by its owner, by the single account approved for
//! that token, or by any operator the owner approved for all of its tokens.
//! The per-token approval is cleared on every transfer; operator approvals
//! survive until the owner revokes them.
//!
//! ## Validation order for transfers
//!
//! existence, sender is owner, receiver is not null, caller is authorized,
//! then (safe transfers only) the receiver's acknowledgement. Nothing is
//! written until all of them pass.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

use ys_protocol::config::{DEFAULT_BASE_URI, DEFAULT_ERC721_NAME, DEFAULT_ERC721_SYMBOL, FIRST_TOKEN_ID};
use ys_protocol::events::{Erc721Event, EventLog};
use ys_protocol::interface::{
    InterfaceId, ERC165_INTERFACE_ID, ERC721_INTERFACE_ID, ERC721_METADATA_INTERFACE_ID,
    ERC721_RECEIVED_SELECTOR,
};
use ys_protocol::{Address, TokenId};

use crate::receiver::ReceiverResolver;

/// Interfaces reported by [`NonFungibleRegistry::supports_interface`].
pub const SUPPORTED_INTERFACES: [InterfaceId; 3] = [
    ERC165_INTERFACE_ID,
    ERC721_INTERFACE_ID,
    ERC721_METADATA_INTERFACE_ID,
];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by the non-fungible registry.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Erc721Error {
    /// The token has never been minted.
    #[error("nonexistent token: {0}")]
    NonexistentToken(#[serde(with = "ys_protocol::uint")] TokenId),

    /// The stated sender does not own the token.
    #[error("invalid sender: {0}")]
    InvalidSender(Address),

    /// The receiver is the null identity, or refused a safe transfer.
    #[error("invalid receiver: {0}")]
    InvalidReceiver(Address),

    /// The caller may not set approvals for this token.
    #[error("invalid approver: {0}")]
    InvalidApprover(Address),

    /// The operator is the null identity.
    #[error("invalid operator: {0}")]
    InvalidOperator(Address),

    /// The caller is neither owner, approved spender, nor operator.
    #[error("insufficient approval: {operator} may not move token {token_id}")]
    InsufficientApproval {
        /// Account attempting the transfer.
        operator: Address,
        /// Token it tried to move.
        #[serde(with = "ys_protocol::uint")]
        token_id: TokenId,
    },

    /// The receiver's acceptance callback failed with a reason.
    #[error("receiver {receiver} reverted: {reason}")]
    ReceiverReverted {
        /// Receiving contract.
        receiver: Address,
        /// Reason it reported.
        reason: String,
    },

    /// An owner's token count would overflow.
    #[error("balance overflow for {0}")]
    BalanceOverflow(Address),
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Construction-time parameters. Fixed for the lifetime of the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Collection name.
    pub name: String,
    /// Collection symbol.
    pub symbol: String,
    /// Prefix of every token URI.
    pub base_uri: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_ERC721_NAME.to_string(),
            symbol: DEFAULT_ERC721_SYMBOL.to_string(),
            base_uri: DEFAULT_BASE_URI.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// NonFungibleRegistry
// ---------------------------------------------------------------------------

/// A fully validated transfer, ready to apply without further checks.
struct PendingTransfer {
    from: Address,
    to: Address,
    token_id: TokenId,
    from_count: u64,
    to_count: u64,
}

/// A deployed non-fungible collection.
#[derive(Debug, Clone)]
pub struct NonFungibleRegistry {
    name: String,
    symbol: String,
    base_uri: String,
    /// Token id to owner. An entry exists iff the token was minted.
    owners: HashMap<TokenId, Address>,
    /// Number of tokens held per account, kept in step with `owners`.
    balances: HashMap<Address, u64>,
    /// Single-token approvals. Absent means no approval.
    token_approvals: HashMap<TokenId, Address>,
    /// `owner -> (operator -> approved)`.
    operator_approvals: HashMap<Address, HashMap<Address, bool>>,
    events: EventLog<Erc721Event>,
}

impl NonFungibleRegistry {
    /// Deploys a registry and mints token [`FIRST_TOKEN_ID`] to `deployer`.
    ///
    /// Emits `Transfer(0x0, deployer, 1)`.
    ///
    /// # Errors
    ///
    /// Returns [`Erc721Error::InvalidReceiver`] if `deployer` is the null
    /// identity.
    pub fn new(config: RegistryConfig, deployer: Address) -> Result<Self, Erc721Error> {
        let mut registry = Self {
            name: config.name,
            symbol: config.symbol,
            base_uri: config.base_uri,
            owners: HashMap::new(),
            balances: HashMap::new(),
            token_approvals: HashMap::new(),
            operator_approvals: HashMap::new(),
            events: EventLog::new(),
        };

        registry.mint(deployer, FIRST_TOKEN_ID)?;

        info!(
            name = %registry.name,
            symbol = %registry.symbol,
            base_uri = %registry.base_uri,
            deployer = %deployer,
            "non-fungible registry deployed"
        );

        Ok(registry)
    }

    // -- Metadata ----------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Metadata URI of `token_id`: the base URI followed by the decimal id.
    /// An empty base URI yields an empty string.
    pub fn token_uri(&self, token_id: TokenId) -> Result<String, Erc721Error> {
        self.owner_of(token_id)?;
        if self.base_uri.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("{}{}", self.base_uri, token_id))
    }

    /// Static ERC165 capability lookup.
    pub fn supports_interface(&self, interface_id: InterfaceId) -> bool {
        SUPPORTED_INTERFACES.contains(&interface_id)
    }

    // -- Queries -----------------------------------------------------------

    /// Owner of `token_id`.
    pub fn owner_of(&self, token_id: TokenId) -> Result<Address, Erc721Error> {
        self.owners
            .get(&token_id)
            .copied()
            .ok_or(Erc721Error::NonexistentToken(token_id))
    }

    /// Number of tokens held by `owner`.
    pub fn balance_of(&self, owner: &Address) -> u64 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    /// Number of minted tokens.
    pub fn token_count(&self) -> usize {
        self.owners.len()
    }

    /// Account approved for `token_id`, if any.
    pub fn get_approved(&self, token_id: TokenId) -> Result<Option<Address>, Erc721Error> {
        self.owner_of(token_id)?;
        Ok(self.token_approvals.get(&token_id).copied())
    }

    pub fn is_approved_for_all(&self, owner: &Address, operator: &Address) -> bool {
        self.operator_approvals
            .get(owner)
            .and_then(|operators| operators.get(operator))
            .copied()
            .unwrap_or(false)
    }

    pub fn events(&self) -> &[Erc721Event] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<Erc721Event> {
        self.events.drain()
    }

    pub(crate) fn take_events_from(&mut self, mark: usize) -> Vec<Erc721Event> {
        self.events.drain_from(mark)
    }

    // -- Approvals ---------------------------------------------------------

    /// Approves `spender` to move `token_id`. The null identity clears the
    /// approval.
    ///
    /// # Errors
    ///
    /// [`Erc721Error::NonexistentToken`] for an unminted id,
    /// [`Erc721Error::InvalidApprover`] if the caller is neither the owner
    /// nor one of the owner's operators.
    pub fn approve(&mut self, caller: Address, spender: Address, token_id: TokenId) -> Result<(), Erc721Error> {
        let owner = self.owner_of(token_id)?;
        if caller != owner && !self.is_approved_for_all(&owner, &caller) {
            debug!(caller = %caller, token_id = %token_id, "approve rejected");
            return Err(Erc721Error::InvalidApprover(caller));
        }

        if spender.is_zero() {
            self.token_approvals.remove(&token_id);
        } else {
            self.token_approvals.insert(token_id, spender);
        }
        debug!(owner = %owner, approved = %spender, token_id = %token_id, "token approval set");
        self.events.emit(Erc721Event::Approval {
            owner,
            approved: spender,
            token_id,
        });
        Ok(())
    }

    /// Grants or revokes `operator` control over all of the caller's tokens.
    ///
    /// # Errors
    ///
    /// [`Erc721Error::InvalidOperator`] if `operator` is the null identity.
    pub fn set_approval_for_all(
        &mut self,
        caller: Address,
        operator: Address,
        approved: bool,
    ) -> Result<(), Erc721Error> {
        if operator.is_zero() {
            return Err(Erc721Error::InvalidOperator(operator));
        }

        self.operator_approvals
            .entry(caller)
            .or_default()
            .insert(operator, approved);
        self.events.emit(Erc721Event::ApprovalForAll {
            owner: caller,
            operator,
            approved,
        });

        debug!(owner = %caller, operator = %operator, approved, "operator approval set");
        Ok(())
    }

    // -- Transfers ---------------------------------------------------------

    /// Moves `token_id` from `from` to `to` on behalf of `caller`, without
    /// consulting the receiver.
    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        token_id: TokenId,
    ) -> Result<(), Erc721Error> {
        let pending = self.prepare_transfer(caller, from, to, token_id)?;
        self.apply_transfer(pending);
        Ok(())
    }

    /// [`transfer_from`](Self::transfer_from) plus the receiver
    /// acknowledgement, with an empty payload.
    pub fn safe_transfer_from<R: ReceiverResolver + ?Sized>(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        token_id: TokenId,
        receivers: &mut R,
    ) -> Result<(), Erc721Error> {
        self.safe_transfer_from_with_data(caller, from, to, token_id, &[], receivers)
    }

    /// Safe transfer carrying `data` to the receiver's callback.
    ///
    /// If `to` resolves to receiver code, the callback gets
    /// `(caller, from, token_id, data)` and must answer with the acceptance
    /// selector. Externally owned accounts are not called.
    ///
    /// # Errors
    ///
    /// Everything [`transfer_from`](Self::transfer_from) can return, plus
    /// [`Erc721Error::InvalidReceiver`] when the receiver answers with the
    /// wrong selector or fails without a reason, and
    /// [`Erc721Error::ReceiverReverted`] when it fails with one.
    pub fn safe_transfer_from_with_data<R: ReceiverResolver + ?Sized>(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        token_id: TokenId,
        data: &[u8],
        receivers: &mut R,
    ) -> Result<(), Erc721Error> {
        let pending = self.prepare_transfer(caller, from, to, token_id)?;

        if let Some(receiver) = receivers.resolve(&to) {
            match receiver.on_erc721_received(caller, from, token_id, data) {
                Ok(selector) if selector == ERC721_RECEIVED_SELECTOR => {}
                Ok(selector) => {
                    debug!(receiver = %to, %selector, "receiver returned wrong selector");
                    return Err(Erc721Error::InvalidReceiver(to));
                }
                Err(e) if e.reason.is_empty() => return Err(Erc721Error::InvalidReceiver(to)),
                Err(e) => {
                    return Err(Erc721Error::ReceiverReverted {
                        receiver: to,
                        reason: e.reason,
                    })
                }
            }
        }

        self.apply_transfer(pending);
        Ok(())
    }

    // -- Internals ---------------------------------------------------------

    fn mint(&mut self, to: Address, token_id: TokenId) -> Result<(), Erc721Error> {
        if to.is_zero() {
            return Err(Erc721Error::InvalidReceiver(to));
        }
        let to_count = self
            .balance_of(&to)
            .checked_add(1)
            .ok_or(Erc721Error::BalanceOverflow(to))?;

        self.owners.insert(token_id, to);
        self.balances.insert(to, to_count);
        self.events.emit(Erc721Event::Transfer {
            from: Address::ZERO,
            to,
            token_id,
        });
        Ok(())
    }

    fn is_authorized(&self, owner: &Address, spender: &Address, token_id: TokenId) -> bool {
        spender == owner
            || self.is_approved_for_all(owner, spender)
            || self.token_approvals.get(&token_id) == Some(spender)
    }

    /// Runs every transfer check and precomputes the new counts.
    fn prepare_transfer(
        &self,
        caller: Address,
        from: Address,
        to: Address,
        token_id: TokenId,
    ) -> Result<PendingTransfer, Erc721Error> {
        let owner = self.owner_of(token_id)?;
        if owner != from {
            return Err(Erc721Error::InvalidSender(from));
        }
        if to.is_zero() {
            return Err(Erc721Error::InvalidReceiver(to));
        }
        if !self.is_authorized(&owner, &caller, token_id) {
            debug!(caller = %caller, token_id = %token_id, "transfer rejected: not authorized");
            return Err(Erc721Error::InsufficientApproval {
                operator: caller,
                token_id,
            });
        }

        // `from` owns the token, so its count is at least one.
        let from_count = self.balance_of(&from).saturating_sub(1);
        let to_count = if from == to {
            self.balance_of(&to)
        } else {
            self.balance_of(&to)
                .checked_add(1)
                .ok_or(Erc721Error::BalanceOverflow(to))?
        };

        Ok(PendingTransfer {
            from,
            to,
            token_id,
            from_count,
            to_count,
        })
    }

    fn apply_transfer(&mut self, pending: PendingTransfer) {
        let PendingTransfer {
            from,
            to,
            token_id,
            from_count,
            to_count,
        } = pending;

        self.token_approvals.remove(&token_id);
        if from != to {
            self.balances.insert(from, from_count);
            self.balances.insert(to, to_count);
        }
        self.owners.insert(token_id, to);
        self.events.emit(Erc721Event::Transfer { from, to, token_id });

        debug!(from = %from, to = %to, token_id = %token_id, "token transferred");
    }
}
