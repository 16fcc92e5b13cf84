//! # Safe-Transfer Receivers
//!
//! A safe transfer to a contract-capable address asks the receiving code to
//! acknowledge the token before the transfer is allowed to stand. The
//! registry does not know which addresses hold code; the host answers that
//! through a [`ReceiverResolver`].
//!
//! A receiver acknowledges by returning [`ERC721_RECEIVED_SELECTOR`]. Any
//! other return value, or an error, rejects the transfer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use ys_protocol::interface::{InterfaceId, ERC721_RECEIVED_SELECTOR, INVALID_INTERFACE_ID};
use ys_protocol::{Address, TokenId};

/// A receiver callback failed outright.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("receiver reverted: {reason}")]
pub struct ReceiverError {
    /// Reason reported by the receiver. May be empty.
    pub reason: String,
}

/// Code that can accept non-fungible tokens via a safe transfer.
pub trait Erc721Receiver {
    /// Called after the registry has validated a safe transfer to this
    /// receiver. Return [`ERC721_RECEIVED_SELECTOR`] to accept.
    fn on_erc721_received(
        &mut self,
        operator: Address,
        from: Address,
        token_id: TokenId,
        data: &[u8],
    ) -> Result<InterfaceId, ReceiverError>;
}

/// Host lookup from address to receiver code.
pub trait ReceiverResolver {
    /// The receiver deployed at `address`, or `None` for an externally
    /// owned account.
    fn resolve(&mut self, address: &Address) -> Option<&mut dyn Erc721Receiver>;
}

/// Resolver for a host without contract code: every address is an
/// externally owned account and safe transfers never call back.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReceivers;

impl ReceiverResolver for NoReceivers {
    fn resolve(&mut self, _address: &Address) -> Option<&mut dyn Erc721Receiver> {
        None
    }
}

// ---------------------------------------------------------------------------
// ReceiverDirectory
// ---------------------------------------------------------------------------

/// In-memory map of receiver code by address.
#[derive(Debug, Clone)]
pub struct ReceiverDirectory<R> {
    receivers: HashMap<Address, R>,
}

impl<R: Erc721Receiver> ReceiverDirectory<R> {
    pub fn new() -> Self {
        Self {
            receivers: HashMap::new(),
        }
    }

    /// Installs `receiver` at `address`, replacing any previous one.
    pub fn register(&mut self, address: Address, receiver: R) {
        self.receivers.insert(address, receiver);
    }

    /// Returns `true` if `address` has receiver code.
    pub fn is_contract(&self, address: &Address) -> bool {
        self.receivers.contains_key(address)
    }

    pub fn get(&self, address: &Address) -> Option<&R> {
        self.receivers.get(address)
    }

    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }
}

impl<R: Erc721Receiver> Default for ReceiverDirectory<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Erc721Receiver> ReceiverResolver for ReceiverDirectory<R> {
    fn resolve(&mut self, address: &Address) -> Option<&mut dyn Erc721Receiver> {
        self.receivers
            .get_mut(address)
            .map(|r| r as &mut dyn Erc721Receiver)
    }
}

// ---------------------------------------------------------------------------
// ScriptedReceiver
// ---------------------------------------------------------------------------

/// How a [`ScriptedReceiver`] answers the acceptance callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiverBehavior {
    /// Return the acceptance selector.
    Accept,
    /// Return a selector other than the acceptance one.
    WrongSelector,
    /// Fail with the given reason.
    Revert { reason: String },
}

/// A single accepted delivery, as seen by the receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub operator: Address,
    pub from: Address,
    #[serde(with = "ys_protocol::uint")]
    pub token_id: TokenId,
    pub data: Vec<u8>,
}

/// Receiver with a fixed answer. Records every delivery it accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedReceiver {
    behavior: ReceiverBehavior,
    deliveries: Vec<Delivery>,
}

impl ScriptedReceiver {
    pub fn new(behavior: ReceiverBehavior) -> Self {
        Self {
            behavior,
            deliveries: Vec::new(),
        }
    }

    pub fn accepting() -> Self {
        Self::new(ReceiverBehavior::Accept)
    }

    /// Deliveries accepted so far, oldest first.
    pub fn deliveries(&self) -> &[Delivery] {
        &self.deliveries
    }
}

impl Erc721Receiver for ScriptedReceiver {
    fn on_erc721_received(
        &mut self,
        operator: Address,
        from: Address,
        token_id: TokenId,
        data: &[u8],
    ) -> Result<InterfaceId, ReceiverError> {
        match &self.behavior {
            ReceiverBehavior::Accept => {
                self.deliveries.push(Delivery {
                    operator,
                    from,
                    token_id,
                    data: data.to_vec(),
                });
                Ok(ERC721_RECEIVED_SELECTOR)
            }
            ReceiverBehavior::WrongSelector => Ok(INVALID_INTERFACE_ID),
            ReceiverBehavior::Revert { reason } => Err(ReceiverError {
                reason: reason.clone(),
            }),
        }
    }
}
