//! # Call Dispatch
//!
//! The ledgers are driven by a host that decodes calls, supplies the caller
//! identity and observes events. This module is that boundary: a call is a
//! method name plus positional arguments,
//!
//! ```json
//! { "method": "transferFrom", "args": ["0x11..", "0x22..", 250] }
//! ```
//!
//! and executing it yields a [`Receipt`] holding the outcome and the events
//! the call emitted. Decoding (`serde`) is where argument bounds are
//! enforced; by the time a call reaches a ledger its arguments are typed.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use ys_protocol::events::{Erc20Event, Erc721Event};
use ys_protocol::interface::InterfaceId;
use ys_protocol::{Address, Amount, TokenId};

use crate::fungible_ledger::{Erc20Error, FungibleLedger};
use crate::non_fungible_registry::{Erc721Error, NonFungibleRegistry};
use crate::receiver::ReceiverResolver;

// ---------------------------------------------------------------------------
// Call data
// ---------------------------------------------------------------------------

/// Opaque byte payload, carried as `0x`-prefixed hex.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallData(pub Vec<u8>);

impl CallData {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for CallData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(&self.0)))
    }
}

impl<'de> Deserialize<'de> for CallData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let payload = s
            .strip_prefix("0x")
            .ok_or_else(|| serde::de::Error::custom("call data must start with 0x"))?;
        hex::decode(payload)
            .map(CallData)
            .map_err(serde::de::Error::custom)
    }
}

/// Arguments of `safeTransferFrom`. On the wire the trailing data is
/// optional: `[from, to, tokenId]` and `[from, to, tokenId, data]` both
/// decode, the former with empty data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SafeTransferArgs", into = "SafeTransferArgs")]
pub struct SafeTransfer {
    pub from: Address,
    pub to: Address,
    pub token_id: TokenId,
    pub data: CallData,
}

impl SafeTransfer {
    pub fn new(from: Address, to: Address, token_id: TokenId) -> Self {
        Self {
            from,
            to,
            token_id,
            data: CallData::default(),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SafeTransferArgs {
    Plain(Address, Address, #[serde(with = "ys_protocol::uint")] TokenId),
    WithData(Address, Address, #[serde(with = "ys_protocol::uint")] TokenId, CallData),
}

impl From<SafeTransferArgs> for SafeTransfer {
    fn from(args: SafeTransferArgs) -> Self {
        match args {
            SafeTransferArgs::Plain(from, to, token_id) => SafeTransfer::new(from, to, token_id),
            SafeTransferArgs::WithData(from, to, token_id, data) => SafeTransfer {
                from,
                to,
                token_id,
                data,
            },
        }
    }
}

impl From<SafeTransfer> for SafeTransferArgs {
    fn from(call: SafeTransfer) -> Self {
        if call.data.0.is_empty() {
            SafeTransferArgs::Plain(call.from, call.to, call.token_id)
        } else {
            SafeTransferArgs::WithData(call.from, call.to, call.token_id, call.data)
        }
    }
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

/// Every entry point of the fungible ledger. Single-argument methods take
/// the bare value as `args`; the rest take an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "args", rename_all = "camelCase")]
pub enum Erc20Call {
    Name,
    Symbol,
    Decimals,
    TotalSupply,
    BalanceOf(Address),
    Allowance(Address, Address),
    Transfer(Address, #[serde(with = "ys_protocol::uint")] Amount),
    TransferFrom(Address, Address, #[serde(with = "ys_protocol::uint")] Amount),
    Approve(Address, #[serde(with = "ys_protocol::uint")] Amount),
}

impl Erc20Call {
    /// Method name as it appears on the wire.
    pub fn method(&self) -> &'static str {
        match self {
            Erc20Call::Name => "name",
            Erc20Call::Symbol => "symbol",
            Erc20Call::Decimals => "decimals",
            Erc20Call::TotalSupply => "totalSupply",
            Erc20Call::BalanceOf(..) => "balanceOf",
            Erc20Call::Allowance(..) => "allowance",
            Erc20Call::Transfer(..) => "transfer",
            Erc20Call::TransferFrom(..) => "transferFrom",
            Erc20Call::Approve(..) => "approve",
        }
    }
}

/// Every entry point of the non-fungible registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "args", rename_all = "camelCase")]
pub enum Erc721Call {
    Name,
    Symbol,
    #[serde(rename = "tokenURI")]
    TokenUri(#[serde(with = "ys_protocol::uint")] TokenId),
    SupportsInterface(InterfaceId),
    BalanceOf(Address),
    OwnerOf(#[serde(with = "ys_protocol::uint")] TokenId),
    GetApproved(#[serde(with = "ys_protocol::uint")] TokenId),
    IsApprovedForAll(Address, Address),
    Approve(Address, #[serde(with = "ys_protocol::uint")] TokenId),
    SetApprovalForAll(Address, bool),
    TransferFrom(Address, Address, #[serde(with = "ys_protocol::uint")] TokenId),
    SafeTransferFrom(SafeTransfer),
}

impl Erc721Call {
    /// Method name as it appears on the wire.
    pub fn method(&self) -> &'static str {
        match self {
            Erc721Call::Name => "name",
            Erc721Call::Symbol => "symbol",
            Erc721Call::TokenUri(..) => "tokenURI",
            Erc721Call::SupportsInterface(..) => "supportsInterface",
            Erc721Call::BalanceOf(..) => "balanceOf",
            Erc721Call::OwnerOf(..) => "ownerOf",
            Erc721Call::GetApproved(..) => "getApproved",
            Erc721Call::IsApprovedForAll(..) => "isApprovedForAll",
            Erc721Call::Approve(..) => "approve",
            Erc721Call::SetApprovalForAll(..) => "setApprovalForAll",
            Erc721Call::TransferFrom(..) => "transferFrom",
            Erc721Call::SafeTransferFrom(..) => "safeTransferFrom",
        }
    }
}

// ---------------------------------------------------------------------------
// Outputs & receipts
// ---------------------------------------------------------------------------

/// ABI-level return value of a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CallOutput {
    /// The call returns nothing.
    Empty,
    Bool(bool),
    Uint(#[serde(with = "ys_protocol::uint")] u128),
    Address(Address),
    String(String),
}

/// Whether a call committed or was rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<Er> {
    Success { output: CallOutput },
    Reverted { error: Er, message: String },
}

impl<Er> Outcome<Er> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

/// Result of executing one call against one ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt<Ev, Er> {
    pub caller: Address,
    pub method: String,
    #[serde(flatten)]
    pub outcome: Outcome<Er>,
    /// Events emitted by the call. Always empty for a reverted call.
    pub events: Vec<Ev>,
}

impl<Ev, Er: std::fmt::Display> Receipt<Ev, Er> {
    fn new(caller: Address, method: &str, result: Result<CallOutput, Er>, events: Vec<Ev>) -> Self {
        let outcome = match result {
            Ok(output) => Outcome::Success { output },
            Err(error) => Outcome::Reverted {
                message: error.to_string(),
                error,
            },
        };
        Self {
            caller,
            method: method.to_string(),
            outcome,
            events,
        }
    }
}

// ---------------------------------------------------------------------------
// Fungible ledger routing
// ---------------------------------------------------------------------------

impl FungibleLedger {
    /// Routes a decoded call to the matching operation.
    pub fn dispatch(&mut self, caller: Address, call: Erc20Call) -> Result<CallOutput, Erc20Error> {
        let output = match call {
            Erc20Call::Name => CallOutput::String(self.name().to_string()),
            Erc20Call::Symbol => CallOutput::String(self.symbol().to_string()),
            Erc20Call::Decimals => CallOutput::Uint(u128::from(self.decimals())),
            Erc20Call::TotalSupply => CallOutput::Uint(self.total_supply()),
            Erc20Call::BalanceOf(account) => CallOutput::Uint(self.balance_of(&account)),
            Erc20Call::Allowance(owner, spender) => CallOutput::Uint(self.allowance(&owner, &spender)),
            Erc20Call::Transfer(to, amount) => {
                self.transfer(caller, to, amount)?;
                CallOutput::Bool(true)
            }
            Erc20Call::TransferFrom(from, to, amount) => {
                self.transfer_from(caller, from, to, amount)?;
                CallOutput::Bool(true)
            }
            Erc20Call::Approve(spender, amount) => {
                self.approve(caller, spender, amount)?;
                CallOutput::Bool(true)
            }
        };
        Ok(output)
    }

    /// Dispatches `call` and packages the outcome with the events it
    /// emitted. Events already buffered before the call stay in the log.
    pub fn execute(&mut self, caller: Address, call: Erc20Call) -> Receipt<Erc20Event, Erc20Error> {
        let method = call.method();
        let mark = self.events().len();
        let result = self.dispatch(caller, call);
        if let Err(e) = &result {
            debug!(caller = %caller, method, error = %e, "erc20 call reverted");
        }
        Receipt::new(caller, method, result, self.take_events_from(mark))
    }
}

// ---------------------------------------------------------------------------
// Non-fungible registry routing
// ---------------------------------------------------------------------------

impl NonFungibleRegistry {
    /// Routes a decoded call to the matching operation. `receivers` answers
    /// the contract-code lookups safe transfers need.
    pub fn dispatch<R: ReceiverResolver + ?Sized>(
        &mut self,
        caller: Address,
        call: Erc721Call,
        receivers: &mut R,
    ) -> Result<CallOutput, Erc721Error> {
        let output = match call {
            Erc721Call::Name => CallOutput::String(self.name().to_string()),
            Erc721Call::Symbol => CallOutput::String(self.symbol().to_string()),
            Erc721Call::TokenUri(id) => CallOutput::String(self.token_uri(id)?),
            Erc721Call::SupportsInterface(id) => CallOutput::Bool(self.supports_interface(id)),
            Erc721Call::BalanceOf(owner) => CallOutput::Uint(u128::from(self.balance_of(&owner))),
            Erc721Call::OwnerOf(id) => CallOutput::Address(self.owner_of(id)?),
            // The ABI has no optional address: "no approval" is the zero address.
            Erc721Call::GetApproved(id) => {
                CallOutput::Address(self.get_approved(id)?.unwrap_or(Address::ZERO))
            }
            Erc721Call::IsApprovedForAll(owner, operator) => {
                CallOutput::Bool(self.is_approved_for_all(&owner, &operator))
            }
            Erc721Call::Approve(spender, id) => {
                self.approve(caller, spender, id)?;
                CallOutput::Empty
            }
            Erc721Call::SetApprovalForAll(operator, approved) => {
                self.set_approval_for_all(caller, operator, approved)?;
                CallOutput::Empty
            }
            Erc721Call::TransferFrom(from, to, id) => {
                self.transfer_from(caller, from, to, id)?;
                CallOutput::Empty
            }
            Erc721Call::SafeTransferFrom(args) => {
                self.safe_transfer_from_with_data(
                    caller,
                    args.from,
                    args.to,
                    args.token_id,
                    args.data.as_slice(),
                    receivers,
                )?;
                CallOutput::Empty
            }
        };
        Ok(output)
    }

    /// Dispatches `call` and packages the outcome with the events it
    /// emitted. Events already buffered before the call stay in the log.
    pub fn execute<R: ReceiverResolver + ?Sized>(
        &mut self,
        caller: Address,
        call: Erc721Call,
        receivers: &mut R,
    ) -> Receipt<Erc721Event, Erc721Error> {
        let method = call.method();
        let mark = self.events().len();
        let result = self.dispatch(caller, call, receivers);
        if let Err(e) = &result {
            debug!(caller = %caller, method, error = %e, "erc721 call reverted");
        }
        Receipt::new(caller, method, result, self.take_events_from(mark))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erc20_calls_decode_positionally() {
        let call: Erc20Call = serde_json::from_str(
            r#"{"method":"transferFrom","args":["0x1111111111111111111111111111111111111111","0x2222222222222222222222222222222222222222",250]}"#,
        )
        .unwrap();
        assert_eq!(
            call,
            Erc20Call::TransferFrom(Address::repeat_byte(0x11), Address::repeat_byte(0x22), 250)
        );
        assert_eq!(call.method(), "transferFrom");

        let call: Erc20Call = serde_json::from_str(r#"{"method":"totalSupply"}"#).unwrap();
        assert_eq!(call, Erc20Call::TotalSupply);
    }

    #[test]
    fn erc721_method_names_match_the_standard() {
        let call: Erc721Call =
            serde_json::from_str(r#"{"method":"tokenURI","args":1}"#).unwrap();
        assert_eq!(call, Erc721Call::TokenUri(1));

        let call: Erc721Call =
            serde_json::from_str(r#"{"method":"supportsInterface","args":"0x80ac58cd"}"#).unwrap();
        assert_eq!(call.method(), "supportsInterface");
    }

    #[test]
    fn safe_transfer_takes_optional_data() {
        let from = Address::repeat_byte(0x11);
        let to = Address::repeat_byte(0xc0);

        let call: Erc721Call = serde_json::from_str(&format!(
            r#"{{"method":"safeTransferFrom","args":["{from}","{to}",1]}}"#
        ))
        .unwrap();
        assert_eq!(call, Erc721Call::SafeTransferFrom(SafeTransfer::new(from, to, 1)));
        assert_eq!(call.method(), "safeTransferFrom");

        let call: Erc721Call = serde_json::from_str(&format!(
            r#"{{"method":"safeTransferFrom","args":["{from}","{to}",1,"0x48656c6c6f20776f726c6421"]}}"#
        ))
        .unwrap();
        assert_eq!(
            call,
            Erc721Call::SafeTransferFrom(SafeTransfer {
                from,
                to,
                token_id: 1,
                data: CallData(b"Hello world!".to_vec()),
            })
        );

        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["args"].as_array().unwrap().len(), 4);
        let json = serde_json::to_value(Erc721Call::SafeTransferFrom(SafeTransfer::new(from, to, 1))).unwrap();
        assert_eq!(json["args"].as_array().unwrap().len(), 3);

        for args in [format!(r#"["{from}","{to}"]"#), format!(r#"["{from}","{to}",1,"0x","0x"]"#)] {
            let res: Result<Erc721Call, _> =
                serde_json::from_str(&format!(r#"{{"method":"safeTransferFrom","args":{args}}}"#));
            assert!(res.is_err(), "{args}");
        }
        let res: Result<Erc721Call, _> =
            serde_json::from_str(r#"{"method":"safeTransferFromWithData","args":[]}"#);
        assert!(res.is_err());
    }

    #[test]
    fn call_data_round_trips_as_hex() {
        let data = CallData(b"Hello world!".to_vec());
        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(json, "\"0x48656c6c6f20776f726c6421\"");
        let back: CallData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
        assert!(serde_json::from_str::<CallData>("\"48\"").is_err());
    }

    #[test]
    fn bad_arguments_are_rejected_at_decode() {
        // Negative amounts never reach the ledger.
        let res: Result<Erc20Call, _> = serde_json::from_str(
            r#"{"method":"approve","args":["0x1111111111111111111111111111111111111111",-1]}"#,
        );
        assert!(res.is_err());

        let res: Result<Erc20Call, _> = serde_json::from_str(r#"{"method":"mint","args":[]}"#);
        assert!(res.is_err());
    }
}
