//! # Interface Identifiers
//!
//! ERC165-style capability advertisement. An interface identifier is the
//! XOR of the 4-byte selectors of every function in the interface; the
//! values below are the published identifiers, kept as constants so that
//! `supportsInterface` is a table lookup rather than a runtime probe.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while parsing an interface identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterfaceIdError {
    /// The string is not `0x` followed by exactly eight hex digits.
    #[error("invalid interface id: {0}")]
    Malformed(String),
}

/// A 4-byte interface identifier or function selector.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterfaceId(pub [u8; 4]);

/// ERC165 itself (`supportsInterface(bytes4)`).
pub const ERC165_INTERFACE_ID: InterfaceId = InterfaceId([0x01, 0xff, 0xc9, 0xa7]);

/// The ERC721 non-fungible token standard.
pub const ERC721_INTERFACE_ID: InterfaceId = InterfaceId([0x80, 0xac, 0x58, 0xcd]);

/// The optional ERC721 metadata extension (`name`, `symbol`, `tokenURI`).
pub const ERC721_METADATA_INTERFACE_ID: InterfaceId = InterfaceId([0x5b, 0x5e, 0x13, 0x9f]);

/// Reserved by ERC165; must never be reported as supported.
pub const INVALID_INTERFACE_ID: InterfaceId = InterfaceId([0xff, 0xff, 0xff, 0xff]);

/// Selector of `onERC721Received(address,address,uint256,bytes)`. A receiver
/// acknowledges a safe transfer by returning exactly this value.
pub const ERC721_RECEIVED_SELECTOR: InterfaceId = InterfaceId([0x15, 0x0b, 0x7a, 0x02]);

impl InterfaceId {
    /// Parses `0x` followed by eight hex digits.
    pub fn from_hex(s: &str) -> Result<Self, InterfaceIdError> {
        let payload = s
            .strip_prefix("0x")
            .ok_or_else(|| InterfaceIdError::Malformed(s.to_string()))?;
        let mut out = [0u8; 4];
        hex::decode_to_slice(payload, &mut out)
            .map_err(|_| InterfaceIdError::Malformed(s.to_string()))?;
        Ok(Self(out))
    }

    /// Lowercase `0x`-prefixed hex rendering.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for InterfaceId {
    type Err = InterfaceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InterfaceId({})", self.to_hex())
    }
}

impl Serialize for InterfaceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for InterfaceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        InterfaceId::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_published_identifiers() {
        assert_eq!(InterfaceId::from_hex("0x80ac58cd").unwrap(), ERC721_INTERFACE_ID);
        assert_eq!(InterfaceId::from_hex("0x01ffc9a7").unwrap(), ERC165_INTERFACE_ID);
        assert_eq!(
            "0xffffffff".parse::<InterfaceId>().unwrap(),
            INVALID_INTERFACE_ID
        );
    }

    #[test]
    fn rejects_wrong_width() {
        assert!(InterfaceId::from_hex("0x80ac58").is_err());
        assert!(InterfaceId::from_hex("0x80ac58cd00").is_err());
        assert!(InterfaceId::from_hex("80ac58cd").is_err());
    }

    #[test]
    fn display_matches_hex() {
        assert_eq!(ERC721_RECEIVED_SELECTOR.to_string(), "0x150b7a02");
    }
}
