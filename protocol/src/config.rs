//! # Ledger Configuration & Constants
//!
//! Defaults used when a ledger is deployed without explicit parameters.
//! Both ledgers fix their name, symbol (and, for the fungible ledger,
//! decimals) at construction; nothing here can change afterwards.

use crate::{Address, Amount, TokenId};

// ---------------------------------------------------------------------------
// Fungible ledger
// ---------------------------------------------------------------------------

/// Default fungible token name.
pub const DEFAULT_ERC20_NAME: &str = "YSERC20token";

/// Default fungible token symbol.
pub const DEFAULT_ERC20_SYMBOL: &str = "YSERC20";

/// Default number of decimal places.
pub const DEFAULT_DECIMALS: u8 = 2;

/// Whole tokens minted to the deployer. The raw supply is this value
/// scaled by `10^decimals`.
pub const DEFAULT_INITIAL_SUPPLY: Amount = 1_000_000;

/// Allowance value that is never decremented by `transferFrom`.
pub const UNLIMITED_ALLOWANCE: Amount = Amount::MAX;

// ---------------------------------------------------------------------------
// Non-fungible registry
// ---------------------------------------------------------------------------

/// Default collection name.
pub const DEFAULT_ERC721_NAME: &str = "YSERC721token";

/// Default collection symbol.
pub const DEFAULT_ERC721_SYMBOL: &str = "YSERC721";

/// Default metadata base URI. Token URIs are `base || decimal(token_id)`.
pub const DEFAULT_BASE_URI: &str = "ipfs://QmPMc4tcBsMqLRuCQtPmPe84bpSjrC3Ky7t3JWuHXYB4aS/";

/// Identifier of the single token minted to the deployer.
pub const FIRST_TOKEN_ID: TokenId = 1;

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

/// Deployer used by the local host when a deployment config names none
/// (`0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266`, the first well-known
/// development account).
pub const DEFAULT_DEPLOYER: Address = Address::new([
    0xf3, 0x9f, 0xd6, 0xe5, 0x1a, 0xad, 0x88, 0xf6, 0xf4, 0xce, 0x6a, 0xb8, 0x82, 0x72, 0x79, 0xcf,
    0xff, 0xb9, 0x22, 0x66,
]);

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// Scales a whole-token amount to raw units: `whole * 10^decimals`.
///
/// Returns `None` when the result does not fit in [`Amount`].
pub fn scaled_supply(whole: Amount, decimals: u8) -> Option<Amount> {
    let unit = Amount::from(10u8).checked_pow(u32::from(decimals))?;
    whole.checked_mul(unit)
}
