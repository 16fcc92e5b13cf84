//! Serde helpers for 128-bit amounts and token ids.
//!
//! Values that fit in a `u64` travel as plain JSON numbers; larger ones as
//! decimal strings. Decoding accepts either form and goes through
//! `deserialize_any`, so fields using these helpers also work inside
//! tagged and flattened enums, where serde buffers content and cannot hand
//! out a `u128` directly.
//!
//! Use with `#[serde(with = "ys_protocol::uint")]`.

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;

pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
    match u64::try_from(*value) {
        Ok(small) => serializer.serialize_u64(small),
        Err(_) => serializer.serialize_str(&value.to_string()),
    }
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
    deserializer.deserialize_any(UintVisitor)
}

struct UintVisitor;

impl<'de> Visitor<'de> for UintVisitor {
    type Value = u128;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer or a decimal string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
        Ok(u128::from(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<u128, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
        u128::try_from(v).map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
        v.parse::<u128>()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}
