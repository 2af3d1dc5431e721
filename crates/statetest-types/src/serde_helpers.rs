//! Serde helpers for the hex quantity encoding used by transition tools and fixtures.

use alloy_primitives::Address;
use serde::{de, Deserialize, Deserializer, Serializer};

/// Integer that is either a JSON number or a (hex or decimal) string.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    String(String),
}

fn parse_u128<E: de::Error>(string: &str) -> Result<u128, E> {
    if let Some(stripped) = string.strip_prefix("0x") {
        if stripped.is_empty() {
            return Ok(0);
        }
        u128::from_str_radix(stripped, 16)
    } else {
        string.parse()
    }
    .map_err(de::Error::custom)
}

/// Hex quantity (`"0x1f"`) encoding for unsigned integers.
///
/// Deserialization also accepts decimal strings and plain JSON numbers.
pub mod quantity {
    use super::{parse_u128, NumberOrString};
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::fmt::Display;

    /// Serializes an integer as a `0x`-prefixed hex string.
    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Copy + Into<u128>,
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:#x}", (*value).into()))
    }

    /// Deserializes an integer from a hex string, decimal string or JSON number.
    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: TryFrom<u128>,
        T::Error: Display,
        D: Deserializer<'de>,
    {
        let value = match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Number(n) => n as u128,
            NumberOrString::String(s) => parse_u128(&s)?,
        };
        T::try_from(value).map_err(de::Error::custom)
    }

    /// Same encoding for optional integers.
    pub mod opt {
        use super::super::{parse_u128, NumberOrString};
        use serde::{de, Deserialize, Deserializer, Serializer};
        use std::fmt::Display;

        /// Serializes `Some` as a hex string and `None` as `null`.
        pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
        where
            T: Copy + Into<u128>,
            S: Serializer,
        {
            match value {
                Some(value) => super::serialize(value, serializer),
                None => serializer.serialize_none(),
            }
        }

        /// Deserializes an optional quantity; `null` maps to `None`.
        pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
        where
            T: TryFrom<u128>,
            T::Error: Display,
            D: Deserializer<'de>,
        {
            let Some(value) = Option::<NumberOrString>::deserialize(deserializer)? else {
                return Ok(None);
            };
            let value = match value {
                NumberOrString::Number(n) => n as u128,
                NumberOrString::String(s) => parse_u128(&s)?,
            };
            T::try_from(value).map(Some).map_err(de::Error::custom)
        }
    }
}

/// Deserializes an address where the empty string means "no address" (contract creation).
pub fn deserialize_maybe_empty<'de, D>(deserializer: D) -> Result<Option<Address>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(string) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if string.is_empty() {
        Ok(None)
    } else {
        string.parse().map_err(de::Error::custom).map(Some)
    }
}

/// Serializes `None` as the empty string, the state test encoding for contract creation.
pub fn serialize_maybe_empty<S>(address: &Option<Address>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match address {
        Some(address) => serializer.serialize_str(&address.to_string()),
        None => serializer.serialize_str(""),
    }
}
