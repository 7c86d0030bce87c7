// Copyright 2021 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Conversions between the chain's hexadecimal wire encodings and
//! arbitrary-precision integers / canonical decimal strings.

use ethereum_types::{H256, U256};
use serde::{de, Deserialize, Deserializer};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed number: {0:?}")]
    MalformedNumber(String),
}

fn hex_digits(text: &str) -> Result<&str, CodecError> {
    let digits = text
        .strip_prefix("0x")
        .ok_or_else(|| CodecError::MalformedNumber(text.into()))?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CodecError::MalformedNumber(text.into()));
    }
    Ok(digits)
}

/// Parses a `0x`-prefixed hexadecimal string into a `U256`. The prefix is
/// mandatory; values may exceed 64 bits.
pub fn u256_from_hex(text: &str) -> Result<U256, CodecError> {
    U256::from_str_radix(hex_digits(text)?, 16)
        .map_err(|_| CodecError::MalformedNumber(text.into()))
}

/// Parses a `0x`-prefixed hexadecimal string into a `u64`.
pub fn u64_from_hex(text: &str) -> Result<u64, CodecError> {
    u64::from_str_radix(hex_digits(text)?, 16)
        .map_err(|_| CodecError::MalformedNumber(text.into()))
}

/// Parses a `0x`-prefixed hexadecimal string into an `i64`. A leading `-`
/// before the prefix is accepted; the node renders negative hex that way.
pub fn i64_from_hex(text: &str) -> Result<i64, CodecError> {
    let (negative, magnitude) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let value = i64::from_str_radix(hex_digits(magnitude)?, 16)
        .map_err(|_| CodecError::MalformedNumber(text.into()))?;
    Ok(if negative { -value } else { value })
}

/// Minimal `0x`-prefixed hexadecimal rendering; zero is `0x0`.
pub fn u256_to_hex(value: U256) -> String { format!("{:#x}", value) }

/// Canonical base-10 rendering: no leading zeros, no sign.
pub fn u256_to_dec(value: U256) -> String { value.to_string() }

/// Signed base-10 rendering for debit amounts. Zero never carries a sign.
pub fn u256_to_neg_dec(value: U256) -> String {
    if value.is_zero() {
        value.to_string()
    } else {
        format!("-{}", value)
    }
}

/// Parses a 256-bit hash from hex text; the `0x` prefix is optional since
/// the legacy block format omits it.
pub fn h256_from_hex(text: &str) -> Result<H256, CodecError> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    if digits.len() != 64 {
        return Err(CodecError::MalformedNumber(text.into()));
    }
    H256::from_str(digits).map_err(|_| CodecError::MalformedNumber(text.into()))
}

/// An enum that represents either a [serde_json::Number] integer, or a
/// string holding a hex or decimal integer. The legacy wire format mixes
/// all three shapes for heights and timestamps.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberOrHex {
    /// An integer
    Int(serde_json::Number),
    /// A hex (`0x`-prefixed) or decimal string
    Text(String),
}

impl NumberOrHex {
    pub fn try_into_u256(self) -> Result<U256, CodecError> {
        match self {
            NumberOrHex::Int(num) => {
                U256::from_dec_str(&num.to_string()).map_err(|_| {
                    CodecError::MalformedNumber(num.to_string())
                })
            }
            NumberOrHex::Text(text) if text.starts_with("0x") => {
                u256_from_hex(&text)
            }
            NumberOrHex::Text(text) => U256::from_dec_str(&text)
                .map_err(|_| CodecError::MalformedNumber(text)),
        }
    }

    pub fn try_into_i64(self) -> Result<i64, CodecError> {
        match self {
            NumberOrHex::Int(num) => num
                .as_i64()
                .ok_or_else(|| CodecError::MalformedNumber(num.to_string())),
            NumberOrHex::Text(text)
                if text.starts_with("0x") || text.starts_with("-0x") =>
            {
                i64_from_hex(&text)
            }
            NumberOrHex::Text(text) => text
                .parse::<i64>()
                .map_err(|_| CodecError::MalformedNumber(text)),
        }
    }
}

/// Deserializes a number-or-hex field into an `i64`, for timestamps that
/// arrive as JSON numbers in one format revision and hex strings in the
/// next.
pub fn de_i64_flex<'de, D>(deserializer: D) -> Result<i64, D::Error>
where D: Deserializer<'de> {
    NumberOrHex::deserialize(deserializer)?
        .try_into_i64()
        .map_err(de::Error::custom)
}

/// Deserializes an optional number-or-hex field, using [`de_i64_flex`] for
/// the inner value.
pub fn de_i64_flex_opt<'de, D>(
    deserializer: D,
) -> Result<Option<i64>, D::Error>
where D: Deserializer<'de> {
    match Option::<NumberOrHex>::deserialize(deserializer)? {
        Some(val) => val.try_into_i64().map(Some).map_err(de::Error::custom),
        None => Ok(None),
    }
}
