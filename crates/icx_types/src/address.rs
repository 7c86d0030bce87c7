// Copyright 2021 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::hash::sha3_256;
use ethereum_types::{Public, H160};
use lazy_static::lazy_static;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Textual form: a two-character kind prefix plus 40 hex digits.
pub const ADDRESS_STRING_LENGTH: usize = 42;

lazy_static! {
    /// The fixed system account that collects network fees.
    pub static ref TREASURY: Address =
        "hx1000000000000000000000000000000000000000".parse().unwrap();
    /// The system-level contract account, also the default fee-sponsor
    /// placeholder for event attribution.
    pub static ref SYSTEM_SCORE: Address =
        "cx0000000000000000000000000000000000000000".parse().unwrap();
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid address length {0}, expected {ADDRESS_STRING_LENGTH}")]
    InvalidLength(usize),
    #[error("invalid address prefix in {0:?}")]
    InvalidPrefix(String),
    #[error("invalid address body in {0:?}")]
    InvalidBody(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressKind {
    /// Externally owned account, `hx` prefix.
    Eoa,
    /// Contract (score) account, `cx` prefix.
    Contract,
}

impl AddressKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            AddressKind::Eoa => "hx",
            AddressKind::Contract => "cx",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "hx" => Some(AddressKind::Eoa),
            "cx" => Some(AddressKind::Contract),
            _ => None,
        }
    }
}

/// An account address: a kind tag plus a 20-byte body.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    pub kind: AddressKind,
    pub payload: H160,
}

impl Address {
    pub fn new_eoa(payload: H160) -> Self {
        Address {
            kind: AddressKind::Eoa,
            payload,
        }
    }

    pub fn new_contract(payload: H160) -> Self {
        Address {
            kind: AddressKind::Contract,
            payload,
        }
    }

    /// Derives the account address of a public key: the trailing 20 bytes
    /// of the SHA3-256 digest over the 64-byte uncompressed key body.
    pub fn from_public(public: &Public) -> Self {
        let digest = sha3_256(public.as_bytes());
        Address::new_eoa(H160::from_slice(&digest.as_bytes()[12..]))
    }

    pub fn is_contract(&self) -> bool { self.kind == AddressKind::Contract }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{:x}", self.kind.prefix(), self.payload)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if text.len() != ADDRESS_STRING_LENGTH {
            return Err(AddressError::InvalidLength(text.len()));
        }
        let kind = text
            .get(..2)
            .and_then(AddressKind::from_prefix)
            .ok_or_else(|| AddressError::InvalidPrefix(text.into()))?;
        let body = &text[2..];
        if body.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(AddressError::InvalidBody(text.into()));
        }
        let payload = H160::from_str(body)
            .map_err(|_| AddressError::InvalidBody(text.into()))?;
        Ok(Address { kind, payload })
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(
        &self, serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: Deserializer<'de> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}
