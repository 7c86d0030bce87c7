// Copyright 2021 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::{Error, Message};
use icx_types::{Address, Public};
use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    global::SECP256K1,
    Message as SecpMessage, SecretKey,
};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

pub const SIGNATURE_LENGTH: usize = 65;

/// A recoverable ECDSA signature: `r ‖ s ‖ recovery id`. Base64 on the
/// wire.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; SIGNATURE_LENGTH]);

impl Signature {
    pub fn from_rsv(r: &[u8; 32], s: &[u8; 32], v: u8) -> Self {
        let mut data = [0u8; SIGNATURE_LENGTH];
        data[0..32].copy_from_slice(r);
        data[32..64].copy_from_slice(s);
        data[64] = v;
        Signature(data)
    }

    pub fn v(&self) -> u8 { self.0[64] }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(Error::InvalidSignature);
        }
        let mut data = [0u8; SIGNATURE_LENGTH];
        data.copy_from_slice(bytes);
        Ok(Signature(data))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", base64::encode(self.0))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Signature({})", self)
    }
}

impl FromStr for Signature {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let bytes =
            base64::decode(text).map_err(|_| Error::InvalidSignature)?;
        Signature::from_bytes(&bytes)
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(
        &self, serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: Deserializer<'de> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

/// Signs `message` with `secret`, producing a recoverable signature.
pub fn sign(secret: &SecretKey, message: &Message) -> Result<Signature, Error> {
    let msg = SecpMessage::from_slice(message.as_bytes())
        .map_err(|_| Error::InvalidMessage)?;
    let (rec_id, data) = SECP256K1
        .sign_ecdsa_recoverable(&msg, secret)
        .serialize_compact();
    let mut sig = [0u8; SIGNATURE_LENGTH];
    sig[0..64].copy_from_slice(&data);
    sig[64] = rec_id.to_i32() as u8;
    Ok(Signature(sig))
}

/// Recovers the public key that produced `signature` over `message`.
pub fn recover(
    signature: &Signature, message: &Message,
) -> Result<Public, Error> {
    let rec_id = RecoveryId::from_i32(signature.v() as i32)?;
    let rsig =
        RecoverableSignature::from_compact(&signature.0[0..64], rec_id)?;
    let msg = SecpMessage::from_slice(message.as_bytes())
        .map_err(|_| Error::InvalidMessage)?;
    let pubkey = SECP256K1.recover_ecdsa(&msg, &rsig)?;
    let serialized = pubkey.serialize_uncompressed();
    Ok(Public::from_slice(&serialized[1..65]))
}

/// Derives the account address of a recovered public key.
pub fn public_to_address(public: &Public) -> Address {
    Address::from_public(public)
}

/// Checks that `signature` over `message` recovers to `address`.
pub fn verify_address(
    address: &Address, signature: &Signature, message: &Message,
) -> Result<bool, Error> {
    let public = recover(signature, message)?;
    Ok(public_to_address(&public) == *address)
}
