// Copyright 2021 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

mod random;
mod signature;

use icx_types::H256;

pub use icx_types::{Address, Public};
pub use secp256k1::{global::SECP256K1, PublicKey, SecretKey};

pub use self::{
    random::Random,
    signature::{
        public_to_address, recover, sign, verify_address, Signature,
    },
};

/// The 32-byte digest a signature commits to.
pub type Message = H256;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("secp256k1 error: {0}")]
    Secp(#[from] secp256k1::Error),
    #[error("invalid signature encoding")]
    InvalidSignature,
    #[error("invalid message")]
    InvalidMessage,
}
