// Copyright 2021 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use icx_types::{Address, Public};
use secp256k1::{global::SECP256K1, SecretKey};

/// Randomly generated keypairs, used by construction tests.
pub struct Random;

impl Random {
    pub fn generate(&self) -> (SecretKey, Public, Address) {
        let (secret, pubkey) =
            SECP256K1.generate_keypair(&mut rand::thread_rng());
        let serialized = pubkey.serialize_uncompressed();
        let public = Public::from_slice(&serialized[1..65]);
        let address = Address::from_public(&public);
        (secret, public, address)
    }
}
