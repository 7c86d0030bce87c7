// Copyright 2021 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

pub use ethereum_types::{BigEndianHash, Public, H160, H256, H512, U256, U64};

mod address;
pub mod codec;
mod hash;

pub use crate::{
    address::{
        Address, AddressError, AddressKind, ADDRESS_STRING_LENGTH,
        SYSTEM_SCORE, TREASURY,
    },
    codec::{CodecError, NumberOrHex},
    hash::sha3_256,
};
