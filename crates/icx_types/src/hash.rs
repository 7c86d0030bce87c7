// Copyright 2021 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use ethereum_types::H256;
use tiny_keccak::{Hasher, Sha3};

/// SHA3-256 digest of `data`. The chain hashes canonical transaction
/// bytes and public keys with SHA3, not keccak.
pub fn sha3_256<T: AsRef<[u8]>>(data: T) -> H256 {
    let mut sha3 = Sha3::v256();
    let mut output = [0u8; 32];
    sha3.update(data.as_ref());
    sha3.finalize(&mut output);
    H256(output)
}

#[cfg(test)]
mod tests {
    use super::sha3_256;

    #[test]
    fn sha3_of_empty_input() {
        // SHA3-256(""), distinct from the keccak-256 empty digest.
        assert_eq!(
            format!("{:x}", sha3_256([])),
            "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
        );
    }
}
