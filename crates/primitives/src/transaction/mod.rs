// Copyright 2021 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

pub mod serialize;

use self::serialize::serialize_value;
use icx_types::{
    codec::{self, CodecError},
    sha3_256, Address, H256, U256,
};
use icxkey::{public_to_address, recover, Signature};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ops::Deref;
use thiserror::Error;

/// Transaction id assigned to the synthetic genesis row.
pub const GENESIS_TX_HASH: H256 = H256([0u8; 32]);

/// Version tag of step-metered transactions on the wire.
const STEPPED_VERSION: u64 = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("malformed transaction: missing {0}")]
    Missing(&'static str),
    #[error("malformed transaction: {0}")]
    Malformed(String),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("recovered signer does not match the declared sender")]
    SignatureMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxVersion {
    /// The original flat-fee format.
    Legacy,
    /// The step-metered format.
    Stepped,
}

/// Payload classification of a decoded transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Transfer,
    Call,
    Deploy,
    Message,
    /// Block-reward row produced by the node itself; carries no sender,
    /// receiver or value.
    Base,
    Deposit,
    /// The pre-fund document embedded in block zero.
    Genesis,
}

impl TransactionKind {
    /// Maps the optional `dataType` tag. Absent and unrecognized tags read
    /// as plain transfers; the tag set is append-only on the node side.
    fn from_data_type(tag: Option<&str>) -> Self {
        match tag {
            Some("base") => TransactionKind::Base,
            Some("call") => TransactionKind::Call,
            Some("deploy") => TransactionKind::Deploy,
            Some("message") => TransactionKind::Message,
            Some("deposit") => TransactionKind::Deposit,
            _ => TransactionKind::Transfer,
        }
    }
}

/// One pre-funded account of the genesis document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub name: String,
    pub address: Address,
    pub balance: U256,
}

/// The embedded content of block zero: pre-funded accounts plus a
/// free-text message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenesisDocument {
    pub accounts: Vec<GenesisAccount>,
    #[serde(default)]
    pub message: String,
}

/// The superset wire shape of a confirmed transaction. Field presence
/// varies across format revisions; [`RawTransaction::decode`] dispatches
/// and validates.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTransaction {
    pub version: Option<String>,
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub value: Option<String>,
    pub fee: Option<String>,
    #[serde(rename = "stepLimit")]
    pub step_limit: Option<String>,
    #[serde(default, deserialize_with = "codec::de_i64_flex_opt")]
    pub timestamp: Option<i64>,
    pub nid: Option<String>,
    pub nonce: Option<String>,
    pub signature: Option<String>,
    #[serde(rename = "dataType")]
    pub data_type: Option<String>,
    pub data: Option<Value>,
    #[serde(rename = "txHash")]
    pub tx_hash_v3: Option<String>,
    #[serde(rename = "tx_hash")]
    pub tx_hash_v2: Option<String>,
    pub method: Option<String>,
}

impl RawTransaction {
    pub fn from_json(raw: &Value) -> Result<Self, TransactionError> {
        serde_json::from_value(raw.clone())
            .map_err(|e| TransactionError::Malformed(e.to_string()))
    }

    /// Decodes by version: `0x3` is step-metered, everything older is the
    /// flat-fee legacy format.
    pub fn decode(self) -> Result<Transaction, TransactionError> {
        let stepped = match &self.version {
            Some(text) => codec::u256_from_hex(text)? == STEPPED_VERSION.into(),
            None => false,
        };
        if stepped {
            self.decode_stepped()
        } else {
            self.decode_legacy()
        }
    }

    fn decode_legacy(self) -> Result<Transaction, TransactionError> {
        let from = self.from.ok_or(TransactionError::Missing("from"))?;
        let to = self.to.ok_or(TransactionError::Missing("to"))?;
        let fee = match &self.fee {
            Some(text) => codec::u256_from_hex(text)?,
            None => return Err(TransactionError::Missing("fee")),
        };
        let value = match &self.value {
            Some(text) => Some(codec::u256_from_hex(text)?),
            None => None,
        };
        let hash_text = self
            .tx_hash_v2
            .as_deref()
            .ok_or(TransactionError::Missing("tx_hash"))?;

        let mut metadata = Map::new();
        metadata.insert("nonce".into(), opt_text(&self.nonce));
        metadata.insert("signature".into(), opt_text(&self.signature));
        metadata.insert("method".into(), opt_text(&self.method));

        Ok(Transaction {
            version: TxVersion::Legacy,
            kind: TransactionKind::Transfer,
            hash: codec::h256_from_hex(hash_text)?,
            from: Some(from),
            to: Some(to),
            value,
            limit: Some(fee),
            timestamp: self.timestamp,
            data: None,
            genesis: None,
            metadata,
        })
    }

    fn decode_stepped(self) -> Result<Transaction, TransactionError> {
        let kind = TransactionKind::from_data_type(self.data_type.as_deref());
        let hash_text = self
            .tx_hash_v3
            .as_deref()
            .ok_or(TransactionError::Missing("txHash"))?;
        let hash = codec::h256_from_hex(hash_text)?;

        let mut metadata = Map::new();
        metadata.insert("version".into(), opt_text(&self.version));
        metadata.insert(
            "timestamp".into(),
            self.timestamp.map(Into::into).unwrap_or(Value::Null),
        );
        metadata.insert("dataType".into(), opt_text(&self.data_type));
        metadata
            .insert("data".into(), self.data.clone().unwrap_or(Value::Null));

        if kind == TransactionKind::Base {
            return Ok(Transaction {
                version: TxVersion::Stepped,
                kind,
                hash,
                from: None,
                to: None,
                value: None,
                limit: None,
                timestamp: self.timestamp,
                data: self.data,
                genesis: None,
                metadata,
            });
        }

        metadata.insert("nid".into(), opt_text(&self.nid));
        metadata.insert("nonce".into(), opt_text(&self.nonce));
        metadata.insert("signature".into(), opt_text(&self.signature));

        let from = self.from.ok_or(TransactionError::Missing("from"))?;
        let to = self.to.ok_or(TransactionError::Missing("to"))?;
        let step_limit = match &self.step_limit {
            Some(text) => codec::u256_from_hex(text)?,
            None => return Err(TransactionError::Missing("stepLimit")),
        };
        let value = match &self.value {
            Some(text) => Some(codec::u256_from_hex(text)?),
            None => None,
        };

        Ok(Transaction {
            version: TxVersion::Stepped,
            kind,
            hash,
            from: Some(from),
            to: Some(to),
            value,
            limit: Some(step_limit),
            timestamp: self.timestamp,
            data: self.data,
            genesis: None,
            metadata,
        })
    }
}

fn opt_text(field: &Option<String>) -> Value {
    match field {
        Some(text) => Value::String(text.clone()),
        None => Value::Null,
    }
}

/// A decoded transaction, owned by its normalized block.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub version: TxVersion,
    pub kind: TransactionKind,
    pub hash: H256,
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub value: Option<U256>,
    /// Declared spend ceiling: the flat `fee` for legacy transactions, the
    /// step limit for stepped ones. Not the amount actually charged.
    pub limit: Option<U256>,
    pub timestamp: Option<i64>,
    pub data: Option<Value>,
    pub genesis: Option<GenesisDocument>,
    pub metadata: Map<String, Value>,
}

impl Transaction {
    pub fn genesis(document: GenesisDocument) -> Self {
        Transaction {
            version: TxVersion::Legacy,
            kind: TransactionKind::Genesis,
            hash: GENESIS_TX_HASH,
            from: None,
            to: None,
            value: None,
            limit: None,
            timestamp: None,
            data: None,
            genesis: Some(document),
            metadata: Map::new(),
        }
    }

    pub fn is_genesis(&self) -> bool { self.kind == TransactionKind::Genesis }

    pub fn is_base(&self) -> bool { self.kind == TransactionKind::Base }

    /// Every row but the genesis document needs its execution result
    /// before operations can be synthesized.
    pub fn requires_receipt(&self) -> bool { !self.is_genesis() }
}

/// The construction shape of an outgoing transaction. Option-typed fields
/// keep the absent-vs-zero distinction the canonical hash depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTransaction {
    pub version: U256,
    pub from: Address,
    pub to: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    pub step_limit: U256,
    pub timestamp: U256,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nid: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<U256>,
    #[serde(rename = "dataType", skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl UnsignedTransaction {
    /// The deterministic byte sequence the transaction hash commits to:
    /// the request name followed by `.field.value` segments in strict
    /// alphabetical field order, absent fields skipped entirely. Both
    /// construction and inbound validation run through here; there is no
    /// second serializer to diverge from.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::from(&b"icx_sendTransaction"[..]);
        if let Some(data) = &self.data {
            out.extend_from_slice(b".data.");
            out.extend_from_slice(&serialize_value(data));
        }
        if let Some(data_type) = &self.data_type {
            out.extend_from_slice(b".dataType.");
            out.extend_from_slice(data_type.as_bytes());
        }
        out.extend_from_slice(b".from.");
        out.extend_from_slice(self.from.to_string().as_bytes());
        if let Some(nid) = self.nid {
            out.extend_from_slice(b".nid.");
            out.extend_from_slice(codec::u256_to_hex(nid).as_bytes());
        }
        if let Some(nonce) = self.nonce {
            out.extend_from_slice(b".nonce.");
            out.extend_from_slice(codec::u256_to_hex(nonce).as_bytes());
        }
        out.extend_from_slice(b".stepLimit.");
        out.extend_from_slice(codec::u256_to_hex(self.step_limit).as_bytes());
        out.extend_from_slice(b".timestamp.");
        out.extend_from_slice(codec::u256_to_hex(self.timestamp).as_bytes());
        out.extend_from_slice(b".to.");
        out.extend_from_slice(self.to.to_string().as_bytes());
        if let Some(value) = self.value {
            out.extend_from_slice(b".value.");
            out.extend_from_slice(codec::u256_to_hex(value).as_bytes());
        }
        out.extend_from_slice(b".version.");
        out.extend_from_slice(codec::u256_to_hex(self.version).as_bytes());
        out
    }

    /// SHA3-256 of the canonical bytes: the signing payload and the
    /// transaction id.
    pub fn hash(&self) -> H256 { sha3_256(self.canonical_bytes()) }
}

/// An unsigned transaction plus its detached signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
    #[serde(flatten)]
    pub unsigned: UnsignedTransaction,
    pub signature: Signature,
}

impl Deref for SignedTransaction {
    type Target = UnsignedTransaction;

    fn deref(&self) -> &Self::Target { &self.unsigned }
}

impl SignedTransaction {
    pub fn new(unsigned: UnsignedTransaction, signature: Signature) -> Self {
        SignedTransaction {
            unsigned,
            signature,
        }
    }

    /// Recovers the signer from the signature over the canonical hash and
    /// requires it to be the declared sender.
    pub fn verify_signature(&self) -> Result<(), TransactionError> {
        let public = recover(&self.signature, &self.unsigned.hash())
            .map_err(|_| TransactionError::SignatureMismatch)?;
        if public_to_address(&public) == self.unsigned.from {
            Ok(())
        } else {
            Err(TransactionError::SignatureMismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use icxkey::{sign, Random};
    use serde_json::json;

    fn unsigned_fixture() -> UnsignedTransaction {
        UnsignedTransaction {
            version: 3.into(),
            from: "hxbe258ceb872e08851f1f59694dac2558708ece11"
                .parse()
                .unwrap(),
            to: "hx5bfdb090f43a808005ffc27c25b213145e80b7cd".parse().unwrap(),
            value: Some(
                codec::u256_from_hex("0xde0b6b3a7640000").unwrap(),
            ),
            step_limit: 0x12345.into(),
            timestamp: 0x563a6cf330136u64.into(),
            nid: Some(1.into()),
            nonce: Some(1.into()),
            data_type: None,
            data: None,
        }
    }

    #[test]
    fn canonical_bytes_field_order() {
        let expected = "icx_sendTransaction\
                        .from.hxbe258ceb872e08851f1f59694dac2558708ece11\
                        .nid.0x1.nonce.0x1.stepLimit.0x12345\
                        .timestamp.0x563a6cf330136\
                        .to.hx5bfdb090f43a808005ffc27c25b213145e80b7cd\
                        .value.0xde0b6b3a7640000.version.0x3";
        assert_eq!(unsigned_fixture().canonical_bytes(), expected.as_bytes());
    }

    #[test]
    fn hash_ignores_wire_field_order() {
        let a: UnsignedTransaction = serde_json::from_value(json!({
            "version": "0x3",
            "from": "hxbe258ceb872e08851f1f59694dac2558708ece11",
            "to": "hx5bfdb090f43a808005ffc27c25b213145e80b7cd",
            "value": "0xde0b6b3a7640000",
            "stepLimit": "0x12345",
            "timestamp": "0x563a6cf330136",
            "nid": "0x1",
            "nonce": "0x1",
        }))
        .unwrap();
        let b: UnsignedTransaction = serde_json::from_value(json!({
            "nonce": "0x1",
            "nid": "0x1",
            "timestamp": "0x563a6cf330136",
            "stepLimit": "0x12345",
            "value": "0xde0b6b3a7640000",
            "to": "hx5bfdb090f43a808005ffc27c25b213145e80b7cd",
            "from": "hxbe258ceb872e08851f1f59694dac2558708ece11",
            "version": "0x3",
        }))
        .unwrap();
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.hash(), unsigned_fixture().hash());
    }

    #[test]
    fn absent_and_zero_values_hash_differently() {
        let mut with_zero = unsigned_fixture();
        with_zero.value = Some(U256::zero());
        let mut without = unsigned_fixture();
        without.value = None;
        assert_ne!(with_zero.hash(), without.hash());
    }

    #[test]
    fn decode_stepped_transfer() {
        let tx = RawTransaction::from_json(&json!({
            "version": "0x3",
            "from": "hxbe258ceb872e08851f1f59694dac2558708ece11",
            "to": "hx5bfdb090f43a808005ffc27c25b213145e80b7cd",
            "value": "0x64",
            "stepLimit": "0x12345",
            "timestamp": "0x563a6cf330136",
            "nid": "0x1",
            "txHash": "0x375540830d475a73b704cf8dee9cd9f7390d21153ae1014975c5a8c53d097aa7",
        }))
        .unwrap()
        .decode()
        .unwrap();
        assert_eq!(tx.version, TxVersion::Stepped);
        assert_eq!(tx.kind, TransactionKind::Transfer);
        assert_eq!(tx.value, Some(0x64u64.into()));
        assert_eq!(tx.limit, Some(0x12345u64.into()));
    }

    #[test]
    fn decode_legacy_transfer() {
        let tx = RawTransaction::from_json(&json!({
            "from": "hx63fac3fc777ad647d2c3dd523411c0e701a5e34e",
            "to": "hx4c7101add2a9ddce9e15113b20d607ca36d7d4b8",
            "value": "0xde0b6b3a7640000",
            "fee": "0x2386f26fc10000",
            "timestamp": "1519021105385000",
            "tx_hash": "6b17886de346655d96373f2e0de494cb8d7f36ce9086cb15a57d3dcf24523c8f",
            "method": "icx_sendTransaction",
        }))
        .unwrap()
        .decode()
        .unwrap();
        assert_eq!(tx.version, TxVersion::Legacy);
        assert_eq!(tx.limit, Some(0x2386f26fc10000u64.into()));
        assert_eq!(tx.timestamp, Some(1519021105385000));
    }

    #[test]
    fn decode_base_transaction() {
        let tx = RawTransaction::from_json(&json!({
            "version": "0x3",
            "timestamp": "0x598b837199a40",
            "dataType": "base",
            "data": { "result": { "coveredByFee": "0x0" } },
            "txHash": "0x6079eff0a3a0498e8d42bc8a5a9e4f4db0b84cc7cdd050f40f7e65a3d2a5eb4c",
        }))
        .unwrap()
        .decode()
        .unwrap();
        assert_eq!(tx.kind, TransactionKind::Base);
        assert_eq!(tx.from, None);
        assert_eq!(tx.limit, None);
    }

    #[test]
    fn stepped_transfer_requires_step_limit() {
        let err = RawTransaction::from_json(&json!({
            "version": "0x3",
            "from": "hxbe258ceb872e08851f1f59694dac2558708ece11",
            "to": "hx5bfdb090f43a808005ffc27c25b213145e80b7cd",
            "txHash": "0x375540830d475a73b704cf8dee9cd9f7390d21153ae1014975c5a8c53d097aa7",
        }))
        .unwrap()
        .decode()
        .unwrap_err();
        assert_eq!(err, TransactionError::Missing("stepLimit"));
    }

    #[test]
    fn combine_verifies_the_signer() {
        let (secret, _, address) = Random.generate();
        let mut unsigned = unsigned_fixture();
        unsigned.from = address;

        let signature = sign(&secret, &unsigned.hash()).unwrap();
        let signed = SignedTransaction::new(unsigned.clone(), signature);
        assert!(signed.verify_signature().is_ok());

        // A signature from any other key must be rejected.
        let (other_secret, _, _) = Random.generate();
        let forged = sign(&other_secret, &unsigned.hash()).unwrap();
        let forged = SignedTransaction::new(unsigned, forged);
        assert_eq!(
            forged.verify_signature().unwrap_err(),
            TransactionError::SignatureMismatch
        );
    }
}
