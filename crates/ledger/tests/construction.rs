use icx_ledger::{
    build_unsigned, combine, parse, transaction_hash, ConstructionError,
    ConstructionMeta,
};
use icx_types::Address;
use icxkey::{sign, Random};
use primitives::{Amount, OpType, Operation};

fn intent_pair(from: Address, to: Address, value: u64) -> Vec<Operation> {
    vec![
        Operation {
            index: 0,
            related: vec![],
            op_type: OpType::Transfer,
            status: None,
            account: Some(from),
            amount: Some(Amount::icx_debit(value.into())),
            metadata: None,
        },
        Operation {
            index: 1,
            related: vec![0],
            op_type: OpType::Transfer,
            status: None,
            account: Some(to),
            amount: Some(Amount::icx_credit(value.into())),
            metadata: None,
        },
    ]
}

fn meta() -> ConstructionMeta {
    ConstructionMeta {
        step_limit: 0x186a0u64.into(),
        timestamp: 1574740804735360,
        nid: Some(1u64.into()),
        nonce: Some(1u64.into()),
    }
}

#[test]
fn build_sign_combine_hash_round_trip() {
    let (secret, _, from) = Random.generate();
    let to: Address =
        "hx5bfdb090f43a808005ffc27c25b213145e80b7cd".parse().unwrap();

    let payload =
        build_unsigned(&intent_pair(from, to, 1000), &meta()).unwrap();
    let signature = sign(&secret, &payload.signing_hash).unwrap();
    let signed = combine(&payload.transaction, signature).unwrap();

    // The submitted payload hashes to the bytes that were signed,
    // regardless of JSON field order in between.
    assert_eq!(transaction_hash(&signed).unwrap(), payload.signing_hash);

    let (operations, signers) = parse(&signed, true).unwrap();
    assert_eq!(operations.len(), 2);
    assert_eq!(operations[0].account, Some(from));
    assert_eq!(operations[0].amount.as_ref().unwrap().value, "-1000");
    assert_eq!(operations[1].related, vec![0]);
    assert_eq!(signers, vec![from]);
}

#[test]
fn forged_signature_is_rejected() {
    let (_, _, from) = Random.generate();
    let (other_secret, _, _) = Random.generate();
    let to: Address =
        "hx5bfdb090f43a808005ffc27c25b213145e80b7cd".parse().unwrap();

    let payload =
        build_unsigned(&intent_pair(from, to, 1000), &meta()).unwrap();
    let forged = sign(&other_secret, &payload.signing_hash).unwrap();
    assert!(matches!(
        combine(&payload.transaction, forged),
        Err(ConstructionError::SignatureMismatch)
    ));
}

#[test]
fn unbalanced_intent_is_unclear() {
    let (_, _, from) = Random.generate();
    let to: Address =
        "hx5bfdb090f43a808005ffc27c25b213145e80b7cd".parse().unwrap();

    let mut operations = intent_pair(from, to, 1000);
    operations[1].amount = Some(Amount::icx_credit(999u64.into()));
    assert!(matches!(
        build_unsigned(&operations, &meta()),
        Err(ConstructionError::UnclearIntent(_))
    ));

    // A lone debit is not an intent either.
    let operations = intent_pair(from, to, 1000);
    assert!(matches!(
        build_unsigned(&operations[..1], &meta()),
        Err(ConstructionError::UnclearIntent(_))
    ));
}

#[test]
fn unsigned_payloads_parse_without_signers() {
    let (_, _, from) = Random.generate();
    let to: Address =
        "hx5bfdb090f43a808005ffc27c25b213145e80b7cd".parse().unwrap();

    let payload =
        build_unsigned(&intent_pair(from, to, 25), &meta()).unwrap();
    let (operations, signers) = parse(&payload.transaction, false).unwrap();
    assert_eq!(operations.len(), 2);
    assert!(signers.is_empty());
}
