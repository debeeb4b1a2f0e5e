use cardano_hw_common::{
    AddressParameters, AddressType, AssetGroup, AuxiliaryData, CatalystRegistrationParameters,
    Certificate, CertificateType, MintAssetGroup, MintToken, OutputFormat, PoolOwner,
    PoolParameters, PoolRelay, PoolRelayType, ReferenceInput, RequiredSigner, SigningMode, Token,
    Withdrawal,
};
use cardano_hw_signer::protocol::{AuxiliaryDataSupplementResult, Request, Response};
use cardano_hw_signer::result::AuxiliaryDataSupplementType;
use cardano_hw_signer::{Error, ErrorKind, TestDeviceEmulator, WitnessType};

use crate::{change_output, emulated_device, input, output, path, simple_request};

#[test]
fn simple_transaction() {
    let device = emulated_device(TestDeviceEmulator::new(), "2.4.2");
    let signed = device.sign_transaction(&simple_request()).unwrap();
    let emulator = device.into_inner().unwrap();

    assert_eq!(
        emulator.request_names(),
        vec![
            "CardanoSignTxInit",
            "CardanoTxInput",
            "CardanoTxInput",
            "CardanoTxInput",
            "CardanoTxOutput",
            "CardanoTxOutput",
            "CardanoTxWitnessRequest",
            "CardanoTxWitnessRequest",
            "CardanoTxHostAck",
            "CardanoTxHostAck",
        ]
    );

    let Request::SignTxInit(init) = &emulator.requests()[0] else {
        panic!("first request is not init");
    };
    assert_eq!(init.inputs_count, 3);
    assert_eq!(init.outputs_count, 2);
    assert_eq!(init.certificates_count, 0);
    assert_eq!(init.withdrawals_count, 0);
    assert_eq!(init.witness_requests_count, 2);
    assert!(!init.has_auxiliary_data);

    assert_eq!(signed.hash, cardano_hw_signer::device_emulator::DEFAULT_TX_HASH);
    assert_eq!(signed.witnesses.len(), 2);
    assert!(signed.auxiliary_data_supplement.is_none());
    assert_eq!(emulator.count("CardanoSignTx"), 0);
}

#[test]
fn witnesses_follow_request_order() {
    let mut request = simple_request();
    request.inputs.push(input(3, Some("m/44'/1815'/0'/0/7")));
    let device = emulated_device(TestDeviceEmulator::new().with_mislabeled_witnesses(), "2.4.4");
    let signed = device.sign_transaction(&request).unwrap();

    let expected = [
        path("m/1852'/1815'/0'/0/0"),
        path("m/1852'/1815'/0'/0/1"),
        path("m/44'/1815'/0'/0/7"),
    ];
    assert_eq!(signed.witnesses.len(), expected.len());
    for (witness, path) in signed.witnesses.iter().zip(expected.iter()) {
        assert_eq!(witness.pub_key, TestDeviceEmulator::pub_key_for(path.as_slice()));
        // labels are returned as the device gives them
        assert_eq!(witness.witness_type, WitnessType::ByronWitness);
    }
}

fn catalyst_auxiliary_data() -> AuxiliaryData {
    let reward = AddressParameters::new(AddressType::Reward, path("m/1852'/1815'/0'/2/0"));
    AuxiliaryData {
        hash: None,
        catalyst_registration_parameters: Some(CatalystRegistrationParameters {
            voting_public_key: vec![0x1a; 32],
            staking_path: path("m/1852'/1815'/0'/2/0"),
            reward_address_parameters: reward,
            nonce: 22634813,
        }),
    }
}

#[test]
fn auxiliary_data_supplement() {
    let mut request = simple_request();
    request.auxiliary_data = Some(catalyst_auxiliary_data());

    // no supplement
    let device = emulated_device(TestDeviceEmulator::new(), "2.4.3");
    let signed = device.sign_transaction(&request).unwrap();
    assert!(signed.auxiliary_data_supplement.is_none());
    let names = device.into_inner().unwrap().request_names();
    let position = names
        .iter()
        .position(|n| n == "CardanoTxAuxiliaryData")
        .unwrap();
    assert_eq!(names[position + 1], "CardanoTxHostAck");
    assert_eq!(names[position + 2], "CardanoTxWitnessRequest");

    // catalyst signature
    let supplement = AuxiliaryDataSupplementResult {
        supplement_type: AuxiliaryDataSupplementType::CatalystRegistrationSignature,
        auxiliary_data_hash: Some(vec![0xad; 32]),
        catalyst_signature: Some(vec![0x5e; 64]),
    };
    let device = emulated_device(TestDeviceEmulator::new().with_supplement(supplement), "2.4.3");
    let signed = device.sign_transaction(&request).unwrap();
    let supplement = signed.auxiliary_data_supplement.unwrap();
    assert_eq!(
        supplement.supplement_type,
        AuxiliaryDataSupplementType::CatalystRegistrationSignature
    );
    assert_eq!(supplement.auxiliary_data_hash, vec![0xad; 32]);
    assert_eq!(supplement.catalyst_signature, Some(vec![0x5e; 64]));
}

#[test]
fn supplement_without_hash_fails() {
    let mut request = simple_request();
    request.auxiliary_data = Some(catalyst_auxiliary_data());
    let supplement = AuxiliaryDataSupplementResult {
        supplement_type: AuxiliaryDataSupplementType::CatalystRegistrationSignature,
        auxiliary_data_hash: None,
        catalyst_signature: Some(vec![0x5e; 64]),
    };
    let device = emulated_device(TestDeviceEmulator::new().with_supplement(supplement), "2.4.3");
    let err = device.sign_transaction(&request).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DeviceProtocol);
    assert!(matches!(err, Error::IncompleteReply { .. }));

    let emulator = device.into_inner().unwrap();
    assert_eq!(
        emulator.request_names().last().map(String::as_str),
        Some("CardanoTxAuxiliaryData")
    );
    assert_eq!(emulator.count("CardanoTxHostAck"), 0);
    assert_eq!(emulator.count("CardanoTxWitnessRequest"), 0);
}

fn sent_reward_path(version: &str) -> (Vec<u32>, Vec<u32>) {
    let mut request = simple_request();
    request.auxiliary_data = Some(catalyst_auxiliary_data());
    let device = emulated_device(TestDeviceEmulator::new(), version);
    device.sign_transaction(&request).unwrap();
    let emulator = device.into_inner().unwrap();
    let params = emulator
        .requests()
        .iter()
        .find_map(|r| match r {
            Request::TxAuxiliaryData(params) => Some(params.clone()),
            _ => None,
        })
        .unwrap();
    let reward = params
        .catalyst_registration_parameters
        .unwrap()
        .reward_address_parameters;
    (reward.address_n, reward.address_n_staking)
}

#[test]
fn catalyst_reward_address_rewrite() {
    let staking = path("m/1852'/1815'/0'/2/0").to_vec();

    let (address_n, address_n_staking) = sent_reward_path("2.4.2");
    assert_eq!(address_n, staking);
    assert!(address_n_staking.is_empty());

    let (address_n, address_n_staking) = sent_reward_path("2.4.3");
    assert!(address_n.is_empty());
    assert_eq!(address_n_staking, staking);
}

#[test]
fn conflicting_reward_paths() {
    let mut auxiliary_data = catalyst_auxiliary_data();
    if let Some(catalyst) = auxiliary_data.catalyst_registration_parameters.as_mut() {
        catalyst.reward_address_parameters.address_n_staking = path("m/1852'/1815'/0'/2/0");
    }
    let mut request = simple_request();
    request.auxiliary_data = Some(auxiliary_data);

    let device = emulated_device(TestDeviceEmulator::new(), "2.4.3");
    let err = device.sign_transaction(&request).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    assert!(device.into_inner().unwrap().requests().is_empty());
}

#[test]
fn device_error_aborts() {
    let device = emulated_device(
        TestDeviceEmulator::new().failing_on("CardanoTxOutput"),
        "2.4.2",
    );
    let err = device.sign_transaction(&simple_request()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DeviceProtocol);
    assert!(err.to_string().contains("Action rejected by user"));

    let emulator = device.into_inner().unwrap();
    assert_eq!(
        emulator.request_names().last().map(String::as_str),
        Some("CardanoTxOutput")
    );
    assert_eq!(emulator.count("CardanoTxOutput"), 1);
    assert_eq!(emulator.count("CardanoTxWitnessRequest"), 0);
}

#[test]
fn wrong_reply_kind_aborts() {
    let device = emulated_device(
        TestDeviceEmulator::new().replying_to("CardanoTxWitnessRequest", Response::TxItemAck),
        "2.4.2",
    );
    let err = device.sign_transaction(&simple_request()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DeviceProtocol);
    match &err {
        Error::UnexpectedResponse { request, response } => {
            assert_eq!(request, "CardanoTxWitnessRequest");
            assert_eq!(response, "CardanoTxItemAck");
        }
        other => panic!("unexpected error {other:?}"),
    }

    let emulator = device.into_inner().unwrap();
    assert_eq!(emulator.count("CardanoTxWitnessRequest"), 1);
    assert_eq!(emulator.count("CardanoTxHostAck"), 0);
}

fn pool_registration() -> Certificate {
    Certificate {
        certificate_type: CertificateType::StakePoolRegistration,
        path: None,
        pool: None,
        pool_parameters: Some(PoolParameters {
            pool_id: vec![0xf6; 28],
            vrf_key_hash: vec![0x19; 32],
            pledge: 500_000_000,
            cost: 340_000_000,
            margin_numerator: 1,
            margin_denominator: 2,
            reward_account: "stake1uya87zwnmax0v6nnn8ptqkl6ydx4522kpsc3l3wmf3yswygwx45el".to_string(),
            owners: vec![
                PoolOwner {
                    staking_key_path: Some(path("m/1852'/1815'/0'/2/0")),
                    staking_key_hash: None,
                },
                PoolOwner {
                    staking_key_path: None,
                    staking_key_hash: Some(vec![0x3a; 28]),
                },
            ],
            relays: vec![PoolRelay {
                relay_type: PoolRelayType::SingleHostName,
                ipv4_address: None,
                ipv6_address: None,
                host_name: Some("relay.example.com".to_string()),
                port: Some(3001),
            }],
            metadata: None,
        }),
        script_hash: None,
        key_hash: None,
    }
}

#[test]
fn pool_registration_as_owner() {
    let mut request = simple_request();
    request.signing_mode = SigningMode::PoolRegistrationAsOwner;
    request.inputs = vec![input(0, None)];
    request.outputs = vec![output(1_000_000)];
    request.certificates = vec![pool_registration()];

    let device = emulated_device(TestDeviceEmulator::new(), "2.4.2");
    let signed = device.sign_transaction(&request).unwrap();
    assert_eq!(signed.witnesses.len(), 1);
    assert_eq!(
        signed.witnesses[0].pub_key,
        TestDeviceEmulator::pub_key_for(path("m/1852'/1815'/0'/2/0").as_slice())
    );

    let names = device.into_inner().unwrap().request_names();
    assert_eq!(
        names,
        vec![
            "CardanoSignTxInit",
            "CardanoTxInput",
            "CardanoTxOutput",
            "CardanoTxCertificate",
            "CardanoPoolOwner",
            "CardanoPoolOwner",
            "CardanoPoolRelayParameters",
            "CardanoTxWitnessRequest",
            "CardanoTxHostAck",
            "CardanoTxHostAck",
        ]
    );
}

#[test]
fn every_phase_in_order() {
    let mut request = simple_request();
    request.signing_mode = SigningMode::PlutusTransaction;
    request.inputs = vec![input(0, Some("m/1852'/1815'/0'/0/0"))];
    let mut plutus_output = change_output(3_000_000);
    plutus_output.format = OutputFormat::MapBabbage;
    plutus_output.token_bundle = vec![AssetGroup {
        policy_id: vec![0x95; 28],
        tokens: vec![Token {
            asset_name_bytes: b"coin".to_vec(),
            amount: 7,
        }],
    }];
    plutus_output.inline_datum = Some(vec![0xd8; 2500]);
    plutus_output.reference_script = Some(vec![0x82; 10]);
    request.outputs = vec![plutus_output];
    request.certificates = vec![Certificate {
        certificate_type: CertificateType::StakeDelegation,
        path: Some(path("m/1852'/1815'/0'/2/0")),
        pool: Some(vec![0xf6; 28]),
        pool_parameters: None,
        script_hash: None,
        key_hash: None,
    }];
    request.withdrawals = vec![Withdrawal {
        path: Some(path("m/1852'/1815'/0'/2/0")),
        amount: 1_000,
        script_hash: None,
        key_hash: None,
    }];
    request.mint = vec![MintAssetGroup {
        policy_id: vec![0x95; 28],
        tokens: vec![
            MintToken {
                asset_name_bytes: b"a".to_vec(),
                mint_amount: 10,
            },
            MintToken {
                asset_name_bytes: b"b".to_vec(),
                mint_amount: -1,
            },
        ],
    }];
    request.script_data_hash = Some(vec![0x5d; 32]);
    request.collateral_inputs = vec![input(4, Some("m/1852'/1815'/0'/0/5"))];
    request.required_signers = vec![
        RequiredSigner::KeyPath(path("m/1852'/1815'/0'/0/6")),
        RequiredSigner::KeyHash(vec![0x4b; 28]),
    ];
    request.collateral_return = Some(output(4_000_000));
    request.total_collateral = Some(5_000_000);
    request.reference_inputs = vec![ReferenceInput {
        prev_hash: vec![0x1f; 32],
        prev_index: 0,
    }];
    request.additional_witness_requests = vec![path("m/1852'/1815'/0'/0/9")];

    let device = emulated_device(TestDeviceEmulator::new(), "2.5.2");
    let signed = device.sign_transaction(&request).unwrap();
    let emulator = device.into_inner().unwrap();

    let mut expected = vec![
        "CardanoSignTxInit",
        "CardanoTxInput",
        "CardanoTxOutput",
        "CardanoAssetGroup",
        "CardanoToken",
        "CardanoTxInlineDatumChunk",
        "CardanoTxInlineDatumChunk",
        "CardanoTxInlineDatumChunk",
        "CardanoTxReferenceScriptChunk",
        "CardanoTxCertificate",
        "CardanoTxWithdrawal",
        "CardanoTxMint",
        "CardanoAssetGroup",
        "CardanoToken",
        "CardanoToken",
        "CardanoTxCollateralInput",
        "CardanoTxRequiredSigner",
        "CardanoTxRequiredSigner",
        "CardanoTxOutput",
        "CardanoTxReferenceInput",
    ];
    expected.extend(["CardanoTxWitnessRequest"; 5]);
    expected.extend(["CardanoTxHostAck"; 2]);
    assert_eq!(emulator.request_names(), expected);

    let witness_keys: Vec<_> = signed.witnesses.iter().map(|w| w.pub_key.clone()).collect();
    let expected_keys: Vec<_> = [
        "m/1852'/1815'/0'/0/0",
        "m/1852'/1815'/0'/2/0",
        "m/1852'/1815'/0'/0/5",
        "m/1852'/1815'/0'/0/6",
        "m/1852'/1815'/0'/0/9",
    ]
    .iter()
    .map(|p| TestDeviceEmulator::pub_key_for(path(p).as_slice()))
    .collect();
    assert_eq!(witness_keys, expected_keys);

    let Request::SignTxInit(init) = &emulator.requests()[0] else {
        panic!("first request is not init");
    };
    assert_eq!(init.minting_asset_groups_count, 1);
    assert_eq!(init.collateral_inputs_count, 1);
    assert_eq!(init.required_signers_count, 2);
    assert!(init.has_collateral_return);
    assert_eq!(init.reference_inputs_count, 1);
    assert_eq!(init.witness_requests_count, 5);
}
