use cardano_hw_common::{MintAssetGroup, MintToken, OutputFormat, SigningRequest};
use cardano_hw_signer::{Error, ErrorKind, Feature, Strategy, TestDeviceEmulator};

use crate::{emulated_device, simple_request};

fn minting_request() -> SigningRequest {
    let mut request = simple_request();
    request.mint = vec![MintAssetGroup {
        policy_id: vec![0x95; 28],
        tokens: vec![MintToken {
            asset_name_bytes: b"coin".to_vec(),
            mint_amount: 1_000,
        }],
    }];
    request
}

#[test]
fn unsupported_feature_sends_nothing() {
    let device = emulated_device(TestDeviceEmulator::new(), "2.4.2");
    let err = device.sign_transaction(&minting_request()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FeatureNotSupported);
    assert!(matches!(
        err,
        Error::FeatureNotSupported {
            feature: Feature::TokenMinting,
            ..
        }
    ));
    assert!(device.into_inner().unwrap().requests().is_empty());
}

#[test]
fn minimum_version_flips_outcome() {
    let device = emulated_device(TestDeviceEmulator::new(), "2.4.3");
    assert!(device.sign_transaction(&minting_request()).is_ok());

    let mut babbage = simple_request();
    babbage.outputs[0].format = OutputFormat::MapBabbage;

    let device = emulated_device(TestDeviceEmulator::new(), "2.5.1");
    let err = device.sign_transaction(&babbage).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FeatureNotSupported);

    let device = emulated_device(TestDeviceEmulator::new(), "2.5.2");
    assert!(device.sign_transaction(&babbage).is_ok());
}

#[test]
fn old_major_line_rejects_features() {
    let mut request = simple_request();
    request.validity_interval_start = Some(42);
    let device = emulated_device(TestDeviceEmulator::new(), "1.10.0");
    let err = device.sign_transaction(&request).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FeatureNotSupported);
    assert!(device.into_inner().unwrap().requests().is_empty());
}

#[test]
fn strategy_boundary() {
    let legacy = emulated_device(TestDeviceEmulator::new(), "2.4.1");
    assert_eq!(legacy.strategy(), Strategy::Legacy);
    let streaming = emulated_device(TestDeviceEmulator::new(), "2.4.2");
    assert_eq!(streaming.strategy(), Strategy::Streaming);

    streaming.sign_transaction(&simple_request()).unwrap();
    let emulator = streaming.into_inner().unwrap();
    assert_eq!(emulator.request_names()[0], "CardanoSignTxInit");
    assert_eq!(emulator.count("CardanoSignTx"), 0);
}
