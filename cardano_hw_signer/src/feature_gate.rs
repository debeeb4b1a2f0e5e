use cardano_hw_common::{Output, SigningMode, SigningRequest};

use crate::firmware::{Feature, FirmwareFeatures};
use crate::Error;

/// Fails with [`Error::FeatureNotSupported`] if the request needs a feature the firmware lacks.
///
/// Nothing is sent to the device.
pub fn check_supported(request: &SigningRequest, firmware: &FirmwareFeatures) -> Result<(), Error> {
    for feature in required_features(request) {
        firmware.ensure(feature)?;
    }
    Ok(())
}

/// Every feature implied by the contents of `request`, without duplicates.
pub fn required_features(request: &SigningRequest) -> Vec<Feature> {
    let mut features = vec![];
    let mut require = |feature: Feature| {
        if !features.contains(&feature) {
            features.push(feature);
        }
    };

    for certificate in &request.certificates {
        if certificate.is_pool_registration() {
            require(Feature::SignStakePoolRegistrationAsOwner);
        }
        if certificate.key_hash.is_some() {
            require(Feature::KeyHashStakeCredential);
        }
    }

    if let Some(start) = request.validity_interval_start {
        require(Feature::ValidityIntervalStart);
        if start == 0 {
            require(Feature::ZeroValidityIntervalStart);
        }
    }

    for output in request.all_outputs() {
        output_features(output, &mut require);
    }

    if request.withdrawals.iter().any(|w| w.key_hash.is_some()) {
        require(Feature::KeyHashStakeCredential);
    }

    if let Some(auxiliary_data) = request.auxiliary_data.as_ref() {
        require(Feature::AuxiliaryData);
        if auxiliary_data.hash.is_some() {
            require(Feature::AuxiliaryDataHash);
        }
    }

    if request.ttl == Some(0) {
        require(Feature::ZeroTTL);
    }

    if !request.mint.is_empty() {
        require(Feature::TokenMinting);
    }

    if !request.additional_witness_requests.is_empty()
        || request.signing_mode == SigningMode::MultisigTransaction
    {
        require(Feature::Multisig);
    }

    if request.include_network_id {
        require(Feature::NetworkIdInTxBody);
    }

    if request.script_data_hash.is_some() {
        require(Feature::ScriptDataHash);
    }

    if request.signing_mode == SigningMode::PlutusTransaction {
        require(Feature::Plutus);
    }

    if request.collateral_return.is_some()
        || request.total_collateral.is_some()
        || !request.reference_inputs.is_empty()
    {
        require(Feature::Babbage);
    }

    features
}

fn output_features(output: &Output, require: &mut impl FnMut(Feature)) {
    if !output.token_bundle.is_empty() {
        require(Feature::MultiassetOutputs);
    }
    if output.datum_hash.is_some() {
        require(Feature::OutputDatumHash);
    }
    if output.is_babbage() {
        require(Feature::Babbage);
    }
}
