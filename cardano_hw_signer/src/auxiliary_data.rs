use cardano_hw_common::{AddressType, AuxiliaryData};

use crate::firmware::{Feature, FirmwareFeatures};
use crate::protocol::{AddressParametersParams, AuxiliaryDataParams, CatalystRegistrationParams};
use crate::Error;

/// Build the auxiliary data message in the shape expected by the connected firmware.
///
/// The caller's auxiliary data is not modified.
pub fn auxiliary_data_params(
    auxiliary_data: &AuxiliaryData,
    firmware: &FirmwareFeatures,
) -> Result<AuxiliaryDataParams, Error> {
    let catalyst_registration_parameters = match &auxiliary_data.catalyst_registration_parameters
    {
        Some(params) => {
            let params = CatalystRegistrationParams::from(params);
            Some(rewrite_catalyst_registration(params, firmware)?)
        }
        None => None,
    };
    Ok(AuxiliaryDataParams {
        catalyst_registration_parameters,
        hash: auxiliary_data.hash.clone(),
    })
}

fn rewrite_catalyst_registration(
    params: CatalystRegistrationParams,
    firmware: &FirmwareFeatures,
) -> Result<CatalystRegistrationParams, Error> {
    let staking_path = firmware.supports(Feature::RewardAddressStakingPath);
    Ok(CatalystRegistrationParams {
        reward_address_parameters: rewrite_reward_address(
            params.reward_address_parameters,
            staking_path,
        )?,
        ..params
    })
}

/// Reward addresses are identified by their staking key path. Older firmware expects it in
/// `address_n`, newer in `address_n_staking`.
fn rewrite_reward_address(
    mut params: AddressParametersParams,
    staking_path: bool,
) -> Result<AddressParametersParams, Error> {
    if params.address_type != AddressType::Reward {
        return Ok(params);
    }
    if !params.address_n.is_empty() && !params.address_n_staking.is_empty() {
        return Err(Error::InvalidParameter(
            "reward address parameters accept only the staking path".to_string(),
        ));
    }
    if staking_path {
        if !params.address_n.is_empty() {
            params.address_n_staking = std::mem::take(&mut params.address_n);
        }
    } else if !params.address_n_staking.is_empty() {
        params.address_n = std::mem::take(&mut params.address_n_staking);
    }
    tracing::debug!(
        "reward address path in {}",
        if staking_path {
            "address_n_staking"
        } else {
            "address_n"
        }
    );
    Ok(params)
}
