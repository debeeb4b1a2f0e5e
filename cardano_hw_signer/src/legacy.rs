//! The single call signing protocol of firmware predating transaction streaming.
//!
//! The whole transaction is sent in one message; the device answers with the signed
//! transaction, either directly or in chunks acked one by one.

use cardano_hw_common::{
    AssetGroup, Certificate, CertificateType, Input, Output, PoolParameters, SigningRequest,
};
use serde::Serialize;
use serde_cbor::Value;

use crate::auxiliary_data::auxiliary_data_params;
use crate::firmware::FirmwareFeatures;
use crate::output::destination_params;
use crate::protocol::{
    AuxiliaryDataParams, PoolMetadataParams, PoolOwnerParams, PoolRelayParams, Request, Response,
    WithdrawalParams,
};
use crate::result::{ResultAssembler, SignedTransaction, Witness, WitnessType};
use crate::streaming::{exchange, unexpected};
use crate::transport::Transport;
use crate::{Error, Result};

#[derive(Debug, Clone, Serialize)]
pub struct LegacySignTxParams {
    pub inputs: Vec<LegacyInputParams>,
    pub outputs: Vec<LegacyOutputParams>,
    pub protocol_magic: u32,
    pub fee: u64,
    pub ttl: Option<u64>,
    pub network_id: u32,
    pub certificates: Vec<LegacyCertificateParams>,
    pub withdrawals: Vec<WithdrawalParams>,
    pub auxiliary_data: Option<AuxiliaryDataParams>,
    pub validity_interval_start: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegacyInputParams {
    pub address_n: Vec<u32>,
    #[serde(with = "serde_bytes")]
    pub prev_hash: Vec<u8>,
    pub prev_index: u32,
}

impl From<&Input> for LegacyInputParams {
    fn from(input: &Input) -> Self {
        Self {
            address_n: input.path.as_ref().map(|p| p.to_vec()).unwrap_or_default(),
            prev_hash: input.prev_hash.clone(),
            prev_index: input.prev_index,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LegacyTokenParams {
    #[serde(with = "serde_bytes")]
    pub asset_name_bytes: Vec<u8>,
    pub amount: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegacyAssetGroupParams {
    #[serde(with = "serde_bytes")]
    pub policy_id: Vec<u8>,
    pub tokens: Vec<LegacyTokenParams>,
}

impl From<&AssetGroup> for LegacyAssetGroupParams {
    fn from(group: &AssetGroup) -> Self {
        Self {
            policy_id: group.policy_id.clone(),
            tokens: group
                .tokens
                .iter()
                .map(|t| LegacyTokenParams {
                    asset_name_bytes: t.asset_name_bytes.clone(),
                    amount: t.amount,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LegacyOutputParams {
    pub address: Option<String>,
    pub address_parameters: Option<crate::protocol::AddressParametersParams>,
    pub amount: u64,
    pub token_bundle: Vec<LegacyAssetGroupParams>,
}

impl From<&Output> for LegacyOutputParams {
    fn from(output: &Output) -> Self {
        let (address, address_parameters) = destination_params(&output.destination);
        Self {
            address,
            address_parameters,
            amount: output.amount,
            token_bundle: output.token_bundle.iter().map(Into::into).collect(),
        }
    }
}

/// Pool parameters with owners and relays inline.
#[derive(Debug, Clone, Serialize)]
pub struct LegacyPoolParametersParams {
    #[serde(with = "serde_bytes")]
    pub pool_id: Vec<u8>,
    #[serde(with = "serde_bytes")]
    pub vrf_key_hash: Vec<u8>,
    pub pledge: u64,
    pub cost: u64,
    pub margin_numerator: u64,
    pub margin_denominator: u64,
    pub reward_account: String,
    pub owners: Vec<PoolOwnerParams>,
    pub relays: Vec<PoolRelayParams>,
    pub metadata: Option<PoolMetadataParams>,
}

impl From<&PoolParameters> for LegacyPoolParametersParams {
    fn from(p: &PoolParameters) -> Self {
        Self {
            pool_id: p.pool_id.clone(),
            vrf_key_hash: p.vrf_key_hash.clone(),
            pledge: p.pledge,
            cost: p.cost,
            margin_numerator: p.margin_numerator,
            margin_denominator: p.margin_denominator,
            reward_account: p.reward_account.clone(),
            owners: p.owners.iter().map(Into::into).collect(),
            relays: p.relays.iter().map(Into::into).collect(),
            metadata: p.metadata.as_ref().map(|m| PoolMetadataParams {
                url: m.url.clone(),
                hash: m.hash.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LegacyCertificateParams {
    #[serde(rename = "type")]
    pub certificate_type: CertificateType,
    pub path: Vec<u32>,
    #[serde(with = "serde_bytes")]
    pub pool: Option<Vec<u8>>,
    pub pool_parameters: Option<LegacyPoolParametersParams>,
}

impl From<&Certificate> for LegacyCertificateParams {
    fn from(certificate: &Certificate) -> Self {
        Self {
            certificate_type: certificate.certificate_type,
            path: certificate
                .path
                .as_ref()
                .map(|p| p.to_vec())
                .unwrap_or_default(),
            pool: certificate.pool.clone(),
            pool_parameters: certificate.pool_parameters.as_ref().map(Into::into),
        }
    }
}

/// The first item of `request` the single call message has no field for.
fn unsupported_item(request: &SigningRequest) -> Option<&'static str> {
    let script_credential = request.certificates.iter().any(|c| c.script_hash.is_some())
        || request.withdrawals.iter().any(|w| w.script_hash.is_some());
    let output_extras = request.outputs.iter().any(|o| {
        o.datum_hash.is_some() || o.inline_datum.is_some() || o.reference_script.is_some()
    });
    [
        (!request.mint.is_empty(), "mint"),
        (request.script_data_hash.is_some(), "script data hash"),
        (!request.collateral_inputs.is_empty(), "collateral inputs"),
        (!request.required_signers.is_empty(), "required signers"),
        (request.collateral_return.is_some(), "collateral return"),
        (request.total_collateral.is_some(), "total collateral"),
        (!request.reference_inputs.is_empty(), "reference inputs"),
        (
            !request.additional_witness_requests.is_empty(),
            "additional witness requests",
        ),
        (request.include_network_id, "network id"),
        (script_credential, "script credentials"),
        (output_extras, "output datum or reference script"),
    ]
    .into_iter()
    .find_map(|(present, name)| present.then_some(name))
}

impl LegacySignTxParams {
    /// Convert a request to the shape of the single call protocol.
    ///
    /// Fails with [`Error::InvalidParameter`] if the request has items the message cannot carry.
    pub fn new(request: &SigningRequest, firmware: &FirmwareFeatures) -> Result<Self> {
        if let Some(item) = unsupported_item(request) {
            return Err(Error::InvalidParameter(format!(
                "{item} cannot be signed with the single call protocol"
            )));
        }
        let auxiliary_data = request
            .auxiliary_data
            .as_ref()
            .map(|a| auxiliary_data_params(a, firmware))
            .transpose()?;
        Ok(Self {
            inputs: request.inputs.iter().map(Into::into).collect(),
            outputs: request.outputs.iter().map(Into::into).collect(),
            protocol_magic: request.protocol_magic,
            fee: request.fee,
            ttl: request.ttl,
            network_id: request.network_id,
            certificates: request.certificates.iter().map(Into::into).collect(),
            withdrawals: request.withdrawals.iter().map(Into::into).collect(),
            auxiliary_data,
            validity_interval_start: request.validity_interval_start,
        })
    }
}

pub struct LegacySigner {
    params: LegacySignTxParams,
}

impl LegacySigner {
    pub fn new(request: &SigningRequest, firmware: &FirmwareFeatures) -> Result<Self> {
        Ok(Self {
            params: LegacySignTxParams::new(request, firmware)?,
        })
    }

    pub fn sign<T: Transport + ?Sized>(self, conn: &mut T) -> Result<SignedTransaction> {
        let (hash, serialized_tx) = self.serialized_tx(conn)?;
        tracing::info!(
            "signed tx {} ({} bytes)",
            hex::encode(&hash),
            serialized_tx.len()
        );
        legacy_serialized_tx_to_result(hash, &serialized_tx)
    }

    /// Send the transaction and reassemble the signed transaction returned by the device.
    ///
    /// Returns the transaction hash and the serialized signed transaction.
    pub fn serialized_tx<T: Transport + ?Sized>(self, conn: &mut T) -> Result<(Vec<u8>, Vec<u8>)> {
        let mut serialized_tx = vec![];
        let mut request = Request::SignTx(self.params);
        loop {
            let name = request.to_string();
            match exchange(conn, request)? {
                Response::SignedTxChunk(chunk) => {
                    serialized_tx.extend(chunk.signed_tx_chunk);
                    request = Request::SignedTxChunkAck;
                }
                Response::SignedTx(signed) => {
                    // Firmware without chunking sends the whole transaction here
                    if let Some(rest) = signed.serialized_tx {
                        serialized_tx.extend(rest);
                    }
                    return Ok((signed.tx_hash, serialized_tx));
                }
                other => return Err(unexpected(name, &other)),
            }
        }
    }
}

/// Extract the witnesses from a serialized signed transaction `[body, witness_set, ..]`.
///
/// Vkey witnesses become Shelley witnesses, bootstrap witnesses become Byron witnesses.
pub fn legacy_serialized_tx_to_result(
    hash: Vec<u8>,
    serialized_tx: &[u8],
) -> Result<SignedTransaction> {
    let tx: Value = serde_cbor::from_slice(serialized_tx)
        .map_err(|e| Error::InvalidSerializedTx(e.to_string()))?;
    let witness_set = match &tx {
        Value::Array(items) => match items.get(1) {
            Some(Value::Map(witness_set)) => witness_set,
            _ => return Err(invalid("missing witness set")),
        },
        _ => return Err(invalid("transaction is not an array")),
    };

    let mut assembler = ResultAssembler::default();
    if let Some(vkey_witnesses) = witness_set.get(&Value::Integer(0)) {
        for witness in as_array(vkey_witnesses)? {
            let fields = as_array(witness)?;
            assembler.push_witness(Witness {
                witness_type: WitnessType::ShelleyWitness,
                pub_key: as_bytes(fields.first())?,
                signature: as_bytes(fields.get(1))?,
                chain_code: None,
            });
        }
    }
    if let Some(bootstrap_witnesses) = witness_set.get(&Value::Integer(2)) {
        for witness in as_array(bootstrap_witnesses)? {
            let fields = as_array(witness)?;
            assembler.push_witness(Witness {
                witness_type: WitnessType::ByronWitness,
                pub_key: as_bytes(fields.first())?,
                signature: as_bytes(fields.get(1))?,
                chain_code: Some(as_bytes(fields.get(2))?),
            });
        }
    }
    Ok(assembler.finish(hash))
}

fn invalid(message: &str) -> Error {
    Error::InvalidSerializedTx(message.to_string())
}

fn as_array(value: &Value) -> Result<&Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(invalid("expected an array")),
    }
}

fn as_bytes(value: Option<&Value>) -> Result<Vec<u8>> {
    match value {
        Some(Value::Bytes(bytes)) => Ok(bytes.clone()),
        _ => Err(invalid("expected bytes")),
    }
}
