//! Messages exchanged with the device while signing a transaction.

use std::fmt::Debug;

use cardano_hw_common::{
    AddressParameters, AddressType, AssetGroup, CatalystRegistrationParameters, Certificate,
    CertificateType, DerivationType, Input, MintAssetGroup, MintToken, OutputFormat, PoolOwner,
    PoolRelay, PoolRelayType, ReferenceInput, RequiredSigner, SigningMode, SigningRequest, Token,
    Withdrawal,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::{
    error::ErrorDetails,
    legacy::LegacySignTxParams,
    result::{AuxiliaryDataSupplementType, WitnessType},
    Error,
};

/// Item counts and payload sizes are declared to the device as `u32`.
pub(crate) fn wire_count(len: usize, what: &str) -> Result<u32, Error> {
    u32::try_from(len)
        .map_err(|_| Error::InvalidParameter(format!("{len} {what} exceed the device limit")))
}

#[derive(Debug, Serialize)]
pub struct FullRequest {
    pub id: String,
    pub method: String,
    pub params: Request,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Request {
    SignTxInit(SignTxInitParams),
    TxInput(TxInputParams),
    TxOutput(TxOutputParams),
    AssetGroup(AssetGroupParams),
    Token(TokenParams),
    InlineDatumChunk(ChunkParams),
    ReferenceScriptChunk(ChunkParams),
    TxCertificate(CertificateParams),
    PoolOwner(PoolOwnerParams),
    PoolRelay(PoolRelayParams),
    TxWithdrawal(WithdrawalParams),
    TxAuxiliaryData(AuxiliaryDataParams),
    TxMint(MintParams),
    TxCollateralInput(TxInputParams),
    TxRequiredSigner(RequiredSignerParams),
    TxReferenceInput(TxInputParams),
    TxWitnessRequest(WitnessRequestParams),
    TxHostAck,
    SignTx(LegacySignTxParams),
    SignedTxChunkAck,
}

impl std::fmt::Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Request::SignTxInit(_) => write!(f, "CardanoSignTxInit"),
            Request::TxInput(_) => write!(f, "CardanoTxInput"),
            Request::TxOutput(_) => write!(f, "CardanoTxOutput"),
            Request::AssetGroup(_) => write!(f, "CardanoAssetGroup"),
            Request::Token(_) => write!(f, "CardanoToken"),
            Request::InlineDatumChunk(_) => write!(f, "CardanoTxInlineDatumChunk"),
            Request::ReferenceScriptChunk(_) => write!(f, "CardanoTxReferenceScriptChunk"),
            Request::TxCertificate(_) => write!(f, "CardanoTxCertificate"),
            Request::PoolOwner(_) => write!(f, "CardanoPoolOwner"),
            Request::PoolRelay(_) => write!(f, "CardanoPoolRelayParameters"),
            Request::TxWithdrawal(_) => write!(f, "CardanoTxWithdrawal"),
            Request::TxAuxiliaryData(_) => write!(f, "CardanoTxAuxiliaryData"),
            Request::TxMint(_) => write!(f, "CardanoTxMint"),
            Request::TxCollateralInput(_) => write!(f, "CardanoTxCollateralInput"),
            Request::TxRequiredSigner(_) => write!(f, "CardanoTxRequiredSigner"),
            Request::TxReferenceInput(_) => write!(f, "CardanoTxReferenceInput"),
            Request::TxWitnessRequest(_) => write!(f, "CardanoTxWitnessRequest"),
            Request::TxHostAck => write!(f, "CardanoTxHostAck"),
            Request::SignTx(_) => write!(f, "CardanoSignTx"),
            Request::SignedTxChunkAck => write!(f, "CardanoSignedTxChunkAck"),
        }
    }
}

impl Request {
    pub fn serialize(self) -> Result<Vec<u8>, crate::Error> {
        let mut rng = rand::thread_rng();
        let id = rng.next_u32().to_string();
        let method = self.to_string();
        let req = FullRequest {
            id,
            method,
            params: self,
        };
        let mut buf = Vec::new();
        serde_cbor::to_writer(&mut buf, &req)?;
        tracing::trace!(
            "\n--->\t{:#?}\n\t({} bytes) {}",
            &req,
            buf.len(),
            &hex::encode(&buf),
        );
        Ok(buf)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FullResponse {
    pub id: String,
    pub result: Option<Response>,
    pub error: Option<ErrorDetails>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum Response {
    #[serde(rename = "CardanoTxItemAck")]
    TxItemAck,

    #[serde(rename = "CardanoTxAuxiliaryDataSupplement")]
    TxAuxiliaryDataSupplement(AuxiliaryDataSupplementResult),

    #[serde(rename = "CardanoTxWitnessResponse")]
    TxWitnessResponse(WitnessResult),

    #[serde(rename = "CardanoTxBodyHash")]
    TxBodyHash(TxBodyHashResult),

    #[serde(rename = "CardanoSignTxFinished")]
    SignTxFinished,

    #[serde(rename = "CardanoSignedTxChunk")]
    SignedTxChunk(SignedTxChunkResult),

    #[serde(rename = "CardanoSignedTx")]
    SignedTx(SignedTxResult),
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Response::TxItemAck => write!(f, "CardanoTxItemAck"),
            Response::TxAuxiliaryDataSupplement(_) => write!(f, "CardanoTxAuxiliaryDataSupplement"),
            Response::TxWitnessResponse(_) => write!(f, "CardanoTxWitnessResponse"),
            Response::TxBodyHash(_) => write!(f, "CardanoTxBodyHash"),
            Response::SignTxFinished => write!(f, "CardanoSignTxFinished"),
            Response::SignedTxChunk(_) => write!(f, "CardanoSignedTxChunk"),
            Response::SignedTx(_) => write!(f, "CardanoSignedTx"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignTxInitParams {
    pub signing_mode: SigningMode,
    pub protocol_magic: u32,
    pub network_id: u32,
    pub inputs_count: u32,
    pub outputs_count: u32,
    pub fee: u64,
    pub ttl: Option<u64>,
    pub certificates_count: u32,
    pub withdrawals_count: u32,
    pub has_auxiliary_data: bool,
    pub validity_interval_start: Option<u64>,
    pub witness_requests_count: u32,
    pub minting_asset_groups_count: u32,
    pub derivation_type: DerivationType,
    pub include_network_id: bool,
    #[serde(with = "serde_bytes")]
    pub script_data_hash: Option<Vec<u8>>,
    pub collateral_inputs_count: u32,
    pub required_signers_count: u32,
    pub has_collateral_return: bool,
    pub total_collateral: Option<u64>,
    pub reference_inputs_count: u32,
}

impl SignTxInitParams {
    pub fn new(request: &SigningRequest, witness_requests_count: usize) -> Result<Self, Error> {
        Ok(Self {
            signing_mode: request.signing_mode,
            protocol_magic: request.protocol_magic,
            network_id: request.network_id,
            inputs_count: wire_count(request.inputs.len(), "inputs")?,
            outputs_count: wire_count(request.outputs.len(), "outputs")?,
            fee: request.fee,
            ttl: request.ttl,
            certificates_count: wire_count(request.certificates.len(), "certificates")?,
            withdrawals_count: wire_count(request.withdrawals.len(), "withdrawals")?,
            has_auxiliary_data: request.auxiliary_data.is_some(),
            validity_interval_start: request.validity_interval_start,
            witness_requests_count: wire_count(witness_requests_count, "witness requests")?,
            minting_asset_groups_count: wire_count(request.mint.len(), "minting asset groups")?,
            derivation_type: request.derivation_type,
            include_network_id: request.include_network_id,
            script_data_hash: request.script_data_hash.clone(),
            collateral_inputs_count: wire_count(
                request.collateral_inputs.len(),
                "collateral inputs",
            )?,
            required_signers_count: wire_count(
                request.required_signers.len(),
                "required signers",
            )?,
            has_collateral_return: request.collateral_return.is_some(),
            total_collateral: request.total_collateral,
            reference_inputs_count: wire_count(
                request.reference_inputs.len(),
                "reference inputs",
            )?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TxInputParams {
    #[serde(with = "serde_bytes")]
    pub prev_hash: Vec<u8>,
    pub prev_index: u32,
}

impl From<&Input> for TxInputParams {
    fn from(input: &Input) -> Self {
        Self {
            prev_hash: input.prev_hash.clone(),
            prev_index: input.prev_index,
        }
    }
}

impl From<&ReferenceInput> for TxInputParams {
    fn from(input: &ReferenceInput) -> Self {
        Self {
            prev_hash: input.prev_hash.clone(),
            prev_index: input.prev_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressParametersParams {
    pub address_type: AddressType,
    pub address_n: Vec<u32>,
    pub address_n_staking: Vec<u32>,
    #[serde(with = "serde_bytes")]
    pub staking_key_hash: Option<Vec<u8>>,
    #[serde(with = "serde_bytes")]
    pub script_payment_hash: Option<Vec<u8>>,
    #[serde(with = "serde_bytes")]
    pub script_staking_hash: Option<Vec<u8>>,
}

impl From<&AddressParameters> for AddressParametersParams {
    fn from(params: &AddressParameters) -> Self {
        Self {
            address_type: params.address_type,
            address_n: params.address_n.to_vec(),
            address_n_staking: params.address_n_staking.to_vec(),
            staking_key_hash: params.staking_key_hash.clone(),
            script_payment_hash: params.script_payment_hash.clone(),
            script_staking_hash: params.script_staking_hash.clone(),
        }
    }
}

/// Header of an output, followed on the wire by its asset groups and datum/script chunks.
#[derive(Debug, Clone, Serialize)]
pub struct TxOutputParams {
    pub address: Option<String>,
    pub address_parameters: Option<AddressParametersParams>,
    pub amount: u64,
    pub asset_groups_count: u32,
    #[serde(with = "serde_bytes")]
    pub datum_hash: Option<Vec<u8>>,
    pub format: OutputFormat,
    pub inline_datum_size: u32,
    pub reference_script_size: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetGroupParams {
    #[serde(with = "serde_bytes")]
    pub policy_id: Vec<u8>,
    pub tokens_count: u32,
}

impl TryFrom<&AssetGroup> for AssetGroupParams {
    type Error = Error;

    fn try_from(group: &AssetGroup) -> Result<Self, Error> {
        Ok(Self {
            policy_id: group.policy_id.clone(),
            tokens_count: wire_count(group.tokens.len(), "tokens")?,
        })
    }
}

impl TryFrom<&MintAssetGroup> for AssetGroupParams {
    type Error = Error;

    fn try_from(group: &MintAssetGroup) -> Result<Self, Error> {
        Ok(Self {
            policy_id: group.policy_id.clone(),
            tokens_count: wire_count(group.tokens.len(), "tokens")?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenParams {
    #[serde(with = "serde_bytes")]
    pub asset_name_bytes: Vec<u8>,
    pub amount: Option<u64>,
    pub mint_amount: Option<i64>,
}

impl From<&Token> for TokenParams {
    fn from(token: &Token) -> Self {
        Self {
            asset_name_bytes: token.asset_name_bytes.clone(),
            amount: Some(token.amount),
            mint_amount: None,
        }
    }
}

impl From<&MintToken> for TokenParams {
    fn from(token: &MintToken) -> Self {
        Self {
            asset_name_bytes: token.asset_name_bytes.clone(),
            amount: None,
            mint_amount: Some(token.mint_amount),
        }
    }
}

#[derive(Clone, Serialize)]
pub struct ChunkParams {
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
}

impl Debug for ChunkParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkParams")
            .field("data", &hex::encode(&self.data))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolMetadataParams {
    pub url: String,
    #[serde(with = "serde_bytes")]
    pub hash: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolParametersParams {
    #[serde(with = "serde_bytes")]
    pub pool_id: Vec<u8>,
    #[serde(with = "serde_bytes")]
    pub vrf_key_hash: Vec<u8>,
    pub pledge: u64,
    pub cost: u64,
    pub margin_numerator: u64,
    pub margin_denominator: u64,
    pub reward_account: String,
    pub owners_count: u32,
    pub relays_count: u32,
    pub metadata: Option<PoolMetadataParams>,
}

/// A certificate; pool owners and relays follow it as separate messages.
#[derive(Debug, Clone, Serialize)]
pub struct CertificateParams {
    #[serde(rename = "type")]
    pub certificate_type: CertificateType,
    pub path: Vec<u32>,
    #[serde(with = "serde_bytes")]
    pub pool: Option<Vec<u8>>,
    pub pool_parameters: Option<PoolParametersParams>,
    #[serde(with = "serde_bytes")]
    pub script_hash: Option<Vec<u8>>,
    #[serde(with = "serde_bytes")]
    pub key_hash: Option<Vec<u8>>,
}

impl TryFrom<&Certificate> for CertificateParams {
    type Error = Error;

    fn try_from(certificate: &Certificate) -> Result<Self, Error> {
        let pool_parameters = match certificate.pool_parameters.as_ref() {
            Some(p) => Some(PoolParametersParams {
                pool_id: p.pool_id.clone(),
                vrf_key_hash: p.vrf_key_hash.clone(),
                pledge: p.pledge,
                cost: p.cost,
                margin_numerator: p.margin_numerator,
                margin_denominator: p.margin_denominator,
                reward_account: p.reward_account.clone(),
                owners_count: wire_count(p.owners.len(), "pool owners")?,
                relays_count: wire_count(p.relays.len(), "pool relays")?,
                metadata: p.metadata.as_ref().map(|m| PoolMetadataParams {
                    url: m.url.clone(),
                    hash: m.hash.clone(),
                }),
            }),
            None => None,
        };
        Ok(Self {
            certificate_type: certificate.certificate_type,
            path: certificate
                .path
                .as_ref()
                .map(|p| p.to_vec())
                .unwrap_or_default(),
            pool: certificate.pool.clone(),
            pool_parameters,
            script_hash: certificate.script_hash.clone(),
            key_hash: certificate.key_hash.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolOwnerParams {
    pub staking_key_path: Vec<u32>,
    #[serde(with = "serde_bytes")]
    pub staking_key_hash: Option<Vec<u8>>,
}

impl From<&PoolOwner> for PoolOwnerParams {
    fn from(owner: &PoolOwner) -> Self {
        Self {
            staking_key_path: owner
                .staking_key_path
                .as_ref()
                .map(|p| p.to_vec())
                .unwrap_or_default(),
            staking_key_hash: owner.staking_key_hash.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolRelayParams {
    #[serde(rename = "type")]
    pub relay_type: PoolRelayType,
    #[serde(with = "serde_bytes")]
    pub ipv4_address: Option<Vec<u8>>,
    #[serde(with = "serde_bytes")]
    pub ipv6_address: Option<Vec<u8>>,
    pub host_name: Option<String>,
    pub port: Option<u32>,
}

impl From<&PoolRelay> for PoolRelayParams {
    fn from(relay: &PoolRelay) -> Self {
        Self {
            relay_type: relay.relay_type,
            ipv4_address: relay.ipv4_address.clone(),
            ipv6_address: relay.ipv6_address.clone(),
            host_name: relay.host_name.clone(),
            port: relay.port,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalParams {
    pub path: Vec<u32>,
    pub amount: u64,
    #[serde(with = "serde_bytes")]
    pub script_hash: Option<Vec<u8>>,
    #[serde(with = "serde_bytes")]
    pub key_hash: Option<Vec<u8>>,
}

impl From<&Withdrawal> for WithdrawalParams {
    fn from(withdrawal: &Withdrawal) -> Self {
        Self {
            path: withdrawal
                .path
                .as_ref()
                .map(|p| p.to_vec())
                .unwrap_or_default(),
            amount: withdrawal.amount,
            script_hash: withdrawal.script_hash.clone(),
            key_hash: withdrawal.key_hash.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalystRegistrationParams {
    #[serde(with = "serde_bytes")]
    pub voting_public_key: Vec<u8>,
    pub staking_path: Vec<u32>,
    pub reward_address_parameters: AddressParametersParams,
    pub nonce: u64,
}

impl From<&CatalystRegistrationParameters> for CatalystRegistrationParams {
    fn from(params: &CatalystRegistrationParameters) -> Self {
        Self {
            voting_public_key: params.voting_public_key.clone(),
            staking_path: params.staking_path.to_vec(),
            reward_address_parameters: (&params.reward_address_parameters).into(),
            nonce: params.nonce,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuxiliaryDataParams {
    pub catalyst_registration_parameters: Option<CatalystRegistrationParams>,
    #[serde(with = "serde_bytes")]
    pub hash: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MintParams {
    pub asset_groups_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequiredSignerParams {
    #[serde(with = "serde_bytes")]
    pub key_hash: Option<Vec<u8>>,
    pub key_path: Vec<u32>,
}

impl From<&RequiredSigner> for RequiredSignerParams {
    fn from(signer: &RequiredSigner) -> Self {
        match signer {
            RequiredSigner::KeyHash(hash) => Self {
                key_hash: Some(hash.clone()),
                key_path: vec![],
            },
            RequiredSigner::KeyPath(path) => Self {
                key_hash: None,
                key_path: path.to_vec(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WitnessRequestParams {
    pub path: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuxiliaryDataSupplementResult {
    #[serde(rename = "type")]
    pub supplement_type: AuxiliaryDataSupplementType,
    #[serde(with = "serde_bytes", default)]
    pub auxiliary_data_hash: Option<Vec<u8>>,
    #[serde(with = "serde_bytes", default)]
    pub catalyst_signature: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WitnessResult {
    #[serde(rename = "type")]
    pub witness_type: WitnessType,
    #[serde(with = "serde_bytes")]
    pub pub_key: Vec<u8>,
    #[serde(with = "serde_bytes")]
    pub signature: Vec<u8>,
    #[serde(with = "serde_bytes", default)]
    pub chain_code: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TxBodyHashResult {
    #[serde(with = "serde_bytes")]
    pub tx_hash: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SignedTxChunkResult {
    #[serde(with = "serde_bytes")]
    pub signed_tx_chunk: Vec<u8>,
}

/// Terminal reply of the legacy protocol.
///
/// Firmware predating chunking returns the whole transaction in `serialized_tx`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SignedTxResult {
    #[serde(with = "serde_bytes")]
    pub tx_hash: Vec<u8>,
    #[serde(with = "serde_bytes", default)]
    pub serialized_tx: Option<Vec<u8>>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn serialize_unit_request() {
        let a = Request::TxHostAck;
        let s = serde_json::to_string(&a).unwrap();
        assert_eq!(s, "null");
        assert_eq!(a.to_string(), "CardanoTxHostAck");
    }

    #[test]
    fn serialize_params() {
        let params = WitnessRequestParams {
            path: vec![2147485500, 2147485463, 2147483648, 2, 0],
        };
        let s = serde_json::to_string(&Request::TxWitnessRequest(params)).unwrap();
        assert_eq!(s, r#"{"path":[2147485500,2147485463,2147483648,2,0]}"#);

        let relay = PoolRelayParams {
            relay_type: PoolRelayType::SingleHostName,
            ipv4_address: None,
            ipv6_address: None,
            host_name: Some("relay.example.com".to_string()),
            port: Some(3001),
        };
        let v = serde_json::to_value(&relay).unwrap();
        assert_eq!(v["type"], "SINGLE_HOST_NAME");
        assert_eq!(v["port"], 3001);
    }

    #[test]
    fn counts_beyond_u32_rejected() {
        assert_eq!(wire_count(3, "inputs").unwrap(), 3);
        assert_eq!(wire_count(u32::MAX as usize, "inputs").unwrap(), u32::MAX);

        #[cfg(target_pointer_width = "64")]
        {
            let err = wire_count(u32::MAX as usize + 1, "inputs").unwrap_err();
            assert_eq!(err.kind(), crate::ErrorKind::InvalidParameter);
            assert!(err.to_string().contains("inputs"));
        }
    }

    #[test]
    fn response_cbor_roundtrip() {
        let response = FullResponse {
            id: "1".to_string(),
            result: Some(Response::TxItemAck),
            error: None,
        };
        let bytes = serde_cbor::to_vec(&response).unwrap();
        let back: FullResponse = serde_cbor::from_slice(&bytes).unwrap();
        assert_eq!(back.result, Some(Response::TxItemAck));

        let witness = Response::TxWitnessResponse(WitnessResult {
            witness_type: WitnessType::ShelleyWitness,
            pub_key: vec![1u8; 32],
            signature: vec![2u8; 64],
            chain_code: None,
        });
        let bytes = serde_cbor::to_vec(&witness).unwrap();
        let back: Response = serde_cbor::from_slice(&bytes).unwrap();
        assert_eq!(back, witness);
        assert_eq!(back.to_string(), "CardanoTxWitnessResponse");
    }
}
