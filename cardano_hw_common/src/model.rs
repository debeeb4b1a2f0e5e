use serde::{Deserialize, Serialize};

use crate::DerivationPath;

/// The high-level intent of a signing operation.
///
/// It decides which witnesses the device is asked for and which firmware features are needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SigningMode {
    #[default]
    OrdinaryTransaction,
    PoolRegistrationAsOwner,
    MultisigTransaction,
    PlutusTransaction,
}

/// How the device derives its root key from the mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DerivationType {
    Ledger,
    Icarus,
    #[default]
    IcarusTrezor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AddressType {
    Base,
    BaseScriptKey,
    BaseKeyScript,
    BaseScriptScript,
    Pointer,
    PointerScript,
    Enterprise,
    EnterpriseScript,
    Byron,
    Reward,
    RewardScript,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateType {
    StakeRegistration,
    StakeDeregistration,
    StakeDelegation,
    StakePoolRegistration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolRelayType {
    SingleHostIp,
    SingleHostName,
    MultipleHostName,
}

/// Serialization format of a transaction output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputFormat {
    #[default]
    ArrayLegacy,
    MapBabbage,
}

/// Parameters from which the device derives and displays an address it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressParameters {
    pub address_type: AddressType,
    pub address_n: DerivationPath,
    pub address_n_staking: DerivationPath,
    pub staking_key_hash: Option<Vec<u8>>,
    pub script_payment_hash: Option<Vec<u8>>,
    pub script_staking_hash: Option<Vec<u8>>,
}

impl AddressParameters {
    pub fn new(address_type: AddressType, address_n: DerivationPath) -> Self {
        Self {
            address_type,
            address_n,
            address_n_staking: DerivationPath::master(),
            staking_key_hash: None,
            script_payment_hash: None,
            script_staking_hash: None,
        }
    }
}

/// A transaction input; `path` is set when the input is spent by a key of the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub prev_hash: Vec<u8>,
    pub prev_index: u32,
    pub path: Option<DerivationPath>,
}

/// An input referenced but not spent by the transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceInput {
    pub prev_hash: Vec<u8>,
    pub prev_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputDestination {
    /// Third party address, bech32 or base58 encoded
    Address(String),

    /// Address owned by the device, shown as change
    Parameters(AddressParameters),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub asset_name_bytes: Vec<u8>,
    pub amount: u64,
}

/// Tokens of a single minting policy carried by an output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetGroup {
    pub policy_id: Vec<u8>,
    pub tokens: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintToken {
    pub asset_name_bytes: Vec<u8>,

    /// Negative amounts burn tokens
    pub mint_amount: i64,
}

/// Tokens of a single minting policy minted or burned by the transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintAssetGroup {
    pub policy_id: Vec<u8>,
    pub tokens: Vec<MintToken>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub destination: OutputDestination,
    pub amount: u64,
    pub token_bundle: Vec<AssetGroup>,
    pub datum_hash: Option<Vec<u8>>,
    pub format: OutputFormat,
    pub inline_datum: Option<Vec<u8>>,
    pub reference_script: Option<Vec<u8>>,
}

impl Output {
    /// An output without tokens nor datums, in the legacy array format.
    pub fn new(destination: OutputDestination, amount: u64) -> Self {
        Self {
            destination,
            amount,
            token_bundle: vec![],
            datum_hash: None,
            format: OutputFormat::ArrayLegacy,
            inline_datum: None,
            reference_script: None,
        }
    }

    /// Whether this output can only be expressed with the Babbage serialization.
    pub fn is_babbage(&self) -> bool {
        self.format == OutputFormat::MapBabbage
            || self.inline_datum.is_some()
            || self.reference_script.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolOwner {
    pub staking_key_path: Option<DerivationPath>,
    pub staking_key_hash: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolRelay {
    pub relay_type: PoolRelayType,
    pub ipv4_address: Option<Vec<u8>>,
    pub ipv6_address: Option<Vec<u8>>,
    pub host_name: Option<String>,
    pub port: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolMetadata {
    pub url: String,
    pub hash: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolParameters {
    pub pool_id: Vec<u8>,
    pub vrf_key_hash: Vec<u8>,
    pub pledge: u64,
    pub cost: u64,
    pub margin_numerator: u64,
    pub margin_denominator: u64,
    pub reward_account: String,
    pub owners: Vec<PoolOwner>,
    pub relays: Vec<PoolRelay>,
    pub metadata: Option<PoolMetadata>,
}

/// A certificate; exactly one of `path`, `script_hash` and `key_hash` identifies the stake
/// credential, except for pool registrations which carry `pool_parameters` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub certificate_type: CertificateType,
    pub path: Option<DerivationPath>,
    pub pool: Option<Vec<u8>>,
    pub pool_parameters: Option<PoolParameters>,
    pub script_hash: Option<Vec<u8>>,
    pub key_hash: Option<Vec<u8>>,
}

impl Certificate {
    pub fn is_pool_registration(&self) -> bool {
        self.certificate_type == CertificateType::StakePoolRegistration
    }

    pub fn pool_owners(&self) -> &[PoolOwner] {
        self.pool_parameters
            .as_ref()
            .map(|p| p.owners.as_slice())
            .unwrap_or_default()
    }

    pub fn pool_relays(&self) -> &[PoolRelay] {
        self.pool_parameters
            .as_ref()
            .map(|p| p.relays.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Withdrawal {
    pub path: Option<DerivationPath>,
    pub amount: u64,
    pub script_hash: Option<Vec<u8>>,
    pub key_hash: Option<Vec<u8>>,
}

/// A key whose signature is required by a Plutus script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequiredSigner {
    KeyHash(Vec<u8>),
    KeyPath(DerivationPath),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalystRegistrationParameters {
    pub voting_public_key: Vec<u8>,
    pub staking_path: DerivationPath,
    pub reward_address_parameters: AddressParameters,
    pub nonce: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuxiliaryData {
    pub hash: Option<Vec<u8>>,
    pub catalyst_registration_parameters: Option<CatalystRegistrationParameters>,
}

/// A fully normalized and validated request to sign a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SigningRequest {
    pub signing_mode: SigningMode,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub fee: u64,
    pub ttl: Option<u64>,
    pub certificates: Vec<Certificate>,
    pub withdrawals: Vec<Withdrawal>,
    pub auxiliary_data: Option<AuxiliaryData>,
    pub validity_interval_start: Option<u64>,
    pub mint: Vec<MintAssetGroup>,
    pub script_data_hash: Option<Vec<u8>>,
    pub collateral_inputs: Vec<Input>,
    pub required_signers: Vec<RequiredSigner>,
    pub collateral_return: Option<Output>,
    pub total_collateral: Option<u64>,
    pub reference_inputs: Vec<ReferenceInput>,
    pub additional_witness_requests: Vec<DerivationPath>,
    pub protocol_magic: u32,
    pub network_id: u32,
    pub derivation_type: DerivationType,
    pub include_network_id: bool,
}

impl SigningRequest {
    /// An ordinary transaction request with the given network parameters and no items.
    pub fn new(protocol_magic: u32, network_id: u32) -> Self {
        Self {
            protocol_magic,
            network_id,
            ..Default::default()
        }
    }

    /// Every output the device receives, the collateral return included.
    pub fn all_outputs(&self) -> impl Iterator<Item = &Output> {
        self.outputs.iter().chain(self.collateral_return.iter())
    }
}
