//! Firmware versions and the capabilities they unlock.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// A firmware version as reported by the device, e.g. `2.4.3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FirmwareVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl FirmwareVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for FirmwareVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || Error::InvalidFirmwareVersion(s.to_string());
        let mut parts = s.trim().split('.');
        let mut next = || -> Result<u32, Error> {
            parts.next().ok_or_else(err)?.parse().map_err(|_| err())
        };
        let version = FirmwareVersion::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(version)
    }
}

/// Transaction features that older firmware does not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    SignStakePoolRegistrationAsOwner,
    ValidityIntervalStart,
    MultiassetOutputs,
    AuxiliaryData,
    ZeroTTL,
    ZeroValidityIntervalStart,
    TransactionStreaming,
    AuxiliaryDataHash,
    TokenMinting,
    Multisig,
    /// Reward addresses in catalyst registrations are given by their staking path
    RewardAddressStakingPath,
    NetworkIdInTxBody,
    OutputDatumHash,
    ScriptDataHash,
    Plutus,
    KeyHashStakeCredential,
    Babbage,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// Minimum version for the two supported major lines, `None` if the line never supports it.
type MinVersions = [Option<FirmwareVersion>; 2];

const fn since_t2(minor: u32, patch: u32) -> MinVersions {
    [None, Some(FirmwareVersion::new(2, minor, patch))]
}

impl Feature {
    pub const ALL: [Feature; 17] = [
        Feature::SignStakePoolRegistrationAsOwner,
        Feature::ValidityIntervalStart,
        Feature::MultiassetOutputs,
        Feature::AuxiliaryData,
        Feature::ZeroTTL,
        Feature::ZeroValidityIntervalStart,
        Feature::TransactionStreaming,
        Feature::AuxiliaryDataHash,
        Feature::TokenMinting,
        Feature::Multisig,
        Feature::RewardAddressStakingPath,
        Feature::NetworkIdInTxBody,
        Feature::OutputDatumHash,
        Feature::ScriptDataHash,
        Feature::Plutus,
        Feature::KeyHashStakeCredential,
        Feature::Babbage,
    ];

    fn min_versions(&self) -> MinVersions {
        match self {
            Feature::SignStakePoolRegistrationAsOwner => since_t2(3, 5),
            Feature::ValidityIntervalStart => since_t2(3, 5),
            Feature::MultiassetOutputs => since_t2(3, 5),
            Feature::AuxiliaryData => since_t2(3, 7),
            Feature::ZeroTTL => since_t2(4, 2),
            Feature::ZeroValidityIntervalStart => since_t2(4, 2),
            Feature::TransactionStreaming => since_t2(4, 2),
            Feature::AuxiliaryDataHash => since_t2(4, 2),
            Feature::TokenMinting => since_t2(4, 3),
            Feature::Multisig => since_t2(4, 3),
            Feature::RewardAddressStakingPath => since_t2(4, 3),
            Feature::NetworkIdInTxBody => since_t2(4, 4),
            Feature::OutputDatumHash => since_t2(4, 4),
            Feature::ScriptDataHash => since_t2(4, 4),
            Feature::Plutus => since_t2(4, 4),
            Feature::KeyHashStakeCredential => since_t2(4, 4),
            Feature::Babbage => since_t2(5, 2),
        }
    }

    /// The minimum version supporting this feature on the major line of `version`.
    pub fn min_version(&self, version: &FirmwareVersion) -> Option<FirmwareVersion> {
        let line = match version.major {
            1 => 0,
            2 => 1,
            _ => return None,
        };
        self.min_versions()[line]
    }
}

/// The capabilities of the connected firmware, computed once from its version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareFeatures {
    version: FirmwareVersion,
}

impl FirmwareFeatures {
    pub fn new(version: FirmwareVersion) -> Self {
        Self { version }
    }

    pub fn version(&self) -> FirmwareVersion {
        self.version
    }

    /// Whether the firmware is at least the minimum version for `feature` on its major line.
    pub fn supports(&self, feature: Feature) -> bool {
        feature
            .min_version(&self.version)
            .map(|min| self.version >= min)
            .unwrap_or(false)
    }

    pub fn ensure(&self, feature: Feature) -> Result<(), Error> {
        if self.supports(feature) {
            Ok(())
        } else {
            Err(Error::FeatureNotSupported {
                feature,
                version: self.version,
            })
        }
    }
}

impl From<FirmwareVersion> for FirmwareFeatures {
    fn from(version: FirmwareVersion) -> Self {
        Self::new(version)
    }
}
