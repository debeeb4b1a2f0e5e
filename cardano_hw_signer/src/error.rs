use std::sync::{MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use serde_cbor::Value;

use crate::firmware::{Feature, FirmwareVersion};

/// The three ways a signing run can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request or a caller supplied value is malformed, nothing was sent to the device
    InvalidParameter,

    /// The connected firmware cannot sign the request, nothing was sent to the device
    FeatureNotSupported,

    /// The device rejected a message, disconnected or replied unexpectedly
    DeviceProtocol,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Feature {feature} is not supported by firmware {version}")]
    FeatureNotSupported {
        feature: Feature,
        version: FirmwareVersion,
    },

    #[error("Invalid firmware version: {0}")]
    InvalidFirmwareVersion(String),

    #[error("Device Error: {0}")]
    DeviceError(ErrorDetails),

    #[error("Device replied {response} to {request}")]
    UnexpectedResponse { request: String, response: String },

    #[error("Device reply {response} is missing {field}")]
    IncompleteReply {
        response: &'static str,
        field: &'static str,
    },

    #[error("Device returned neither an error nor a result")]
    NeitherErrorNorResult,

    #[error("Invalid serialized transaction: {0}")]
    InvalidSerializedTx(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "serial")]
    #[error("Serial Error: {0}")]
    SerialError(#[from] serialport::Error),

    #[error(transparent)]
    SerdeCbor(#[from] serde_cbor::Error),

    #[error(transparent)]
    Common(#[from] cardano_hw_common::Error),

    #[error("Poison error: {0}")]
    PoisonError(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidParameter(_)
            | Error::InvalidFirmwareVersion(_)
            | Error::Common(_) => ErrorKind::InvalidParameter,
            Error::FeatureNotSupported { .. } => ErrorKind::FeatureNotSupported,
            _ => ErrorKind::DeviceProtocol,
        }
    }
}

/// A failure reported by the device.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ErrorDetails {
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
}

impl ErrorDetails {
    pub fn new(code: i64, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            data: None,
        }
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error code: {} - message: {}", self.code, self.message)
    }
}

impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(e: PoisonError<MutexGuard<'_, T>>) -> Self {
        Error::PoisonError(e.to_string())
    }
}
