#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]

pub mod auxiliary_data;
mod connection;
pub mod consts;
pub mod device;
pub mod error;
pub mod feature_gate;
pub mod firmware;
pub mod legacy;
mod output;
pub mod protocol;
pub mod result;
pub mod streaming;
pub mod transport;

#[cfg(any(test, feature = "test_device"))]
pub mod device_emulator;

pub use cardano_hw_common;
pub use connection::Connection;
pub use consts::{BAUD_RATE, TIMEOUT};
pub use device::{Device, Strategy};
pub use error::{Error, ErrorKind};
pub use firmware::{Feature, FirmwareFeatures, FirmwareVersion};
pub use result::{AuxiliaryDataSupplement, SignedTransaction, Witness, WitnessType};
pub use transport::Transport;

#[cfg(any(test, feature = "test_device"))]
pub use device_emulator::TestDeviceEmulator;

#[cfg(feature = "serial")]
pub use serialport;

pub type Result<T> = std::result::Result<T, error::Error>;
