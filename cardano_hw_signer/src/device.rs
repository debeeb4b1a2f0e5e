use std::net::SocketAddr;
use std::sync::{Mutex, PoisonError};

use cardano_hw_common::SigningRequest;

use crate::connection::Connection;
use crate::feature_gate::check_supported;
use crate::firmware::{Feature, FirmwareFeatures, FirmwareVersion};
use crate::legacy::LegacySigner;
use crate::result::SignedTransaction;
use crate::streaming::StreamingSigner;
use crate::transport::Transport;
use crate::Result;

#[cfg(feature = "serial")]
use crate::consts::{BAUD_RATE, TIMEOUT};

/// How the transaction is sent to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The whole transaction in a single message
    Legacy,

    /// One message per item
    Streaming,
}

impl Strategy {
    pub fn select(firmware: &FirmwareFeatures) -> Self {
        if firmware.supports(Feature::TransactionStreaming) {
            Strategy::Streaming
        } else {
            Strategy::Legacy
        }
    }
}

/// A hardware device signing Cardano transactions.
///
/// The transport is locked for the whole signing run, concurrent runs on the same device are
/// serialized.
#[derive(Debug)]
pub struct Device<T: Transport> {
    conn: Mutex<T>,
    firmware: FirmwareFeatures,
}

impl<T: Transport> Device<T> {
    pub fn new(transport: T, firmware_version: FirmwareVersion) -> Self {
        Self {
            conn: Mutex::new(transport),
            firmware: FirmwareFeatures::new(firmware_version),
        }
    }

    pub fn firmware(&self) -> &FirmwareFeatures {
        &self.firmware
    }

    pub fn strategy(&self) -> Strategy {
        Strategy::select(&self.firmware)
    }

    /// Sign `request` and return the transaction hash with the device witnesses.
    ///
    /// Requests the firmware cannot handle fail before anything is sent to the device.
    pub fn sign_transaction(&self, request: &SigningRequest) -> Result<SignedTransaction> {
        check_supported(request, &self.firmware)?;
        let strategy = self.strategy();
        tracing::info!(
            "signing with {strategy:?} strategy, firmware {}",
            self.firmware.version()
        );
        match strategy {
            Strategy::Streaming => {
                let signer = StreamingSigner::new(request, &self.firmware)?;
                let mut conn = self.conn.lock()?;
                signer.sign(&mut *conn)
            }
            Strategy::Legacy => {
                let signer = LegacySigner::new(request, &self.firmware)?;
                let mut conn = self.conn.lock()?;
                signer.sign(&mut *conn)
            }
        }
    }

    pub fn into_inner(self) -> std::result::Result<T, Box<PoisonError<T>>> {
        self.conn.into_inner().map_err(Box::new)
    }

    pub fn get_mut(&mut self) -> std::result::Result<&mut T, Box<PoisonError<&mut T>>> {
        self.conn.get_mut().map_err(Box::new)
    }
}

impl Device<Connection> {
    pub fn from_socket(socket: SocketAddr, firmware_version: FirmwareVersion) -> Result<Self> {
        let stream = std::net::TcpStream::connect(socket)?;
        Ok(Self::new(Connection::TcpStream(stream), firmware_version))
    }

    #[cfg(feature = "serial")]
    pub fn from_serial(
        firmware_version: FirmwareVersion,
        port_name: &str,
        timeout: Option<std::time::Duration>,
    ) -> Result<Self> {
        tracing::info!("serial port {port_name}");
        let timeout = timeout.unwrap_or(TIMEOUT);
        let port = serialport::new(port_name, BAUD_RATE)
            .timeout(timeout)
            .open()?;
        Ok(Self::new(port.into(), firmware_version))
    }
}
