use std::io::{self, ErrorKind, Read, Write};
use std::net::TcpStream;

use crate::consts::RX_BUFFER_SIZE;
use crate::protocol::{FullResponse, Request, Response};
use crate::transport::Transport;
use crate::{Error, Result};

/// A CBOR framed link to the device.
#[derive(Debug)]
pub enum Connection {
    TcpStream(TcpStream),

    #[cfg(feature = "serial")]
    Serial(Box<dyn serialport::SerialPort>),

    #[cfg(test)]
    PartialReadTest {
        data: Vec<u8>,
        status: usize,
    },
}

impl Connection {
    pub fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            Connection::TcpStream(stream) => stream.write_all(buf),

            #[cfg(feature = "serial")]
            Connection::Serial(port) => port.write_all(buf),

            #[cfg(test)]
            Connection::PartialReadTest { data: _, status: _ } => Ok(()),
        }
    }

    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Connection::TcpStream(stream) => stream.read(buf),

            #[cfg(feature = "serial")]
            Connection::Serial(port) => port.read(buf),

            #[cfg(test)]
            Connection::PartialReadTest { data, status } => match status {
                0 => {
                    buf[0] = data[0];
                    *status = 1;
                    Ok(1)
                }
                1 => {
                    *status = 2;
                    Err(io::Error::new(io::ErrorKind::Interrupted, "oh no!"))
                }
                _ => {
                    buf[..data.len() - 1].copy_from_slice(&data[1..]);
                    Ok(data.len() - 1)
                }
            },
        }
    }
}

impl Transport for Connection {
    fn call(&mut self, request: &Request) -> Result<Response> {
        let buf = request.clone().serialize()?;
        self.write_all(&buf)?;

        let mut rx = [0u8; RX_BUFFER_SIZE];
        let mut received = Vec::new();
        loop {
            match self.read(&mut rx) {
                Ok(0) => {
                    return Err(Error::IoError(io::Error::new(
                        ErrorKind::UnexpectedEof,
                        format!("device disconnected while waiting reply to {request}"),
                    )))
                }
                Ok(len) => {
                    received.extend_from_slice(&rx[..len]);
                    if let Some(value) = try_parse_response(&received) {
                        return value;
                    }
                }
                Err(e) => {
                    if e.kind() != ErrorKind::Interrupted {
                        return Err(Error::IoError(e));
                    }
                }
            }
        }
    }
}

/// Returns `None` if `reader` does not contain a whole frame yet.
fn try_parse_response(reader: &[u8]) -> Option<Result<Response>> {
    match serde_cbor::from_reader::<FullResponse, &[u8]>(reader) {
        Ok(r) => {
            if let Some(result) = r.result {
                tracing::trace!(
                    "\n<---\t{:?}\n\t({} bytes) {}",
                    &result,
                    reader.len(),
                    hex::encode(reader)
                );
                return Some(Ok(result));
            }
            if let Some(error) = r.error {
                return Some(Err(Error::DeviceError(error)));
            }
            Some(Err(Error::NeitherErrorNorResult))
        }

        Err(e) => {
            let res = serde_cbor::from_reader::<serde_cbor::Value, &[u8]>(reader);
            if let Ok(value) = res {
                // Complete CBOR but not a reply frame we know
                tracing::warn!("unexpected reply frame: {value:?}");
                return Some(Err(Error::SerdeCbor(e)));
            }
            None
        }
    }
}

impl From<TcpStream> for Connection {
    fn from(stream: TcpStream) -> Self {
        Connection::TcpStream(stream)
    }
}

#[cfg(feature = "serial")]
impl From<Box<dyn serialport::SerialPort>> for Connection {
    fn from(port: Box<dyn serialport::SerialPort>) -> Self {
        Connection::Serial(port)
    }
}
