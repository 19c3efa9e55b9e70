// Image upload to the accelerator's UART input buffer

pub mod serial;
pub mod tcp;

pub use serial::SerialTransmitter;
pub use tcp::TcpTransmitter;

use crate::bitmap::PAYLOAD_LEN;
use std::io;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BAUD: u32 = 115_200;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);
/// Port prefix selecting the TCP bridge instead of a serial device.
pub const TCP_SCHEME: &str = "tcp://";

#[derive(Debug, Error)]
pub enum TransmitError {
  #[error("payload is {actual} bytes, the accelerator expects exactly {expected}")]
  PayloadLength { expected: usize, actual: usize },

  #[error("cannot open {port}: {source}")]
  Open {
    port: String,
    #[source]
    source: serialport::Error,
  },

  #[error("cannot connect to {addr}: {source}")]
  Connect {
    addr: String,
    #[source]
    source: io::Error,
  },

  #[error("write to {target} failed: {source}")]
  Write {
    target: String,
    #[source]
    source: io::Error,
  },

  #[error("short write to {target}: {written} of {expected} bytes")]
  ShortWrite {
    target: String,
    written: usize,
    expected: usize,
  },
}

/// One blocking write of a complete image per call, no retries.
pub trait Transmitter {
  /// Human readable destination, for logs.
  fn target(&self) -> String;

  fn send(&mut self, payload: &[u8]) -> Result<usize, TransmitError>;
}

pub fn check_payload(payload: &[u8]) -> Result<(), TransmitError> {
  if payload.len() != PAYLOAD_LEN {
    return Err(TransmitError::PayloadLength {
      expected: PAYLOAD_LEN,
      actual: payload.len(),
    });
  }
  Ok(())
}

/// Pick the transport from the port string: `tcp://host:port` or a device.
pub fn open_transmitter(port: &str, baud: u32, timeout: Duration) -> Box<dyn Transmitter> {
  match port.strip_prefix(TCP_SCHEME) {
    Some(addr) => Box::new(TcpTransmitter::new(addr, timeout)),
    None => Box::new(SerialTransmitter::new(port, baud, timeout)),
  }
}
