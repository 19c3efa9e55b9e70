use super::{check_payload, TransmitError, Transmitter, TCP_SCHEME};
use std::io::Write;
use std::net::TcpStream;
use std::time::Duration;

/// Same contract as the UART link, over a TCP byte stream (ser2net style
/// bridges, RTL simulation harnesses).
pub struct TcpTransmitter {
  addr: String,
  timeout: Duration,
  stream: Option<TcpStream>,
}

impl TcpTransmitter {
  pub fn new(addr: &str, timeout: Duration) -> Self {
    Self {
      addr: addr.to_string(),
      timeout,
      stream: None,
    }
  }

  pub fn is_connected(&self) -> bool {
    self.stream.is_some()
  }

  fn ensure_connected(&mut self) -> Result<&mut TcpStream, TransmitError> {
    let stream = match self.stream.take() {
      Some(stream) => stream,
      None => {
        let connect_err = |source| TransmitError::Connect {
          addr: self.addr.clone(),
          source,
        };
        let stream = TcpStream::connect(&self.addr).map_err(connect_err)?;
        stream.set_write_timeout(Some(self.timeout)).map_err(connect_err)?;
        stream.set_nodelay(true).map_err(connect_err)?;
        log::info!("Connected to {}", self.addr);
        stream
      },
    };
    Ok(self.stream.insert(stream))
  }
}

impl Transmitter for TcpTransmitter {
  fn target(&self) -> String {
    format!("{}{}", TCP_SCHEME, self.addr)
  }

  fn send(&mut self, payload: &[u8]) -> Result<usize, TransmitError> {
    check_payload(payload)?;
    let target = self.target();
    let stream = self.ensure_connected()?;

    match stream.write_all(payload).and_then(|_| stream.flush()) {
      Ok(()) => {
        log::info!("Sent {} bytes to {}", payload.len(), target);
        Ok(payload.len())
      },
      Err(source) => {
        self.stream = None;
        Err(TransmitError::Write { target, source })
      },
    }
  }
}
