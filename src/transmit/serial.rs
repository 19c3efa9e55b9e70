use super::{check_payload, TransmitError, Transmitter};
use serialport::SerialPort;
use std::io::Write;
use std::time::Duration;

/// UART link to the board. The port is opened on first send and kept open
/// until a write fails.
pub struct SerialTransmitter {
  port_name: String,
  baud: u32,
  timeout: Duration,
  port: Option<Box<dyn SerialPort>>,
}

impl SerialTransmitter {
  pub fn new(port_name: &str, baud: u32, timeout: Duration) -> Self {
    Self {
      port_name: port_name.to_string(),
      baud,
      timeout,
      port: None,
    }
  }

  pub fn is_open(&self) -> bool {
    self.port.is_some()
  }

  fn ensure_open(&mut self) -> Result<&mut Box<dyn SerialPort>, TransmitError> {
    let port = match self.port.take() {
      Some(port) => port,
      None => {
        log::info!("Attempting to connect to {}...", self.port_name);
        let port = serialport::new(&self.port_name, self.baud)
          .timeout(self.timeout)
          .open()
          .map_err(|source| {
            log_available_ports();
            TransmitError::Open {
              port: self.port_name.clone(),
              source,
            }
          })?;
        log::info!("Connected to {} at {} baud", self.port_name, self.baud);
        port
      },
    };
    Ok(self.port.insert(port))
  }
}

impl Transmitter for SerialTransmitter {
  fn target(&self) -> String {
    format!("{}@{}", self.port_name, self.baud)
  }

  fn send(&mut self, payload: &[u8]) -> Result<usize, TransmitError> {
    check_payload(payload)?;
    let target = self.target();
    let port = self.ensure_open()?;

    let result = port.write_all(payload).and_then(|_| port.flush());
    match result {
      Ok(()) => {
        log::info!("Sent {} bytes to {}", payload.len(), target);
        Ok(payload.len())
      },
      Err(source) => {
        // force a reopen on the next send
        self.port = None;
        Err(TransmitError::Write { target, source })
      },
    }
  }
}

fn log_available_ports() {
  match serialport::available_ports() {
    Ok(ports) if ports.is_empty() => log::warn!("No serial ports found"),
    Ok(ports) => {
      log::warn!("Available ports:");
      for p in ports {
        log::warn!("- {}", p.port_name);
      }
    },
    Err(e) => log::warn!("Cannot enumerate serial ports: {}", e),
  }
}
