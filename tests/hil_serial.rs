// Hardware-in-the-loop check: needs a board on NNHOST_HIL_PORT.
// cargo test --features hil-tests --test hil_serial

#[test]
#[cfg(feature = "hil-tests")]
fn test_send_blank_frame_to_board() {
  use nnhost::bitmap::PAYLOAD_LEN;
  use nnhost::transmit::{SerialTransmitter, Transmitter, DEFAULT_BAUD, DEFAULT_TIMEOUT};
  use nnhost::utils::log::init_log;

  init_log();
  let port = std::env::var("NNHOST_HIL_PORT").expect("NNHOST_HIL_PORT not set");
  let mut tx = SerialTransmitter::new(&port, DEFAULT_BAUD, DEFAULT_TIMEOUT);
  assert_eq!(tx.send(&[0u8; PAYLOAD_LEN]).expect("send failed"), PAYLOAD_LEN);
}
