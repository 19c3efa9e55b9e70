//! Host-side tooling for the FPGA MNIST accelerator.
//!
//! * [`codec`] turns a quantized two-layer network into the `.mem` files the
//!   BRAM initializers load.
//! * [`bitmap`] and [`transmit`] capture a digit, shrink it to 28x28 and push
//!   the 784 raw bytes over UART.

pub mod bitmap;
pub mod codec;
pub mod config;
pub mod model;
pub mod shell;
pub mod transmit;
pub mod utils;

pub use codec::{write_all, CodecError, ExportMode, FileManifest, MemoryImageWriter};
pub use model::{QuantizedWeights, WeightMatrix};
