use super::hex::HexError;
use crate::model::Shape;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop a memory image from being produced.
///
/// None of these are recovered from: a possibly wrong BRAM image is worse
/// than no image.
#[derive(Debug, Error)]
pub enum CodecError {
  #[error("model artifact not found: {}", .0.display())]
  MissingArtifact(PathBuf),

  #[error("failed to parse model artifact {}: {source}", .path.display())]
  InvalidArtifact {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("shape mismatch for {matrix}: expected {expected}, found {actual}")]
  ShapeMismatch {
    matrix: String,
    expected: Shape,
    actual: Shape,
  },

  #[error("{matrix} has {len} elements, expected shape {expected}")]
  ElementCount {
    matrix: String,
    expected: Shape,
    len: usize,
  },

  #[error("{name} = {value} is outside the representable range {min}..={max}")]
  RangeError {
    name: String,
    value: i64,
    min: i64,
    max: i64,
  },

  #[error("invalid layout for {name}: {reason}")]
  InvalidLayout { name: String, reason: String },

  #[error("malformed memory image {} at line {line}: {reason}", .path.display())]
  MalformedImage {
    path: PathBuf,
    line: usize,
    reason: String,
  },

  #[error("memory image {} differs from the encoded model at line {line}", .path.display())]
  ImageMismatch { path: PathBuf, line: usize },

  #[error(transparent)]
  Hex(#[from] HexError),

  #[error("I/O error on {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

impl CodecError {
  pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
    CodecError::Io {
      path: path.into(),
      source,
    }
  }
}
