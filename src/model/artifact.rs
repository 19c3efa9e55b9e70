use super::{QuantizedWeights, WeightMatrix};
use crate::codec::CodecError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// On-disk training artifact: named arrays exported by the training notebook.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct ArtifactFile {
  w1: Vec<Vec<i64>>,
  w2: Vec<Vec<i64>>,
  shift_l1: i64,
  shift_l2: i64,
}

/// Load `w1`, `w2`, `shift_l1` and `shift_l2` from a JSON artifact.
pub fn load_artifact(path: &Path) -> Result<QuantizedWeights, CodecError> {
  let content = fs::read_to_string(path).map_err(|e| match e.kind() {
    io::ErrorKind::NotFound => CodecError::MissingArtifact(path.to_path_buf()),
    _ => CodecError::io(path, e),
  })?;

  let raw: ArtifactFile = serde_json::from_str(&content).map_err(|source| CodecError::InvalidArtifact {
    path: path.to_path_buf(),
    source,
  })?;

  let w1 = WeightMatrix::from_rows("w1", &raw.w1)?;
  let w2 = WeightMatrix::from_rows("w2", &raw.w2)?;

  log::info!("Loaded model from {}", path.display());
  log::info!("W1 shape: {} (expected: {})", w1.shape(), super::L1_SHAPE);
  log::info!("W2 shape: {} (expected: {})", w2.shape(), super::L2_SHAPE);
  log::info!("Shift L1: {}", raw.shift_l1);
  log::info!("Shift L2: {}", raw.shift_l2);

  Ok(QuantizedWeights::new(w1, w2, raw.shift_l1, raw.shift_l2))
}

/// Write weights back out in the artifact format.
pub fn save_artifact(weights: &QuantizedWeights, path: &Path) -> Result<(), CodecError> {
  let rows = |m: &WeightMatrix| -> Vec<Vec<i64>> {
    m.as_slice()
      .chunks(m.cols().max(1))
      .map(|row| row.iter().map(|&v| v as i64).collect())
      .collect()
  };
  let raw = ArtifactFile {
    w1: rows(&weights.w1),
    w2: rows(&weights.w2),
    shift_l1: weights.shift_l1,
    shift_l2: weights.shift_l2,
  };
  let json = serde_json::to_string(&raw).map_err(|source| CodecError::InvalidArtifact {
    path: path.to_path_buf(),
    source,
  })?;
  fs::write(path, json).map_err(|e| CodecError::io(path, e))
}
