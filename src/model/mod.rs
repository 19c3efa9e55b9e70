// Quantized weight store: the trained network as the accelerator sees it

pub mod artifact;
pub mod matrix;

pub use artifact::{load_artifact, save_artifact};
pub use matrix::{Shape, WeightMatrix};

/// Hidden layer: 128 neurons over the 28x28 input.
pub const L1_SHAPE: Shape = Shape::new(128, 784);
/// Output layer: 10 classes over the 128 hidden activations.
pub const L2_SHAPE: Shape = Shape::new(10, 128);

/// Output of training: both weight matrices and their post-MAC right shifts.
///
/// Shifts are kept as loaded so an out-of-range value can be reported
/// instead of masked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedWeights {
  pub w1: WeightMatrix,
  pub w2: WeightMatrix,
  pub shift_l1: i64,
  pub shift_l2: i64,
}

impl QuantizedWeights {
  pub fn new(w1: WeightMatrix, w2: WeightMatrix, shift_l1: i64, shift_l2: i64) -> Self {
    Self {
      w1,
      w2,
      shift_l1,
      shift_l2,
    }
  }

  /// All-zero weights with the accelerator's shapes.
  pub fn zeros() -> Self {
    Self::new(
      WeightMatrix::zeros(L1_SHAPE.rows, L1_SHAPE.cols),
      WeightMatrix::zeros(L2_SHAPE.rows, L2_SHAPE.cols),
      0,
      0,
    )
  }
}
