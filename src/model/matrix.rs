use crate::codec::CodecError;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Shape {
  pub rows: usize,
  pub cols: usize,
}

impl Shape {
  pub const fn new(rows: usize, cols: usize) -> Self {
    Self { rows, cols }
  }

  pub fn len(&self) -> usize {
    self.rows * self.cols
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl fmt::Display for Shape {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({}, {})", self.rows, self.cols)
  }
}

/// Row-major matrix of pre-quantized signed 8-bit weights.
///
/// Rows are neurons, columns are inputs, matching the trained `w1`/`w2`
/// arrays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightMatrix {
  shape: Shape,
  data: Vec<i8>,
}

impl WeightMatrix {
  pub fn zeros(rows: usize, cols: usize) -> Self {
    Self::filled(rows, cols, 0)
  }

  pub fn filled(rows: usize, cols: usize, value: i8) -> Self {
    Self {
      shape: Shape::new(rows, cols),
      data: vec![value; rows * cols],
    }
  }

  pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> i8) -> Self {
    let mut data = Vec::with_capacity(rows * cols);
    for r in 0..rows {
      for c in 0..cols {
        data.push(f(r, c));
      }
    }
    Self {
      shape: Shape::new(rows, cols),
      data,
    }
  }

  /// Build from a flat row-major buffer; `data.len()` must equal `rows * cols`.
  pub fn from_vec(name: &str, rows: usize, cols: usize, data: Vec<i8>) -> Result<Self, CodecError> {
    if data.len() != rows * cols {
      return Err(CodecError::ElementCount {
        matrix: name.to_string(),
        expected: Shape::new(rows, cols),
        len: data.len(),
      });
    }
    Ok(Self {
      shape: Shape::new(rows, cols),
      data,
    })
  }

  /// Build from nested rows as found in a training artifact.
  ///
  /// Ragged rows are a shape error and every value must fit in an `i8`;
  /// nothing is clamped or padded.
  pub fn from_rows(name: &str, rows: &[Vec<i64>]) -> Result<Self, CodecError> {
    let cols = rows.first().map_or(0, |r| r.len());
    let mut data = Vec::with_capacity(rows.len() * cols);
    for (r, row) in rows.iter().enumerate() {
      if row.len() != cols {
        return Err(CodecError::ShapeMismatch {
          matrix: format!("{}[{}]", name, r),
          expected: Shape::new(1, cols),
          actual: Shape::new(1, row.len()),
        });
      }
      for (c, &value) in row.iter().enumerate() {
        let v = i8::try_from(value).map_err(|_| CodecError::RangeError {
          name: format!("{}[{}][{}]", name, r, c),
          value,
          min: i8::MIN as i64,
          max: i8::MAX as i64,
        })?;
        data.push(v);
      }
    }
    Ok(Self {
      shape: Shape::new(rows.len(), cols),
      data,
    })
  }

  pub fn shape(&self) -> Shape {
    self.shape
  }

  pub fn rows(&self) -> usize {
    self.shape.rows
  }

  pub fn cols(&self) -> usize {
    self.shape.cols
  }

  pub fn get(&self, row: usize, col: usize) -> i8 {
    self.data[row * self.shape.cols + col]
  }

  pub fn set(&mut self, row: usize, col: usize, value: i8) {
    self.data[row * self.shape.cols + col] = value;
  }

  pub fn set_row(&mut self, row: usize, value: i8) {
    let cols = self.shape.cols;
    self.data[row * cols..(row + 1) * cols].fill(value);
  }

  pub fn as_slice(&self) -> &[i8] {
    &self.data
  }

  /// Fail with `ShapeMismatch` unless the shape is exactly `expected`.
  pub fn expect_shape(&self, name: &str, expected: Shape) -> Result<(), CodecError> {
    if self.shape != expected {
      return Err(CodecError::ShapeMismatch {
        matrix: name.to_string(),
        expected,
        actual: self.shape,
      });
    }
    Ok(())
  }
}
