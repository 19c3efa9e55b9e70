use super::CodecError;

/// Which lane lands in the most significant byte position of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneOrder {
  /// Highest lane index leftmost. This is what the accelerator RTL reads and
  /// every built-in layout uses it.
  HighLaneFirst,
  LowLaneFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coord {
  pub row: usize,
  pub col: usize,
}

/// Contents of one memory line, MSB position first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinePlan {
  pub index: usize,
  pub coords: Vec<Coord>,
}

/// Declarative description of how a `rows x cols` matrix maps onto a BRAM.
///
/// Rows are split into batches of `lanes` consecutive rows. Each batch emits
/// one line per column, and a line carries that column's value for every lane
/// of the batch. Batches are emitted in order, so line `b * cols + c` holds
/// rows `b * lanes .. (b + 1) * lanes` of column `c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutDescriptor {
  pub name: &'static str,
  pub rows: usize,
  pub cols: usize,
  pub lanes: usize,
  pub order: LaneOrder,
}

/// Layer 1: 64 DSP lanes, two neuron batches, one line per input pixel.
pub const L1_LAYOUT: LayoutDescriptor = LayoutDescriptor::new("weights_l1", 128, 784, 64);
/// Layer 2: 10 of the DSP lanes, one line per hidden activation.
pub const L2_LAYOUT: LayoutDescriptor = LayoutDescriptor::new("weights_l2", 10, 128, 10);
/// Shifts: one byte per line, layer 1 first.
pub const SHIFT_LAYOUT: LayoutDescriptor = LayoutDescriptor::new("shifts", 2, 1, 1);

impl LayoutDescriptor {
  pub const fn new(name: &'static str, rows: usize, cols: usize, lanes: usize) -> Self {
    Self {
      name,
      rows,
      cols,
      lanes,
      order: LaneOrder::HighLaneFirst,
    }
  }

  pub const fn with_order(mut self, order: LaneOrder) -> Self {
    self.order = order;
    self
  }

  pub fn validate(&self) -> Result<(), CodecError> {
    let reason = if self.lanes == 0 {
      Some("lane count must be positive".to_string())
    } else if self.rows == 0 || self.cols == 0 {
      Some(format!("empty matrix ({} x {})", self.rows, self.cols))
    } else if self.rows % self.lanes != 0 {
      Some(format!("{} rows do not split into batches of {} lanes", self.rows, self.lanes))
    } else {
      None
    };
    match reason {
      Some(reason) => Err(CodecError::InvalidLayout {
        name: self.name.to_string(),
        reason,
      }),
      None => Ok(()),
    }
  }

  pub fn batches(&self) -> usize {
    self.rows / self.lanes
  }

  pub fn line_count(&self) -> usize {
    self.batches() * self.cols
  }

  pub fn bytes_per_line(&self) -> usize {
    self.lanes
  }

  pub fn hex_chars_per_line(&self) -> usize {
    self.lanes * 2
  }

  /// Matrix coordinate stored at byte `pos` (0 = MSB) of line `line`.
  pub fn coord(&self, line: usize, pos: usize) -> Coord {
    let batch = line / self.cols;
    let col = line % self.cols;
    let lane = match self.order {
      LaneOrder::HighLaneFirst => self.lanes - 1 - pos,
      LaneOrder::LowLaneFirst => pos,
    };
    Coord {
      row: batch * self.lanes + lane,
      col,
    }
  }

  /// Inverse of [`coord`](Self::coord): `(line, pos)` holding matrix element `(row, col)`.
  pub fn locate(&self, row: usize, col: usize) -> (usize, usize) {
    let batch = row / self.lanes;
    let lane = row % self.lanes;
    let pos = match self.order {
      LaneOrder::HighLaneFirst => self.lanes - 1 - lane,
      LaneOrder::LowLaneFirst => lane,
    };
    (batch * self.cols + col, pos)
  }

  pub fn line(&self, index: usize) -> LinePlan {
    LinePlan {
      index,
      coords: (0..self.lanes).map(|pos| self.coord(index, pos)).collect(),
    }
  }

  /// The full plan in file order.
  pub fn plan(&self) -> impl Iterator<Item = LinePlan> + '_ {
    (0..self.line_count()).map(move |i| self.line(i))
  }

  /// Rebuild the row-major matrix bytes from decoded lines.
  pub fn scatter(&self, lines: &[Vec<u8>]) -> Result<Vec<u8>, CodecError> {
    if lines.len() != self.line_count() {
      return Err(CodecError::InvalidLayout {
        name: self.name.to_string(),
        reason: format!("expected {} lines, found {}", self.line_count(), lines.len()),
      });
    }
    let mut out = vec![0u8; self.rows * self.cols];
    for (index, bytes) in lines.iter().enumerate() {
      if bytes.len() != self.lanes {
        return Err(CodecError::InvalidLayout {
          name: self.name.to_string(),
          reason: format!("line {} holds {} bytes, expected {}", index, bytes.len(), self.lanes),
        });
      }
      for (pos, &b) in bytes.iter().enumerate() {
        let c = self.coord(index, pos);
        out[c.row * self.cols + c.col] = b;
      }
    }
    Ok(out)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_builtin_layout_sizes() {
    assert_eq!(L1_LAYOUT.line_count(), 1568);
    assert_eq!(L1_LAYOUT.hex_chars_per_line(), 128);
    assert_eq!(L2_LAYOUT.line_count(), 128);
    assert_eq!(L2_LAYOUT.hex_chars_per_line(), 20);
    assert_eq!(SHIFT_LAYOUT.line_count(), 2);
    assert_eq!(SHIFT_LAYOUT.hex_chars_per_line(), 2);
    for layout in [L1_LAYOUT, L2_LAYOUT, SHIFT_LAYOUT] {
      assert!(layout.validate().is_ok());
    }
  }

  #[test]
  fn test_l1_high_lane_is_msb() {
    let first = L1_LAYOUT.line(0);
    assert_eq!(first.coords[0], Coord { row: 63, col: 0 });
    assert_eq!(first.coords[63], Coord { row: 0, col: 0 });

    // second batch starts right after the last pixel of the first
    let batch1 = L1_LAYOUT.line(784);
    assert_eq!(batch1.coords[0], Coord { row: 127, col: 0 });
    assert_eq!(batch1.coords[63], Coord { row: 64, col: 0 });

    let last = L1_LAYOUT.line(1567);
    assert_eq!(last.coords[0], Coord { row: 127, col: 783 });
  }

  #[test]
  fn test_l2_line_order() {
    let line = L2_LAYOUT.line(5);
    let rows: Vec<usize> = line.coords.iter().map(|c| c.row).collect();
    assert_eq!(rows, vec![9, 8, 7, 6, 5, 4, 3, 2, 1, 0]);
    assert!(line.coords.iter().all(|c| c.col == 5));
  }

  #[test]
  fn test_shift_layout() {
    assert_eq!(SHIFT_LAYOUT.line(0).coords, vec![Coord { row: 0, col: 0 }]);
    assert_eq!(SHIFT_LAYOUT.line(1).coords, vec![Coord { row: 1, col: 0 }]);
  }

  #[test]
  fn test_low_lane_first() {
    let layout = LayoutDescriptor::new("t", 4, 3, 2).with_order(LaneOrder::LowLaneFirst);
    assert_eq!(layout.line(0).coords, vec![Coord { row: 0, col: 0 }, Coord { row: 1, col: 0 }]);
    assert_eq!(layout.line(4).coords, vec![Coord { row: 2, col: 1 }, Coord { row: 3, col: 1 }]);
  }

  #[test]
  fn test_locate_inverts_coord() {
    for layout in [L1_LAYOUT, L2_LAYOUT, LayoutDescriptor::new("t", 6, 5, 3).with_order(LaneOrder::LowLaneFirst)] {
      for plan in layout.plan() {
        for (pos, c) in plan.coords.iter().enumerate() {
          assert_eq!(layout.locate(c.row, c.col), (plan.index, pos));
        }
      }
    }
  }

  #[test]
  fn test_plan_visits_every_element_once() {
    let mut seen = vec![0u32; L1_LAYOUT.rows * L1_LAYOUT.cols];
    for plan in L1_LAYOUT.plan() {
      for c in plan.coords {
        seen[c.row * L1_LAYOUT.cols + c.col] += 1;
      }
    }
    assert!(seen.iter().all(|&n| n == 1));
  }

  #[test]
  fn test_invalid_descriptors() {
    assert!(LayoutDescriptor::new("t", 10, 4, 0).validate().is_err());
    assert!(LayoutDescriptor::new("t", 10, 4, 3).validate().is_err());
    assert!(LayoutDescriptor::new("t", 0, 4, 1).validate().is_err());
  }

  #[test]
  fn test_scatter() {
    let layout = LayoutDescriptor::new("t", 4, 2, 2);
    // line 0: col 0 rows 1,0 | line 1: col 1 rows 1,0 | line 2: col 0 rows 3,2 | line 3: col 1 rows 3,2
    let lines = vec![vec![10, 0], vec![11, 1], vec![30, 20], vec![31, 21]];
    assert_eq!(layout.scatter(&lines).unwrap(), vec![0, 1, 10, 11, 20, 21, 30, 31]);
    assert!(layout.scatter(&lines[..3]).is_err());
    assert!(layout.scatter(&[vec![1], vec![2], vec![3], vec![4]]).is_err());
  }
}
