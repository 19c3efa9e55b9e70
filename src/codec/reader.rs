use super::hex::decode_line;
use super::layout::{LayoutDescriptor, L1_LAYOUT, L2_LAYOUT, SHIFT_LAYOUT};
use super::writer::{MemoryImageWriter, SHIFTS_FILE, WEIGHTS_L1_FILE, WEIGHTS_L2_FILE};
use super::CodecError;
use crate::model::{QuantizedWeights, WeightMatrix};
use std::fs;
use std::path::Path;

/// Parse a memory image into its lines of bytes, checking it against `layout`.
pub fn read_image(path: &Path, layout: &LayoutDescriptor) -> Result<Vec<Vec<u8>>, CodecError> {
  let content = fs::read_to_string(path).map_err(|e| CodecError::io(path, e))?;
  let malformed = |line: usize, reason: String| CodecError::MalformedImage {
    path: path.to_path_buf(),
    line,
    reason,
  };

  // every line, the last included, ends in a bare '\n'
  let body = match content.strip_suffix('\n') {
    Some(body) => body,
    None if content.is_empty() => "",
    None => {
      let last = content.split('\n').count() - 1;
      return Err(malformed(last, "missing trailing newline".to_string()));
    },
  };

  let texts: Vec<&str> = if body.is_empty() { Vec::new() } else { body.split('\n').collect() };

  let mut lines = Vec::with_capacity(layout.line_count());
  for (i, text) in texts.into_iter().enumerate() {
    if text.ends_with('\r') {
      return Err(malformed(i, "CRLF line ending, expected '\\n'".to_string()));
    }
    if text.len() != layout.hex_chars_per_line() {
      return Err(malformed(
        i,
        format!("{} hex chars, expected {}", text.len(), layout.hex_chars_per_line()),
      ));
    }
    lines.push(decode_line(text).map_err(|e| malformed(i, e.to_string()))?);
  }

  if lines.len() != layout.line_count() {
    return Err(malformed(
      lines.len(),
      format!("{} lines, expected {}", lines.len(), layout.line_count()),
    ));
  }
  Ok(lines)
}

/// Read a weight image back into the matrix it was rendered from.
pub fn read_matrix(path: &Path, layout: &LayoutDescriptor) -> Result<WeightMatrix, CodecError> {
  let lines = read_image(path, layout)?;
  let bytes = layout.scatter(&lines)?;
  WeightMatrix::from_vec(
    layout.name,
    layout.rows,
    layout.cols,
    bytes.into_iter().map(|b| b as i8).collect(),
  )
}

/// Reassemble a model from the canonical files in `dir`.
pub fn read_dir(dir: &Path) -> Result<QuantizedWeights, CodecError> {
  let w1 = read_matrix(&dir.join(WEIGHTS_L1_FILE), &L1_LAYOUT)?;
  let w2 = read_matrix(&dir.join(WEIGHTS_L2_FILE), &L2_LAYOUT)?;
  let shifts = read_image(&dir.join(SHIFTS_FILE), &SHIFT_LAYOUT)?;
  Ok(QuantizedWeights::new(w1, w2, shifts[0][0] as i64, shifts[1][0] as i64))
}

/// Compare the canonical files in `dir` byte for byte with what `weights`
/// encodes to, reporting the first differing line.
pub fn verify_dir(dir: &Path, weights: &QuantizedWeights) -> Result<(), CodecError> {
  for file in MemoryImageWriter::new(dir).render(weights)? {
    let path = dir.join(file.name);
    let actual = fs::read_to_string(&path).map_err(|e| CodecError::io(&path, e))?;
    if actual != file.contents {
      let line = actual
        .lines()
        .zip(file.contents.lines())
        .position(|(a, e)| a != e)
        .unwrap_or_else(|| actual.lines().count().min(file.lines));
      return Err(CodecError::ImageMismatch { path, line });
    }
    log::info!("{} matches", path.display());
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::codec::writer::render_matrix;

  #[test]
  fn test_read_matrix_small_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("t.mem");
    let layout = LayoutDescriptor::new("t", 4, 3, 2);
    let m = WeightMatrix::from_fn(4, 3, |r, c| (r as i8 - 2) * 7 + c as i8);
    fs::write(&path, render_matrix(&layout, &m).unwrap()).unwrap();
    assert_eq!(read_matrix(&path, &layout).unwrap(), m);
  }

  #[test]
  fn test_read_image_rejects_wrong_width() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shifts.mem");
    fs::write(&path, "07\n0\n").unwrap();
    match read_image(&path, &SHIFT_LAYOUT) {
      Err(CodecError::MalformedImage { line, .. }) => assert_eq!(line, 1),
      other => panic!("unexpected result: {other:?}"),
    }
  }

  #[test]
  fn test_read_image_rejects_wrong_line_count() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shifts.mem");
    fs::write(&path, "07\n").unwrap();
    assert!(matches!(
      read_image(&path, &SHIFT_LAYOUT),
      Err(CodecError::MalformedImage { .. })
    ));
  }

  #[test]
  fn test_read_image_rejects_missing_newline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shifts.mem");
    fs::write(&path, "07\n05").unwrap();
    match read_image(&path, &SHIFT_LAYOUT) {
      Err(CodecError::MalformedImage { line, reason, .. }) => {
        assert_eq!(line, 1);
        assert!(reason.contains("trailing newline"));
      },
      other => panic!("unexpected result: {other:?}"),
    }
  }

  #[test]
  fn test_read_image_rejects_crlf() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shifts.mem");
    fs::write(&path, "07\r\n05\r\n").unwrap();
    match read_image(&path, &SHIFT_LAYOUT) {
      Err(CodecError::MalformedImage { line, reason, .. }) => {
        assert_eq!(line, 0);
        assert!(reason.contains("CRLF"));
      },
      other => panic!("unexpected result: {other:?}"),
    }
  }

  #[test]
  fn test_read_image_accepts_unix_newlines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shifts.mem");
    fs::write(&path, "07\n05\n").unwrap();
    assert_eq!(read_image(&path, &SHIFT_LAYOUT).unwrap(), vec![vec![7], vec![5]]);
  }

  #[test]
  fn test_read_image_rejects_non_hex() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shifts.mem");
    fs::write(&path, "07\nZZ\n").unwrap();
    assert!(read_image(&path, &SHIFT_LAYOUT).is_err());
  }
}
