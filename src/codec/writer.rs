use super::hex::{encode_byte, BYTE_BITS};
use super::layout::{Coord, LayoutDescriptor, L1_LAYOUT, L2_LAYOUT, SHIFT_LAYOUT};
use super::CodecError;
use crate::model::{QuantizedWeights, WeightMatrix, L1_SHAPE, L2_SHAPE};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const WEIGHTS_L1_FILE: &str = "weights_l1.mem";
pub const WEIGHTS_L2_FILE: &str = "weights_l2.mem";
pub const SHIFTS_FILE: &str = "shifts.mem";
pub const WEIGHTS_L1_WIDE_FILE: &str = "weights_l1_wide.mem";
pub const WEIGHTS_L2_WIDE_FILE: &str = "weights_l2_wide.mem";
pub const BIASES_L1_FILE: &str = "biases_l1.mem";
pub const BIASES_L2_FILE: &str = "biases_l2.mem";

/// Bias words are 32 bits wide.
pub const BIAS_WORD_BYTES: usize = 4;

/// Which set of files a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportMode {
  /// `weights_l1.mem`, `weights_l2.mem`, `shifts.mem`.
  #[default]
  Canonical,
  /// Canonical files plus the `_wide` weight copies and zeroed bias stubs
  /// the bias-enabled RTL expects to find.
  Extended,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
  pub name: String,
  pub path: PathBuf,
  pub lines: usize,
  pub chars_per_line: usize,
}

/// What a writer run put on disk, in write order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileManifest {
  pub dir: PathBuf,
  pub files: Vec<ManifestEntry>,
}

impl FileManifest {
  pub fn total_lines(&self) -> usize {
    self.files.iter().map(|f| f.lines).sum()
  }

  pub fn get(&self, name: &str) -> Option<&ManifestEntry> {
    self.files.iter().find(|f| f.name == name)
  }
}

/// A fully rendered file waiting to be committed.
#[derive(Debug, Clone)]
pub struct RenderedFile {
  pub name: &'static str,
  pub lines: usize,
  pub chars_per_line: usize,
  pub contents: String,
}

/// Render every line of `layout`, taking byte values from `value`.
pub fn render_layout(layout: &LayoutDescriptor, value: impl Fn(Coord) -> u8) -> Result<String, CodecError> {
  layout.validate()?;
  let mut out = String::with_capacity(layout.line_count() * (layout.hex_chars_per_line() + 1));
  for plan in layout.plan() {
    for coord in plan.coords {
      out.push_str(&encode_byte(value(coord) as i64, BYTE_BITS)?);
    }
    out.push('\n');
  }
  Ok(out)
}

/// Render a weight matrix under `layout`; the matrix shape must match it.
pub fn render_matrix(layout: &LayoutDescriptor, matrix: &WeightMatrix) -> Result<String, CodecError> {
  matrix.expect_shape(layout.name, crate::model::Shape::new(layout.rows, layout.cols))?;
  render_layout(layout, |c| matrix.get(c.row, c.col) as u8)
}

pub fn render_shifts(shift_l1: u8, shift_l2: u8) -> Result<String, CodecError> {
  let shifts = [shift_l1, shift_l2];
  render_layout(&SHIFT_LAYOUT, |c| shifts[c.row])
}

/// `lines` all-zero words of `bytes` bytes each.
pub fn render_zero_words(lines: usize, bytes: usize) -> Result<String, CodecError> {
  let word: String = (0..bytes)
    .map(|_| encode_byte(0, BYTE_BITS))
    .collect::<Result<_, _>>()?;
  Ok(format!("{}\n", word).repeat(lines))
}

/// A shift must fit an unsigned byte; anything else is an upstream bug, not
/// something to mask.
pub fn check_shift(name: &str, value: i64) -> Result<u8, CodecError> {
  u8::try_from(value).map_err(|_| CodecError::RangeError {
    name: name.to_string(),
    value,
    min: 0,
    max: u8::MAX as i64,
  })
}

/// Check every precondition of a write without touching the filesystem.
pub fn validate(weights: &QuantizedWeights) -> Result<(u8, u8), CodecError> {
  weights.w1.expect_shape("weights_l1", L1_SHAPE)?;
  weights.w2.expect_shape("weights_l2", L2_SHAPE)?;
  let s1 = check_shift("shift_l1", weights.shift_l1)?;
  let s2 = check_shift("shift_l2", weights.shift_l2)?;
  Ok((s1, s2))
}

/// Emits the BRAM initialization files for one trained model.
pub struct MemoryImageWriter {
  out_dir: PathBuf,
  mode: ExportMode,
}

impl MemoryImageWriter {
  pub fn new(out_dir: impl Into<PathBuf>) -> Self {
    Self {
      out_dir: out_dir.into(),
      mode: ExportMode::Canonical,
    }
  }

  pub fn with_mode(mut self, mode: ExportMode) -> Self {
    self.mode = mode;
    self
  }

  pub fn out_dir(&self) -> &Path {
    &self.out_dir
  }

  /// Render everything in memory, then commit file by file.
  ///
  /// Nothing is created (not even the directory) unless validation and
  /// rendering of every file succeeded.
  pub fn write(&self, weights: &QuantizedWeights) -> Result<FileManifest, CodecError> {
    let files = self.render(weights)?;

    if !self.out_dir.exists() {
      log::warn!("Output directory {} does not exist, creating it", self.out_dir.display());
    }
    fs::create_dir_all(&self.out_dir).map_err(|e| CodecError::io(&self.out_dir, e))?;

    let mut manifest = FileManifest {
      dir: self.out_dir.clone(),
      files: Vec::with_capacity(files.len()),
    };
    for file in files {
      let path = self.out_dir.join(file.name);
      log::info!("Generating {}...", path.display());
      write_atomic(&path, file.contents.as_bytes())?;
      manifest.files.push(ManifestEntry {
        name: file.name.to_string(),
        path,
        lines: file.lines,
        chars_per_line: file.chars_per_line,
      });
    }

    log::info!(
      "Wrote {} memory files ({} lines) to {}",
      manifest.files.len(),
      manifest.total_lines(),
      self.out_dir.display()
    );
    Ok(manifest)
  }

  /// Validate and render every file of this writer's mode without writing.
  pub fn render(&self, weights: &QuantizedWeights) -> Result<Vec<RenderedFile>, CodecError> {
    let (s1, s2) = validate(weights)?;

    let l1 = render_matrix(&L1_LAYOUT, &weights.w1)?;
    let l2 = render_matrix(&L2_LAYOUT, &weights.w2)?;
    let shifts = render_shifts(s1, s2)?;

    let entry = |name: &'static str, layout: &LayoutDescriptor, contents: String| RenderedFile {
      name,
      lines: layout.line_count(),
      chars_per_line: layout.hex_chars_per_line(),
      contents,
    };

    let mut files = vec![
      entry(WEIGHTS_L1_FILE, &L1_LAYOUT, l1.clone()),
      entry(WEIGHTS_L2_FILE, &L2_LAYOUT, l2.clone()),
      entry(SHIFTS_FILE, &SHIFT_LAYOUT, shifts),
    ];

    if self.mode == ExportMode::Extended {
      files.push(entry(WEIGHTS_L1_WIDE_FILE, &L1_LAYOUT, l1));
      files.push(entry(WEIGHTS_L2_WIDE_FILE, &L2_LAYOUT, l2));
      for (name, lines) in [(BIASES_L1_FILE, L1_SHAPE.rows), (BIASES_L2_FILE, L2_SHAPE.rows)] {
        files.push(RenderedFile {
          name,
          lines,
          chars_per_line: BIAS_WORD_BYTES * 2,
          contents: render_zero_words(lines, BIAS_WORD_BYTES)?,
        });
      }
    }

    Ok(files)
  }
}

/// Write the three canonical memory images for `weights_l1`/`weights_l2`.
pub fn write_all(
  weights_l1: &WeightMatrix,
  weights_l2: &WeightMatrix,
  shift_l1: i64,
  shift_l2: i64,
  output_directory: &Path,
) -> Result<FileManifest, CodecError> {
  let weights = QuantizedWeights::new(weights_l1.clone(), weights_l2.clone(), shift_l1, shift_l2);
  MemoryImageWriter::new(output_directory).write(&weights)
}

/// Write to a hidden sibling, sync, then rename over `path`.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), CodecError> {
  let file_name = path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default();
  let tmp = path.with_file_name(format!(".{}.tmp", file_name));

  let result = (|| {
    let file = File::create(&tmp)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(contents)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    drop(writer);
    fs::rename(&tmp, path)
  })();

  result.map_err(|e| {
    let _ = fs::remove_file(&tmp);
    CodecError::io(path, e)
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_render_layout_small() {
    let layout = LayoutDescriptor::new("t", 4, 2, 2);
    let m = WeightMatrix::from_fn(4, 2, |r, c| (r * 10 + c) as i8 - 20);
    let text = render_layout(&layout, |c| m.get(c.row, c.col) as u8).unwrap();
    // (1,0)=-10 (0,0)=-20 | (1,1)=-9 (0,1)=-19 | (3,0)=10 (2,0)=0 | (3,1)=11 (2,1)=1
    assert_eq!(text, "F6EC\nF7ED\n0A00\n0B01\n");
  }

  #[test]
  fn test_render_matrix_rejects_wrong_shape() {
    let m = WeightMatrix::zeros(10, 127);
    assert!(matches!(
      render_matrix(&L2_LAYOUT, &m),
      Err(CodecError::ShapeMismatch { .. })
    ));
  }

  #[test]
  fn test_render_shifts() {
    assert_eq!(render_shifts(9, 255).unwrap(), "09\nFF\n");
  }

  #[test]
  fn test_render_zero_words() {
    assert_eq!(render_zero_words(2, 4).unwrap(), "00000000\n00000000\n");
    assert_eq!(render_zero_words(0, 4).unwrap(), "");
  }

  #[test]
  fn test_check_shift() {
    assert_eq!(check_shift("s", 0).unwrap(), 0);
    assert_eq!(check_shift("s", 255).unwrap(), 255);
    assert!(matches!(check_shift("s", 256), Err(CodecError::RangeError { value: 256, .. })));
    assert!(matches!(check_shift("s", -1), Err(CodecError::RangeError { value: -1, .. })));
  }

  #[test]
  fn test_write_atomic_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("x.mem");
    fs::write(&path, "old\n").unwrap();
    write_atomic(&path, b"00\n").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "00\n");
    let names: Vec<_> = fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().file_name()).collect();
    assert_eq!(names.len(), 1);
  }

  #[test]
  fn test_write_atomic_into_missing_dir_fails_with_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("x.mem");
    match write_atomic(&path, b"00\n") {
      Err(CodecError::Io { path: p, .. }) => assert_eq!(p, path),
      other => panic!("unexpected result: {other:?}"),
    }
  }
}
