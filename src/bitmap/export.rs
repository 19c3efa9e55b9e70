use super::{Bitmap, BitmapError, CanvasSession};
use std::fs;
use std::path::{Path, PathBuf};

pub const CANVAS_PNG: &str = "canvas_original.png";
pub const DOWNSCALED_PNG: &str = "downscaled_28x28.png";
pub const DOWNSCALED_BIN: &str = "downscaled_28x28.bin";

/// Save the canvas, the downsampled image and the raw payload bytes.
pub fn save_images(session: &CanvasSession, dir: &Path) -> Result<Vec<PathBuf>, BitmapError> {
  fs::create_dir_all(dir).map_err(|source| BitmapError::Io {
    path: dir.to_path_buf(),
    source,
  })?;

  let canvas_path = dir.join(CANVAS_PNG);
  save_png(session.canvas(), &canvas_path)?;

  let png_path = dir.join(DOWNSCALED_PNG);
  save_png(session.downscaled(), &png_path)?;

  let bin_path = dir.join(DOWNSCALED_BIN);
  fs::write(&bin_path, session.downscaled().as_bytes()).map_err(|source| BitmapError::Io {
    path: bin_path.clone(),
    source,
  })?;

  for p in [&canvas_path, &png_path, &bin_path] {
    log::info!("Saved {}", p.display());
  }
  Ok(vec![canvas_path, png_path, bin_path])
}

pub fn save_png(bitmap: &Bitmap, path: &Path) -> Result<(), BitmapError> {
  bitmap.to_gray_image().save(path).map_err(|source| BitmapError::Image {
    path: path.to_path_buf(),
    source,
  })
}

/// Load any supported image file as 8-bit grayscale.
///
/// Pixel values are taken as-is; no polarity inversion is applied.
pub fn load_image(path: &Path) -> Result<Bitmap, BitmapError> {
  let img = image::open(path).map_err(|source| BitmapError::Image {
    path: path.to_path_buf(),
    source,
  })?;
  Ok(Bitmap::from_gray_image(img.to_luma8()))
}
