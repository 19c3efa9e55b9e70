// Bitmap capture: drawing canvas, downsampling and the UART payload

pub mod canvas;
pub mod downsample;
pub mod export;

pub use canvas::{rasterize_line, stamp, CanvasSession, Ink};
pub use downsample::{downsampler, AreaDownsampler, Downsampler, FilterKind, LanczosDownsampler};
pub use export::{load_image, save_images};

use image::GrayImage;
use std::path::PathBuf;
use thiserror::Error;

/// Side of the square drawing canvas; 4x the accelerator input so the
/// downscale ratio is an integer.
pub const CANVAS_SIZE: u32 = 112;
/// Side of the accelerator's input image.
pub const TARGET_SIZE: u32 = 28;
/// Bytes sent over UART per image.
pub const PAYLOAD_LEN: usize = (TARGET_SIZE * TARGET_SIZE) as usize;

pub const BACKGROUND: u8 = 0;
pub const INKED: u8 = 255;

#[derive(Debug, Error)]
pub enum BitmapError {
  #[error("pixel buffer holds {actual} bytes, expected {expected} for {width}x{height}")]
  SizeMismatch {
    width: u32,
    height: u32,
    expected: usize,
    actual: usize,
  },

  #[error("{filter} cannot resample {from_w}x{from_h} to {to_w}x{to_h}")]
  UnsupportedRatio {
    filter: &'static str,
    from_w: u32,
    from_h: u32,
    to_w: u32,
    to_h: u32,
  },

  #[error("image error on {}: {source}", .path.display())]
  Image {
    path: PathBuf,
    #[source]
    source: image::ImageError,
  },

  #[error("I/O error on {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Row-major 8-bit grayscale image. 0 is background, 255 is full ink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
  width: u32,
  height: u32,
  pixels: Vec<u8>,
}

impl Bitmap {
  pub fn new(width: u32, height: u32) -> Self {
    Self {
      width,
      height,
      pixels: vec![BACKGROUND; (width * height) as usize],
    }
  }

  pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, BitmapError> {
    let expected = (width * height) as usize;
    if pixels.len() != expected {
      return Err(BitmapError::SizeMismatch {
        width,
        height,
        expected,
        actual: pixels.len(),
      });
    }
    Ok(Self { width, height, pixels })
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  pub fn contains(&self, x: i32, y: i32) -> bool {
    x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
  }

  pub fn get(&self, x: u32, y: u32) -> u8 {
    self.pixels[(y * self.width + x) as usize]
  }

  pub fn set(&mut self, x: u32, y: u32, value: u8) {
    self.pixels[(y * self.width + x) as usize] = value;
  }

  pub fn clear(&mut self) {
    self.pixels.fill(BACKGROUND);
  }

  /// True for a zero-width or zero-height bitmap.
  pub fn is_empty(&self) -> bool {
    self.width == 0 || self.height == 0
  }

  pub fn is_blank(&self) -> bool {
    self.pixels.iter().all(|&p| p == BACKGROUND)
  }

  /// Flat row-major bytes, exactly what goes over the wire.
  pub fn as_bytes(&self) -> &[u8] {
    &self.pixels
  }

  pub fn min_max(&self) -> (u8, u8) {
    let min = self.pixels.iter().copied().min().unwrap_or(0);
    let max = self.pixels.iter().copied().max().unwrap_or(0);
    (min, max)
  }

  pub fn to_gray_image(&self) -> GrayImage {
    GrayImage::from_raw(self.width, self.height, self.pixels.clone())
      .unwrap_or_else(|| GrayImage::new(self.width, self.height))
  }

  pub fn from_gray_image(img: GrayImage) -> Self {
    let (width, height) = img.dimensions();
    Self {
      width,
      height,
      pixels: img.into_raw(),
    }
  }

  /// Text dump with one row per line, for the shell's `show` command.
  pub fn render_ascii(&self) -> String {
    let mut out = String::with_capacity(((self.width + 1) * self.height) as usize);
    for y in 0..self.height {
      for x in 0..self.width {
        out.push(match self.get(x, y) {
          0 => '.',
          1..=84 => ':',
          85..=169 => 'o',
          _ => '#',
        });
      }
      out.push('\n');
    }
    out
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_from_raw_checks_length() {
    assert!(Bitmap::from_raw(28, 28, vec![0; 784]).is_ok());
    assert!(matches!(
      Bitmap::from_raw(28, 28, vec![0; 783]),
      Err(BitmapError::SizeMismatch { actual: 783, .. })
    ));
  }

  #[test]
  fn test_row_major_bytes() {
    let mut bmp = Bitmap::new(3, 2);
    bmp.set(2, 0, 9);
    bmp.set(0, 1, 7);
    assert_eq!(bmp.as_bytes(), &[0, 0, 9, 7, 0, 0]);
    assert_eq!(bmp.min_max(), (0, 9));
  }

  #[test]
  fn test_gray_image_conversion() {
    let mut bmp = Bitmap::new(4, 3);
    bmp.set(3, 2, 200);
    let back = Bitmap::from_gray_image(bmp.to_gray_image());
    assert_eq!(back, bmp);
  }

  #[test]
  fn test_render_ascii() {
    let mut bmp = Bitmap::new(2, 2);
    bmp.set(1, 0, 255);
    bmp.set(0, 1, 100);
    assert_eq!(bmp.render_ascii(), ".#\no.\n");
  }
}
