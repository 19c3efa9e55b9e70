use super::{Bitmap, BitmapError};
use image::imageops::{self, FilterType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resampling strategy from canvas resolution to accelerator resolution.
pub trait Downsampler {
  fn name(&self) -> &'static str;

  fn downsample(&self, raw: &Bitmap, target: (u32, u32)) -> Result<Bitmap, BitmapError>;
}

/// Lanczos3, the filter the original drawing front-end used.
#[derive(Debug, Default, Clone, Copy)]
pub struct LanczosDownsampler;

impl Downsampler for LanczosDownsampler {
  fn name(&self) -> &'static str {
    "lanczos"
  }

  fn downsample(&self, raw: &Bitmap, target: (u32, u32)) -> Result<Bitmap, BitmapError> {
    let (w, h) = target;
    if w == 0 || h == 0 || raw.is_empty() {
      return Err(unsupported(self.name(), raw, target));
    }
    let resized = imageops::resize(&raw.to_gray_image(), w, h, FilterType::Lanczos3);
    Ok(Bitmap::from_gray_image(resized))
  }
}

/// Box average over each source block. Only integer ratios are accepted.
#[derive(Debug, Default, Clone, Copy)]
pub struct AreaDownsampler;

impl Downsampler for AreaDownsampler {
  fn name(&self) -> &'static str {
    "area"
  }

  fn downsample(&self, raw: &Bitmap, target: (u32, u32)) -> Result<Bitmap, BitmapError> {
    let (w, h) = target;
    if w == 0 || h == 0 || raw.is_empty() || raw.width() % w != 0 || raw.height() % h != 0 {
      return Err(unsupported(self.name(), raw, target));
    }
    let fx = raw.width() / w;
    let fy = raw.height() / h;
    let n = fx * fy;

    let mut out = Bitmap::new(w, h);
    for y in 0..h {
      for x in 0..w {
        let mut sum = 0u32;
        for sy in y * fy..(y + 1) * fy {
          for sx in x * fx..(x + 1) * fx {
            sum += raw.get(sx, sy) as u32;
          }
        }
        // round half up
        out.set(x, y, ((sum + n / 2) / n) as u8);
      }
    }
    Ok(out)
  }
}

fn unsupported(filter: &'static str, raw: &Bitmap, target: (u32, u32)) -> BitmapError {
  BitmapError::UnsupportedRatio {
    filter,
    from_w: raw.width(),
    from_h: raw.height(),
    to_w: target.0,
    to_h: target.1,
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
  #[default]
  Lanczos,
  Area,
}

impl fmt::Display for FilterKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FilterKind::Lanczos => write!(f, "lanczos"),
      FilterKind::Area => write!(f, "area"),
    }
  }
}

pub fn downsampler(kind: FilterKind) -> Box<dyn Downsampler> {
  match kind {
    FilterKind::Lanczos => Box::new(LanczosDownsampler),
    FilterKind::Area => Box::new(AreaDownsampler),
  }
}
