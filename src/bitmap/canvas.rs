use super::downsample::Downsampler;
use super::{Bitmap, BitmapError, BACKGROUND, INKED};

pub const MIN_BRUSH: u32 = 1;
pub const MAX_BRUSH: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ink {
  Draw,
  Erase,
}

impl Ink {
  pub fn value(self) -> u8 {
    match self {
      Ink::Draw => INKED,
      Ink::Erase => BACKGROUND,
    }
  }
}

/// Fill the disc of `radius` around `(cx, cy)`, clipped to the bitmap.
///
/// A center outside the bitmap paints nothing, even if part of the disc
/// would overlap it.
pub fn stamp(bitmap: &mut Bitmap, cx: i32, cy: i32, radius: u32, ink: Ink) {
  if !bitmap.contains(cx, cy) {
    return;
  }
  let r = radius as i32;
  for dx in -r..=r {
    for dy in -r..=r {
      let (px, py) = (cx + dx, cy + dy);
      if bitmap.contains(px, py) && dx * dx + dy * dy <= r * r {
        bitmap.set(px as u32, py as u32, ink.value());
      }
    }
  }
}

/// Bresenham from `from` to `to`, stamping the brush at every visited point,
/// both endpoints included.
pub fn rasterize_line(bitmap: &mut Bitmap, from: (i32, i32), to: (i32, i32), radius: u32, ink: Ink) {
  let (mut x, mut y) = from;
  let (x2, y2) = to;
  let dx = (x2 - x).abs();
  let dy = (y2 - y).abs();
  let sx = if x < x2 { 1 } else { -1 };
  let sy = if y < y2 { 1 } else { -1 };
  let mut err = dx - dy;

  loop {
    stamp(bitmap, x, y, radius, ink);
    if x == x2 && y == y2 {
      break;
    }
    let e2 = 2 * err;
    if e2 > -dy {
      err -= dy;
      x += sx;
    }
    if e2 < dx {
      err += dx;
      y += sy;
    }
  }
}

/// Drawing state of one capture session.
///
/// Pen positions are in display coordinates (canvas pixels times
/// `scale_factor`); consecutive positions of one stroke are joined.
pub struct CanvasSession {
  canvas: Bitmap,
  downscaled: Bitmap,
  target: (u32, u32),
  scale_factor: u32,
  brush: u32,
  last_pos: Option<(i32, i32)>,
  stroke_ink: Option<Ink>,
  downsampler: Box<dyn Downsampler>,
}

impl CanvasSession {
  pub fn new(canvas_size: u32, target_size: u32, scale_factor: u32, brush: u32, downsampler: Box<dyn Downsampler>) -> Self {
    Self {
      canvas: Bitmap::new(canvas_size, canvas_size),
      downscaled: Bitmap::new(target_size, target_size),
      target: (target_size, target_size),
      scale_factor: scale_factor.max(1),
      brush: brush.clamp(MIN_BRUSH, MAX_BRUSH),
      last_pos: None,
      stroke_ink: None,
      downsampler,
    }
  }

  pub fn canvas(&self) -> &Bitmap {
    &self.canvas
  }

  pub fn downscaled(&self) -> &Bitmap {
    &self.downscaled
  }

  pub fn brush(&self) -> u32 {
    self.brush
  }

  pub fn scale_factor(&self) -> u32 {
    self.scale_factor
  }

  pub fn is_drawing(&self) -> bool {
    self.stroke_ink.is_some()
  }

  pub fn set_downsampler(&mut self, downsampler: Box<dyn Downsampler>) {
    self.downsampler = downsampler;
  }

  pub fn brush_up(&mut self) -> u32 {
    self.brush = (self.brush + 1).min(MAX_BRUSH);
    self.brush
  }

  pub fn brush_down(&mut self) -> u32 {
    self.brush = self.brush.saturating_sub(1).max(MIN_BRUSH);
    self.brush
  }

  pub fn set_brush(&mut self, brush: u32) -> u32 {
    self.brush = brush.clamp(MIN_BRUSH, MAX_BRUSH);
    self.brush
  }

  /// Start a stroke at display position `pos`.
  pub fn pen_down(&mut self, pos: (i32, i32), ink: Ink) {
    self.stroke_ink = Some(ink);
    self.last_pos = None;
    self.paint(pos, ink);
  }

  /// Continue the current stroke; ignored when no stroke is active.
  pub fn pen_move(&mut self, pos: (i32, i32)) {
    if let Some(ink) = self.stroke_ink {
      self.paint(pos, ink);
    }
  }

  pub fn pen_up(&mut self) {
    self.stroke_ink = None;
    self.last_pos = None;
  }

  /// Draw a whole stroke through `points` (display coordinates).
  pub fn stroke(&mut self, points: &[(i32, i32)], ink: Ink) {
    if let Some((&first, rest)) = points.split_first() {
      self.pen_down(first, ink);
      for &p in rest {
        self.pen_move(p);
      }
      self.pen_up();
    }
  }

  fn paint(&mut self, pos: (i32, i32), ink: Ink) {
    let to = self.to_canvas(pos);
    match self.last_pos {
      Some(last) => {
        let from = self.to_canvas(last);
        rasterize_line(&mut self.canvas, from, to, self.brush, ink)
      }
      None => stamp(&mut self.canvas, to.0, to.1, self.brush, ink),
    }
    self.last_pos = Some(pos);
  }

  fn to_canvas(&self, pos: (i32, i32)) -> (i32, i32) {
    let s = self.scale_factor as i32;
    (pos.0.div_euclid(s), pos.1.div_euclid(s))
  }

  /// Reset the canvas and the last downsampled image.
  pub fn clear(&mut self) {
    self.canvas.clear();
    self.downscaled.clear();
    self.last_pos = None;
    self.stroke_ink = None;
  }

  /// Recompute the downsampled image from the current canvas.
  pub fn process(&mut self) -> Result<&Bitmap, BitmapError> {
    self.downscaled = self.downsampler.downsample(&self.canvas, self.target)?;
    let (min, max) = self.downscaled.min_max();
    log::info!(
      "Downscaled {}x{} -> {}x{} ({}), min {}, max {}",
      self.canvas.width(),
      self.canvas.height(),
      self.target.0,
      self.target.1,
      self.downsampler.name(),
      min,
      max
    );
    Ok(&self.downscaled)
  }

  /// Fresh payload for transmission: always re-downsamples first.
  pub fn payload(&mut self) -> Result<Vec<u8>, BitmapError> {
    Ok(self.process()?.as_bytes().to_vec())
  }
}
