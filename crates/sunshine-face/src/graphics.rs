//! Drawing primitives handed to the draw step.
//!
//! The host owns the real surface; the engine only sees [`Canvas`].

use std::sync::Arc;

use sunshine_core::ResourceError;

pub const BLACK: u32 = 0xFF00_0000;

/// Zero-saturation luminance weights (ITU-R BT.709, as used by color matrices)
const LUMA_R: f32 = 0.213;
const LUMA_G: f32 = 0.715;
const LUMA_B: f32 = 0.072;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(
            0,
            0,
            i32::try_from(width).unwrap_or(i32::MAX),
            i32::try_from(height).unwrap_or(i32::MAX),
        )
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    /// Overlap of two rectangles; empty when disjoint
    pub fn intersect(&self, other: &Rect) -> Rect {
        let r = Rect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        if r.is_empty() {
            Rect::default()
        } else {
            r
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    pub color: u32,
    pub text_size: f32,
    pub anti_alias: bool,
}

impl Paint {
    pub fn fill(color: u32) -> Self {
        Self {
            color,
            text_size: 0.0,
            anti_alias: false,
        }
    }

    pub fn text(color: u32, text_size: f32) -> Self {
        Self {
            color,
            text_size,
            anti_alias: true,
        }
    }
}

/// Immutable ARGB image. Clones share pixel storage.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Arc<[u32]>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self, ResourceError> {
        if width == 0 || height == 0 {
            return Err(ResourceError::InvalidBitmap(format!(
                "zero-sized bitmap {width}x{height}"
            )));
        }
        let expected = (width as usize) * (height as usize);
        if pixels.len() != expected {
            return Err(ResourceError::InvalidBitmap(format!(
                "{width}x{height} bitmap needs {expected} pixels, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels: pixels.into(),
        })
    }

    /// Single-color bitmap; dimensions are clamped to at least 1x1
    pub fn solid(width: u32, height: u32, color: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            pixels: vec![color; (width as usize) * (height as usize)].into(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get((y as usize) * (self.width as usize) + x as usize)
            .copied()
    }

    /// Nearest-neighbour resample
    pub fn scaled(&self, width: u32, height: u32) -> Bitmap {
        let width = width.max(1);
        let height = height.max(1);
        if width == self.width && height == self.height {
            return self.clone();
        }

        let mut pixels = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            let src_y = (u64::from(y) * u64::from(self.height) / u64::from(height)) as usize;
            for x in 0..width {
                let src_x = (u64::from(x) * u64::from(self.width) / u64::from(width)) as usize;
                pixels.push(self.pixels[src_y * self.width as usize + src_x]);
            }
        }
        Bitmap {
            width,
            height,
            pixels: pixels.into(),
        }
    }

    /// Scale so the width matches, keeping the aspect ratio
    pub fn scaled_to_width(&self, width: u32) -> Bitmap {
        let scale = width as f32 / self.width as f32;
        let height = (self.height as f32 * scale) as u32;
        self.scaled(width, height)
    }

    /// Zero-saturation copy; alpha is preserved
    pub fn desaturated(&self) -> Bitmap {
        let pixels: Vec<u32> = self.pixels.iter().map(|&p| desaturate_pixel(p)).collect();
        Bitmap {
            width: self.width,
            height: self.height,
            pixels: pixels.into(),
        }
    }

    pub fn is_grayscale(&self) -> bool {
        self.pixels.iter().all(|&p| {
            let (_, r, g, b) = channels(p);
            r == g && g == b
        })
    }
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

fn channels(argb: u32) -> (u32, u32, u32, u32) {
    (
        (argb >> 24) & 0xFF,
        (argb >> 16) & 0xFF,
        (argb >> 8) & 0xFF,
        argb & 0xFF,
    )
}

fn desaturate_pixel(argb: u32) -> u32 {
    let (a, r, g, b) = channels(argb);
    let luma = LUMA_R * r as f32 + LUMA_G * g as f32 + LUMA_B * b as f32;
    let l = (luma.round() as u32).min(0xFF);
    (a << 24) | (l << 16) | (l << 8) | l
}

/// Surface the draw step renders into
pub trait Canvas {
    /// Called by the frame owner before each draw pass
    fn begin_frame(&mut self) {}

    fn draw_color(&mut self, color: u32);

    fn draw_bitmap(&mut self, bitmap: &Bitmap, left: f32, top: f32, paint: &Paint);

    fn draw_text(&mut self, text: &str, x: f32, y: f32, paint: &Paint);

    fn draw_line(&mut self, start_x: f32, start_y: f32, stop_x: f32, stop_y: f32, paint: &Paint);

    fn draw_rect(&mut self, rect: &Rect, paint: &Paint);

    /// Advance width of `text` rendered with `paint`
    fn measure_text(&self, text: &str, paint: &Paint) -> f32;
}
