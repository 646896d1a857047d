// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use pxsvg_tree::MaskType;
use rgb::RGBA;

use crate::geom::IntRect;
use crate::paint_server::Shader;
use crate::raster::Coverage;

/// A premultiplied color with channels in `0..=1`.
pub type Color = RGBA<f32>;

pub const TRANSPARENT: Color = RGBA {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 0.0,
};

/// Allocates a vector without aborting on allocation failure.
pub(crate) fn alloc_vec<T: Clone>(len: usize, value: T) -> Option<Vec<T>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len).ok()?;
    data.resize(len, value);
    Some(data)
}

/// An image sampling method.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum FilterQuality {
    Nearest,
    Bilinear,
}

/// A floating point premultiplied RGBA canvas.
#[derive(Clone)]
pub struct Pixmap {
    width: u32,
    height: u32,
    data: Vec<Color>,
}

impl Pixmap {
    /// Allocates a new transparent pixmap.
    ///
    /// Returns `None` when the size is zero or the memory cannot be allocated.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }

        let len = (width as usize).checked_mul(height as usize)?;
        Some(Pixmap {
            width,
            height,
            data: alloc_vec(len, TRANSPARENT)?,
        })
    }

    /// Creates a pixmap from demultiplied 8-bit RGBA data.
    pub fn from_rgba8(width: u32, height: u32, rgba: &[rgb::RGBA8]) -> Option<Self> {
        let mut pixmap = Self::new(width, height)?;
        if rgba.len() != pixmap.data.len() {
            return None;
        }

        for (dst, src) in pixmap.data.iter_mut().zip(rgba) {
            let a = src.a as f32 / 255.0;
            *dst = RGBA::new(
                src.r as f32 / 255.0 * a,
                src.g as f32 / 255.0 * a,
                src.b as f32 / 255.0 * a,
                a,
            );
        }

        Some(pixmap)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn rect(&self) -> IntRect {
        // Size is checked during creation.
        IntRect::from_xywh(0, 0, self.width, self.height).unwrap()
    }

    #[inline]
    pub fn pixels(&self) -> &[Color] {
        &self.data
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        self.data[(y * self.width + x) as usize]
    }

    pub fn clear(&mut self) {
        self.data.fill(TRANSPARENT);
    }

    /// Blends a shaded coverage onto the pixmap using source-over.
    pub fn fill(&mut self, coverage: &Coverage, shader: &Shader, opacity: f32, clip: Option<&Mask>) {
        let rect = match coverage.rect().intersect(self.rect()) {
            Some(v) => v,
            None => return,
        };

        for y in rect.top()..rect.bottom() {
            let row = coverage.row(y);
            for x in rect.left()..rect.right() {
                let mut c = row[(x - coverage.rect().x()) as usize] * opacity;
                if let Some(clip) = clip {
                    c *= clip.get(x as u32, y as u32);
                }

                if c <= 0.0 {
                    continue;
                }

                let src = shader.shade(x as f32 + 0.5, y as f32 + 0.5);
                let idx = (y as u32 * self.width + x as u32) as usize;
                self.data[idx] = source_over(scale(src, c), self.data[idx]);
            }
        }
    }

    /// Blends a pixmap of the same size onto this one using source-over.
    pub fn draw_layer(&mut self, layer: &Pixmap, opacity: f32) {
        debug_assert_eq!(self.data.len(), layer.data.len());

        for (dst, src) in self.data.iter_mut().zip(&layer.data) {
            if src.a > 0.0 {
                *dst = source_over(scale(*src, opacity), *dst);
            }
        }
    }

    /// Draws a single premultiplied pixel using source-over.
    #[inline]
    pub fn blend_pixel(&mut self, x: u32, y: u32, src: Color) {
        let idx = (y * self.width + x) as usize;
        self.data[idx] = source_over(src, self.data[idx]);
    }

    /// Multiplies every pixel by the mask value.
    pub fn apply_mask(&mut self, mask: &Mask) {
        for (p, m) in self.data.iter_mut().zip(&mask.data) {
            *p = scale(*p, *m);
        }
    }

    /// Samples the pixmap at the specified position in pixel coordinates.
    ///
    /// With `repeat` set, the pixmap is treated as an infinite tiling.
    /// Otherwise, samples outside of the pixmap are clamped to the edge.
    pub fn sample(&self, x: f32, y: f32, quality: FilterQuality, repeat: bool) -> Color {
        let fetch = |x: i64, y: i64| -> Color {
            let (w, h) = (self.width as i64, self.height as i64);
            let (x, y) = if repeat {
                (x.rem_euclid(w), y.rem_euclid(h))
            } else {
                (x.clamp(0, w - 1), y.clamp(0, h - 1))
            };
            self.data[(y * w + x) as usize]
        };

        match quality {
            FilterQuality::Nearest => fetch(x.floor() as i64, y.floor() as i64),
            FilterQuality::Bilinear => {
                let x = x - 0.5;
                let y = y - 0.5;
                let (x0, y0) = (x.floor(), y.floor());
                let (fx, fy) = (x - x0, y - y0);
                let (x0, y0) = (x0 as i64, y0 as i64);

                let top = mix(fetch(x0, y0), fetch(x0 + 1, y0), fx);
                let bottom = mix(fetch(x0, y0 + 1), fetch(x0 + 1, y0 + 1), fx);
                mix(top, bottom, fy)
            }
        }
    }

    /// Quantizes the pixmap into premultiplied 8-bit RGBA.
    ///
    /// `out` must be at least `width * height * 4` bytes long.
    pub fn write_rgba8(&self, out: &mut [u8]) {
        for (dst, src) in out.chunks_exact_mut(4).zip(&self.data) {
            let a = quantize(src.a);
            // Quantization must not break the premultiplied invariant.
            dst[0] = quantize(src.r).min(a);
            dst[1] = quantize(src.g).min(a);
            dst[2] = quantize(src.b).min(a);
            dst[3] = a;
        }
    }
}

impl std::fmt::Debug for Pixmap {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Pixmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// A canvas-sized coverage mask.
#[derive(Clone)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl Mask {
    /// Allocates a new mask filled with `value`.
    pub fn new(width: u32, height: u32, value: f32) -> Option<Self> {
        let len = (width as usize).checked_mul(height as usize)?;
        Some(Mask {
            width,
            height,
            data: alloc_vec(len, value)?,
        })
    }

    /// Converts pixmap content into a mask.
    pub fn from_pixmap(pixmap: &Pixmap, kind: MaskType) -> Option<Self> {
        let mut mask = Self::new(pixmap.width, pixmap.height, 0.0)?;
        for (m, p) in mask.data.iter_mut().zip(&pixmap.data) {
            *m = match kind {
                // Premultiplied channels already carry alpha.
                MaskType::Luminance => 0.2125 * p.r + 0.7154 * p.g + 0.0721 * p.b,
                MaskType::Alpha => p.a,
            }
            .clamp(0.0, 1.0);
        }

        Some(mask)
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[(y * self.width + x) as usize]
    }

    /// Adds coverage to the mask.
    ///
    /// Overlapping coverage is combined as `c + f - c * f`.
    /// When `clip` is set, the added coverage is clipped by it first.
    pub fn union(&mut self, coverage: &Coverage, clip: Option<&Mask>) {
        let bounds = IntRect::from_xywh(0, 0, self.width, self.height);
        let rect = match bounds.and_then(|b| coverage.rect().intersect(b)) {
            Some(v) => v,
            None => return,
        };

        for y in rect.top()..rect.bottom() {
            let row = coverage.row(y);
            for x in rect.left()..rect.right() {
                let mut f = row[(x - coverage.rect().x()) as usize];
                if let Some(clip) = clip {
                    f *= clip.get(x as u32, y as u32);
                }

                let idx = (y as u32 * self.width + x as u32) as usize;
                let c = self.data[idx];
                self.data[idx] = c + f - c * f;
            }
        }
    }

    /// Multiplies the mask by `coverage`.
    ///
    /// Values outside of the coverage region are zeroed.
    pub fn intersect_coverage(&mut self, coverage: &Coverage) {
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = (y * self.width + x) as usize;
                self.data[idx] *= coverage.get(x as i32, y as i32);
            }
        }
    }

    /// Multiplies the mask by another one.
    pub fn intersect(&mut self, other: &Mask) {
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a *= *b;
        }
    }
}

impl std::fmt::Debug for Mask {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Mask")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

#[inline]
pub(crate) fn quantize(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

#[inline]
pub(crate) fn scale(c: Color, s: f32) -> Color {
    RGBA::new(c.r * s, c.g * s, c.b * s, c.a * s)
}

#[inline]
pub(crate) fn mix(a: Color, b: Color, t: f32) -> Color {
    RGBA::new(
        a.r + (b.r - a.r) * t,
        a.g + (b.g - a.g) * t,
        a.b + (b.b - a.b) * t,
        a.a + (b.a - a.a) * t,
    )
}

#[inline]
fn source_over(src: Color, dst: Color) -> Color {
    let ia = 1.0 - src.a;
    RGBA::new(
        src.r + dst.r * ia,
        src.g + dst.g * ia,
        src.b + dst.b * ia,
        src.a + dst.a * ia,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantization() {
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(1.0), 255);
        assert_eq!(quantize(0.5), 128);
        assert_eq!(quantize(1.5), 255);
        assert_eq!(quantize(-1.0), 0);
        assert_eq!(quantize(f32::NAN), 0);
    }

    #[test]
    fn write_keeps_premultiplied_invariant() {
        let mut pixmap = Pixmap::new(1, 1).unwrap();
        pixmap.data[0] = RGBA::new(0.5, 0.2, 0.1, 0.4);
        let mut out = [0u8; 4];
        pixmap.write_rgba8(&mut out);
        assert_eq!(out, [102, 51, 26, 102]);
    }

    #[test]
    fn source_over_blending() {
        let red = RGBA::new(1.0, 0.0, 0.0, 1.0);
        let half_blue = RGBA::new(0.0, 0.0, 0.5, 0.5);
        assert_eq!(source_over(half_blue, red), RGBA::new(0.5, 0.0, 0.5, 1.0));
        assert_eq!(source_over(TRANSPARENT, red), red);
    }

    #[test]
    fn from_rgba8_premultiplies() {
        let data = [rgb::RGBA8::new(255, 0, 0, 51)];
        let pixmap = Pixmap::from_rgba8(1, 1, &data).unwrap();
        let p = pixmap.pixel(0, 0);
        assert!((p.r - 0.2).abs() < 1e-6);
        assert!((p.a - 0.2).abs() < 1e-6);
    }

    #[test]
    fn zero_size() {
        assert!(Pixmap::new(0, 10).is_none());
    }

    #[test]
    fn repeat_sampling() {
        let mut pixmap = Pixmap::new(2, 1).unwrap();
        pixmap.data[1] = RGBA::new(1.0, 1.0, 1.0, 1.0);
        assert_eq!(pixmap.sample(3.5, 0.5, FilterQuality::Nearest, true).a, 1.0);
        assert_eq!(pixmap.sample(-1.5, 0.5, FilterQuality::Nearest, true).a, 0.0);
        assert_eq!(pixmap.sample(9.0, 0.5, FilterQuality::Nearest, false).a, 1.0);

        let c = pixmap.sample(1.0, 0.5, FilterQuality::Bilinear, false);
        assert!((c.a - 0.5).abs() < 1e-6);
    }

    #[test]
    fn luminance_mask() {
        let mut pixmap = Pixmap::new(2, 1).unwrap();
        pixmap.data[0] = RGBA::new(1.0, 1.0, 1.0, 1.0);
        pixmap.data[1] = RGBA::new(0.0, 0.0, 0.0, 1.0);
        let mask = Mask::from_pixmap(&pixmap, MaskType::Luminance).unwrap();
        assert!((mask.get(0, 0) - 1.0).abs() < 1e-4);
        assert_eq!(mask.get(1, 0), 0.0);

        let mask = Mask::from_pixmap(&pixmap, MaskType::Alpha).unwrap();
        assert_eq!(mask.get(1, 0), 1.0);
    }
}
