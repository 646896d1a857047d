// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Analytic coverage rasterization.
//!
//! Each polygon edge deposits its signed area and cover into an accumulation
//! buffer. A running sum over every row then yields the winding-weighted
//! coverage of each pixel.

use pxsvg_tree::{FillRule, Point};

use crate::flatten::{lerp, Polyline};
use crate::geom::{self, IntRect};

/// Per-pixel coverage of a filled shape in `0..=1`.
#[derive(Clone, Debug)]
pub struct Coverage {
    rect: IntRect,
    data: Vec<f32>,
}

impl Coverage {
    /// Returns the region covered by this buffer in device pixels.
    #[inline]
    pub fn rect(&self) -> IntRect {
        self.rect
    }

    /// Returns coverage values of a row.
    ///
    /// `y` is in device pixels and must be inside `rect`.
    #[inline]
    pub fn row(&self, y: i32) -> &[f32] {
        let w = self.rect.width() as usize;
        let start = (y - self.rect.y()) as usize * w;
        &self.data[start..start + w]
    }

    /// Returns coverage at the specified device pixel.
    ///
    /// Pixels outside of the buffer are not covered.
    pub fn get(&self, x: i32, y: i32) -> f32 {
        if !self.rect.contains(x, y) {
            return 0.0;
        }

        let idx = (y - self.rect.y()) as usize * self.rect.width() as usize
            + (x - self.rect.x()) as usize;
        self.data[idx]
    }
}

/// Rasterizes polygons clipped to `bounds`.
///
/// All polygons are closed implicitly.
///
/// Returns `None` when nothing is covered.
pub fn rasterize(
    polygons: &[Polyline],
    rule: FillRule,
    anti_alias: bool,
    bounds: IntRect,
) -> Option<Coverage> {
    let shape_rect = geom::points_bounds(polygons.iter().flat_map(|p| p.points.iter()))?;
    let rect = IntRect::round_out(shape_rect)?.intersect(bounds)?;

    let mut acc = Accumulator::new(rect)?;
    for polygon in polygons {
        if polygon.points.len() < 2 {
            continue;
        }

        let first = polygon.points[0];
        let last = polygon.points[polygon.points.len() - 1];
        for w in polygon.points.windows(2) {
            acc.add_edge(w[0], w[1]);
        }
        acc.add_edge(last, first);
    }

    Some(acc.into_coverage(rule, anti_alias))
}

struct Accumulator {
    rect: IntRect,
    // Each row has two extra cells for edges touching the right border.
    stride: usize,
    cells: Vec<f32>,
}

impl Accumulator {
    fn new(rect: IntRect) -> Option<Self> {
        let stride = rect.width() as usize + 2;
        let len = stride.checked_mul(rect.height() as usize)?;

        let mut cells = Vec::new();
        if cells.try_reserve_exact(len).is_err() {
            log::warn!("Failed to allocate a coverage buffer for {:?}.", rect);
            return None;
        }
        cells.resize(len, 0.0);

        Some(Accumulator { rect, stride, cells })
    }

    /// Adds an edge in device coordinates.
    fn add_edge(&mut self, p0: Point, p1: Point) {
        let p0 = Point::from_xy(p0.x - self.rect.x() as f32, p0.y - self.rect.y() as f32);
        let p1 = Point::from_xy(p1.x - self.rect.x() as f32, p1.y - self.rect.y() as f32);
        if p0.y == p1.y {
            return;
        }

        // Geometry to the left of the buffer has to be projected onto its left border
        // and geometry to the right can be dropped. To keep slopes intact, the edge is
        // split at both borders first.
        let right = self.rect.width() as f32;
        let mut splits = [0.0f32; 2];
        let mut count = 0;
        for border in [0.0, right] {
            if (p0.x - border) * (p1.x - border) < 0.0 {
                splits[count] = (border - p0.x) / (p1.x - p0.x);
                count += 1;
            }
        }
        let splits = &mut splits[..count];
        splits.sort_by(|a, b| a.total_cmp(b));

        let clamp = |p: Point| Point::from_xy(p.x.clamp(0.0, right), p.y);
        let mut prev = p0;
        for t in splits.iter() {
            let p = lerp(p0, p1, *t);
            self.add_line(clamp(prev), clamp(p));
            prev = p;
        }
        self.add_line(clamp(prev), clamp(p1));
    }

    /// Accumulates a line which is fully inside the horizontal buffer range.
    fn add_line(&mut self, p0: Point, p1: Point) {
        if p0.y == p1.y {
            return;
        }

        let (dir, p0, p1) = if p0.y < p1.y {
            (1.0, p0, p1)
        } else {
            (-1.0, p1, p0)
        };

        let height = self.rect.height() as usize;
        let right = self.rect.width() as f32;
        let dxdy = (p1.x - p0.x) / (p1.y - p0.y);
        let mut x = p0.x;
        if p0.y < 0.0 {
            x = (x - p0.y * dxdy).clamp(0.0, right);
        }

        // Saturating casts clamp negative values to zero.
        let y_start = p0.y as usize;
        let y_end = height.min(p1.y.ceil() as usize);
        for y in y_start..y_end {
            let row = y * self.stride;
            let dy = ((y + 1) as f32).min(p1.y) - (y as f32).max(p0.y);
            // Rounding errors must not move the line outside the row.
            let x_next = (x + dxdy * dy).clamp(0.0, right);
            let d = dy * dir;

            let (x0, x1) = if x < x_next { (x, x_next) } else { (x_next, x) };
            let x0_floor = x0.floor();
            let x0i = x0_floor as usize;
            let x1_ceil = x1.ceil();
            let x1i = x1_ceil as usize;

            if x1i <= x0i + 1 {
                // The line stays within a single pixel column.
                let xmf = 0.5 * (x + x_next) - x0_floor;
                self.cells[row + x0i] += d - d * xmf;
                self.cells[row + x0i + 1] += d * xmf;
            } else {
                let s = (x1 - x0).recip();
                let x0f = x0 - x0_floor;
                let a0 = 0.5 * s * (1.0 - x0f) * (1.0 - x0f);
                let x1f = x1 - x1_ceil + 1.0;
                let am = 0.5 * s * x1f * x1f;

                self.cells[row + x0i] += d * a0;
                if x1i == x0i + 2 {
                    self.cells[row + x0i + 1] += d * (1.0 - a0 - am);
                } else {
                    let a1 = s * (1.5 - x0f);
                    self.cells[row + x0i + 1] += d * (a1 - a0);
                    for xi in x0i + 2..x1i - 1 {
                        self.cells[row + xi] += d * s;
                    }
                    let a2 = a1 + (x1i - x0i - 3) as f32 * s;
                    self.cells[row + x1i - 1] += d * (1.0 - a2 - am);
                }
                self.cells[row + x1i] += d * am;
            }

            x = x_next;
        }
    }

    fn into_coverage(self, rule: FillRule, anti_alias: bool) -> Coverage {
        let width = self.rect.width() as usize;
        let mut data = Vec::with_capacity(width * self.rect.height() as usize);
        for row in self.cells.chunks_exact(self.stride) {
            let mut sum = 0.0;
            for cell in &row[..width] {
                sum += *cell;
                let mut c = match rule {
                    FillRule::NonZero => sum.abs().min(1.0),
                    FillRule::EvenOdd => {
                        let m = sum.abs() % 2.0;
                        if m > 1.0 {
                            2.0 - m
                        } else {
                            m
                        }
                    }
                };

                if !c.is_finite() {
                    c = 0.0;
                }

                if !anti_alias {
                    c = if c >= 0.5 { 1.0 } else { 0.0 };
                }

                data.push(c);
            }
        }

        Coverage {
            rect: self.rect,
            data,
        }
    }
}
