// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use pxsvg_tree::{
    BaseGradient, Color as SvgColor, LinearGradient, NonZeroRect, Pattern, Point,
    RadialGradient, SpreadMethod, Transform, Units,
};
use rgb::RGBA;

use crate::pixmap::{self, Color, FilterQuality, Pixmap, TRANSPARENT};
use crate::OptionLog;

const STOP_TABLE_SIZE: usize = 256;

/// Pattern tiles larger than this are rendered at a lower resolution.
const MAX_TILE_SIZE: f32 = 4096.0;

/// A resolved paint.
///
/// All shaders are evaluated in device space.
#[derive(Clone, Debug)]
pub enum Shader {
    Solid(Color),
    LinearGradient(LinearShader),
    RadialGradient(RadialShader),
    Pattern(PatternShader),
}

impl Shader {
    /// Creates a solid color shader.
    pub fn from_color(c: SvgColor, opacity: f32) -> Self {
        Shader::Solid(premultiply(c, opacity))
    }

    /// Returns a premultiplied color at the specified device position.
    pub fn shade(&self, x: f32, y: f32) -> Color {
        match self {
            Shader::Solid(c) => *c,
            Shader::LinearGradient(ref g) => g.shade(x, y),
            Shader::RadialGradient(ref g) => g.shade(x, y),
            Shader::Pattern(ref p) => p.shade(x, y),
        }
    }
}

/// A gradient color ramp sampled at fixed steps.
#[derive(Clone)]
pub struct StopTable {
    colors: Vec<Color>,
    spread: SpreadMethod,
}

impl StopTable {
    fn new(gradient: &BaseGradient) -> Option<Self> {
        let mut stops: Vec<(f32, Color)> = Vec::with_capacity(gradient.stops().len());
        let mut prev_offset = 0.0f32;
        for stop in gradient.stops() {
            // Offsets are clamped and must never decrease.
            let offset = stop.offset().get().clamp(0.0, 1.0).max(prev_offset);
            prev_offset = offset;
            stops.push((offset, premultiply(stop.color(), stop.opacity().get())));
        }

        if stops.is_empty() {
            return None;
        }

        let mut colors = Vec::with_capacity(STOP_TABLE_SIZE);
        for i in 0..STOP_TABLE_SIZE {
            let t = i as f32 / (STOP_TABLE_SIZE - 1) as f32;
            colors.push(color_at(&stops, t));
        }

        Some(StopTable {
            colors,
            spread: gradient.spread_method(),
        })
    }

    /// Returns the color for an unbounded gradient position.
    pub fn lookup(&self, t: f32) -> Color {
        if !t.is_finite() {
            return TRANSPARENT;
        }

        let t = match self.spread {
            SpreadMethod::Pad => t.clamp(0.0, 1.0),
            SpreadMethod::Repeat => t - t.floor(),
            SpreadMethod::Reflect => {
                let m = t.rem_euclid(2.0);
                if m > 1.0 {
                    2.0 - m
                } else {
                    m
                }
            }
        };

        let idx = (t * (STOP_TABLE_SIZE - 1) as f32 + 0.5) as usize;
        self.colors[idx.min(STOP_TABLE_SIZE - 1)]
    }

    fn last(&self) -> Color {
        self.colors[STOP_TABLE_SIZE - 1]
    }
}

impl std::fmt::Debug for StopTable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("StopTable")
            .field("spread", &self.spread)
            .finish()
    }
}

fn color_at(stops: &[(f32, Color)], t: f32) -> Color {
    let (first_offset, first) = stops[0];
    if t <= first_offset {
        return first;
    }

    for w in stops.windows(2) {
        let (o0, c0) = w[0];
        let (o1, c1) = w[1];
        if t <= o1 {
            if o1 - o0 <= f32::EPSILON {
                return c1;
            }

            return pixmap::mix(c0, c1, (t - o0) / (o1 - o0));
        }
    }

    stops[stops.len() - 1].1
}

#[derive(Clone, Debug)]
pub struct LinearShader {
    inverse: Transform,
    start: Point,
    delta: Point,
    table: StopTable,
}

impl LinearShader {
    fn shade(&self, x: f32, y: f32) -> Color {
        let mut p = Point::from_xy(x, y);
        self.inverse.map_point(&mut p);
        let len2 = self.delta.x * self.delta.x + self.delta.y * self.delta.y;
        let t = ((p.x - self.start.x) * self.delta.x + (p.y - self.start.y) * self.delta.y) / len2;
        self.table.lookup(t)
    }
}

/// A two-point conical gradient with a zero focal radius.
#[derive(Clone, Debug)]
pub struct RadialShader {
    inverse: Transform,
    center: Point,
    focal: Point,
    radius: f32,
    table: StopTable,
}

impl RadialShader {
    fn shade(&self, x: f32, y: f32) -> Color {
        let mut p = Point::from_xy(x, y);
        self.inverse.map_point(&mut p);

        // Find the largest `t` for which `p` lies on the circle
        // centered at `focal + t * (center - focal)` with a radius of `t * r`.
        let cdx = self.center.x - self.focal.x;
        let cdy = self.center.y - self.focal.y;
        let pdx = p.x - self.focal.x;
        let pdy = p.y - self.focal.y;

        let a = cdx * cdx + cdy * cdy - self.radius * self.radius;
        let b = pdx * cdx + pdy * cdy;
        let c = pdx * pdx + pdy * pdy;

        let t = if a.abs() < 1e-6 {
            if b.abs() < 1e-6 {
                return TRANSPARENT;
            }
            c / (2.0 * b)
        } else {
            let discr = b * b - a * c;
            if discr < 0.0 {
                return TRANSPARENT;
            }

            let s = discr.sqrt();
            ((b + s) / a).max((b - s) / a)
        };

        if t < 0.0 {
            return TRANSPARENT;
        }

        self.table.lookup(t)
    }
}

#[derive(Clone, Debug)]
pub struct PatternShader {
    /// Maps device coordinates to tile pixels.
    inverse: Transform,
    tile: Arc<Pixmap>,
}

impl PatternShader {
    pub fn new(tile: Pixmap, tile_transform: Transform) -> Option<Self> {
        let inverse = tile_transform
            .invert()
            .log_none(|| log::warn!("Pattern has a non-invertible transform."))?;
        Some(PatternShader {
            inverse,
            tile: Arc::new(tile),
        })
    }

    fn shade(&self, x: f32, y: f32) -> Color {
        let mut p = Point::from_xy(x, y);
        self.inverse.map_point(&mut p);
        self.tile.sample(p.x, p.y, FilterQuality::Bilinear, true)
    }
}

/// Creates a linear gradient shader.
///
/// `ts` maps the gradient user space onto the device.
pub fn convert_linear_gradient(
    gradient: &LinearGradient,
    object_bbox: Option<NonZeroRect>,
    ts: Transform,
) -> Option<Shader> {
    let (table, transform) = convert_base_gradient(gradient, object_bbox, ts)?;

    let start = Point::from_xy(gradient.x1(), gradient.y1());
    let delta = Point::from_xy(gradient.x2() - gradient.x1(), gradient.y2() - gradient.y1());
    if delta.x == 0.0 && delta.y == 0.0 {
        // A zero-length vector is painted using the last stop color.
        return Some(Shader::Solid(table.last()));
    }

    let inverse = transform
        .invert()
        .log_none(|| log::warn!("Gradient has a non-invertible transform."))?;

    Some(Shader::LinearGradient(LinearShader {
        inverse,
        start,
        delta,
        table,
    }))
}

/// Creates a radial gradient shader.
pub fn convert_radial_gradient(
    gradient: &RadialGradient,
    object_bbox: Option<NonZeroRect>,
    ts: Transform,
) -> Option<Shader> {
    let (table, transform) = convert_base_gradient(gradient, object_bbox, ts)?;

    let radius = gradient.r().get();
    if !(radius > 0.0) {
        return Some(Shader::Solid(table.last()));
    }

    let center = Point::from_xy(gradient.cx(), gradient.cy());
    let mut focal = Point::from_xy(gradient.fx(), gradient.fy());

    // A focal point outside of the end circle is moved onto its edge.
    let fdx = focal.x - center.x;
    let fdy = focal.y - center.y;
    let dist = (fdx * fdx + fdy * fdy).sqrt();
    let max_dist = radius * 0.999;
    if dist > max_dist {
        let k = max_dist / dist;
        focal = Point::from_xy(center.x + fdx * k, center.y + fdy * k);
    }

    let inverse = transform
        .invert()
        .log_none(|| log::warn!("Gradient has a non-invertible transform."))?;

    Some(Shader::RadialGradient(RadialShader {
        inverse,
        center,
        focal,
        radius,
        table,
    }))
}

fn convert_base_gradient(
    gradient: &BaseGradient,
    object_bbox: Option<NonZeroRect>,
    ts: Transform,
) -> Option<(StopTable, Transform)> {
    let transform = if gradient.units() == Units::ObjectBoundingBox {
        let bbox =
            object_bbox.log_none(|| log::warn!("Gradient on zero-sized shapes is not allowed."))?;
        Transform::from_bbox(bbox).pre_concat(gradient.transform())
    } else {
        gradient.transform()
    };

    let table = StopTable::new(gradient)
        .log_none(|| log::warn!("Gradient '{}' has no stops.", gradient.id()))?;

    Some((table, ts.pre_concat(transform)))
}

/// A pattern tile placement.
#[derive(Clone, Copy, Debug)]
pub struct PatternLayout {
    pub width: u32,
    pub height: u32,
    /// Maps pattern content coordinates to tile pixels.
    pub content_transform: Transform,
    /// Maps tile pixels to the device.
    pub tile_transform: Transform,
}

/// Calculates the tile size and transforms of a pattern.
///
/// The tile is rendered at device scale.
pub fn pattern_layout(
    pattern: &Pattern,
    object_bbox: Option<NonZeroRect>,
    ts: Transform,
) -> Option<PatternLayout> {
    let rect = if pattern.units() == Units::ObjectBoundingBox {
        let bbox =
            object_bbox.log_none(|| log::warn!("Pattern on zero-sized shapes is not allowed."))?;
        pattern.rect().bbox_transform(bbox)
    } else {
        pattern.rect()
    };

    let ts = ts.pre_concat(pattern.transform());
    let (sx, sy) = ts.get_scale();
    let width = (rect.width() * sx).round().clamp(1.0, MAX_TILE_SIZE);
    let height = (rect.height() * sy).round().clamp(1.0, MAX_TILE_SIZE);
    if !width.is_finite() || !height.is_finite() {
        return None;
    }

    // The tile has an integer size, so the actual scale is slightly different.
    let sx = width / rect.width();
    let sy = height / rect.height();

    let mut content_transform = Transform::from_scale(sx, sy);
    if let Some(view_box) = pattern.view_box() {
        content_transform = content_transform.pre_concat(view_box.to_transform(rect.size()));
    } else if pattern.content_units() == Units::ObjectBoundingBox {
        let bbox =
            object_bbox.log_none(|| log::warn!("Pattern on zero-sized shapes is not allowed."))?;
        // No need to shift patterns.
        content_transform = content_transform.pre_scale(bbox.width(), bbox.height());
    }

    let tile_transform = ts
        .pre_translate(rect.x(), rect.y())
        .pre_scale(1.0 / sx, 1.0 / sy);

    Some(PatternLayout {
        width: width as u32,
        height: height as u32,
        content_transform,
        tile_transform,
    })
}

pub(crate) fn premultiply(c: SvgColor, opacity: f32) -> Color {
    let a = opacity.clamp(0.0, 1.0);
    RGBA::new(
        c.red as f32 / 255.0 * a,
        c.green as f32 / 255.0 * a,
        c.blue as f32 / 255.0 * a,
        a,
    )
}
