// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use pxsvg_tree::{PathData, PathSegment, Point, Rect, Transform};

/// The maximum distance between a curve and its flattened version, in device pixels.
pub const FLATTEN_TOLERANCE: f32 = 0.1;

const MAX_SUBDIVISION_DEPTH: u8 = 16;

/// A flattened subpath.
#[derive(Clone, Default, Debug)]
pub struct Polyline {
    pub points: Vec<Point>,
    /// Set when the subpath was explicitly closed.
    ///
    /// Fills close all subpaths implicitly, so this only affects stroking.
    pub closed: bool,
}

impl Polyline {
    pub fn from_rect(rect: Rect) -> Self {
        Polyline {
            points: vec![
                Point::from_xy(rect.left(), rect.top()),
                Point::from_xy(rect.right(), rect.top()),
                Point::from_xy(rect.right(), rect.bottom()),
                Point::from_xy(rect.left(), rect.bottom()),
            ],
            closed: true,
        }
    }

    pub fn transform(&mut self, ts: Transform) {
        if !ts.is_identity() {
            ts.map_points(&mut self.points);
        }
    }

    /// Iterates over all segments, including the closing one.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let closing = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) if self.points.len() > 2 => Some((*last, *first)),
            _ => None,
        };

        self.points
            .windows(2)
            .map(|w| (w[0], w[1]))
            .chain(closing)
    }

    /// Returns the doubled signed area.
    pub fn signed_area(&self) -> f32 {
        self.edges()
            .map(|(a, b)| a.x * b.y - b.x * a.y)
            .sum()
    }

    pub fn is_finite(&self) -> bool {
        self.points.iter().all(|p| p.x.is_finite() && p.y.is_finite())
    }
}

/// Flattens path data into device-space polylines.
///
/// Curves are subdivided after the transform is applied, so `tolerance`
/// is expressed in device pixels.
///
/// Returns an empty list when the path has non-finite coordinates.
pub fn flatten(data: &PathData, ts: Transform, tolerance: f32) -> Vec<Polyline> {
    let mut f = Flattener {
        ts,
        tolerance,
        polylines: Vec::new(),
        current: Vec::new(),
        start: Point::zero(),
        last: Point::zero(),
    };

    for seg in data.simplified() {
        match seg {
            PathSegment::MoveTo(p) => {
                let p = f.map(p);
                f.move_to(p);
            }
            PathSegment::LineTo(p) => {
                let p = f.map(p);
                f.line_to(p);
            }
            PathSegment::QuadTo(p1, p) => {
                let (p1, p) = (f.map(p1), f.map(p));
                f.quad_to(p1, p);
            }
            PathSegment::CubicTo(p1, p2, p) => {
                let (p1, p2, p) = (f.map(p1), f.map(p2), f.map(p));
                f.cubic_to(p1, p2, p, 0);
            }
            PathSegment::ArcTo { .. } => {
                // Arcs are converted into curves by `simplified()`.
                debug_assert!(false);
            }
            PathSegment::Close => f.close(),
        }
    }
    f.finish(false);

    if !f.polylines.iter().all(Polyline::is_finite) {
        log::warn!("A path with non-finite coordinates is skipped.");
        return Vec::new();
    }

    f.polylines
}

struct Flattener {
    ts: Transform,
    tolerance: f32,
    polylines: Vec<Polyline>,
    current: Vec<Point>,
    start: Point,
    last: Point,
}

impl Flattener {
    fn map(&self, mut p: Point) -> Point {
        self.ts.map_point(&mut p);
        p
    }

    fn move_to(&mut self, p: Point) {
        self.finish(false);
        self.start = p;
        self.last = p;
        self.current.push(p);
    }

    fn line_to(&mut self, p: Point) {
        // A segment after `Close` starts at the previous subpath start.
        if self.current.is_empty() {
            self.current.push(self.start);
        }

        if p != self.last {
            self.current.push(p);
        }
        self.last = p;
    }

    fn quad_to(&mut self, p1: Point, p: Point) {
        // Degree elevation.
        let p0 = self.last;
        let c1 = lerp(p0, p1, 2.0 / 3.0);
        let c2 = lerp(p, p1, 2.0 / 3.0);
        self.cubic_to(c1, c2, p, 0);
    }

    fn cubic_to(&mut self, p1: Point, p2: Point, p3: Point, depth: u8) {
        let p0 = self.last;
        if depth >= MAX_SUBDIVISION_DEPTH || is_flat(p0, p1, p2, p3, self.tolerance) {
            self.line_to(p3);
            return;
        }

        // de Casteljau at t = 0.5
        let p01 = mid(p0, p1);
        let p12 = mid(p1, p2);
        let p23 = mid(p2, p3);
        let p012 = mid(p01, p12);
        let p123 = mid(p12, p23);
        let p0123 = mid(p012, p123);

        self.cubic_to(p01, p012, p0123, depth + 1);
        self.cubic_to(p123, p23, p3, depth + 1);
    }

    fn close(&mut self) {
        if let (Some(first), Some(last)) = (self.current.first(), self.current.last()) {
            if self.current.len() > 1 && first == last {
                self.current.pop();
            }
        }

        self.finish(true);
        self.last = self.start;
    }

    fn finish(&mut self, closed: bool) {
        if !self.current.is_empty() {
            self.polylines.push(Polyline {
                points: std::mem::take(&mut self.current),
                closed,
            });
        }
    }
}

#[inline]
fn mid(a: Point, b: Point) -> Point {
    lerp(a, b, 0.5)
}

#[inline]
pub(crate) fn lerp(a: Point, b: Point, t: f32) -> Point {
    Point::from_xy(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

// The maximum distance between the curve and its chord is bounded by
// 3/4 of the control points deviation. See "Piecewise Linear Approximation
// of Bezier Curves" by Roger Willcocks.
fn is_flat(p0: Point, p1: Point, p2: Point, p3: Point, tolerance: f32) -> bool {
    let ux = 3.0 * p1.x - 2.0 * p0.x - p3.x;
    let uy = 3.0 * p1.y - 2.0 * p0.y - p3.y;
    let vx = 3.0 * p2.x - p0.x - 2.0 * p3.x;
    let vy = 3.0 * p2.y - p0.y - 2.0 * p3.y;
    let d = (ux * ux).max(vx * vx) + (uy * uy).max(vy * vy);
    !(d > 16.0 * tolerance * tolerance)
}
