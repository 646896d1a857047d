// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::VecDeque;

use kurbo::{ParamCurve, ParamCurveExtrema};

use super::Bounds;
use crate::{Point, Rect, Transform};

/// A path's absolute segment.
///
/// Unlike the SVG path syntax, all segments are absolute
/// and shorthand/smooth segments are already expanded.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    QuadTo(Point, Point),
    CubicTo(Point, Point, Point),
    /// An elliptical arc in the SVG endpoint parameterization.
    ///
    /// `x_axis_rotation` is in degrees.
    ArcTo {
        rx: f32,
        ry: f32,
        x_axis_rotation: f32,
        large_arc: bool,
        sweep: bool,
        x: f32,
        y: f32,
    },
    Close,
}

/// An SVG path data container.
///
/// Always has at least one drawing segment and a valid bounding box.
#[derive(Clone, Debug)]
pub struct PathData {
    segments: Vec<PathSegment>,
    bounds: Rect,
}

impl PathData {
    /// Creates a path from a rect.
    pub fn from_rect(rect: Rect) -> Option<Self> {
        let mut builder = PathBuilder::new();
        builder.push_rect(rect);
        builder.finish()
    }

    /// Returns a list of path segments as they were parsed.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns an iterator over segments with arcs converted into cubic curves.
    ///
    /// The iterator never yields [`PathSegment::ArcTo`].
    pub fn simplified(&self) -> SimplifiedSegments {
        SimplifiedSegments {
            iter: self.segments.iter(),
            pending: VecDeque::new(),
            start: Point::zero(),
            last: Point::zero(),
        }
    }

    /// Returns path's tight bounding box.
    ///
    /// Can have a zero width or height, like for horizontal lines.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Returns a transformed copy of the path.
    ///
    /// Arcs will be converted into curves.
    pub fn transform(&self, ts: Transform) -> Option<Self> {
        let map = |mut p: Point| {
            ts.map_point(&mut p);
            p
        };

        let mut builder = PathBuilder::new();
        for seg in self.simplified() {
            match seg {
                PathSegment::MoveTo(p) => builder.move_to_point(map(p)),
                PathSegment::LineTo(p) => builder.line_to_point(map(p)),
                PathSegment::QuadTo(p1, p) => builder.push(PathSegment::QuadTo(map(p1), map(p))),
                PathSegment::CubicTo(p1, p2, p) => {
                    builder.push(PathSegment::CubicTo(map(p1), map(p2), map(p)))
                }
                PathSegment::Close => builder.close(),
                PathSegment::ArcTo { .. } => {}
            }
        }

        builder.finish()
    }
}

/// An iterator over simplified path segments.
///
/// See [`PathData::simplified`].
#[allow(missing_debug_implementations)]
pub struct SimplifiedSegments<'a> {
    iter: std::slice::Iter<'a, PathSegment>,
    pending: VecDeque<PathSegment>,
    start: Point,
    last: Point,
}

impl Iterator for SimplifiedSegments<'_> {
    type Item = PathSegment;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(seg) = self.pending.pop_front() {
            return Some(seg);
        }

        let seg = *self.iter.next()?;
        match seg {
            PathSegment::MoveTo(p) => {
                self.start = p;
                self.last = p;
                Some(seg)
            }
            PathSegment::LineTo(p) | PathSegment::QuadTo(_, p) | PathSegment::CubicTo(_, _, p) => {
                self.last = p;
                Some(seg)
            }
            PathSegment::ArcTo {
                rx,
                ry,
                x_axis_rotation,
                large_arc,
                sweep,
                x,
                y,
            } => {
                let from = self.last;
                self.last = Point::from_xy(x, y);

                let svg_arc = kurbo::SvgArc {
                    from: kurbo::Point::new(from.x as f64, from.y as f64),
                    to: kurbo::Point::new(x as f64, y as f64),
                    radii: kurbo::Vec2::new(rx as f64, ry as f64),
                    x_rotation: (x_axis_rotation as f64).to_radians(),
                    large_arc,
                    sweep,
                };

                match kurbo::Arc::from_svg_arc(&svg_arc) {
                    Some(arc) => {
                        let pending = &mut self.pending;
                        arc.to_cubic_beziers(0.1, |p1, p2, p| {
                            pending.push_back(PathSegment::CubicTo(
                                Point::from_xy(p1.x as f32, p1.y as f32),
                                Point::from_xy(p2.x as f32, p2.y as f32),
                                Point::from_xy(p.x as f32, p.y as f32),
                            ));
                        });

                        // Degenerate arcs can produce no curves at all.
                        self.pending
                            .pop_front()
                            .or(Some(PathSegment::LineTo(self.last)))
                    }
                    None => Some(PathSegment::LineTo(self.last)),
                }
            }
            PathSegment::Close => {
                self.last = self.start;
                Some(seg)
            }
        }
    }
}

/// A [`PathData`] builder.
#[derive(Clone, Default, Debug)]
pub struct PathBuilder {
    segments: Vec<PathSegment>,
    start: Option<Point>,
    move_to_required: bool,
}

impl PathBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        PathBuilder {
            move_to_required: true,
            ..PathBuilder::default()
        }
    }

    /// Returns the amount of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Checks that the builder has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Starts a new subpath.
    pub fn move_to(&mut self, x: f32, y: f32) {
        self.move_to_point(Point::from_xy(x, y));
    }

    fn move_to_point(&mut self, p: Point) {
        // Consecutive MoveTo segments are collapsed into the last one.
        if let Some(PathSegment::MoveTo(_)) = self.segments.last() {
            self.segments.pop();
        }

        self.segments.push(PathSegment::MoveTo(p));
        self.start = Some(p);
        self.move_to_required = false;
    }

    /// Adds a line segment.
    pub fn line_to(&mut self, x: f32, y: f32) {
        self.line_to_point(Point::from_xy(x, y));
    }

    fn line_to_point(&mut self, p: Point) {
        self.push(PathSegment::LineTo(p));
    }

    /// Adds a quadratic curve segment.
    pub fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.push(PathSegment::QuadTo(
            Point::from_xy(x1, y1),
            Point::from_xy(x, y),
        ));
    }

    /// Adds a cubic curve segment.
    pub fn cubic_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.push(PathSegment::CubicTo(
            Point::from_xy(x1, y1),
            Point::from_xy(x2, y2),
            Point::from_xy(x, y),
        ));
    }

    /// Adds an elliptical arc segment.
    ///
    /// An arc with a zero radius is stored as a line.
    pub fn arc_to(
        &mut self,
        rx: f32,
        ry: f32,
        x_axis_rotation: f32,
        large_arc: bool,
        sweep: bool,
        x: f32,
        y: f32,
    ) {
        if rx == 0.0 || ry == 0.0 {
            self.line_to(x, y);
            return;
        }

        self.push(PathSegment::ArcTo {
            rx: rx.abs(),
            ry: ry.abs(),
            x_axis_rotation,
            large_arc,
            sweep,
            x,
            y,
        });
    }

    /// Closes the current subpath.
    pub fn close(&mut self) {
        match self.segments.last() {
            None | Some(PathSegment::Close) | Some(PathSegment::MoveTo(_)) => {}
            Some(_) => {
                self.segments.push(PathSegment::Close);
                self.move_to_required = true;
            }
        }
    }

    /// Adds a closed rect subpath.
    pub fn push_rect(&mut self, rect: Rect) {
        self.move_to(rect.left(), rect.top());
        self.line_to(rect.right(), rect.top());
        self.line_to(rect.right(), rect.bottom());
        self.line_to(rect.left(), rect.bottom());
        self.close();
    }

    fn push(&mut self, seg: PathSegment) {
        if self.move_to_required {
            // A segment after ClosePath starts at the previous subpath start.
            let start = self.start.unwrap_or_else(Point::zero);
            self.move_to_point(start);
        }

        self.segments.push(seg);
    }

    /// Finishes the path.
    ///
    /// Returns `None` when the path has no drawing segments
    /// or its bounding box cannot be calculated.
    pub fn finish(mut self) -> Option<PathData> {
        // Trailing MoveTo is meaningless.
        if let Some(PathSegment::MoveTo(_)) = self.segments.last() {
            self.segments.pop();
        }

        if self.segments.len() < 2 {
            return None;
        }

        let mut data = PathData {
            segments: self.segments,
            bounds: Rect::from_xywh(0.0, 0.0, 0.0, 0.0)?,
        };
        data.bounds = calc_bounds(&data)?;
        Some(data)
    }
}

fn calc_bounds(path: &PathData) -> Option<Rect> {
    let to_kurbo = |p: Point| kurbo::Point::new(p.x as f64, p.y as f64);

    let mut bounds = Bounds::default();
    let mut prev = Point::zero();
    for seg in path.simplified() {
        match seg {
            PathSegment::MoveTo(p) | PathSegment::LineTo(p) => {
                bounds.add_point(p);
                prev = p;
            }
            PathSegment::QuadTo(p1, p) => {
                let curve = kurbo::QuadBez::new(to_kurbo(prev), to_kurbo(p1), to_kurbo(p));
                add_curve(&mut bounds, &curve);
                prev = p;
            }
            PathSegment::CubicTo(p1, p2, p) => {
                let curve = kurbo::CubicBez::new(
                    to_kurbo(prev),
                    to_kurbo(p1),
                    to_kurbo(p2),
                    to_kurbo(p),
                );
                add_curve(&mut bounds, &curve);
                prev = p;
            }
            PathSegment::ArcTo { .. } | PathSegment::Close => {}
        }
    }

    bounds.to_rect()
}

// Curves are bounded by their end points and extrema, not control points.
fn add_curve<C: ParamCurve + ParamCurveExtrema>(bounds: &mut Bounds, curve: &C) {
    bounds.add_point(to_point(curve.start()));
    bounds.add_point(to_point(curve.end()));
    for t in curve.extrema() {
        bounds.add_point(to_point(curve.eval(t)));
    }
}

fn to_point(p: kurbo::Point) -> Point {
    Point::from_xy(p.x as f32, p.y as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implicit_move_to_after_close() {
        let mut builder = PathBuilder::new();
        builder.move_to(10.0, 10.0);
        builder.line_to(20.0, 10.0);
        builder.line_to(20.0, 20.0);
        builder.close();
        builder.line_to(0.0, 0.0);
        let path = builder.finish().unwrap();

        assert_eq!(
            path.segments()[4..],
            [
                PathSegment::MoveTo(Point::from_xy(10.0, 10.0)),
                PathSegment::LineTo(Point::from_xy(0.0, 0.0)),
            ]
        );
    }

    #[test]
    fn lone_move_to() {
        let mut builder = PathBuilder::new();
        builder.move_to(10.0, 10.0);
        assert!(builder.finish().is_none());
    }

    #[test]
    fn curve_bounds_are_tight() {
        let mut builder = PathBuilder::new();
        builder.move_to(0.0, 0.0);
        builder.quad_to(50.0, 100.0, 100.0, 0.0);
        let path = builder.finish().unwrap();

        let bounds = path.bounds();
        assert_eq!(bounds.left(), 0.0);
        assert_eq!(bounds.right(), 100.0);
        assert!((bounds.bottom() - 50.0).abs() < 0.001);
    }

    #[test]
    fn arc_is_simplified() {
        let mut builder = PathBuilder::new();
        builder.move_to(0.0, 0.0);
        builder.arc_to(10.0, 10.0, 0.0, false, true, 20.0, 0.0);
        let path = builder.finish().unwrap();

        assert!(path
            .simplified()
            .all(|seg| !matches!(seg, PathSegment::ArcTo { .. })));
        assert!((path.bounds().top() + 10.0).abs() < 0.01);
    }
}
