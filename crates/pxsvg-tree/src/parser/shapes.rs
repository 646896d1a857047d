// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Basic shapes and `path` data into [`PathData`].

use svgtypes::{Length, PathSegment as Seg};

use super::converter::Context;
use super::svgtree::{AId, EId, SvgNode};
use crate::tree::is_valid_length;
use crate::{PathBuilder, PathData, Rect, Units};

/// `None` when the element has nothing to draw.
pub(crate) fn convert(node: SvgNode, ctx: &Context) -> Option<PathData> {
    let data = match node.tag_name()? {
        EId::Rect => rect(node, ctx),
        EId::Circle => circle(node, ctx),
        EId::Ellipse => ellipse(node, ctx),
        EId::Line => line(node, ctx),
        EId::Polyline => polyline(node, false),
        EId::Polygon => polyline(node, true),
        EId::Path => parse_path(node.attribute(AId::D)?),
        _ => return None,
    };

    if data.is_none() {
        log::warn!("'{}' has no drawable geometry. Skipped.", node.element_id());
    }
    data
}

/// Tracks the state needed to resolve relative and smooth segments.
struct Pen {
    builder: PathBuilder,
    current: (f32, f32),
    start: (f32, f32),
    /// The last control point, if the last segment was a curve of that kind.
    cubic_ctrl: Option<(f32, f32)>,
    quad_ctrl: Option<(f32, f32)>,
}

impl Pen {
    fn abs(&self, abs: bool, x: f64, y: f64) -> (f32, f32) {
        if abs {
            (x as f32, y as f32)
        } else {
            (self.current.0 + x as f32, self.current.1 + y as f32)
        }
    }

    /// The reflection of `ctrl` around the current point.
    fn reflect(&self, ctrl: Option<(f32, f32)>) -> (f32, f32) {
        let (cx, cy) = self.current;
        ctrl.map_or((cx, cy), |(px, py)| (2.0 * cx - px, 2.0 * cy - py))
    }

    fn push(&mut self, seg: Seg) {
        let mut cubic_ctrl = None;
        let mut quad_ctrl = None;

        let end = match seg {
            Seg::MoveTo { abs, x, y } => {
                let p = self.abs(abs, x, y);
                self.builder.move_to(p.0, p.1);
                self.start = p;
                p
            }
            Seg::LineTo { abs, x, y } => {
                let p = self.abs(abs, x, y);
                self.builder.line_to(p.0, p.1);
                p
            }
            Seg::HorizontalLineTo { abs, x } => {
                let x = if abs { x as f32 } else { self.current.0 + x as f32 };
                self.builder.line_to(x, self.current.1);
                (x, self.current.1)
            }
            Seg::VerticalLineTo { abs, y } => {
                let y = if abs { y as f32 } else { self.current.1 + y as f32 };
                self.builder.line_to(self.current.0, y);
                (self.current.0, y)
            }
            Seg::CurveTo { abs, x1, y1, x2, y2, x, y } => {
                let c1 = self.abs(abs, x1, y1);
                self.cubic(c1, self.abs(abs, x2, y2), self.abs(abs, x, y), &mut cubic_ctrl)
            }
            Seg::SmoothCurveTo { abs, x2, y2, x, y } => {
                let c1 = self.reflect(self.cubic_ctrl);
                self.cubic(c1, self.abs(abs, x2, y2), self.abs(abs, x, y), &mut cubic_ctrl)
            }
            Seg::Quadratic { abs, x1, y1, x, y } => {
                let c = self.abs(abs, x1, y1);
                self.quad(c, self.abs(abs, x, y), &mut quad_ctrl)
            }
            Seg::SmoothQuadratic { abs, x, y } => {
                let c = self.reflect(self.quad_ctrl);
                self.quad(c, self.abs(abs, x, y), &mut quad_ctrl)
            }
            Seg::EllipticalArc { abs, rx, ry, x_axis_rotation, large_arc, sweep, x, y } => {
                let p = self.abs(abs, x, y);
                self.builder.arc_to(
                    rx as f32,
                    ry as f32,
                    x_axis_rotation as f32,
                    large_arc,
                    sweep,
                    p.0,
                    p.1,
                );
                p
            }
            Seg::ClosePath { .. } => {
                self.builder.close();
                self.start
            }
        };

        self.current = end;
        self.cubic_ctrl = cubic_ctrl;
        self.quad_ctrl = quad_ctrl;
    }

    fn cubic(
        &mut self,
        c1: (f32, f32),
        c2: (f32, f32),
        p: (f32, f32),
        ctrl: &mut Option<(f32, f32)>,
    ) -> (f32, f32) {
        self.builder.cubic_to(c1.0, c1.1, c2.0, c2.1, p.0, p.1);
        *ctrl = Some(c2);
        p
    }

    fn quad(&mut self, c: (f32, f32), p: (f32, f32), ctrl: &mut Option<(f32, f32)>) -> (f32, f32) {
        self.builder.quad_to(c.0, c.1, p.0, p.1);
        *ctrl = Some(c);
        p
    }
}

/// Parses `d` into absolute segments. Arcs are kept as arcs.
///
/// An error ends the path, keeping what came before it.
fn parse_path(text: &str) -> Option<PathData> {
    let mut pen = Pen {
        builder: PathBuilder::new(),
        current: (0.0, 0.0),
        start: (0.0, 0.0),
        cubic_ctrl: None,
        quad_ctrl: None,
    };

    for seg in svgtypes::PathParser::from(text) {
        let seg = match seg {
            Ok(seg) => seg,
            Err(e) => {
                log::warn!("Invalid path data: {}.", e);
                break;
            }
        };

        if pen.builder.is_empty() && !matches!(seg, Seg::MoveTo { .. }) {
            break;
        }

        pen.push(seg);
    }

    pen.builder.finish()
}

fn user(ctx: &Context, node: SvgNode, aid: AId) -> f32 {
    ctx.user_length(node, aid, Length::zero())
}

/// `rx` and `ry`, where a missing or negative one copies the other.
fn radii(node: SvgNode, ctx: &Context) -> (f32, f32) {
    let get = |aid| {
        node.attribute::<Length>(aid)
            .filter(|l| !l.number.is_sign_negative())
            .map(|l| ctx.convert(l, node, super::units::Axis::of(aid), Units::UserSpaceOnUse))
    };

    match (get(AId::Rx), get(AId::Ry)) {
        (Some(rx), Some(ry)) => (rx, ry),
        (Some(r), None) | (None, Some(r)) => (r, r),
        (None, None) => (0.0, 0.0),
    }
}

fn rect(node: SvgNode, ctx: &Context) -> Option<PathData> {
    let (w, h) = (user(ctx, node, AId::Width), user(ctx, node, AId::Height));
    if !is_valid_length(w) || !is_valid_length(h) {
        return None;
    }

    let (x, y) = (user(ctx, node, AId::X), user(ctx, node, AId::Y));
    let (rx, ry) = radii(node, ctx);
    let (rx, ry) = (rx.min(w / 2.0), ry.min(h / 2.0));
    if !is_valid_length(rx) || !is_valid_length(ry) {
        return PathData::from_rect(Rect::from_xywh(x, y, w, h)?);
    }

    let mut b = PathBuilder::new();
    b.move_to(x + rx, y);
    b.line_to(x + w - rx, y);
    b.arc_to(rx, ry, 0.0, false, true, x + w, y + ry);
    b.line_to(x + w, y + h - ry);
    b.arc_to(rx, ry, 0.0, false, true, x + w - rx, y + h);
    b.line_to(x + rx, y + h);
    b.arc_to(rx, ry, 0.0, false, true, x, y + h - ry);
    b.line_to(x, y + ry);
    b.arc_to(rx, ry, 0.0, false, true, x + rx, y);
    b.close();
    b.finish()
}

fn circle(node: SvgNode, ctx: &Context) -> Option<PathData> {
    let r = ctx.user_length(node, AId::R, Length::zero());
    if !is_valid_length(r) {
        return None;
    }

    ellipse_path(user(ctx, node, AId::Cx), user(ctx, node, AId::Cy), r, r)
}

fn ellipse(node: SvgNode, ctx: &Context) -> Option<PathData> {
    let (rx, ry) = radii(node, ctx);
    if !is_valid_length(rx) || !is_valid_length(ry) {
        return None;
    }

    ellipse_path(user(ctx, node, AId::Cx), user(ctx, node, AId::Cy), rx, ry)
}

/// Four quarter arcs, clockwise from the rightmost point.
fn ellipse_path(cx: f32, cy: f32, rx: f32, ry: f32) -> Option<PathData> {
    let mut b = PathBuilder::new();
    b.move_to(cx + rx, cy);
    for (x, y) in [(cx, cy + ry), (cx - rx, cy), (cx, cy - ry), (cx + rx, cy)] {
        b.arc_to(rx, ry, 0.0, false, true, x, y);
    }
    b.close();
    b.finish()
}

fn line(node: SvgNode, ctx: &Context) -> Option<PathData> {
    let mut b = PathBuilder::new();
    b.move_to(user(ctx, node, AId::X1), user(ctx, node, AId::Y1));
    b.line_to(user(ctx, node, AId::X2), user(ctx, node, AId::Y2));
    b.finish()
}

/// `polyline` and, when `closed`, `polygon`. At least two points are required.
fn polyline(node: SvgNode, closed: bool) -> Option<PathData> {
    let points: &str = node.attribute(AId::Points)?;

    let mut b = PathBuilder::new();
    for (x, y) in svgtypes::PointsParser::from(points) {
        if b.is_empty() {
            b.move_to(x as f32, y as f32);
        } else {
            b.line_to(x as f32, y as f32);
        }
    }

    if b.len() < 2 {
        return None;
    }

    if closed {
        b.close();
    }
    b.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PathSegment, Point};

    #[test]
    fn relative_and_smooth_segments() {
        let path = parse_path("m 10 10 h 10 v 10 s 10 10 20 0 z").unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::MoveTo(Point::from_xy(10.0, 10.0)),
                PathSegment::LineTo(Point::from_xy(20.0, 10.0)),
                PathSegment::LineTo(Point::from_xy(20.0, 20.0)),
                PathSegment::CubicTo(
                    Point::from_xy(20.0, 20.0),
                    Point::from_xy(30.0, 30.0),
                    Point::from_xy(40.0, 20.0),
                ),
                PathSegment::Close,
            ]
        );
    }

    #[test]
    fn smooth_quad_reflects_only_quads() {
        let path = parse_path("M 0 0 Q 10 10 20 0 T 40 0 C 0 0 0 0 50 0 T 60 0").unwrap();
        let segs = path.segments();
        assert_eq!(
            segs[2],
            PathSegment::QuadTo(Point::from_xy(30.0, -10.0), Point::from_xy(40.0, 0.0))
        );
        // After a cubic, the control point is the current point.
        assert_eq!(
            segs[4],
            PathSegment::QuadTo(Point::from_xy(50.0, 0.0), Point::from_xy(60.0, 0.0))
        );
    }

    #[test]
    fn arcs_are_preserved() {
        let path = parse_path("M 0 0 A 10 10 0 0 1 20 0").unwrap();
        assert!(matches!(path.segments()[1], PathSegment::ArcTo { .. }));
    }

    #[test]
    fn parsing_stops_at_error() {
        let path = parse_path("M 0 0 L 10 10 L 20 x").unwrap();
        assert_eq!(path.segments().len(), 2);
    }

    #[test]
    fn path_must_start_with_move_to() {
        assert!(parse_path("L 10 10 L 20 20").is_none());
    }
}
