// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Stroke to fill conversion.
//!
//! A stroke outline is produced as a set of positively oriented polygons:
//! one quad per segment plus join and cap pieces. They overlap,
//! so the result must be filled using the nonzero rule.

use pxsvg_tree::{LineCap, LineJoin, Point, Stroke};

use crate::flatten::{lerp, Polyline};

/// Converts user-space polylines into stroke outline polygons.
///
/// `tolerance` is used for round joins and caps and has to be in user units.
pub fn stroke(polylines: &[Polyline], stroke: &Stroke, tolerance: f32) -> Vec<Polyline> {
    let dashed;
    let polylines = match stroke.dasharray() {
        Some(list) => {
            dashed = dash(polylines, list, stroke.dashoffset());
            &dashed
        }
        None => polylines,
    };

    let mut stroker = Stroker {
        hw: stroke.width().get() / 2.0,
        cap: stroke.linecap(),
        join: stroke.linejoin(),
        miterlimit: stroke.miterlimit().get(),
        tolerance,
        outline: Vec::new(),
    };

    for polyline in polylines {
        stroker.stroke_polyline(polyline);
    }

    stroker.outline
}

/// Splits polylines into dashes.
///
/// The pattern restarts at each subpath.
pub fn dash(polylines: &[Polyline], list: &[f32], offset: f32) -> Vec<Polyline> {
    let total: f32 = list.iter().sum();
    if !(total > 0.0 && total.is_finite()) || list.iter().any(|n| *n < 0.0) {
        return polylines.to_vec();
    }

    let mut dashes = Vec::new();
    for polyline in polylines {
        let first = match polyline.points.first() {
            Some(p) => *p,
            None => continue,
        };

        let mut idx = 0;
        let mut remaining = list[0];
        let mut on = true;

        let mut skip = offset % total;
        if skip < 0.0 {
            skip += total;
        }
        while skip > 0.0 {
            if skip >= remaining {
                skip -= remaining;
                idx = (idx + 1) % list.len();
                remaining = list[idx];
                on = !on;
            } else {
                remaining -= skip;
                skip = 0.0;
            }
        }

        let mut current = Vec::new();
        if on {
            current.push(first);
        }

        let closing = if polyline.closed && polyline.points.len() > 1 {
            Some((*polyline.points.last().unwrap_or(&first), first))
        } else {
            None
        };

        let edges = polyline
            .points
            .windows(2)
            .map(|w| (w[0], w[1]))
            .chain(closing);
        for (a, b) in edges {
            let len = distance(a, b);
            let mut pos = 0.0;
            while len - pos > remaining {
                pos += remaining;
                let p = lerp(a, b, pos / len);
                if on {
                    current.push(p);
                    dashes.push(Polyline {
                        points: std::mem::take(&mut current),
                        closed: false,
                    });
                } else {
                    current.clear();
                    current.push(p);
                }

                on = !on;
                idx = (idx + 1) % list.len();
                remaining = list[idx];
            }

            remaining -= len - pos;
            if on {
                current.push(b);
            }
        }

        if on && current.len() > 1 {
            dashes.push(Polyline {
                points: current,
                closed: false,
            });
        }
    }

    dashes
}

struct Stroker {
    hw: f32,
    cap: LineCap,
    join: LineJoin,
    miterlimit: f32,
    tolerance: f32,
    outline: Vec<Polyline>,
}

impl Stroker {
    fn stroke_polyline(&mut self, polyline: &Polyline) {
        let mut points = polyline.points.clone();
        points.dedup();
        if polyline.closed && points.len() > 1 && points.first() == points.last() {
            points.pop();
        }

        let n = points.len();
        if n == 0 {
            return;
        }

        if n == 1 {
            // A zero-length subpath is painted only by round and square caps.
            let p = points[0];
            match self.cap {
                LineCap::Butt => {}
                LineCap::Round => self.circle(p),
                LineCap::Square => self.square_cap(p, Point::from_xy(1.0, 0.0)),
            }
            return;
        }

        for w in points.windows(2) {
            self.segment(w[0], w[1]);
        }

        if polyline.closed {
            self.segment(points[n - 1], points[0]);
            for i in 0..n {
                self.join(points[(i + n - 1) % n], points[i], points[(i + 1) % n]);
            }
        } else {
            for i in 1..n - 1 {
                self.join(points[i - 1], points[i], points[i + 1]);
            }

            self.cap(points[0], direction(points[1], points[0]));
            self.cap(points[n - 1], direction(points[n - 2], points[n - 1]));
        }
    }

    fn segment(&mut self, a: Point, b: Point) {
        let n = normal(direction(a, b), self.hw);
        self.push(vec![add(a, n), add(b, n), sub(b, n), sub(a, n)]);
    }

    fn join(&mut self, prev: Point, cur: Point, next: Point) {
        let d0 = direction(prev, cur);
        let d1 = direction(cur, next);
        let cross = d0.x * d1.y - d0.y * d1.x;
        let dot = d0.x * d1.x + d0.y * d1.y;
        if cross.abs() < 1e-6 && dot > 0.0 {
            // Collinear segments.
            return;
        }

        if self.join == LineJoin::Round {
            self.circle(cur);
            return;
        }

        let sign = if cross > 0.0 { -1.0 } else { 1.0 };
        let o0 = normal(d0, self.hw * sign);
        let o1 = normal(d1, self.hw * sign);
        let p0 = add(cur, o0);
        let p1 = add(cur, o1);

        if self.join == LineJoin::Bevel {
            self.push(vec![cur, p0, p1]);
            return;
        }

        // The ratio of the miter length to the stroke width is 1 / sin(theta / 2).
        let half_sin = ((1.0 + dot) / 2.0).max(0.0).sqrt();
        let bisector = direction(Point::zero(), add(o0, o1));
        if half_sin > 1e-6 && 1.0 / half_sin <= self.miterlimit {
            let miter = add(cur, scale(bisector, self.hw / half_sin));
            self.push(vec![cur, p0, miter, p1]);
            return;
        }

        if self.join == LineJoin::MiterClip {
            let clip = self.miterlimit * self.hw;
            let along = d0.x * bisector.x + d0.y * bisector.y;
            if along > 1e-6 {
                let t = (clip - self.hw * half_sin) / along;
                let c0 = add(p0, scale(d0, t));
                let c1 = sub(p1, scale(d1, t));
                self.push(vec![cur, p0, c0, c1, p1]);
                return;
            }
        }

        self.push(vec![cur, p0, p1]);
    }

    fn cap(&mut self, p: Point, dir: Point) {
        match self.cap {
            LineCap::Butt => {}
            LineCap::Round => self.circle(p),
            LineCap::Square => self.square_cap(p, dir),
        }
    }

    fn square_cap(&mut self, p: Point, dir: Point) {
        let n = normal(dir, self.hw);
        let e = scale(dir, self.hw);
        self.push(vec![
            add(p, n),
            add(add(p, n), e),
            add(sub(p, n), e),
            sub(p, n),
        ]);
    }

    fn circle(&mut self, c: Point) {
        let count = circle_segments(self.hw, self.tolerance);
        let step = std::f32::consts::TAU / count as f32;
        let points = (0..count)
            .map(|i| {
                let (sin, cos) = (i as f32 * step).sin_cos();
                Point::from_xy(c.x + cos * self.hw, c.y + sin * self.hw)
            })
            .collect();
        self.push(points);
    }

    fn push(&mut self, points: Vec<Point>) {
        let mut polygon = Polyline {
            points,
            closed: true,
        };

        let area = polygon.signed_area();
        if area == 0.0 || !area.is_finite() {
            return;
        }

        if area < 0.0 {
            polygon.points.reverse();
        }

        self.outline.push(polygon);
    }
}

fn circle_segments(radius: f32, tolerance: f32) -> usize {
    if radius <= tolerance {
        return 8;
    }

    let step = 2.0 * (1.0 - tolerance / radius).acos();
    let count = (std::f32::consts::TAU / step).ceil();
    if count.is_finite() {
        (count as usize).clamp(8, 1024)
    } else {
        1024
    }
}

#[inline]
fn add(a: Point, b: Point) -> Point {
    Point::from_xy(a.x + b.x, a.y + b.y)
}

#[inline]
fn sub(a: Point, b: Point) -> Point {
    Point::from_xy(a.x - b.x, a.y - b.y)
}

#[inline]
fn scale(p: Point, s: f32) -> Point {
    Point::from_xy(p.x * s, p.y * s)
}

#[inline]
fn distance(a: Point, b: Point) -> f32 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Returns a unit vector from `a` to `b`.
fn direction(a: Point, b: Point) -> Point {
    let len = distance(a, b);
    if len > 0.0 {
        Point::from_xy((b.x - a.x) / len, (b.y - a.y) / len)
    } else {
        Point::zero()
    }
}

#[inline]
fn normal(dir: Point, len: f32) -> Point {
    Point::from_xy(-dir.y * len, dir.x * len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::IntRect;
    use crate::raster::{self, Coverage};
    use pxsvg_tree::{FillRule, Options};

    fn stroke_of(svg_attrs: &str) -> Stroke {
        let text = format!(
            "<svg xmlns='http://www.w3.org/2000/svg' width='20' height='20'>\
             <path d='M 0 0 L 1 1' stroke='black' {}/></svg>",
            svg_attrs
        );
        let doc = pxsvg_tree::Document::from_str(&text, &Options::default()).unwrap();
        match &doc.root().children()[0] {
            pxsvg_tree::Node::Path(p) => p.stroke().unwrap().clone(),
            _ => unreachable!(),
        }
    }

    fn line(points: &[(f32, f32)], closed: bool) -> Polyline {
        Polyline {
            points: points.iter().map(|(x, y)| Point::from_xy(*x, *y)).collect(),
            closed,
        }
    }

    fn fill(polygons: &[Polyline]) -> Coverage {
        let bounds = IntRect::from_xywh(0, 0, 20, 20).unwrap();
        raster::rasterize(polygons, FillRule::NonZero, true, bounds).unwrap()
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn butt_cap() {
        let s = stroke_of("stroke-width='2'");
        let c = fill(&stroke(&[line(&[(2.0, 5.0), (10.0, 5.0)], false)], &s, 0.1));
        assert!(approx(c.get(2, 4), 1.0));
        assert!(approx(c.get(9, 5), 1.0));
        assert!(approx(c.get(1, 4), 0.0));
        assert!(approx(c.get(10, 4), 0.0));
        assert!(approx(c.get(5, 3), 0.0));
        assert!(approx(c.get(5, 6), 0.0));
    }

    #[test]
    fn square_cap() {
        let s = stroke_of("stroke-width='2' stroke-linecap='square'");
        let c = fill(&stroke(&[line(&[(2.0, 5.0), (10.0, 5.0)], false)], &s, 0.1));
        assert!(approx(c.get(1, 4), 1.0));
        assert!(approx(c.get(10, 5), 1.0));
        assert!(approx(c.get(11, 5), 0.0));
    }

    #[test]
    fn round_cap() {
        let s = stroke_of("stroke-width='4' stroke-linecap='round'");
        let c = fill(&stroke(&[line(&[(5.0, 10.0), (12.0, 10.0)], false)], &s, 0.1));
        let cap = c.get(3, 9);
        assert!(cap > 0.5 && cap < 1.0, "{}", cap);
        assert!(c.get(2, 9) < 0.01);
    }

    #[test]
    fn zero_length_round_cap() {
        let s = stroke_of("stroke-width='4' stroke-linecap='round'");
        let c = fill(&stroke(&[line(&[(10.0, 10.0)], false)], &s, 0.1));
        assert!(approx(c.get(9, 9), 1.0));

        let s = stroke_of("stroke-width='4'");
        assert!(stroke(&[line(&[(10.0, 10.0)], false)], &s, 0.1).is_empty());
    }

    #[test]
    fn miter_and_bevel_joins() {
        let corner = [line(&[(2.0, 4.0), (10.0, 4.0), (10.0, 12.0)], false)];

        let s = stroke_of("stroke-width='4'");
        let c = fill(&stroke(&corner, &s, 0.1));
        assert!(approx(c.get(10, 2), 1.0));
        assert!(approx(c.get(11, 2), 1.0));

        let s = stroke_of("stroke-width='4' stroke-linejoin='bevel'");
        let c = fill(&stroke(&corner, &s, 0.1));
        assert!(approx(c.get(10, 2), 0.5));
        assert!(approx(c.get(11, 2), 0.0));
    }

    #[test]
    fn miter_limit() {
        // A sharp angle exceeds the default miter limit of 4.
        let spike = [line(&[(2.0, 2.0), (18.0, 4.0), (2.0, 6.0)], false)];
        let s = stroke_of("stroke-width='2'");
        let miter_clip = stroke_of("stroke-width='2' stroke-linejoin='miter-clip'");
        let beveled = fill(&stroke(&spike, &s, 0.1));
        let clipped = fill(&stroke(&spike, &miter_clip, 0.1));
        assert!(approx(beveled.get(19, 4), 0.0));
        assert!(clipped.get(19, 4) > 0.0);
    }

    #[test]
    fn closed_polyline_has_no_caps() {
        let s = stroke_of("stroke-width='2' stroke-linecap='square'");
        let square = [line(&[(4.0, 4.0), (12.0, 4.0), (12.0, 12.0), (4.0, 12.0)], true)];
        let c = fill(&stroke(&square, &s, 0.1));
        assert!(approx(c.get(8, 3), 1.0));
        assert!(approx(c.get(8, 8), 0.0));
        assert!(approx(c.get(2, 4), 0.0));
    }

    #[test]
    fn dashes() {
        let l = [line(&[(0.0, 0.0), (10.0, 0.0)], false)];
        let dashes = dash(&l, &[2.0, 2.0], 0.0);
        assert_eq!(dashes.len(), 3);
        assert_eq!(dashes[1].points, vec![Point::from_xy(4.0, 0.0), Point::from_xy(6.0, 0.0)]);

        // A negative offset starts the pattern in a gap.
        let dashes = dash(&l, &[2.0, 2.0], -1.0);
        assert_eq!(dashes[0].points, vec![Point::from_xy(1.0, 0.0), Point::from_xy(3.0, 0.0)]);
        assert_eq!(dashes[1].points, vec![Point::from_xy(5.0, 0.0), Point::from_xy(7.0, 0.0)]);
    }

    #[test]
    fn dashes_span_vertices() {
        let l = [line(&[(0.0, 0.0), (3.0, 0.0), (3.0, 3.0)], false)];
        let dashes = dash(&l, &[4.0, 1.0], 0.0);
        assert_eq!(
            dashes[0].points,
            vec![
                Point::from_xy(0.0, 0.0),
                Point::from_xy(3.0, 0.0),
                Point::from_xy(3.0, 1.0)
            ]
        );
    }

    #[test]
    fn invalid_dash_array() {
        let l = [line(&[(0.0, 0.0), (10.0, 0.0)], false)];
        assert_eq!(dash(&l, &[0.0, 0.0], 0.0).len(), 1);
        assert_eq!(dash(&l, &[-1.0, 2.0], 0.0).len(), 1);
    }
}
