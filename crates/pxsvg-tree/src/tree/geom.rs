// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use svgtypes::{Align, AspectRatio};

pub use tiny_skia_path::{NonZeroRect, Point, Rect, Size, Transform};

/// Returns `true` for a finite, strictly positive length.
pub(crate) fn is_valid_length(n: f32) -> bool {
    n > 0.0 && n.is_finite()
}

/// A `viewBox` together with its `preserveAspectRatio`.
#[derive(Clone, Copy, Debug)]
pub struct ViewBox {
    /// The visible region of the user space.
    pub rect: NonZeroRect,
    /// How `rect` is fitted into a viewport.
    pub aspect: AspectRatio,
}

impl ViewBox {
    /// Returns a transform that fits `rect` into a viewport of `size`
    /// placed at the origin.
    pub fn to_transform(&self, size: Size) -> Transform {
        let rect = self.rect;
        let mut sx = size.width() / rect.width();
        let mut sy = size.height() / rect.height();
        if self.aspect.align != Align::None {
            let s = if self.aspect.slice {
                sx.max(sy)
            } else {
                sx.min(sy)
            };
            sx = s;
            sy = s;
        }

        // The part of the viewport left uncovered, distributed by alignment.
        let (ax, ay) = alignment(self.aspect.align);
        let tx = (size.width() - rect.width() * sx) * ax - rect.x() * sx;
        let ty = (size.height() - rect.height() * sy) * ay - rect.y() * sy;
        Transform::from_row(sx, 0.0, 0.0, sy, tx, ty)
    }
}

fn alignment(align: Align) -> (f32, f32) {
    use Align::*;

    let x = match align {
        None | XMinYMin | XMinYMid | XMinYMax => 0.0,
        XMidYMin | XMidYMid | XMidYMax => 0.5,
        XMaxYMin | XMaxYMid | XMaxYMax => 1.0,
    };
    let y = match align {
        None | XMinYMin | XMidYMin | XMaxYMin => 0.0,
        XMinYMid | XMidYMid | XMaxYMid => 0.5,
        XMinYMax | XMidYMax | XMaxYMax => 1.0,
    };

    (x, y)
}

/// Accumulates points and rectangles into a bounding rectangle.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Bounds {
    min: Point,
    max: Point,
}

impl Default for Bounds {
    fn default() -> Self {
        Bounds {
            min: Point::from_xy(f32::MAX, f32::MAX),
            max: Point::from_xy(f32::MIN, f32::MIN),
        }
    }
}

impl Bounds {
    pub fn add_point(&mut self, p: Point) {
        self.min = Point::from_xy(self.min.x.min(p.x), self.min.y.min(p.y));
        self.max = Point::from_xy(self.max.x.max(p.x), self.max.y.max(p.y));
    }

    pub fn add_rect(&mut self, r: Rect) {
        self.add_point(Point::from_xy(r.left(), r.top()));
        self.add_point(Point::from_xy(r.right(), r.bottom()));
    }

    /// `None` when nothing was added.
    pub fn to_rect(self) -> Option<Rect> {
        Rect::from_ltrb(self.min.x, self.min.y, self.max.x, self.max.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_box_meet() {
        let vb = ViewBox {
            rect: NonZeroRect::from_xywh(0.0, 0.0, 10.0, 20.0).unwrap(),
            aspect: AspectRatio::default(),
        };

        let ts = vb.to_transform(Size::from_wh(100.0, 100.0).unwrap());
        assert_eq!(ts, Transform::from_row(5.0, 0.0, 0.0, 5.0, 25.0, 0.0));
    }

    #[test]
    fn view_box_slice_with_offset() {
        let vb = ViewBox {
            rect: NonZeroRect::from_xywh(10.0, 10.0, 10.0, 20.0).unwrap(),
            aspect: AspectRatio {
                defer: false,
                align: Align::XMaxYMax,
                slice: true,
            },
        };

        let ts = vb.to_transform(Size::from_wh(100.0, 100.0).unwrap());
        assert_eq!(ts, Transform::from_row(10.0, 0.0, 0.0, 10.0, -100.0, -200.0));
    }

    #[test]
    fn bounds_accumulate() {
        let mut bounds = Bounds::default();
        assert!(bounds.to_rect().is_none());

        bounds.add_point(Point::from_xy(1.0, 2.0));
        bounds.add_point(Point::from_xy(-3.0, 5.0));
        assert_eq!(bounds.to_rect(), Rect::from_ltrb(-3.0, 2.0, 1.0, 5.0));
    }
}
