// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use pxsvg_tree::{Point, Rect};

/// An integer rectangle in device pixels.
///
/// Width and height are guarantee to be > 0.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct IntRect {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
}

impl IntRect {
    /// Creates a new `IntRect` from values.
    #[inline]
    pub fn from_xywh(x: i32, y: i32, width: u32, height: u32) -> Option<Self> {
        if width > 0 && height > 0 {
            Some(IntRect {
                x,
                y,
                width,
                height,
            })
        } else {
            None
        }
    }

    /// Creates a new `IntRect` from left, top, right and bottom edges.
    #[inline]
    pub fn from_ltrb(left: i32, top: i32, right: i32, bottom: i32) -> Option<Self> {
        let width = u32::try_from(right.checked_sub(left)?).ok()?;
        let height = u32::try_from(bottom.checked_sub(top)?).ok()?;
        Self::from_xywh(left, top, width, height)
    }

    /// Returns the smallest integer rect that contains `rect`.
    pub fn round_out(rect: Rect) -> Option<Self> {
        // Values outside of the `i32` range are irrelevant for rendering anyway.
        const LIMIT: f32 = (1 << 24) as f32;
        let left = rect.left().floor().max(-LIMIT) as i32;
        let top = rect.top().floor().max(-LIMIT) as i32;
        let right = rect.right().ceil().min(LIMIT) as i32;
        let bottom = rect.bottom().ceil().min(LIMIT) as i32;
        Self::from_ltrb(left, top, right, bottom)
    }

    #[inline]
    pub fn x(&self) -> i32 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.y
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
    pub fn left(&self) -> i32 {
        self.x
    }

    #[inline]
    pub fn top(&self) -> i32 {
        self.y
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    /// Checks that the rect contains the pixel at the specified position.
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left() && x < self.right() && y >= self.top() && y < self.bottom()
    }

    /// Returns an intersection of two rects.
    ///
    /// `None` when rects do not overlap.
    pub fn intersect(&self, other: IntRect) -> Option<Self> {
        Self::from_ltrb(
            self.left().max(other.left()),
            self.top().max(other.top()),
            self.right().min(other.right()),
            self.bottom().min(other.bottom()),
        )
    }
}

impl std::fmt::Debug for IntRect {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("IntRect")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Calculates the bounding rect of the points.
///
/// Returns `None` for an empty list or non-finite coordinates.
pub fn points_bounds<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Rect> {
    let mut left = f32::MAX;
    let mut top = f32::MAX;
    let mut right = f32::MIN;
    let mut bottom = f32::MIN;
    for p in points {
        left = left.min(p.x);
        top = top.min(p.y);
        right = right.max(p.x);
        bottom = bottom.max(p.y);
    }

    Rect::from_ltrb(left, top, right, bottom)
}
