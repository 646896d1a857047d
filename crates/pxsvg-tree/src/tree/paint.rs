// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::{NonZeroPositiveF32, Opacity, PaintServerId};

/// An opaque sRGB color. Alpha is kept separately as an [`Opacity`].
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    /// Creates a color from components.
    #[inline]
    pub fn new_rgb(red: u8, green: u8, blue: u8) -> Color {
        Color { red, green, blue }
    }

    /// `#000000`
    #[inline]
    pub fn black() -> Color {
        Color::new_rgb(0, 0, 0)
    }

    /// `#ffffff`
    #[inline]
    pub fn white() -> Color {
        Color::new_rgb(255, 255, 255)
    }
}

/// What a fill or a stroke is painted with.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Paint {
    /// A plain color.
    Color(Color),
    /// A gradient, a pattern or a solid color server.
    Server(PaintServerId),
}

/// The `fill-rule` and `clip-rule` properties.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

/// A resolved fill.
#[derive(Clone, Debug)]
pub struct Fill {
    pub(crate) paint: Paint,
    pub(crate) opacity: Opacity,
    pub(crate) rule: FillRule,
}

getters!(Fill {
    /// Fill paint.
    borrow paint: Paint;
    /// `fill-opacity` combined with the alpha of the fill color.
    copy opacity: Opacity;
    /// `fill-rule`, or `clip-rule` inside a clip path.
    copy rule: FillRule;
});

impl Fill {
    /// An opaque black fill, as used by clip path children.
    pub fn black(rule: FillRule) -> Self {
        Fill {
            paint: Paint::Color(Color::black()),
            opacity: Opacity::ONE,
            rule,
        }
    }
}

impl Default for Fill {
    fn default() -> Self {
        Fill::black(FillRule::default())
    }
}

/// The `stroke-linecap` property.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// The `stroke-linejoin` property.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum LineJoin {
    #[default]
    Miter,
    MiterClip,
    Round,
    Bevel,
}

/// The `stroke-miterlimit` property. Never less than 1.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct StrokeMiterlimit(f32);

impl StrokeMiterlimit {
    /// Creates a limit, raising values below 1 to 1.
    #[inline]
    pub fn new(n: f32) -> Self {
        StrokeMiterlimit(n.max(1.0))
    }

    /// Returns the limit.
    #[inline]
    pub fn get(&self) -> f32 {
        self.0
    }
}

impl Default for StrokeMiterlimit {
    fn default() -> Self {
        StrokeMiterlimit(4.0)
    }
}

/// A resolved stroke.
#[derive(Clone, Debug)]
pub struct Stroke {
    pub(crate) paint: Paint,
    pub(crate) dasharray: Option<Vec<f32>>,
    pub(crate) dashoffset: f32,
    pub(crate) miterlimit: StrokeMiterlimit,
    pub(crate) opacity: Opacity,
    pub(crate) width: NonZeroPositiveF32,
    pub(crate) linecap: LineCap,
    pub(crate) linejoin: LineJoin,
}

getters!(Stroke {
    /// Stroke paint.
    borrow paint: Paint;
    /// Dash offset in user units.
    copy dashoffset: f32;
    /// Miter limit.
    copy miterlimit: StrokeMiterlimit;
    /// `stroke-opacity` combined with the alpha of the stroke color.
    copy opacity: Opacity;
    /// Stroke width in user units.
    copy width: NonZeroPositiveF32;
    /// Line cap.
    copy linecap: LineCap;
    /// Line join.
    copy linejoin: LineJoin;
});

impl Stroke {
    /// Dash lengths in user units.
    ///
    /// Always has an even number of positive-sum entries.
    pub fn dasharray(&self) -> Option<&[f32]> {
        self.dasharray.as_deref()
    }
}

/// The `paint-order` property, reduced to fill and stroke.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum PaintOrder {
    /// The fill is drawn first.
    #[default]
    FillAndStroke,
    /// The stroke is drawn first.
    StrokeAndFill,
}
