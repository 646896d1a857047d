// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::{
    Color, Group, NonZeroRect, NormalizedF32, Opacity, PositiveF32, Transform, Units, ViewBox,
};

/// The `spreadMethod` attribute.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum SpreadMethod {
    #[default]
    Pad,
    Reflect,
    Repeat,
}

/// A gradient stop.
#[derive(Clone, Copy, Debug)]
pub struct Stop {
    pub(crate) offset: NormalizedF32,
    pub(crate) color: Color,
    pub(crate) opacity: Opacity,
}

getters!(Stop {
    /// Position along the gradient vector.
    ///
    /// Offsets inside a gradient are strictly increasing.
    copy offset: NormalizedF32;
    /// `stop-color`.
    copy color: Color;
    /// `stop-opacity` combined with the alpha of `stop-color`.
    copy opacity: Opacity;
});

/// Attributes shared by linear and radial gradients.
#[derive(Clone, Debug)]
pub struct BaseGradient {
    pub(crate) id: String,
    pub(crate) units: Units,
    pub(crate) transform: Transform,
    pub(crate) spread_method: SpreadMethod,
    pub(crate) stops: Vec<Stop>,
}

getters!(BaseGradient {
    /// The element ID.
    borrow id: str;
    /// `gradientUnits`.
    copy units: Units;
    /// `gradientTransform`.
    copy transform: Transform;
    /// `spreadMethod`.
    copy spread_method: SpreadMethod;
    /// At least two stops.
    borrow stops: [Stop];
});

/// A `linearGradient` with all template references applied.
#[derive(Clone, Debug)]
pub struct LinearGradient {
    pub(crate) base: BaseGradient,
    pub(crate) x1: f32,
    pub(crate) y1: f32,
    pub(crate) x2: f32,
    pub(crate) y2: f32,
}

getters!(LinearGradient {
    /// Start of the gradient vector.
    copy x1: f32;
    /// Start of the gradient vector.
    copy y1: f32;
    /// End of the gradient vector.
    copy x2: f32;
    /// End of the gradient vector.
    copy y2: f32;
});

impl std::ops::Deref for LinearGradient {
    type Target = BaseGradient;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

/// A `radialGradient` with all template references applied.
#[derive(Clone, Debug)]
pub struct RadialGradient {
    pub(crate) base: BaseGradient,
    pub(crate) cx: f32,
    pub(crate) cy: f32,
    pub(crate) r: PositiveF32,
    pub(crate) fx: f32,
    pub(crate) fy: f32,
}

getters!(RadialGradient {
    /// Center of the end circle.
    copy cx: f32;
    /// Center of the end circle.
    copy cy: f32;
    /// Radius of the end circle.
    copy r: PositiveF32;
    /// Focal point.
    copy fx: f32;
    /// Focal point.
    copy fy: f32;
});

impl std::ops::Deref for RadialGradient {
    type Target = BaseGradient;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

/// A `pattern` with all template references applied.
#[derive(Clone, Debug)]
pub struct Pattern {
    pub(crate) id: String,
    pub(crate) units: Units,
    pub(crate) content_units: Units,
    pub(crate) transform: Transform,
    pub(crate) rect: NonZeroRect,
    pub(crate) view_box: Option<ViewBox>,
    pub(crate) root: Group,
}

getters!(Pattern {
    /// The element ID.
    borrow id: str;
    /// `patternUnits`. Applies to `rect`.
    copy units: Units;
    /// `patternContentUnits`. Ignored when `view_box` is set.
    copy content_units: Units;
    /// `patternTransform`.
    copy transform: Transform;
    /// The tile.
    copy rect: NonZeroRect;
    /// Maps the content onto the tile.
    copy view_box: Option<ViewBox>;
    /// Tile content. May reference this very pattern.
    borrow root: Group;
});

/// An entry of the paint server table.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub enum PaintServer {
    /// A `solidColor` element.
    SolidColor(Color, Opacity),
    LinearGradient(LinearGradient),
    RadialGradient(RadialGradient),
    Pattern(Pattern),
}
