// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::str::FromStr;

use tiny_skia_path::Transform;

use super::{AId, SvgNode};
use crate::{
    FillRule, FontStyle, ImageRendering, LineCap, LineJoin, MaskType, Opacity, ShapeRendering,
    SpreadMethod, TextAnchor, Units, Visibility,
};

/// A type an attribute value can be parsed into.
pub(crate) trait AttrValue<'a>: Sized {
    /// `None` marks the value as invalid.
    fn parse(node: SvgNode<'a>, aid: AId, value: &'a str) -> Option<Self>;
}

macro_rules! keywords {
    ($($ty:ident { $($pat:pat => $variant:ident),+ $(,)? })+) => {
        $(impl<'a> AttrValue<'a> for $ty {
            fn parse(_: SvgNode<'a>, _: AId, value: &'a str) -> Option<Self> {
                match value {
                    $($pat => Some($ty::$variant),)+
                    _ => None,
                }
            }
        })+
    };
}

keywords! {
    Units {
        "userSpaceOnUse" => UserSpaceOnUse,
        "objectBoundingBox" => ObjectBoundingBox,
    }
    Visibility {
        "visible" => Visible,
        "hidden" => Hidden,
        "collapse" => Collapse,
    }
    SpreadMethod {
        "pad" => Pad,
        "reflect" => Reflect,
        "repeat" => Repeat,
    }
    ShapeRendering {
        "optimizeSpeed" => OptimizeSpeed,
        "crispEdges" => CrispEdges,
        "geometricPrecision" => GeometricPrecision,
    }
    ImageRendering {
        "optimizeQuality" => OptimizeQuality,
        "optimizeSpeed" => OptimizeSpeed,
    }
    LineCap {
        "butt" => Butt,
        "round" => Round,
        "square" => Square,
    }
    LineJoin {
        "miter" => Miter,
        "miter-clip" => MiterClip,
        "round" => Round,
        "bevel" => Bevel,
    }
    FillRule {
        "nonzero" => NonZero,
        "evenodd" => EvenOdd,
    }
    MaskType {
        "luminance" => Luminance,
        "alpha" => Alpha,
    }
    TextAnchor {
        "start" => Start,
        "middle" => Middle,
        "end" => End,
    }
    FontStyle {
        "normal" => Normal,
        "italic" => Italic,
        "oblique" => Oblique,
    }
}

macro_rules! from_str_values {
    ($($ty:ty),+) => {
        $(impl<'a> AttrValue<'a> for $ty {
            fn parse(_: SvgNode<'a>, _: AId, value: &'a str) -> Option<Self> {
                <$ty>::from_str(value).ok()
            }
        })+
    };
}

from_str_values!(
    svgtypes::Length,
    svgtypes::ViewBox,
    svgtypes::AspectRatio,
    svgtypes::PaintOrder,
    svgtypes::Color,
    svgtypes::TransformOrigin
);

impl<'a> AttrValue<'a> for &'a str {
    fn parse(_: SvgNode<'a>, _: AId, value: &'a str) -> Option<Self> {
        Some(value)
    }
}

impl<'a> AttrValue<'a> for f32 {
    fn parse(_: SvgNode<'a>, _: AId, value: &'a str) -> Option<Self> {
        svgtypes::Number::from_str(value).ok().map(|n| n.0 as f32)
    }
}

/// A number or a percentage, clamped to 0..=1.
impl<'a> AttrValue<'a> for Opacity {
    fn parse(_: SvgNode<'a>, _: AId, value: &'a str) -> Option<Self> {
        let length = svgtypes::Length::from_str(value).ok()?;
        let n = match length.unit {
            svgtypes::LengthUnit::None => length.number,
            svgtypes::LengthUnit::Percent => length.number / 100.0,
            _ => return None,
        };

        Some(Opacity::new_clamped(n as f32))
    }
}

/// Can be degenerate. Callers decide what a non-invertible transform means.
impl<'a> AttrValue<'a> for Transform {
    fn parse(_: SvgNode<'a>, _: AId, value: &'a str) -> Option<Self> {
        let ts = svgtypes::Transform::from_str(value).ok()?;
        let ts = Transform::from_row(
            ts.a as f32,
            ts.b as f32,
            ts.c as f32,
            ts.d as f32,
            ts.e as f32,
            ts.f as f32,
        );

        if ts.is_finite() {
            Some(ts)
        } else {
            None
        }
    }
}

impl<'a> AttrValue<'a> for Vec<f32> {
    fn parse(_: SvgNode<'a>, _: AId, value: &'a str) -> Option<Self> {
        svgtypes::NumberListParser::from(value)
            .map(|n| n.ok().map(|n| n as f32))
            .collect()
    }
}

impl<'a> AttrValue<'a> for Vec<svgtypes::Length> {
    fn parse(_: SvgNode<'a>, _: AId, value: &'a str) -> Option<Self> {
        svgtypes::LengthListParser::from(value)
            .map(Result::ok)
            .collect()
    }
}

/// A reference to another element: `#id` for `href`, `url(#id)` otherwise.
impl<'a> AttrValue<'a> for SvgNode<'a> {
    fn parse(node: SvgNode<'a>, aid: AId, value: &'a str) -> Option<Self> {
        let id = if aid == AId::Href {
            svgtypes::IRI::from_str(value).ok()?.0
        } else {
            svgtypes::FuncIRI::from_str(value).ok()?.0
        };

        node.document().element_by_id(id)
    }
}
