// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

macro_rules! names {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:literal,)* }) => {
        $(#[$meta])*
        #[allow(missing_docs)]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        pub enum $name {
            $($variant,)*
        }

        impl $name {
            /// Parses a name from a local XML name.
            pub fn from_str(text: &str) -> Option<Self> {
                match text {
                    $($value => Some($name::$variant),)*
                    _ => None,
                }
            }

            /// Returns the XML name.
            pub fn to_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)*
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}", self.to_str())
            }
        }
    };
}

names! {
    /// A supported SVG element.
    EId {
        A = "a",
        Circle = "circle",
        ClipPath = "clipPath",
        Defs = "defs",
        Ellipse = "ellipse",
        G = "g",
        Image = "image",
        Line = "line",
        LinearGradient = "linearGradient",
        Mask = "mask",
        Path = "path",
        Pattern = "pattern",
        Polygon = "polygon",
        Polyline = "polyline",
        RadialGradient = "radialGradient",
        Rect = "rect",
        SolidColor = "solidColor",
        Stop = "stop",
        Style = "style",
        Svg = "svg",
        Switch = "switch",
        Symbol = "symbol",
        Text = "text",
        Tspan = "tspan",
        Use = "use",
    }
}

names! {
    /// A supported SVG attribute or CSS property.
    AId {
        Class = "class",
        ClipPath = "clip-path",
        ClipRule = "clip-rule",
        ClipPathUnits = "clipPathUnits",
        Color = "color",
        Cx = "cx",
        Cy = "cy",
        D = "d",
        Display = "display",
        Dx = "dx",
        Dy = "dy",
        Fill = "fill",
        FillOpacity = "fill-opacity",
        FillRule = "fill-rule",
        Font = "font",
        FontFamily = "font-family",
        FontSize = "font-size",
        FontStretch = "font-stretch",
        FontStyle = "font-style",
        FontVariant = "font-variant",
        FontWeight = "font-weight",
        Fx = "fx",
        Fy = "fy",
        GradientTransform = "gradientTransform",
        GradientUnits = "gradientUnits",
        Height = "height",
        Href = "href",
        Id = "id",
        ImageRendering = "image-rendering",
        Mask = "mask",
        MaskContentUnits = "maskContentUnits",
        MaskType = "mask-type",
        MaskUnits = "maskUnits",
        Offset = "offset",
        Opacity = "opacity",
        Overflow = "overflow",
        PaintOrder = "paint-order",
        PatternContentUnits = "patternContentUnits",
        PatternTransform = "patternTransform",
        PatternUnits = "patternUnits",
        Points = "points",
        PreserveAspectRatio = "preserveAspectRatio",
        R = "r",
        RequiredExtensions = "requiredExtensions",
        RequiredFeatures = "requiredFeatures",
        Rx = "rx",
        Ry = "ry",
        ShapeRendering = "shape-rendering",
        SolidColor = "solid-color",
        SolidOpacity = "solid-opacity",
        Space = "space",
        SpreadMethod = "spreadMethod",
        StopColor = "stop-color",
        StopOpacity = "stop-opacity",
        Stroke = "stroke",
        StrokeDasharray = "stroke-dasharray",
        StrokeDashoffset = "stroke-dashoffset",
        StrokeLinecap = "stroke-linecap",
        StrokeLinejoin = "stroke-linejoin",
        StrokeMiterlimit = "stroke-miterlimit",
        StrokeOpacity = "stroke-opacity",
        StrokeWidth = "stroke-width",
        Style = "style",
        SystemLanguage = "systemLanguage",
        TextAnchor = "text-anchor",
        TextRendering = "text-rendering",
        Transform = "transform",
        TransformOrigin = "transform-origin",
        Type = "type",
        ViewBox = "viewBox",
        Visibility = "visibility",
        Width = "width",
        X = "x",
        X1 = "x1",
        X2 = "x2",
        Y = "y",
        Y1 = "y1",
        Y2 = "y2",
    }
}

impl EId {
    /// Basic shapes and `path`.
    pub fn is_shape(self) -> bool {
        matches!(
            self,
            EId::Circle
                | EId::Ellipse
                | EId::Line
                | EId::Path
                | EId::Polygon
                | EId::Polyline
                | EId::Rect
        )
    }

    pub fn is_gradient(self) -> bool {
        matches!(self, EId::LinearGradient | EId::RadialGradient)
    }

    /// Elements `fill` and `stroke` can point to.
    pub fn is_paint_server(self) -> bool {
        matches!(
            self,
            EId::LinearGradient | EId::RadialGradient | EId::Pattern | EId::SolidColor
        )
    }

    /// Elements allowed inside `clipPath`.
    pub fn is_clip_content(self) -> bool {
        self.is_shape() || matches!(self, EId::Text | EId::Use)
    }
}

/// Cascade behavior of a CSS property.
#[derive(Clone, Copy, Debug)]
pub struct Property {
    /// Whether children take the parent value when not set.
    pub inherited: bool,
    /// The value `inherit` falls back to at the top of the tree.
    ///
    /// `None` drops the declaration instead.
    pub initial: Option<&'static str>,
}

impl AId {
    /// `None` for plain attributes, which CSS cannot set.
    pub fn property(self) -> Option<Property> {
        let (inherited, initial) = match self {
            AId::ClipRule | AId::FillRule => (true, Some("nonzero")),
            AId::Color | AId::Fill => (true, Some("black")),
            AId::FillOpacity | AId::StrokeOpacity => (true, Some("1")),
            AId::FontFamily => (true, None),
            AId::FontSize => (true, Some("medium")),
            AId::FontStretch | AId::FontStyle | AId::FontVariant | AId::FontWeight => {
                (true, Some("normal"))
            }
            AId::ImageRendering | AId::ShapeRendering | AId::TextRendering => (true, Some("auto")),
            AId::PaintOrder => (true, Some("normal")),
            AId::Stroke | AId::StrokeDasharray => (true, Some("none")),
            AId::StrokeDashoffset => (true, Some("0")),
            AId::StrokeLinecap => (true, Some("butt")),
            AId::StrokeLinejoin => (true, Some("miter")),
            AId::StrokeMiterlimit => (true, Some("4")),
            AId::StrokeWidth => (true, Some("1")),
            AId::TextAnchor => (true, Some("start")),
            AId::Visibility => (true, Some("visible")),

            AId::ClipPath | AId::Mask => (false, Some("none")),
            AId::Display => (false, Some("inline")),
            AId::MaskType => (false, Some("luminance")),
            AId::Opacity | AId::SolidOpacity | AId::StopOpacity => (false, Some("1")),
            AId::Overflow => (false, Some("visible")),
            AId::SolidColor | AId::StopColor => (false, Some("black")),
            AId::Transform | AId::TransformOrigin => (false, None),
            _ => return None,
        };

        Some(Property { inherited, initial })
    }
}
