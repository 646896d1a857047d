// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

pub use svgtypes::FontFamily;

use super::{
    Fill, Group, NonZeroPositiveF32, PaintOrder, Rect, ShapeRendering, Stroke, Visibility,
};

/// The `font-stretch` property.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub enum FontStretch {
    UltraCondensed,
    ExtraCondensed,
    Condensed,
    SemiCondensed,
    #[default]
    Normal,
    SemiExpanded,
    Expanded,
    ExtraExpanded,
    UltraExpanded,
}

/// The `font-style` property.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

/// The `text-anchor` property.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

/// A font query.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Font {
    pub(crate) families: Vec<FontFamily>,
    pub(crate) style: FontStyle,
    pub(crate) stretch: FontStretch,
    pub(crate) weight: u16,
}

getters!(Font {
    /// `font-family`, in preference order.
    borrow families: [FontFamily];
    /// `font-style`.
    copy style: FontStyle;
    /// `font-stretch`.
    copy stretch: FontStretch;
    /// `font-weight` as a number in 1..=1000.
    copy weight: u16;
});

/// A run of characters sharing one style.
///
/// Produced by a `text` element and each of its `tspan` descendants.
#[derive(Clone, Debug)]
pub struct TextSpan {
    pub(crate) text: String,
    pub(crate) x: Option<f32>,
    pub(crate) y: Option<f32>,
    pub(crate) dx: f32,
    pub(crate) dy: f32,
    pub(crate) anchor: TextAnchor,
    pub(crate) font: Font,
    pub(crate) font_size: NonZeroPositiveF32,
    pub(crate) fill: Option<Fill>,
    pub(crate) stroke: Option<Stroke>,
    pub(crate) paint_order: PaintOrder,
    pub(crate) visibility: Visibility,
}

getters!(TextSpan {
    /// Characters with whitespace already collapsed.
    borrow text: str;
    /// An absolute position that starts a new text chunk.
    copy x: Option<f32>;
    /// An absolute position that starts a new text chunk.
    copy y: Option<f32>;
    /// A relative shift of the first character.
    copy dx: f32;
    /// A relative shift of the first character.
    copy dy: f32;
    /// Chunk alignment.
    copy anchor: TextAnchor;
    /// Font query.
    borrow font: Font;
    /// Font size in user units.
    copy font_size: NonZeroPositiveF32;
    /// Paint order.
    copy paint_order: PaintOrder;
    /// Visibility.
    copy visibility: Visibility;
});

impl TextSpan {
    /// Glyph fill.
    pub fn fill(&self) -> Option<&Fill> {
        self.fill.as_ref()
    }

    /// Glyph stroke.
    pub fn stroke(&self) -> Option<&Stroke> {
        self.stroke.as_ref()
    }
}

/// A `text` element.
#[derive(Clone, Debug)]
pub struct Text {
    pub(crate) id: String,
    pub(crate) rendering_mode: ShapeRendering,
    pub(crate) spans: Vec<TextSpan>,
    pub(crate) flattened: Option<Box<Group>>,
}

getters!(Text {
    /// The element ID.
    borrow id: str;
    /// Derived from `text-rendering`.
    copy rendering_mode: ShapeRendering;
    /// Spans in logical order.
    borrow spans: [TextSpan];
});

impl Text {
    /// Glyph outlines as paths.
    ///
    /// `None` without the `text` feature or when no font matched.
    pub fn flattened(&self) -> Option<&Group> {
        self.flattened.as_deref()
    }

    /// Bounds of the glyph outlines. `None` when not flattened.
    pub fn bounding_box(&self) -> Option<Rect> {
        self.flattened.as_ref().and_then(|g| g.bounding_box)
    }
}
