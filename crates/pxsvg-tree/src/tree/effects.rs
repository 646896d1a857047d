// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::{ClipPathId, Group, MaskId, NonZeroRect, Transform, Units};

/// A `clipPath` element.
///
/// Children are paths and texts with a black fill and no stroke.
#[derive(Clone, Debug)]
pub struct ClipPath {
    pub(crate) id: String,
    pub(crate) units: Units,
    pub(crate) transform: Transform,
    pub(crate) clip_path: Option<ClipPathId>,
    pub(crate) root: Group,
}

getters!(ClipPath {
    /// The element ID. Empty for viewport clips.
    borrow id: str;
    /// `clipPathUnits`.
    copy units: Units;
    /// The `transform` of the `clipPath` element.
    copy transform: Transform;
    /// A clip path applied to this clip path.
    copy clip_path: Option<ClipPathId>;
    /// Clip geometry.
    borrow root: Group;
});

impl ClipPath {
    pub(crate) fn empty(id: String) -> Self {
        ClipPath {
            id,
            units: Units::UserSpaceOnUse,
            transform: Transform::default(),
            clip_path: None,
            root: Group::empty(),
        }
    }
}

/// The `mask-type` property.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum MaskType {
    /// Coverage comes from the content luminance.
    #[default]
    Luminance,
    /// Coverage comes from the content alpha.
    Alpha,
}

/// A `mask` element.
#[derive(Clone, Debug)]
pub struct Mask {
    pub(crate) id: String,
    pub(crate) units: Units,
    pub(crate) content_units: Units,
    pub(crate) rect: NonZeroRect,
    pub(crate) kind: MaskType,
    pub(crate) mask: Option<MaskId>,
    pub(crate) root: Group,
}

getters!(Mask {
    /// The element ID.
    borrow id: str;
    /// `maskUnits`. Applies to `rect`.
    copy units: Units;
    /// `maskContentUnits`.
    copy content_units: Units;
    /// The region outside of which everything is masked out.
    copy rect: NonZeroRect;
    /// `mask-type`.
    copy kind: MaskType;
    /// A mask applied to this mask.
    copy mask: Option<MaskId>;
    /// Mask content. Can be empty, which hides the element entirely.
    borrow root: Group;
});
