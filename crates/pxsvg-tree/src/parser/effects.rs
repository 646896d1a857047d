// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! `clipPath` and `mask` elements.

use svgtypes::{Length, LengthUnit};

use super::converter::{self, Context, Tables};
use super::svgtree::{AId, EId, SvgNode};
use crate::{ClipPath, ClipPathId, Group, Mask, MaskId, NonZeroRect, Rect, Transform, Units};

fn has_area(bbox: Option<Rect>) -> bool {
    bbox.map_or(false, |r| r.width() > 0.0 && r.height() > 0.0)
}

/// Resolves a `clip-path` reference for an element with the given bounds.
///
/// `None` means the element must not be rendered.
pub(crate) fn convert_clip_path(
    node: SvgNode,
    ctx: &Context,
    bbox: Option<Rect>,
    tables: &mut Tables,
) -> Option<ClipPathId> {
    if node.tag_name() != Some(EId::ClipPath) {
        log::warn!("'{}' is not a clipPath.", node.element_id());
        return None;
    }

    let units = node
        .attribute(AId::ClipPathUnits)
        .unwrap_or(Units::UserSpaceOnUse);
    if units == Units::ObjectBoundingBox && !has_area(bbox) {
        log::warn!("Cannot clip a zero-sized element with '{}'.", node.element_id());
        return None;
    }

    if let Some(id) = tables.clip_paths_by_node.get(&node.node_id()) {
        return *id;
    }

    let id = build_clip_path(node, units, ctx, bbox, tables);
    tables.clip_paths_by_node.insert(node.node_id(), id);
    id
}

fn build_clip_path(
    node: SvgNode,
    units: Units,
    ctx: &Context,
    bbox: Option<Rect>,
    tables: &mut Tables,
) -> Option<ClipPathId> {
    // An invalid transform disables the whole clip path.
    if let Some(ts) = node.attribute::<Transform>(AId::Transform) {
        if !ts.is_valid() {
            return None;
        }
    }

    let clip_path = match node.try_attribute::<SvgNode>(AId::ClipPath) {
        Some(link) => Some(convert_clip_path(link, ctx, bbox, tables)?),
        None => None,
    };

    let content_ctx = Context {
        in_clip_path: true,
        ..*ctx
    };
    let mut root = Group::empty();
    converter::convert_clip_children(node, &content_ctx, tables, &mut root);
    if !root.has_children() {
        log::warn!("clipPath '{}' has no content.", node.element_id());
        return None;
    }
    root.calculate_bounding_box();

    Some(tables.add_clip_path(ClipPath {
        id: node.element_id().to_string(),
        units,
        transform: converter::transform_of(node, AId::Transform, ctx),
        clip_path,
        root,
    }))
}

/// Resolves a `mask` reference for an element with the given bounds.
///
/// `None` means the element must not be rendered.
pub(crate) fn convert_mask(
    node: SvgNode,
    ctx: &Context,
    bbox: Option<Rect>,
    tables: &mut Tables,
) -> Option<MaskId> {
    if node.tag_name() != Some(EId::Mask) {
        log::warn!("'{}' is not a mask.", node.element_id());
        return None;
    }

    let units = node
        .attribute(AId::MaskUnits)
        .unwrap_or(Units::ObjectBoundingBox);
    let content_units = node
        .attribute(AId::MaskContentUnits)
        .unwrap_or(Units::UserSpaceOnUse);

    // The opposite combination is handled while rendering,
    // where a zero-sized element is masked out entirely.
    if units == Units::UserSpaceOnUse
        && content_units == Units::ObjectBoundingBox
        && !has_area(bbox)
    {
        log::warn!("Cannot mask a zero-sized element with '{}'.", node.element_id());
        return None;
    }

    if let Some(id) = tables.masks_by_node.get(&node.node_id()) {
        return *id;
    }

    let id = build_mask(node, units, content_units, ctx, bbox, tables);
    tables.masks_by_node.insert(node.node_id(), id);
    id
}

fn build_mask(
    node: SvgNode,
    units: Units,
    content_units: Units,
    ctx: &Context,
    bbox: Option<Rect>,
    tables: &mut Tables,
) -> Option<MaskId> {
    let start = Length::new(-10.0, LengthUnit::Percent);
    let extent = Length::new(120.0, LengthUnit::Percent);
    let rect = NonZeroRect::from_xywh(
        ctx.length(node, AId::X, units, start),
        ctx.length(node, AId::Y, units, start),
        ctx.length(node, AId::Width, units, extent),
        ctx.length(node, AId::Height, units, extent),
    );
    let rect = match rect {
        Some(rect) => rect,
        None => {
            log::warn!("Mask '{}' has no area. Skipped.", node.element_id());
            return None;
        }
    };

    let mask = match node.try_attribute::<SvgNode>(AId::Mask) {
        Some(link) => Some(convert_mask(link, ctx, bbox, tables)?),
        None => None,
    };

    let content_ctx = Context {
        in_clip_path: false,
        ..*ctx
    };
    let mut root = Group::empty();
    converter::convert_children(node, &content_ctx, tables, &mut root);
    root.calculate_bounding_box();

    Some(tables.add_mask(Mask {
        id: node.element_id().to_string(),
        units,
        content_units,
        rect,
        kind: node.attribute(AId::MaskType).unwrap_or_default(),
        mask,
        root,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::svgtree;
    use crate::{MaskType, Node, Options};

    fn convert_str(text: &str) -> crate::Document {
        let xml = roxmltree::Document::parse(text).unwrap();
        let svg = svgtree::Document::parse(&xml, None).unwrap();
        converter::convert(&svg, &Options::default(), true).unwrap()
    }

    #[test]
    fn shared_clip_path_is_converted_once() {
        let doc = convert_str(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <clipPath id='c'><rect width='5' height='5' fill='red' stroke='blue'/></clipPath>
                <rect width='10' height='10' clip-path='url(#c)'/>
                <rect x='20' width='10' height='10' clip-path='url(#c)'/>
            </svg>",
        );
        assert_eq!(doc.clip_paths().len(), 1);

        let clip = &doc.clip_paths()[0];
        match clip.root().children()[0] {
            Node::Path(ref p) => {
                assert!(p.stroke().is_none());
                assert_eq!(*p.fill().unwrap().paint(), crate::Paint::Color(crate::Color::black()));
            }
            _ => panic!("expected a path"),
        }
    }

    #[test]
    fn empty_clip_path_hides_element() {
        let doc = convert_str(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <clipPath id='c'/>
                <rect width='10' height='10' clip-path='url(#c)'/>
            </svg>",
        );
        assert!(!doc.root().has_children());
    }

    #[test]
    fn bbox_clip_needs_area() {
        let doc = convert_str(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <clipPath id='c' clipPathUnits='objectBoundingBox'><rect width='1' height='1'/></clipPath>
                <line x2='10' stroke='black' clip-path='url(#c)'/>
            </svg>",
        );
        assert!(!doc.root().has_children());
    }

    #[test]
    fn mask_defaults() {
        let doc = convert_str(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <mask id='m' mask-type='alpha'/>
                <rect width='10' height='10' mask='url(#m)'/>
            </svg>",
        );
        let mask = &doc.masks()[0];
        assert_eq!(mask.units(), Units::ObjectBoundingBox);
        assert_eq!(mask.kind(), MaskType::Alpha);
        assert_eq!(mask.rect(), NonZeroRect::from_xywh(-0.1, -0.1, 1.2, 1.2).unwrap());
        assert!(!mask.root().has_children());
    }
}
