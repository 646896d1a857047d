// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Elements that establish a new viewport: `use` of a `symbol` or an `svg`,
//! and nested `svg`.
//!
//! A viewport becomes a group transform plus an anonymous clip path.

use std::sync::Arc;

use svgtypes::{Length, LengthUnit};

use super::converter::{self, Context, Tables};
use super::svgtree::{AId, EId, SvgNode};
use crate::tree::is_valid_length;
use crate::{
    ClipPath, ClipPathId, Fill, Group, Node, NonZeroRect, Path, PathData, PaintOrder,
    ShapeRendering, Size, Transform, Units, Use, ViewBox, Visibility,
};

/// Converts a `use` element.
///
/// The referenced element was copied under `use` while building the tree,
/// so the content is converted in place.
pub(crate) fn convert_use(node: SvgNode, ctx: &Context, tables: &mut Tables, out: &mut Group) {
    let child = match node.first_element_child() {
        Some(child) => child,
        None => return,
    };

    let is_symbol = child.tag_name() == Some(EId::Symbol);
    if is_symbol && ctx.in_clip_path {
        log::warn!("A symbol cannot be used inside a clip path.");
        return;
    }

    let offset = position(node, ctx);
    let mut root = converter::new_group(node, ctx);
    let transform = root.transform.pre_concat(offset);
    root.transform = Transform::default();

    if is_symbol {
        let (w, h) = size(node, ctx);
        let mut content = Group {
            transform: view_box_transform(child, w, h).unwrap_or_default(),
            ..Group::empty()
        };
        convert_content(child, ctx, tables, &mut content);

        let clip = if clips(child) {
            NonZeroRect::from_xywh(0.0, 0.0, w, h)
        } else {
            None
        };
        push_clipped(content, clip, tables, &mut root);
    } else {
        let mut inner = *ctx;
        if child.tag_name() == Some(EId::Svg) {
            // Each `use` replaces the size set by an outer one.
            inner.use_size = (
                ctx.try_length(node, AId::Width, Units::UserSpaceOnUse),
                ctx.try_length(node, AId::Height, Units::UserSpaceOnUse),
            );
        }
        convert_content(node, &inner, tables, &mut root);
    }

    if !root.has_children() {
        return;
    }

    if !converter::resolve_effects(node, ctx, tables, &mut root) {
        return;
    }

    out.children.push(Node::Use(Box::new(Use {
        id: node.element_id().to_string(),
        transform,
        root,
    })));
}

/// Converts the content of a nested `svg` into `out`,
/// which already holds the element transform.
pub(crate) fn convert_svg(node: SvgNode, ctx: &Context, tables: &mut Tables, out: &mut Group) {
    let offset = position(node, ctx);
    let (x, y) = (offset.tx, offset.ty);
    let (w, h) = size(node, ctx);

    let mut content = Group {
        transform: offset.pre_concat(view_box_transform(node, w, h).unwrap_or_default()),
        ..Group::empty()
    };

    let view_box = node
        .attribute(AId::ViewBox)
        .and_then(converter::to_rect)
        .or_else(|| NonZeroRect::from_xywh(x, y, w, h))
        .unwrap_or(ctx.view_box);
    let inner = Context {
        view_box,
        use_size: (None, None),
        ..*ctx
    };
    convert_content(node, &inner, tables, &mut content);

    // Without an explicit size the viewport is unbounded.
    let has_size = ctx.use_size != (None, None)
        || (node.has_attribute(AId::Width) && node.has_attribute(AId::Height));
    let clip = if has_size && clips(node) {
        NonZeroRect::from_xywh(x, y, w, h)
    } else {
        None
    };
    push_clipped(content, clip, tables, out);
}

fn convert_content(node: SvgNode, ctx: &Context, tables: &mut Tables, out: &mut Group) {
    if ctx.in_clip_path {
        converter::convert_clip_children(node, ctx, tables, out);
    } else {
        converter::convert_children(node, ctx, tables, out);
    }
}

fn position(node: SvgNode, ctx: &Context) -> Transform {
    Transform::from_translate(
        ctx.user_length(node, AId::X, Length::zero()),
        ctx.user_length(node, AId::Y, Length::zero()),
    )
}

/// The viewport size. `use` can override the size of an `svg` it references.
fn size(node: SvgNode, ctx: &Context) -> (f32, f32) {
    let full = Length::new(100.0, LengthUnit::Percent);
    let w = ctx.user_length(node, AId::Width, full);
    let h = ctx.user_length(node, AId::Height, full);
    if node.tag_name() == Some(EId::Svg) {
        (ctx.use_size.0.unwrap_or(w), ctx.use_size.1.unwrap_or(h))
    } else {
        (w, h)
    }
}

fn clips(node: SvgNode) -> bool {
    !matches!(
        node.attribute::<&str>(AId::Overflow),
        Some("visible") | Some("auto")
    )
}

fn view_box_transform(node: SvgNode, w: f32, h: f32) -> Option<Transform> {
    let size = Size::from_wh(w, h)?;
    let view_box = ViewBox {
        rect: node.attribute(AId::ViewBox).and_then(converter::to_rect)?,
        aspect: node.attribute(AId::PreserveAspectRatio).unwrap_or_default(),
    };
    Some(view_box.to_transform(size))
}

/// Adds `content` to `out`, wrapped in a group clipped to `clip` if there is one.
fn push_clipped(
    mut content: Group,
    clip: Option<NonZeroRect>,
    tables: &mut Tables,
    out: &mut Group,
) {
    if !content.has_children() {
        return;
    }
    content.calculate_bounding_box();

    let clip = clip.filter(|r| is_valid_length(r.width()) && is_valid_length(r.height()));
    match clip {
        Some(rect) => {
            let mut g = Group {
                clip_path: Some(viewport_clip(rect, tables)),
                children: vec![Node::Group(Box::new(content))],
                ..Group::empty()
            };
            g.calculate_bounding_box();
            out.children.push(Node::Group(Box::new(g)));
        }
        None => converter::push_group(content, false, out),
    }
}

/// An anonymous clip path covering `rect`.
fn viewport_clip(rect: NonZeroRect, tables: &mut Tables) -> ClipPathId {
    let mut clip = ClipPath::empty(String::new());
    if let Some(data) = PathData::from_rect(rect.to_rect()) {
        clip.root.children.push(Node::Path(Box::new(Path {
            id: String::new(),
            visibility: Visibility::Visible,
            fill: Some(Fill::default()),
            stroke: None,
            paint_order: PaintOrder::default(),
            rendering_mode: ShapeRendering::default(),
            data: Arc::new(data),
        })));
    }
    clip.root.calculate_bounding_box();
    tables.add_clip_path(clip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::svgtree;
    use crate::{Options, Rect};

    fn convert_str(text: &str) -> crate::Document {
        let xml = roxmltree::Document::parse(text).unwrap();
        let svg = svgtree::Document::parse(&xml, None).unwrap();
        converter::convert(&svg, &Options::default(), true).unwrap()
    }

    #[test]
    fn sized_svg_is_clipped() {
        let doc = convert_str(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <svg x='10' y='10' width='20' height='20'><rect width='50' height='50'/></svg>
            </svg>",
        );
        assert_eq!(doc.clip_paths().len(), 1);
        assert_eq!(
            doc.clip_paths()[0].root().bounding_box(),
            Rect::from_xywh(10.0, 10.0, 20.0, 20.0)
        );

        match doc.root().children()[0] {
            Node::Group(ref g) => {
                assert!(g.clip_path().is_some());
                assert_eq!(g.children()[0].transform(), Transform::from_translate(10.0, 10.0));
            }
            _ => panic!("expected a group"),
        }
    }

    #[test]
    fn visible_overflow_is_not_clipped() {
        let doc = convert_str(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <svg width='20' height='20' overflow='visible'><rect width='50' height='50'/></svg>
            </svg>",
        );
        assert!(doc.clip_paths().is_empty());
        assert!(matches!(doc.root().children()[0], Node::Path(_)));
    }

    #[test]
    fn use_size_overrides_svg_size() {
        let doc = convert_str(
            "<svg xmlns='http://www.w3.org/2000/svg' xmlns:xlink='http://www.w3.org/1999/xlink' viewBox='0 0 100 100'>
                <defs>
                    <svg id='s' viewBox='0 0 10 10' width='10' height='10'>
                        <rect width='10' height='10'/>
                    </svg>
                </defs>
                <use xlink:href='#s' width='40' height='40'/>
            </svg>",
        );
        assert_eq!(
            doc.clip_paths()[0].root().bounding_box(),
            Rect::from_xywh(0.0, 0.0, 40.0, 40.0)
        );
    }

    #[test]
    fn symbol_in_clip_path_is_ignored() {
        let doc = convert_str(
            "<svg xmlns='http://www.w3.org/2000/svg' xmlns:xlink='http://www.w3.org/1999/xlink' viewBox='0 0 100 100'>
                <symbol id='s'><rect width='10' height='10'/></symbol>
                <clipPath id='c'><use xlink:href='#s'/></clipPath>
                <rect width='10' height='10' clip-path='url(#c)'/>
            </svg>",
        );
        assert!(!doc.root().has_children());
    }
}
