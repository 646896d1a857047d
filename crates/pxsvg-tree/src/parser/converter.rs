// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;
use std::sync::Arc;

use svgtypes::{Length, LengthUnit};

use super::paint_server::Resolved;
use super::svgtree::{self, AId, AttrValue, EId, NodeId, SvgNode};
use super::units::Axis;
use super::{Error, Options};
use crate::{
    ClipPath, ClipPathId, Document, Group, Mask, MaskId, Node, NonZeroRect, Opacity, Path,
    PathData, PaintServer, PaintServerId, ShapeRendering, Size, Transform, Units, ViewBox,
    Visibility,
};

/// Settings that change while descending the tree.
#[derive(Clone, Copy)]
pub(crate) struct Context<'o> {
    pub opt: &'o Options,
    /// The viewport percentages refer to.
    pub view_box: NonZeroRect,
    /// `width` and `height` of the closest `use` that instantiates an `svg`.
    pub use_size: (Option<f32>, Option<f32>),
    /// Set while converting `clipPath` content.
    pub in_clip_path: bool,
    pub allow_images: bool,
}

/// Paint servers, clip paths and masks collected during conversion.
///
/// A referenced element is converted once, later references reuse its index.
#[derive(Default)]
pub(crate) struct Tables {
    paint_servers: Vec<Option<PaintServer>>,
    clip_paths: Vec<ClipPath>,
    masks: Vec<Mask>,
    pub servers_by_node: HashMap<NodeId, Option<Resolved>>,
    pub clip_paths_by_node: HashMap<NodeId, Option<ClipPathId>>,
    pub masks_by_node: HashMap<NodeId, Option<MaskId>>,
}

impl Tables {
    /// Adds an empty paint server slot, filled by [`Tables::fill_paint_server`].
    pub fn reserve_paint_server(&mut self) -> PaintServerId {
        self.paint_servers.push(None);
        PaintServerId(self.paint_servers.len() - 1)
    }

    pub fn fill_paint_server(&mut self, id: PaintServerId, server: PaintServer) {
        self.paint_servers[id.0] = Some(server);
    }

    pub fn add_paint_server(&mut self, server: PaintServer) -> PaintServerId {
        let id = self.reserve_paint_server();
        self.fill_paint_server(id, server);
        id
    }

    pub fn add_clip_path(&mut self, clip: ClipPath) -> ClipPathId {
        self.clip_paths.push(clip);
        ClipPathId(self.clip_paths.len() - 1)
    }

    pub fn add_mask(&mut self, mask: Mask) -> MaskId {
        self.masks.push(mask);
        MaskId(self.masks.len() - 1)
    }
}

pub(crate) fn convert(
    svg_doc: &svgtree::Document,
    opt: &Options,
    allow_images: bool,
) -> Result<Document, Error> {
    let svg = svg_doc.root_element().ok_or(Error::UnsupportedVersion)?;

    let view_box_rect = svg.attribute::<svgtypes::ViewBox>(AId::ViewBox).and_then(to_rect);
    let (size, size_from_content) = resolve_size(svg, view_box_rect, opt)?;
    let view_box = ViewBox {
        rect: view_box_rect.unwrap_or_else(|| size.to_non_zero_rect(0.0, 0.0)),
        aspect: svg.attribute(AId::PreserveAspectRatio).unwrap_or_default(),
    };

    let ctx = Context {
        opt,
        view_box: view_box.rect,
        use_size: (None, None),
        in_clip_path: false,
        allow_images,
    };

    let mut tables = Tables::default();
    let mut root = Group::empty();
    convert_element(svg, &ctx, &mut tables, &mut root);
    root.calculate_bounding_box();

    let mut doc = Document {
        size: Some(size),
        view_box,
        root,
        paint_servers: tables.paint_servers,
        clip_paths: tables.clip_paths,
        masks: tables.masks,
    };

    if size_from_content {
        fit_to_content(&mut doc);
    }

    Ok(doc)
}

pub(crate) fn to_rect(vb: svgtypes::ViewBox) -> Option<NonZeroRect> {
    NonZeroRect::from_xywh(vb.x as f32, vb.y as f32, vb.w as f32, vb.h as f32)
}

/// Returns the root size and whether it has to be replaced
/// by the content bounds afterwards.
fn resolve_size(
    svg: SvgNode,
    view_box: Option<NonZeroRect>,
    opt: &Options,
) -> Result<(Size, bool), Error> {
    let full = Length::new(100.0, LengthUnit::Percent);
    let width: Length = svg.attribute(AId::Width).unwrap_or(full);
    let height: Length = svg.attribute(AId::Height).unwrap_or(full);

    let is_relative = width.unit == LengthUnit::Percent || height.unit == LengthUnit::Percent;
    let size_from_content = is_relative && view_box.is_none();

    // Without a viewBox, percentages refer to the default size.
    let viewport = match view_box {
        Some(vb) => vb,
        None => opt.default_size.to_non_zero_rect(0.0, 0.0),
    };
    let ctx = Context {
        opt,
        view_box: viewport,
        use_size: (None, None),
        in_clip_path: false,
        allow_images: false,
    };

    let w = ctx.convert(width, svg, Axis::Horizontal, Units::UserSpaceOnUse);
    let h = ctx.convert(height, svg, Axis::Vertical, Units::UserSpaceOnUse);
    let size = Size::from_wh(w, h).ok_or(Error::InvalidSize)?;
    Ok((size, size_from_content))
}

/// A document without content gets no size at all.
fn fit_to_content(doc: &mut Document) {
    let bbox = match doc.root.bounding_box {
        Some(bbox) => bbox,
        None => {
            doc.size = None;
            return;
        }
    };

    doc.size = Size::from_wh(bbox.right(), bbox.bottom());
    if let Some(rect) = NonZeroRect::from_xywh(0.0, 0.0, bbox.right(), bbox.bottom()) {
        doc.view_box.rect = rect;
    }
}

pub(crate) fn convert_children(node: SvgNode, ctx: &Context, tables: &mut Tables, out: &mut Group) {
    for child in node.children() {
        convert_element(child, ctx, tables, out);
    }
}

pub(crate) fn convert_element(node: SvgNode, ctx: &Context, tables: &mut Tables, out: &mut Group) {
    let tag = match node.tag_name() {
        Some(tag) if tag.is_shape() => tag,
        Some(tag @ (EId::G | EId::Svg | EId::Image | EId::Text | EId::Use | EId::Switch)) => tag,
        _ => return,
    };

    if !is_visible(node, ctx.opt) {
        return;
    }

    match tag {
        EId::Use => return super::viewport::convert_use(node, ctx, tables, out),
        EId::Switch => return super::conditions::convert_switch(node, ctx, tables, out),
        _ => {}
    }

    let mut g = new_group(node, ctx);
    match tag {
        EId::G => convert_children(node, ctx, tables, &mut g),
        EId::Svg if node.parent_element().is_some() => {
            super::viewport::convert_svg(node, ctx, tables, &mut g)
        }
        EId::Svg => convert_children(node, ctx, tables, &mut g),
        EId::Image => super::image::convert(node, ctx, &mut g),
        EId::Text => super::text::convert(node, ctx, tables, &mut g),
        _ => convert_shape(node, ctx, tables, &mut g),
    }

    if resolve_effects(node, ctx, tables, &mut g) {
        push_group(g, tag == EId::G, out);
    }
}

/// Converts `clipPath` content. Only shapes, `text` and `use` are allowed.
pub(crate) fn convert_clip_children(
    node: SvgNode,
    ctx: &Context,
    tables: &mut Tables,
    out: &mut Group,
) {
    for child in node.children() {
        let tag = match child.tag_name() {
            Some(tag) => tag,
            None => continue,
        };

        if !tag.is_clip_content() {
            log::warn!("'{}' cannot be used inside a clip path. Skipped.", tag);
            continue;
        }

        if !is_visible(child, ctx.opt) {
            continue;
        }

        if tag == EId::Use {
            super::viewport::convert_use(child, ctx, tables, out);
            continue;
        }

        let mut g = new_group(child, ctx);
        if tag == EId::Text {
            super::text::convert(child, ctx, tables, &mut g);
        } else {
            convert_shape(child, ctx, tables, &mut g);
        }

        if resolve_effects(child, ctx, tables, &mut g) {
            push_group(g, false, out);
        }
    }
}

/// `display`, a degenerate transform and conditional attributes can hide
/// an element with all of its content.
fn is_visible(node: SvgNode, opt: &Options) -> bool {
    node.attribute::<&str>(AId::Display) != Some("none")
        && node
            .attribute::<Transform>(AId::Transform)
            .map_or(true, |ts| ts.is_valid())
        && super::conditions::passes(node, opt)
}

/// A group holding the element transform and opacity.
pub(crate) fn new_group(node: SvgNode, ctx: &Context) -> Group {
    let id = if node.tag_name() == Some(EId::G) {
        node.element_id().to_string()
    } else {
        String::new()
    };

    // Clip path content is always opaque.
    let opacity = if ctx.in_clip_path {
        Opacity::ONE
    } else {
        node.attribute(AId::Opacity).unwrap_or(Opacity::ONE)
    };

    Group {
        id,
        transform: transform_of(node, AId::Transform, ctx),
        opacity,
        ..Group::empty()
    }
}

/// Computes the group bounds and resolves `clip-path` and `mask`.
///
/// Returns `false` when a reference is invalid and the element must not be rendered.
pub(crate) fn resolve_effects(
    node: SvgNode,
    ctx: &Context,
    tables: &mut Tables,
    g: &mut Group,
) -> bool {
    g.calculate_bounding_box();

    if let Some(link) = node.try_attribute::<SvgNode>(AId::ClipPath) {
        match super::effects::convert_clip_path(link, ctx, g.bounding_box, tables) {
            Some(id) => g.clip_path = Some(id),
            None => return false,
        }
    }

    if ctx.in_clip_path {
        return true;
    }

    if let Some(link) = node.try_attribute::<SvgNode>(AId::Mask) {
        match super::effects::convert_mask(link, ctx, g.bounding_box, tables) {
            Some(id) => g.mask = Some(id),
            None => return false,
        }
    }

    true
}

/// Adds a group to `out`, or only its children when the group changes nothing.
pub(crate) fn push_group(mut g: Group, keep: bool, out: &mut Group) {
    if keep || g.has_effect() {
        out.children.push(Node::Group(Box::new(g)));
    } else {
        out.children.append(&mut g.children);
    }
}

/// Reads a transform attribute, applying `transform-origin`.
pub(crate) fn transform_of(node: SvgNode, aid: AId, ctx: &Context) -> Transform {
    let ts: Transform = node.attribute(aid).unwrap_or_default();
    let origin = match node.attribute::<svgtypes::TransformOrigin>(AId::TransformOrigin) {
        Some(origin) => origin,
        None => return ts,
    };

    let units = Units::UserSpaceOnUse;
    let x = ctx.convert(origin.x_offset, node, Axis::Horizontal, units);
    let y = ctx.convert(origin.y_offset, node, Axis::Vertical, units);
    Transform::from_translate(x, y)
        .pre_concat(ts)
        .pre_translate(-x, -y)
}

/// Resolves an inherited keyword property where `auto` means the user default.
pub(crate) fn find_or_auto<'a, T: AttrValue<'a>>(node: SvgNode<'a>, aid: AId, auto: T) -> T {
    match node.find_attribute::<&str>(aid) {
        None | Some("auto") => auto,
        Some(_) => node.find_attribute(aid).unwrap_or(auto),
    }
}

fn convert_shape(node: SvgNode, ctx: &Context, tables: &mut Tables, out: &mut Group) {
    let data = match super::shapes::convert(node, ctx) {
        Some(data) => data,
        None => return,
    };

    let path = new_path(node, data, ctx, tables);
    out.children.push(Node::Path(Box::new(path)));
}

fn new_path(node: SvgNode, data: PathData, ctx: &Context, tables: &mut Tables) -> Path {
    let bounds = data.bounds();
    let has_bbox = bounds.width() > 0.0 && bounds.height() > 0.0;
    let fill = super::style::resolve_fill(node, has_bbox, ctx, tables);
    let stroke = super::style::resolve_stroke(node, has_bbox, ctx, tables);

    // Nothing to draw, but the bounds still count.
    let visibility = if fill.is_none() && stroke.is_none() {
        Visibility::Hidden
    } else {
        node.find_attribute(AId::Visibility).unwrap_or_default()
    };

    Path {
        id: node.element_id().to_string(),
        visibility,
        fill,
        stroke,
        paint_order: super::style::resolve_paint_order(node),
        rendering_mode: find_or_auto(node, AId::ShapeRendering, ctx.opt.shape_rendering),
        data: Arc::new(data),
    }
}

impl ShapeRendering {
    /// Maps `text-rendering` onto the shape modes.
    pub(crate) fn from_text_rendering(node: SvgNode, auto: ShapeRendering) -> Self {
        match node.find_attribute::<&str>(AId::TextRendering) {
            Some("optimizeSpeed") => ShapeRendering::CrispEdges,
            Some("optimizeLegibility") | Some("geometricPrecision") => {
                ShapeRendering::GeometricPrecision
            }
            _ => auto,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert_str(text: &str) -> Document {
        let xml = roxmltree::Document::parse(text).unwrap();
        let svg = svgtree::Document::parse(&xml, None).unwrap();
        convert(&svg, &Options::default(), true).unwrap()
    }

    #[test]
    fn transform_origin() {
        let doc = convert_str(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <rect width='10' height='10' transform='scale(2)' transform-origin='5 5'/>
            </svg>",
        );
        assert_eq!(
            doc.root.children[0].transform(),
            Transform::from_row(2.0, 0.0, 0.0, 2.0, -5.0, -5.0)
        );
    }

    #[test]
    fn degenerate_transform_hides_element() {
        let doc = convert_str(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <rect width='10' height='10' transform='scale(0)'/>
            </svg>",
        );
        assert!(!doc.root.has_children());
    }

    #[test]
    fn auto_rendering_uses_options() {
        let xml = roxmltree::Document::parse(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <rect width='10' height='10' shape-rendering='auto'/>
                <rect width='10' height='10' shape-rendering='crispEdges'/>
            </svg>",
        )
        .unwrap();
        let svg = svgtree::Document::parse(&xml, None).unwrap();
        let opt = Options {
            shape_rendering: ShapeRendering::OptimizeSpeed,
            ..Options::default()
        };
        let doc = convert(&svg, &opt, true).unwrap();

        let modes: Vec<_> = doc
            .root
            .children
            .iter()
            .filter_map(|n| match n {
                Node::Path(p) => Some(p.rendering_mode),
                _ => None,
            })
            .collect();
        assert_eq!(
            modes,
            vec![ShapeRendering::OptimizeSpeed, ShapeRendering::CrispEdges]
        );
    }

    #[test]
    fn group_without_effects_is_flattened() {
        let doc = convert_str(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <g id='keep'><rect width='10' height='10'/></g>
                <svg><rect width='10' height='10'/></svg>
            </svg>",
        );
        assert!(matches!(doc.root.children[0], Node::Group(ref g) if g.id == "keep"));
        assert!(matches!(doc.root.children[1], Node::Path(_)));
    }
}
