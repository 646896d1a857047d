// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fill and stroke resolution.

use std::str::FromStr;

use strict_num::NonZeroPositiveF32;
use svgtypes::{PaintFallback, PaintOrderKind};

use super::converter::{Context, Tables};
use super::paint_server::{self, Resolved};
use super::svgtree::{AId, SvgNode};
use crate::{
    ApproxEqUlps, Color, Fill, Opacity, Paint, PaintOrder, Stroke, StrokeMiterlimit, Units,
};

/// Splits an SVG color into a model color and its alpha.
pub(crate) fn split_alpha(c: svgtypes::Color) -> (Color, Opacity) {
    (
        Color::new_rgb(c.red, c.green, c.blue),
        Opacity::new_u8(c.alpha),
    )
}

/// `has_bbox` tells whether `objectBoundingBox` paint servers can be used.
pub(crate) fn resolve_fill(
    node: SvgNode,
    has_bbox: bool,
    ctx: &Context,
    tables: &mut Tables,
) -> Option<Fill> {
    // Clip path content is a black silhouette.
    if ctx.in_clip_path {
        return Some(Fill::black(
            node.find_attribute(AId::ClipRule).unwrap_or_default(),
        ));
    }

    let (paint, paint_opacity) = match node.find_node_with(AId::Fill) {
        Some(source) => resolve_paint(source, AId::Fill, has_bbox, ctx, tables)?,
        None => (Paint::Color(Color::black()), Opacity::ONE),
    };

    let opacity: Opacity = node.find_attribute(AId::FillOpacity).unwrap_or(Opacity::ONE);
    Some(Fill {
        paint,
        opacity: paint_opacity * opacity,
        rule: node.find_attribute(AId::FillRule).unwrap_or_default(),
    })
}

pub(crate) fn resolve_stroke(
    node: SvgNode,
    has_bbox: bool,
    ctx: &Context,
    tables: &mut Tables,
) -> Option<Stroke> {
    if ctx.in_clip_path {
        return None;
    }

    let source = node.find_node_with(AId::Stroke)?;
    let (paint, paint_opacity) = resolve_paint(source, AId::Stroke, has_bbox, ctx, tables)?;

    let width = NonZeroPositiveF32::new(ctx.inherited_length(node, AId::StrokeWidth, 1.0))?;

    let opacity: Opacity = node.find_attribute(AId::StrokeOpacity).unwrap_or(Opacity::ONE);
    Some(Stroke {
        paint,
        dasharray: resolve_dasharray(node, ctx),
        dashoffset: ctx.inherited_length(node, AId::StrokeDashoffset, 0.0),
        miterlimit: StrokeMiterlimit::new(
            node.find_attribute(AId::StrokeMiterlimit).unwrap_or(4.0),
        ),
        opacity: paint_opacity * opacity,
        width,
        linecap: node.find_attribute(AId::StrokeLinecap).unwrap_or_default(),
        linejoin: node.find_attribute(AId::StrokeLinejoin).unwrap_or_default(),
    })
}

/// Resolves `fill` or `stroke` declared on `node`.
///
/// `None` means nothing is painted.
fn resolve_paint(
    node: SvgNode,
    aid: AId,
    has_bbox: bool,
    ctx: &Context,
    tables: &mut Tables,
) -> Option<(Paint, Opacity)> {
    let value: &str = node.attribute(aid)?;
    let paint = match svgtypes::Paint::from_str(value) {
        Ok(paint) => paint,
        // An invalid fill is black, an invalid stroke is none.
        Err(_) if aid == AId::Fill => {
            log::warn!("Invalid {} value: '{}'. Using black.", aid, value);
            svgtypes::Paint::Color(svgtypes::Color::black())
        }
        Err(_) => {
            log::warn!("Invalid {} value: '{}'. Skipped.", aid, value);
            return None;
        }
    };

    match paint {
        // `inherit` is already resolved by the tree.
        svgtypes::Paint::None | svgtypes::Paint::Inherit => None,
        svgtypes::Paint::ContextFill | svgtypes::Paint::ContextStroke => {
            log::warn!("'{}' is only valid inside markers.", value);
            None
        }
        svgtypes::Paint::CurrentColor => Some(current_color(node)),
        svgtypes::Paint::Color(c) => {
            let (color, opacity) = split_alpha(c);
            Some((Paint::Color(color), opacity))
        }
        svgtypes::Paint::FuncIRI(id, fallback) => {
            let link = match node.document().element_by_id(id) {
                Some(link) => link,
                None => {
                    log::warn!("{} references a missing element '{}'.", aid, id);
                    return paint_fallback(node, fallback);
                }
            };

            if !link.tag_name().map_or(false, |tag| tag.is_paint_server()) {
                log::warn!("'{}' is not a paint server.", id);
                return None;
            }

            match paint_server::convert(link, ctx, tables) {
                // A bounding box relative server needs a bounding box.
                Some(Resolved::Server(_, Units::ObjectBoundingBox)) if !has_bbox => {
                    paint_fallback(node, fallback)
                }
                Some(Resolved::Server(id, _)) => Some((Paint::Server(id), Opacity::ONE)),
                Some(Resolved::Color(color, opacity)) => Some((Paint::Color(color), opacity)),
                None => paint_fallback(node, fallback),
            }
        }
    }
}

fn current_color(node: SvgNode) -> (Paint, Opacity) {
    let c = node
        .find_attribute(AId::Color)
        .unwrap_or_else(svgtypes::Color::black);
    let (color, opacity) = split_alpha(c);
    (Paint::Color(color), opacity)
}

fn paint_fallback(node: SvgNode, fallback: Option<PaintFallback>) -> Option<(Paint, Opacity)> {
    match fallback? {
        PaintFallback::None => None,
        PaintFallback::CurrentColor => Some(current_color(node)),
        PaintFallback::Color(c) => {
            let (color, opacity) = split_alpha(c);
            Some((Paint::Color(color), opacity))
        }
    }
}

/// <https://www.w3.org/TR/SVG11/painting.html#StrokeDasharrayProperty>
fn resolve_dasharray(node: SvgNode, ctx: &Context) -> Option<Vec<f32>> {
    let source = node.find_node_with(AId::StrokeDasharray)?;
    if source.attribute::<&str>(AId::StrokeDasharray) == Some("none") {
        return None;
    }

    let mut list = ctx.length_list(source, AId::StrokeDasharray)?;
    if list.iter().any(|n| n.is_sign_negative()) {
        return None;
    }

    let sum: f32 = list.iter().sum();
    if sum.approx_eq_ulps(&0.0, 4) {
        return None;
    }

    // An odd list is repeated to make it even.
    if list.len() % 2 == 1 {
        list.extend_from_within(..);
    }

    Some(list)
}

/// Markers are not rendered, so only fill and stroke order matters.
pub(crate) fn resolve_paint_order(node: SvgNode) -> PaintOrder {
    let order: svgtypes::PaintOrder = node.find_attribute(AId::PaintOrder).unwrap_or_default();
    paint_order_from(order)
}

fn paint_order_from(order: svgtypes::PaintOrder) -> PaintOrder {
    let position = |kind| order.order.iter().position(|k| *k == kind);
    match (position(PaintOrderKind::Fill), position(PaintOrderKind::Stroke)) {
        (Some(fill), Some(stroke)) if stroke < fill => PaintOrder::StrokeAndFill,
        _ => PaintOrder::FillAndStroke,
    }
}
