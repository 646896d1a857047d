// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Gradients, patterns and `solidColor`.
//!
//! Servers can inherit attributes and content from other servers through
//! `href`. Such a chain is walked on every lookup, starting at the
//! referenced element itself.

use svgtypes::{Length, LengthUnit};

use super::converter::{self, Context, Tables};
use super::style::split_alpha;
use super::svgtree::{AId, EId, SvgNode};
use crate::{
    ApproxEqUlps, BaseGradient, Color, Group, LinearGradient, NonZeroRect, NormalizedF32,
    Opacity, PaintServer, PaintServerId, Pattern, PositiveF32, RadialGradient, Stop, Transform,
    Units, ViewBox,
};

/// What a paint server reference turns into.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Resolved {
    /// A server and the units its geometry is in.
    Server(PaintServerId, Units),
    /// A gradient that degenerated into a single color.
    Color(Color, Opacity),
}

/// `None` when the server is invalid. The reference then uses its fallback.
pub(crate) fn convert(node: SvgNode, ctx: &Context, tables: &mut Tables) -> Option<Resolved> {
    if let Some(resolved) = tables.servers_by_node.get(&node.node_id()) {
        return *resolved;
    }

    let resolved = match node.tag_name()? {
        EId::LinearGradient => convert_linear(node, ctx, tables),
        EId::RadialGradient => convert_radial(node, ctx, tables),
        EId::Pattern => convert_pattern(node, ctx, tables),
        EId::SolidColor => Some(convert_solid_color(node, tables)),
        _ => None,
    };

    tables.servers_by_node.insert(node.node_id(), resolved);
    resolved
}

fn convert_linear(node: SvgNode, ctx: &Context, tables: &mut Tables) -> Option<Resolved> {
    let stops = collect_stops(node)?;
    let base = match base_gradient(node, stops, ctx)? {
        Ok(base) => base,
        Err(single) => return Some(single),
    };

    let units = base.units;
    let zero = Length::zero();
    let gradient = LinearGradient {
        x1: template_length(node, AId::X1, units, ctx, zero),
        y1: template_length(node, AId::Y1, units, ctx, zero),
        x2: template_length(node, AId::X2, units, ctx, Length::new(100.0, LengthUnit::Percent)),
        y2: template_length(node, AId::Y2, units, ctx, zero),
        base,
    };

    let id = tables.add_paint_server(PaintServer::LinearGradient(gradient));
    Some(Resolved::Server(id, units))
}

fn convert_radial(node: SvgNode, ctx: &Context, tables: &mut Tables) -> Option<Resolved> {
    let stops = collect_stops(node)?;
    let base = match base_gradient(node, stops, ctx)? {
        Ok(base) => base,
        Err(single) => return Some(single),
    };

    let units = base.units;
    let half = Length::new(50.0, LengthUnit::Percent);
    let r = template_length(node, AId::R, units, ctx, half);

    // A zero radius paints the last stop color.
    let r = match PositiveF32::new(r).filter(|r| r.get() > 0.0) {
        Some(r) => r,
        None => {
            let last = base.stops.last()?;
            return Some(Resolved::Color(last.color, last.opacity));
        }
    };

    let cx = template_length(node, AId::Cx, units, ctx, half);
    let cy = template_length(node, AId::Cy, units, ctx, half);
    let gradient = RadialGradient {
        cx,
        cy,
        r,
        // The focal point defaults to the center.
        fx: template_length(node, AId::Fx, units, ctx, Length::new_number(cx as f64)),
        fy: template_length(node, AId::Fy, units, ctx, Length::new_number(cy as f64)),
        base,
    };

    let id = tables.add_paint_server(PaintServer::RadialGradient(gradient));
    Some(Resolved::Server(id, units))
}

/// Attributes shared by both gradient kinds.
///
/// A gradient with fewer than two stops is a single color, returned as `Err`.
fn base_gradient(
    node: SvgNode,
    stops: Vec<Stop>,
    ctx: &Context,
) -> Option<Result<BaseGradient, Resolved>> {
    if stops.len() < 2 {
        let first = stops.first()?;
        return Some(Err(Resolved::Color(first.color, first.opacity)));
    }

    let transform = template_transform(node, AId::GradientTransform, ctx)?;
    Some(Ok(BaseGradient {
        id: node.element_id().to_string(),
        units: template(node, AId::GradientUnits)
            .attribute(AId::GradientUnits)
            .unwrap_or(Units::ObjectBoundingBox),
        transform,
        spread_method: template(node, AId::SpreadMethod)
            .attribute(AId::SpreadMethod)
            .unwrap_or_default(),
        stops,
    }))
}

fn convert_pattern(node: SvgNode, ctx: &Context, tables: &mut Tables) -> Option<Resolved> {
    let content = content_template(node)?;

    let units = template(node, AId::PatternUnits)
        .attribute(AId::PatternUnits)
        .unwrap_or(Units::ObjectBoundingBox);
    let content_units = template(node, AId::PatternContentUnits)
        .attribute(AId::PatternContentUnits)
        .unwrap_or(Units::UserSpaceOnUse);
    let transform = template_transform(node, AId::PatternTransform, ctx)?;

    let zero = Length::zero();
    let rect = NonZeroRect::from_xywh(
        template_length(node, AId::X, units, ctx, zero),
        template_length(node, AId::Y, units, ctx, zero),
        template_length(node, AId::Width, units, ctx, zero),
        template_length(node, AId::Height, units, ctx, zero),
    );
    let rect = match rect {
        Some(rect) => rect,
        None => {
            log::warn!("Pattern '{}' has no area. Skipped.", node.element_id());
            return None;
        }
    };

    let view_box = template(node, AId::ViewBox)
        .attribute(AId::ViewBox)
        .and_then(converter::to_rect)
        .map(|rect| ViewBox {
            rect,
            aspect: template(node, AId::PreserveAspectRatio)
                .attribute(AId::PreserveAspectRatio)
                .unwrap_or_default(),
        });

    // Content may paint with this very pattern, so the slot
    // has to be known before the content is converted.
    let id = tables.reserve_paint_server();
    let resolved = Resolved::Server(id, units);
    tables.servers_by_node.insert(node.node_id(), Some(resolved));

    let content_ctx = Context {
        in_clip_path: false,
        ..*ctx
    };
    let mut root = Group::empty();
    converter::convert_children(content, &content_ctx, tables, &mut root);
    if !root.has_children() {
        return None;
    }
    root.calculate_bounding_box();

    tables.fill_paint_server(
        id,
        PaintServer::Pattern(Pattern {
            id: node.element_id().to_string(),
            units,
            content_units,
            transform,
            rect,
            view_box,
            root,
        }),
    );

    Some(resolved)
}

fn convert_solid_color(node: SvgNode, tables: &mut Tables) -> Resolved {
    let (color, alpha) = split_alpha(
        node.attribute(AId::SolidColor)
            .unwrap_or_else(svgtypes::Color::black),
    );
    let opacity: Opacity = node.attribute(AId::SolidOpacity).unwrap_or(Opacity::ONE);

    let id = tables.add_paint_server(PaintServer::SolidColor(color, alpha * opacity));
    Resolved::Server(id, Units::UserSpaceOnUse)
}

/// Whether `aid` can be taken from a template of kind `from`.
fn can_inherit(node: EId, from: EId, aid: AId) -> bool {
    if node == from {
        return true;
    }

    node.is_gradient()
        && from.is_gradient()
        && matches!(
            aid,
            AId::GradientUnits | AId::SpreadMethod | AId::GradientTransform
        )
}

/// The first element in the `href` chain that sets `aid`, or `node` itself.
fn template<'a>(node: SvgNode<'a>, aid: AId) -> SvgNode<'a> {
    let kind = match node.tag_name() {
        Some(kind) => kind,
        None => return node,
    };

    node.href_iter()
        .take_while(|link| link.tag_name().map_or(false, |from| can_inherit(kind, from, aid)))
        .find(|link| link.has_attribute(aid))
        .unwrap_or(node)
}

fn template_length(node: SvgNode, aid: AId, units: Units, ctx: &Context, def: Length) -> f32 {
    ctx.length(template(node, aid), aid, units, def)
}

/// `None` when the transform cannot be inverted, which disables the server.
fn template_transform(node: SvgNode, aid: AId, ctx: &Context) -> Option<Transform> {
    let ts = converter::transform_of(template(node, aid), aid, ctx);
    if ts.is_valid() {
        Some(ts)
    } else {
        log::warn!("'{}' has an invalid {}. Skipped.", node.element_id(), aid);
        None
    }
}

/// Finds the element whose children are the server content.
///
/// `stop`s for gradients, graphics for patterns. Templates must be of a
/// compatible kind.
fn content_template(node: SvgNode) -> Option<SvgNode> {
    let kind = node.tag_name()?;
    for link in node.href_iter() {
        let from = link.tag_name()?;
        let compatible = if kind.is_gradient() {
            from.is_gradient()
        } else {
            from == kind
        };
        if !compatible {
            log::warn!("'{}' cannot use '{}' as a template.", node.element_id(), from);
            return None;
        }

        let has_content = if kind.is_gradient() {
            link.children().any(|n| n.tag_name() == Some(EId::Stop))
        } else {
            link.has_children()
        };
        if has_content {
            return Some(link);
        }
    }

    None
}

/// `None` for an invalid template chain. An empty list is valid.
fn collect_stops(node: SvgNode) -> Option<Vec<Stop>> {
    let source = match content_template(node) {
        Some(source) => source,
        None if node.href_iter().all(|n| n.tag_name().map_or(false, EId::is_gradient)) => {
            return Some(Vec::new())
        }
        None => return None,
    };

    let mut stops = Vec::new();
    let mut offset = 0.0;
    for stop in source.children() {
        match stop.tag_name() {
            Some(EId::Stop) => {}
            Some(tag) => {
                log::warn!("'{}' is not a valid gradient child.", tag);
                continue;
            }
            None => continue,
        }

        // A missing offset repeats the previous one.
        if let Some(n) = stop.attribute::<NormalizedF32>(AId::Offset) {
            offset = n.get();
        }

        let color = match stop.attribute::<&str>(AId::StopColor) {
            Some("currentColor") => stop.find_attribute(AId::Color),
            Some(_) => stop.attribute(AId::StopColor),
            None => None,
        };
        let (color, alpha) = split_alpha(color.unwrap_or_else(svgtypes::Color::black));
        let opacity: Opacity = stop.attribute(AId::StopOpacity).unwrap_or(Opacity::ONE);

        stops.push(Stop {
            offset: NormalizedF32::new_clamped(offset),
            color,
            opacity: alpha * opacity,
        });
    }

    normalize_offsets(&mut stops);
    Some(stops)
}

/// Makes offsets strictly increasing.
///
/// A decreasing offset is raised to the previous one. A run of equal
/// offsets keeps only its first and last stop, and the pair left is
/// separated by `f32::EPSILON`.
fn normalize_offsets(stops: &mut Vec<Stop>) {
    let same = |a: &Stop, b: &Stop| a.offset.get().approx_eq_ulps(&b.offset.get(), 4);

    let mut max = 0.0;
    for stop in stops.iter_mut() {
        if stop.offset.get() < max {
            stop.offset = NormalizedF32::new_clamped(max);
        }
        max = stop.offset.get();
    }

    let mut i = 1;
    while i + 1 < stops.len() {
        if same(&stops[i - 1], &stops[i]) && same(&stops[i], &stops[i + 1]) {
            stops.remove(i);
        } else {
            i += 1;
        }
    }

    for i in 1..stops.len() {
        if !same(&stops[i - 1], &stops[i]) {
            continue;
        }

        let offset = stops[i].offset.get();
        if offset + f32::EPSILON <= 1.0 {
            stops[i].offset = NormalizedF32::new_clamped(offset + f32::EPSILON);
        } else {
            stops[i - 1].offset = NormalizedF32::new_clamped(offset - f32::EPSILON);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::svgtree;
    use crate::{Options, Paint};

    fn stop(offset: f32) -> Stop {
        Stop {
            offset: NormalizedF32::new_clamped(offset),
            color: Color::black(),
            opacity: Opacity::ONE,
        }
    }

    fn offsets(stops: &[Stop]) -> Vec<f32> {
        stops.iter().map(|s| s.offset.get()).collect()
    }

    #[test]
    fn decreasing_offsets_are_raised() {
        let mut stops = vec![stop(0.5), stop(0.2), stop(0.8)];
        normalize_offsets(&mut stops);
        let list = offsets(&stops);
        assert_eq!(list.len(), 3);
        assert_eq!(list[0], 0.5);
        assert!(list.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn equal_runs_keep_their_ends() {
        let mut stops = vec![stop(0.0), stop(0.7), stop(0.7), stop(0.7), stop(1.0)];
        normalize_offsets(&mut stops);
        let list = offsets(&stops);
        assert_eq!(list.len(), 4);
        assert!(list.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn equal_offsets_at_the_end() {
        let mut stops = vec![stop(1.0), stop(1.0)];
        normalize_offsets(&mut stops);
        let list = offsets(&stops);
        assert!(list[0] < list[1]);
        assert_eq!(list[1], 1.0);
    }

    fn first_fill(text: &str) -> (crate::Document, Paint) {
        let xml = roxmltree::Document::parse(text).unwrap();
        let svg = svgtree::Document::parse(&xml, None).unwrap();
        let doc = converter::convert(&svg, &Options::default(), true).unwrap();
        let paint = match doc.root.children[0] {
            crate::Node::Path(ref p) => p.fill().unwrap().paint().clone(),
            _ => unreachable!(),
        };
        (doc, paint)
    }

    #[test]
    fn template_attributes() {
        let (doc, paint) = first_fill(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <radialGradient id='base' gradientUnits='userSpaceOnUse' r='7'>
                    <stop offset='0'/>
                    <stop offset='1' stop-color='red'/>
                </radialGradient>
                <linearGradient id='lg' href='#base' x2='20'/>
                <rect width='10' height='10' fill='url(#lg)'/>
            </svg>",
        );

        let lg = match paint {
            Paint::Server(id) => match doc.paint_server(id) {
                Some(PaintServer::LinearGradient(lg)) => lg.clone(),
                _ => unreachable!(),
            },
            _ => unreachable!(),
        };

        // Units come from the radial template, coordinates do not.
        assert_eq!(lg.units, Units::UserSpaceOnUse);
        assert_eq!(lg.x2, 20.0);
        assert_eq!(lg.stops.len(), 2);
        assert_eq!(lg.stops[1].color, Color::new_rgb(255, 0, 0));
    }

    #[test]
    fn single_stop_is_a_color() {
        let (_, paint) = first_fill(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <linearGradient id='lg'><stop stop-color='#0000ff'/></linearGradient>
                <rect width='10' height='10' fill='url(#lg)'/>
            </svg>",
        );
        assert_eq!(paint, Paint::Color(Color::new_rgb(0, 0, 255)));
    }

    #[test]
    fn zero_radius_uses_last_stop() {
        let (_, paint) = first_fill(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <radialGradient id='rg' r='0'>
                    <stop stop-color='red'/>
                    <stop offset='1' stop-color='#00ff00'/>
                </radialGradient>
                <rect width='10' height='10' fill='url(#rg)'/>
            </svg>",
        );
        assert_eq!(paint, Paint::Color(Color::new_rgb(0, 255, 0)));
    }
}
