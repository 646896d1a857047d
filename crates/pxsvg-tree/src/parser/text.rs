// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! `text` and `tspan` into styled spans.
//!
//! With the `text` feature spans are also laid out on a single line
//! and turned into glyph outlines.

use strict_num::NonZeroPositiveF32;
use svgtypes::FontFamily;

use super::converter::{Context, Tables};
use super::style;
use super::svgtree::{AId, SvgNode};
use crate::{Font, FontStretch, Group, Node, ShapeRendering, Text, TextSpan};

/// Positioning that applies to the next character.
#[derive(Clone, Copy, Default)]
struct Cursor {
    x: Option<f32>,
    y: Option<f32>,
    dx: f32,
    dy: f32,
}

pub(crate) fn convert(node: SvgNode, ctx: &Context, tables: &mut Tables, out: &mut Group) {
    let mut spans = Vec::new();
    let mut cursor = Cursor::default();
    collect(node, ctx, tables, &mut cursor, &mut spans);
    if spans.is_empty() {
        return;
    }

    #[allow(unused_mut)]
    let mut text = Text {
        id: node.element_id().to_string(),
        rendering_mode: ShapeRendering::from_text_rendering(node, ctx.opt.shape_rendering),
        spans,
        flattened: None,
    };

    #[cfg(feature = "text")]
    {
        text.flattened = outline::flatten(&text, &ctx.opt.fontdb).map(Box::new);
    }

    out.children.push(Node::Text(Box::new(text)));
}

fn collect(
    element: SvgNode,
    ctx: &Context,
    tables: &mut Tables,
    cursor: &mut Cursor,
    spans: &mut Vec<TextSpan>,
) {
    // Per-character lists are not supported, only the first value is used.
    let first = |aid| ctx.length_list(element, aid).and_then(|l| l.first().copied());
    if let Some(x) = first(AId::X) {
        cursor.x = Some(x);
    }
    if let Some(y) = first(AId::Y) {
        cursor.y = Some(y);
    }
    cursor.dx += first(AId::Dx).unwrap_or(0.0);
    cursor.dy += first(AId::Dy).unwrap_or(0.0);

    for child in element.children() {
        if child.is_text() {
            if child.text().is_empty() {
                continue;
            }

            if let Some(span) = new_span(element, child.text(), *cursor, ctx, tables) {
                spans.push(span);
                *cursor = Cursor::default();
            }
        } else if child.attribute::<&str>(AId::Display) != Some("none") {
            collect(child, ctx, tables, cursor, spans);
        }
    }
}

fn new_span(
    element: SvgNode,
    text: &str,
    cursor: Cursor,
    ctx: &Context,
    tables: &mut Tables,
) -> Option<TextSpan> {
    let font_size = match NonZeroPositiveF32::new(ctx.font_size(element)) {
        Some(size) => size,
        None => {
            log::warn!("A text span with a zero font size. Skipped.");
            return None;
        }
    };

    Some(TextSpan {
        text: text.to_string(),
        x: cursor.x,
        y: cursor.y,
        dx: cursor.dx,
        dy: cursor.dy,
        anchor: element.find_attribute(AId::TextAnchor).unwrap_or_default(),
        font: resolve_font(element, ctx),
        font_size,
        // Glyphs always have an area.
        fill: style::resolve_fill(element, true, ctx, tables),
        stroke: style::resolve_stroke(element, true, ctx, tables),
        paint_order: style::resolve_paint_order(element),
        visibility: element.find_attribute(AId::Visibility).unwrap_or_default(),
    })
}

fn resolve_font(node: SvgNode, ctx: &Context) -> Font {
    let mut families = match node.find_attribute::<&str>(AId::FontFamily) {
        Some(value) => svgtypes::parse_font_families(value).unwrap_or_else(|_| {
            log::warn!("Invalid {} value: '{}'.", AId::FontFamily, value);
            Vec::new()
        }),
        None => Vec::new(),
    };
    families.push(FontFamily::Named(ctx.opt.font_family.clone()));

    Font {
        families,
        style: node.find_attribute(AId::FontStyle).unwrap_or_default(),
        stretch: font_stretch(node),
        weight: font_weight(node),
    }
}

fn font_stretch(node: SvgNode) -> FontStretch {
    match node.find_attribute::<&str>(AId::FontStretch) {
        Some("ultra-condensed") => FontStretch::UltraCondensed,
        Some("extra-condensed") => FontStretch::ExtraCondensed,
        Some("condensed") | Some("narrower") => FontStretch::Condensed,
        Some("semi-condensed") => FontStretch::SemiCondensed,
        Some("semi-expanded") => FontStretch::SemiExpanded,
        Some("expanded") | Some("wider") => FontStretch::Expanded,
        Some("extra-expanded") => FontStretch::ExtraExpanded,
        Some("ultra-expanded") => FontStretch::UltraExpanded,
        _ => FontStretch::Normal,
    }
}

/// Computes `font-weight` from the root down, so relative values can apply.
fn font_weight(node: SvgNode) -> u16 {
    let mut values: Vec<&str> = node
        .ancestors()
        .filter_map(|n| n.try_attribute(AId::FontWeight))
        .collect();
    values.reverse();

    values.into_iter().fold(400, |weight, value| match value {
        "normal" => 400,
        "bold" => 700,
        // Browsers jump from 400 straight to 700 and 200.
        "bolder" if weight == 400 => 700,
        "bolder" => (weight + 100).min(900),
        "lighter" if weight == 400 => 200,
        "lighter" => weight.saturating_sub(100).max(100),
        _ => match value.parse::<u16>() {
            Ok(n) if (1..=1000).contains(&n) => n,
            _ => weight,
        },
    })
}

#[cfg(feature = "text")]
mod outline {
    use std::sync::Arc;

    use svgtypes::FontFamily;

    use crate::{
        Font, FontStretch, FontStyle, Group, Node, Path, PathBuilder, Text, TextAnchor,
        Transform,
    };

    /// A line segment whose spans share one anchor.
    struct Chunk {
        start: f32,
        end: f32,
        anchor: TextAnchor,
    }

    impl Chunk {
        fn shift(&self) -> f32 {
            let width = self.end - self.start;
            match self.anchor {
                TextAnchor::Start => 0.0,
                TextAnchor::Middle => -width / 2.0,
                TextAnchor::End => -width,
            }
        }
    }

    /// Converts spans into paths.
    ///
    /// Spans without a matching font are left out.
    pub(super) fn flatten(text: &Text, fontdb: &fontdb::Database) -> Option<Group> {
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut outlines = Vec::with_capacity(text.spans.len());
        let (mut x, mut y) = (0.0f32, 0.0f32);

        for span in &text.spans {
            // An absolute position starts a new chunk.
            let starts_chunk = chunks.is_empty() || span.x.is_some() || span.y.is_some();
            x = span.x.unwrap_or(x) + span.dx;
            y = span.y.unwrap_or(y) + span.dy;
            if starts_chunk {
                chunks.push(Chunk {
                    start: x,
                    end: x,
                    anchor: span.anchor,
                });
            }

            let mut builder = PathBuilder::new();
            if let Some(id) = query(&span.font, fontdb) {
                let size = span.font_size.get();
                let advance = fontdb.with_face_data(id, |data, index| {
                    outline_run(data, index, &span.text, size, (x, y), &mut builder)
                });
                x += advance.flatten().unwrap_or(0.0);
            }

            let chunk = chunks.len() - 1;
            chunks[chunk].end = x;
            outlines.push((chunk, builder));
        }

        let mut group = Group {
            id: text.id.clone(),
            ..Group::empty()
        };
        for (span, (chunk, builder)) in text.spans.iter().zip(outlines) {
            let shift = chunks[chunk].shift();
            let data = match builder.finish() {
                Some(data) if shift == 0.0 => data,
                Some(data) => match data.transform(Transform::from_translate(shift, 0.0)) {
                    Some(data) => data,
                    None => continue,
                },
                None => continue,
            };

            group.children.push(Node::Path(Box::new(Path {
                id: String::new(),
                visibility: span.visibility,
                fill: span.fill.clone(),
                stroke: span.stroke.clone(),
                paint_order: span.paint_order,
                rendering_mode: text.rendering_mode,
                data: Arc::new(data),
            })));
        }

        if !group.has_children() {
            return None;
        }

        group.calculate_bounding_box();
        Some(group)
    }

    fn query(font: &Font, fontdb: &fontdb::Database) -> Option<fontdb::ID> {
        let families: Vec<_> = font
            .families
            .iter()
            .map(|family| match family {
                FontFamily::Serif => fontdb::Family::Serif,
                FontFamily::SansSerif => fontdb::Family::SansSerif,
                FontFamily::Cursive => fontdb::Family::Cursive,
                FontFamily::Fantasy => fontdb::Family::Fantasy,
                FontFamily::Monospace => fontdb::Family::Monospace,
                FontFamily::Named(name) => fontdb::Family::Name(name),
            })
            .collect();

        let query = fontdb::Query {
            families: &families,
            weight: fontdb::Weight(font.weight),
            stretch: match font.stretch {
                FontStretch::UltraCondensed => fontdb::Stretch::UltraCondensed,
                FontStretch::ExtraCondensed => fontdb::Stretch::ExtraCondensed,
                FontStretch::Condensed => fontdb::Stretch::Condensed,
                FontStretch::SemiCondensed => fontdb::Stretch::SemiCondensed,
                FontStretch::Normal => fontdb::Stretch::Normal,
                FontStretch::SemiExpanded => fontdb::Stretch::SemiExpanded,
                FontStretch::Expanded => fontdb::Stretch::Expanded,
                FontStretch::ExtraExpanded => fontdb::Stretch::ExtraExpanded,
                FontStretch::UltraExpanded => fontdb::Stretch::UltraExpanded,
            },
            style: match font.style {
                FontStyle::Normal => fontdb::Style::Normal,
                FontStyle::Italic => fontdb::Style::Italic,
                FontStyle::Oblique => fontdb::Style::Oblique,
            },
        };

        let id = fontdb.query(&query);
        if id.is_none() {
            let names: Vec<String> = font.families.iter().map(|f| f.to_string()).collect();
            log::warn!("No font matches '{}'.", names.join(", "));
        }
        id
    }

    /// Outlines `text` starting at `origin`. Returns the advance.
    fn outline_run(
        data: &[u8],
        index: u32,
        text: &str,
        font_size: f32,
        origin: (f32, f32),
        builder: &mut PathBuilder,
    ) -> Option<f32> {
        let face = ttf_parser::Face::parse(data, index).ok()?;
        let scale = font_size / face.units_per_em() as f32;

        let mut x = origin.0;
        for c in text.chars() {
            let glyph = match face.glyph_index(c) {
                Some(glyph) => glyph,
                None => {
                    log::warn!("The font has no glyph for '{}'.", c);
                    continue;
                }
            };

            face.outline_glyph(
                glyph,
                &mut GlyphSink {
                    builder: &mut *builder,
                    scale,
                    origin: (x, origin.1),
                },
            );
            x += face.glyph_hor_advance(glyph).unwrap_or(0) as f32 * scale;
        }

        Some(x - origin.0)
    }

    /// Receives glyph outlines in font units, Y pointing up.
    struct GlyphSink<'a> {
        builder: &'a mut PathBuilder,
        scale: f32,
        origin: (f32, f32),
    }

    impl GlyphSink<'_> {
        fn map(&self, x: f32, y: f32) -> (f32, f32) {
            (self.origin.0 + x * self.scale, self.origin.1 - y * self.scale)
        }
    }

    impl ttf_parser::OutlineBuilder for GlyphSink<'_> {
        fn move_to(&mut self, x: f32, y: f32) {
            let (x, y) = self.map(x, y);
            self.builder.move_to(x, y);
        }

        fn line_to(&mut self, x: f32, y: f32) {
            let (x, y) = self.map(x, y);
            self.builder.line_to(x, y);
        }

        fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
            let (x1, y1) = self.map(x1, y1);
            let (x, y) = self.map(x, y);
            self.builder.quad_to(x1, y1, x, y);
        }

        fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
            let (x1, y1) = self.map(x1, y1);
            let (x2, y2) = self.map(x2, y2);
            let (x, y) = self.map(x, y);
            self.builder.cubic_to(x1, y1, x2, y2, x, y);
        }

        fn close(&mut self) {
            self.builder.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{converter, svgtree};
    use crate::Options;

    fn first_text(text: &str) -> Text {
        let xml = roxmltree::Document::parse(text).unwrap();
        let svg = svgtree::Document::parse(&xml, None).unwrap();
        let doc = converter::convert(&svg, &Options::default(), true).unwrap();
        match doc.root().children()[0] {
            Node::Text(ref t) => (**t).clone(),
            _ => panic!("expected a text"),
        }
    }

    #[test]
    fn relative_weights() {
        let text = first_text(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <g font-weight='bolder'>
                    <text>a<tspan font-weight='lighter'>b</tspan><tspan font-weight='950'>c</tspan></text>
                </g>
            </svg>",
        );
        let weights: Vec<u16> = text.spans.iter().map(|s| s.font.weight).collect();
        assert_eq!(weights, vec![700, 600, 950]);
    }

    #[test]
    fn position_applies_to_next_span() {
        let text = first_text(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <text x='5 6 7' dx='1'><tspan dx='2'>a</tspan>b</text>
            </svg>",
        );
        assert_eq!(text.spans.len(), 2);
        assert_eq!(text.spans[0].x, Some(5.0));
        assert_eq!(text.spans[0].dx, 3.0);
        assert_eq!(text.spans[1].x, None);
        assert_eq!(text.spans[1].dx, 0.0);
    }

    #[test]
    fn fallback_family_is_appended() {
        let text = first_text(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <text font-family='Arial, sans-serif' font-stretch='wider'>a</text>
            </svg>",
        );
        let font = &text.spans[0].font;
        assert_eq!(
            font.families,
            vec![
                FontFamily::Named("Arial".to_string()),
                FontFamily::SansSerif,
                FontFamily::Named("Times New Roman".to_string()),
            ]
        );
        assert_eq!(font.stretch, FontStretch::Expanded);
    }
}
