// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! `text` element content and whitespace handling.
//!
//! <https://www.w3.org/TR/SVG11/text.html#WhiteSpace>

use super::parse::{svg_tag, Builder, MAX_DEPTH};
use super::{AId, Document, EId, NodeId, NodeKind, SvgNode};
use crate::Error;

#[derive(Clone, Copy, PartialEq, Debug)]
enum Space {
    Default,
    Preserve,
}

fn xml_space(node: SvgNode) -> Option<Space> {
    node.attribute::<&str>(AId::Space).map(|v| match v {
        "preserve" => Space::Preserve,
        _ => Space::Default,
    })
}

/// Appends text nodes and `tspan`s of a `text` element.
pub(super) fn build<'a>(
    b: &mut Builder<'_, '_, 'a>,
    xml: roxmltree::Node<'_, 'a>,
    text_id: NodeId,
    depth: usize,
    instance: bool,
) -> Result<(), Error> {
    let space = b
        .doc
        .node(text_id)
        .ancestors()
        .find_map(xml_space)
        .unwrap_or(Space::Default);

    let mut runs = Vec::new();
    let mut ctx = Content {
        b: &mut *b,
        instance,
        runs: &mut runs,
    };
    ctx.append(xml, text_id, space, depth)?;
    trim_runs(&mut b.doc, &runs);
    Ok(())
}

struct Content<'b, 'r, 's, 'x, 'a> {
    b: &'b mut Builder<'s, 'x, 'a>,
    instance: bool,
    runs: &'r mut Vec<(NodeId, Space)>,
}

impl<'a> Content<'_, '_, '_, '_, 'a> {
    fn append(
        &mut self,
        xml: roxmltree::Node<'_, 'a>,
        parent: NodeId,
        space: Space,
        depth: usize,
    ) -> Result<(), Error> {
        if depth > MAX_DEPTH {
            return Err(Error::TooComplex);
        }

        for child in xml.children() {
            if child.is_text() {
                let text = collapse(child.text().unwrap_or_default(), space);
                let id = self.b.push_text(parent, text)?;
                self.runs.push((id, space));
            } else if matches!(svg_tag(child), Some(EId::Tspan) | Some(EId::A)) {
                let id = self.b.push_element(child, parent, EId::Tspan, self.instance)?;
                let space = xml_space(self.b.doc.node(id)).unwrap_or(space);
                self.append(child, id, space, depth + 1)?;
                self.b.close(id);
            }
        }

        Ok(())
    }
}

/// Converts newlines and tabs to spaces and, unless preserved,
/// squashes runs of spaces.
fn collapse(text: &str, space: Space) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let c = if matches!(c, '\r' | '\n' | '\t') { ' ' } else { c };
        if space == Space::Default && c == ' ' && out.ends_with(' ') {
            continue;
        }

        out.push(c);
    }

    out
}

fn text_mut<'b>(doc: &'b mut Document<'_>, id: NodeId) -> Option<&'b mut String> {
    match doc.nodes[id.index()].kind {
        NodeKind::Text(ref mut text) => Some(text),
        _ => None,
    }
}

/// Collapses spaces across run boundaries and strips the element edges.
///
/// Each run is already collapsed, so a single space is the most
/// that can be left on either side of a run.
fn trim_runs(doc: &mut Document, runs: &[(NodeId, Space)]) {
    let mut after_space = false;
    for &(id, space) in runs {
        if let Some(text) = text_mut(doc, id) {
            if after_space && space == Space::Default && text.starts_with(' ') {
                text.remove(0);
            }

            if !text.is_empty() {
                after_space = text.ends_with(' ');
            }
        }
    }

    let mut non_empty = runs.iter().filter(|(id, _)| !doc.node(*id).text().is_empty());
    let first = non_empty.next().copied();
    let last = non_empty.last().copied().or(first);

    if let Some((id, Space::Default)) = first {
        if let Some(text) = text_mut(doc, id).filter(|t| t.starts_with(' ')) {
            text.remove(0);
        }
    }

    if let Some((id, Space::Default)) = last {
        if let Some(text) = text_mut(doc, id).filter(|t| t.ends_with(' ')) {
            text.pop();
        }
    }
}
