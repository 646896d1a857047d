// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::borrow::Cow;
use std::collections::HashMap;
use std::str::FromStr;

use simplecss::{Declaration, StyleSheet};

use super::{AId, Attr, Document, EId, NodeData, NodeId, NodeKind};
use crate::Error;

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Maximum element nesting, `use` instances included.
pub(super) const MAX_DEPTH: usize = 100;
/// Maximum number of nodes, `use` instances included.
pub(super) const MAX_NODES: usize = 1_000_000;

/// Elements with an `id`, first occurrence wins.
pub(super) type Links<'x, 'a> = HashMap<&'x str, roxmltree::Node<'x, 'a>>;

impl<'a> Document<'a> {
    /// Builds a tree from XML.
    ///
    /// `style_sheet` is applied after the `style` elements of the document.
    pub fn parse(xml: &roxmltree::Document<'a>, style_sheet: Option<&str>) -> Result<Self, Error> {
        let root = xml.root_element();
        if svg_tag(root) != Some(EId::Svg) {
            return Err(Error::UnsupportedVersion);
        }

        let css = collect_css(xml, style_sheet);
        let mut links = Links::new();
        for node in xml.descendants() {
            if let Some(id) = node.attribute("id") {
                links.entry(id).or_insert(node);
            }
        }

        super::cycles::check(xml, &links, &css)?;

        let mut builder = Builder {
            doc: Document {
                nodes: vec![NodeData {
                    parent: None,
                    end: 1,
                    kind: NodeKind::Root,
                }],
                attrs: Vec::new(),
                ids: HashMap::new(),
            },
            css: &css,
            links: &links,
        };

        let root_id = NodeId::from_index(0);
        builder.element(root, root_id, 0, false)?;
        builder.close(root_id);
        Ok(builder.doc)
    }

    fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(NodeData {
            parent: Some(parent),
            end: self.nodes.len() as u32 + 1,
            kind,
        });
        id
    }
}

pub(super) struct Builder<'s, 'x, 'a> {
    pub doc: Document<'a>,
    css: &'s StyleSheet<'s>,
    links: &'s Links<'x, 'a>,
}

impl<'s, 'x, 'a> Builder<'s, 'x, 'a> {
    /// Appends an element and its content.
    ///
    /// `instance` is set inside `use` copies, which must not carry IDs.
    fn element(
        &mut self,
        xml: roxmltree::Node<'_, 'a>,
        parent: NodeId,
        depth: usize,
        instance: bool,
    ) -> Result<(), Error> {
        if depth > MAX_DEPTH {
            return Err(Error::TooComplex);
        }

        let tag = match svg_tag(xml) {
            None | Some(EId::Style) => return Ok(()),
            Some(EId::A) => EId::G,
            Some(tag) => tag,
        };

        let id = self.push_element(xml, parent, tag, instance)?;
        match tag {
            EId::Text => super::text::build(self, xml, id, depth + 1, instance)?,
            EId::Use => {
                let link = resolve_href(xml, self.links);
                if let Some(link) = link {
                    self.element(link, id, depth + 1, true)?;
                }
            }
            _ => {
                for child in xml.children() {
                    self.element(child, id, depth + 1, instance)?;
                }
            }
        }

        self.close(id);
        Ok(())
    }

    /// Marks the end of a subtree. Must follow the last descendant.
    pub fn close(&mut self, id: NodeId) {
        self.doc.nodes[id.index()].end = self.doc.nodes.len() as u32;
    }

    pub fn push_text(&mut self, parent: NodeId, text: String) -> Result<NodeId, Error> {
        self.check_size()?;
        Ok(self.doc.append(parent, NodeKind::Text(text)))
    }

    pub fn push_element(
        &mut self,
        xml: roxmltree::Node<'_, 'a>,
        parent: NodeId,
        tag: EId,
        instance: bool,
    ) -> Result<NodeId, Error> {
        self.check_size()?;

        let mut values = Cascade::default();
        for attr in xml.attributes() {
            if !matches!(attr.namespace(), None | Some(SVG_NS) | Some(XLINK_NS) | Some(XML_NS)) {
                continue;
            }

            let aid = match AId::from_str(attr.name()) {
                Some(aid) => aid,
                None => continue,
            };

            let skip = match aid {
                // Replaced by their declarations.
                AId::Style | AId::Class => true,
                AId::Id => instance,
                AId::Href => tag == EId::Tspan,
                _ => false,
            };
            if skip {
                continue;
            }

            let value = match attr.value_storage() {
                roxmltree::StringStorage::Borrowed(s) => Cow::Borrowed(*s),
                roxmltree::StringStorage::Owned(s) => Cow::Owned(s.to_string()),
            };
            values.set(aid, value);
        }

        let mut rules: Vec<_> = self
            .css
            .rules
            .iter()
            .filter(|rule| rule.selector.matches(&XmlElement(xml)))
            .collect();
        // Stable, so equal specificity keeps the source order.
        rules.sort_by_key(|rule| rule.selector.specificity());

        let declarations = rules.iter().flat_map(|rule| rule.declarations.iter());
        for d in declarations.clone().filter(|d| !d.important) {
            values.declare(d);
        }

        if let Some(style) = xml.attribute("style") {
            for d in simplecss::DeclarationTokenizer::from(style) {
                values.declare(&d);
            }
        }

        for d in declarations.filter(|d| d.important) {
            values.declare(d);
        }

        let start = self.doc.attrs.len() as u32;
        for (name, value) in values.0 {
            let value = if value == "inherit" {
                match self.inherited_value(parent, name) {
                    Some(v) => v,
                    None => continue,
                }
            } else {
                value
            };

            self.doc.attrs.push(Attr { name, value });
        }

        let attrs = (start, self.doc.attrs.len() as u32);
        let id = self.doc.append(parent, NodeKind::Element { tag, attrs });
        if !instance {
            let element_id = self.doc.node(id).element_id();
            if !element_id.is_empty() && !self.doc.ids.contains_key(element_id) {
                let key = element_id.to_string();
                self.doc.ids.insert(key, id);
            }
        }

        Ok(id)
    }

    fn check_size(&self) -> Result<(), Error> {
        if self.doc.nodes.len() >= MAX_NODES {
            Err(Error::TooComplex)
        } else {
            Ok(())
        }
    }

    /// Resolves `inherit` against already built ancestors.
    fn inherited_value(&self, parent: NodeId, aid: AId) -> Option<Cow<'a, str>> {
        let property = aid.property()?;
        let parent = self.doc.node(parent);
        let source = if property.inherited {
            parent.ancestors().find(|n| n.has_attribute(aid))
        } else {
            Some(parent).filter(|n| n.has_attribute(aid))
        };

        match source {
            Some(node) => self
                .doc
                .attrs_of(node.id)
                .iter()
                .find(|a| a.name == aid)
                .map(|a| a.value.clone()),
            None => property.initial.map(Cow::Borrowed),
        }
    }
}

/// Attribute values of one element in cascade order.
#[derive(Default)]
struct Cascade<'a>(Vec<(AId, Cow<'a, str>)>);

impl<'a> Cascade<'a> {
    fn set(&mut self, aid: AId, value: Cow<'a, str>) {
        match self.0.iter_mut().find(|(name, _)| *name == aid) {
            Some(entry) => entry.1 = value,
            None => self.0.push((aid, value)),
        }
    }

    /// Applies a CSS declaration. Only properties can be set this way.
    fn declare(&mut self, d: &Declaration) {
        if d.name == "font" {
            self.declare_font(d.value);
            return;
        }

        if let Some(aid) = AId::from_str(d.name) {
            if aid.property().is_some() {
                self.set(aid, Cow::Owned(d.value.to_string()));
            }
        }
    }

    fn declare_font(&mut self, value: &str) {
        let font = match svgtypes::FontShorthand::from_str(value) {
            Ok(v) => v,
            Err(_) => {
                log::warn!("Failed to parse {} value: '{}'.", AId::Font, value);
                return;
            }
        };

        // Omitted parts of the shorthand are reset.
        let parts = [
            (AId::FontStyle, font.font_style),
            (AId::FontVariant, font.font_variant),
            (AId::FontWeight, font.font_weight),
            (AId::FontStretch, font.font_stretch),
            (AId::FontSize, Some(font.font_size)),
            (AId::FontFamily, Some(font.font_family)),
        ];
        for (aid, part) in parts {
            self.set(aid, Cow::Owned(part.unwrap_or("normal").to_string()));
        }
    }
}

pub(super) fn svg_tag(node: roxmltree::Node) -> Option<EId> {
    if node.is_element() && node.tag_name().namespace() == Some(SVG_NS) {
        EId::from_str(node.tag_name().name())
    } else {
        None
    }
}

pub(super) fn resolve_href<'x, 'a>(
    node: roxmltree::Node<'_, 'a>,
    links: &Links<'x, 'a>,
) -> Option<roxmltree::Node<'x, 'a>> {
    let value = node
        .attribute((XLINK_NS, "href"))
        .or_else(|| node.attribute("href"))?;
    let id = svgtypes::IRI::from_str(value).ok()?.0;
    links.get(id).copied()
}

/// Returns the value a property would have on `node` after the cascade,
/// without `inherit` resolution.
pub(super) fn cascaded_value(
    node: roxmltree::Node,
    name: &str,
    css: &StyleSheet,
) -> Option<String> {
    let from_style = node.attribute("style").and_then(|style| {
        simplecss::DeclarationTokenizer::from(style)
            .filter(|d| d.name == name)
            .last()
    });
    if let Some(d) = from_style {
        return Some(d.value.to_string());
    }

    let from_css = css
        .rules
        .iter()
        .filter(|rule| rule.selector.matches(&XmlElement(node)))
        .flat_map(|rule| rule.declarations.iter())
        .filter(|d| d.name == name)
        .last();
    match from_css {
        Some(d) => Some(d.value.to_string()),
        None => node.attribute(name).map(str::to_string),
    }
}

fn collect_css<'s>(xml: &'s roxmltree::Document, injected: Option<&'s str>) -> StyleSheet<'s> {
    let mut css = StyleSheet::new();
    for node in xml.descendants().filter(|n| svg_tag(*n) == Some(EId::Style)) {
        if !matches!(node.attribute("type"), None | Some("text/css")) {
            continue;
        }

        if let Some(text) = node.text() {
            css.parse_more(text);
        }
    }

    if let Some(text) = injected {
        css.parse_more(text);
    }

    css
}

struct XmlElement<'x, 'a>(roxmltree::Node<'x, 'a>);

impl simplecss::Element for XmlElement<'_, '_> {
    fn parent_element(&self) -> Option<Self> {
        self.0.parent_element().map(XmlElement)
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.0.prev_sibling_element().map(XmlElement)
    }

    fn has_local_name(&self, name: &str) -> bool {
        self.0.tag_name().name() == name
    }

    fn attribute_matches(&self, name: &str, operator: simplecss::AttributeOperator) -> bool {
        self.0.attribute(name).map_or(false, |v| operator.matches(v))
    }

    fn pseudo_class_matches(&self, class: simplecss::PseudoClass) -> bool {
        // Nothing is hovered or focused in a static image.
        class == simplecss::PseudoClass::FirstChild && self.0.prev_sibling_element().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::svgtree::SvgNode;

    fn with_tree(text: &str, f: impl FnOnce(&Document)) {
        let xml = roxmltree::Document::parse(text).unwrap();
        let doc = Document::parse(&xml, None).unwrap();
        f(&doc);
    }

    fn fill(node: SvgNode) -> Option<&str> {
        node.attribute(AId::Fill)
    }

    #[test]
    fn css_specificity_and_important() {
        with_tree(
            "<svg xmlns='http://www.w3.org/2000/svg'>
                <style>
                    #r1 { fill: green }
                    rect { fill: red }
                    .imp { fill: blue !important }
                </style>
                <rect id='r1'/>
                <rect id='r2' class='imp' style='fill:yellow'/>
            </svg>",
            |doc| {
                assert_eq!(fill(doc.element_by_id("r1").unwrap()), Some("green"));
                assert_eq!(fill(doc.element_by_id("r2").unwrap()), Some("blue"));
            },
        );
    }

    #[test]
    fn inherit_keyword() {
        with_tree(
            "<svg xmlns='http://www.w3.org/2000/svg'>
                <g stroke='red' opacity='0.5'>
                    <g>
                        <rect id='r' stroke='inherit' opacity='inherit' fill='inherit'/>
                    </g>
                </g>
            </svg>",
            |doc| {
                let rect = doc.element_by_id("r").unwrap();
                assert_eq!(rect.attribute::<&str>(AId::Stroke), Some("red"));
                // Not inherited and the direct parent has none.
                assert_eq!(rect.attribute::<&str>(AId::Opacity), Some("1"));
                assert_eq!(fill(rect), Some("black"));
            },
        );
    }

    #[test]
    fn font_shorthand() {
        with_tree(
            "<svg xmlns='http://www.w3.org/2000/svg'>
                <text id='t' font-weight='bold' style='font: italic 12px serif'/>
            </svg>",
            |doc| {
                let text = doc.element_by_id("t").unwrap();
                assert_eq!(text.attribute::<&str>(AId::FontStyle), Some("italic"));
                assert_eq!(text.attribute::<&str>(AId::FontWeight), Some("normal"));
                assert_eq!(text.attribute::<&str>(AId::FontFamily), Some("serif"));
            },
        );
    }

    #[test]
    fn use_copies_have_no_ids() {
        with_tree(
            "<svg xmlns='http://www.w3.org/2000/svg'>
                <rect id='r'/>
                <use id='u' href='#r'/>
            </svg>",
            |doc| {
                let rect = doc.element_by_id("r").unwrap();
                let copy = doc.element_by_id("u").unwrap().first_child().unwrap();
                assert_eq!(copy.tag_name(), Some(EId::Rect));
                assert_ne!(copy, rect);
                assert_eq!(copy.element_id(), "");
            },
        );
    }

    #[test]
    fn links_become_groups() {
        with_tree(
            "<svg xmlns='http://www.w3.org/2000/svg'><a id='a'/></svg>",
            |doc| assert_eq!(doc.element_by_id("a").unwrap().tag_name(), Some(EId::G)),
        );
    }
}
