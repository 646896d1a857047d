// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A compact, style-resolved view of the SVG XML.
//!
//! Nodes are stored in document order and every node knows where its
//! subtree ends, so children and descendants are plain index walks.
//! Attributes hold their cascaded values: CSS and `style` are already
//! applied and `inherit` is replaced.

use std::borrow::Cow;
use std::collections::HashMap;
use std::num::NonZeroU32;

mod cycles;
mod names;
mod parse;
mod text;
mod values;

pub use names::{AId, EId};
pub(crate) use values::AttrValue;

/// A parsed SVG tree.
#[derive(Debug)]
pub struct Document<'a> {
    nodes: Vec<NodeData>,
    attrs: Vec<Attr<'a>>,
    ids: HashMap<String, NodeId>,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct NodeId(NonZeroU32);

impl NodeId {
    fn from_index(index: usize) -> Self {
        // Callers never exceed `MAX_NODES`, far below `u32::MAX`.
        NodeId(NonZeroU32::MIN.saturating_add(index as u32))
    }

    fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

#[derive(Debug)]
struct NodeData {
    parent: Option<NodeId>,
    /// One past the last node of the subtree.
    end: u32,
    kind: NodeKind,
}

#[derive(Debug)]
enum NodeKind {
    Root,
    Element { tag: EId, attrs: (u32, u32) },
    Text(String),
}

#[derive(Clone, Debug)]
struct Attr<'a> {
    name: AId,
    value: Cow<'a, str>,
}

impl<'a> Document<'a> {
    fn node(&self, id: NodeId) -> SvgNode<'_> {
        SvgNode { doc: self, id }
    }

    /// Returns the `svg` element.
    pub fn root_element(&self) -> Option<SvgNode<'_>> {
        self.node(NodeId::from_index(0)).first_element_child()
    }

    /// Looks up an element by its `id` attribute.
    ///
    /// Elements instantiated by `use` have no IDs and are never returned.
    pub fn element_by_id(&self, id: &str) -> Option<SvgNode<'_>> {
        self.ids.get(id).map(|&node_id| self.node(node_id))
    }

    /// The number of nodes, including the root and text nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    fn attrs_of(&self, id: NodeId) -> &[Attr<'a>] {
        match self.nodes[id.index()].kind {
            NodeKind::Element { attrs: (start, end), .. } => &self.attrs[start as usize..end as usize],
            _ => &[],
        }
    }
}

/// A node handle.
#[derive(Clone, Copy)]
pub struct SvgNode<'a> {
    doc: &'a Document<'a>,
    id: NodeId,
}

impl PartialEq for SvgNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && std::ptr::eq(self.doc, other.doc)
    }
}

impl std::fmt::Debug for SvgNode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.data().kind {
            NodeKind::Root => f.write_str("Root"),
            NodeKind::Element { tag, .. } => write!(f, "<{} #{}>", tag, self.element_id()),
            NodeKind::Text(ref text) => write!(f, "{:?}", text),
        }
    }
}

impl<'a> SvgNode<'a> {
    fn data(&self) -> &'a NodeData {
        &self.doc.nodes[self.id.index()]
    }

    pub(crate) fn node_id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &'a Document<'a> {
        self.doc
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data().kind, NodeKind::Element { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self.data().kind, NodeKind::Text(_))
    }

    /// `None` for the root and text nodes.
    pub fn tag_name(&self) -> Option<EId> {
        match self.data().kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// The `id` attribute or an empty string.
    pub fn element_id(&self) -> &'a str {
        self.raw_attribute(AId::Id).unwrap_or_default()
    }

    /// A text node content, or the content of the first child of an element.
    pub fn text(&self) -> &'a str {
        let node = match self.data().kind {
            NodeKind::Element { .. } => match self.first_child() {
                Some(child) => child,
                None => return "",
            },
            _ => *self,
        };

        match node.data().kind {
            NodeKind::Text(ref text) => text,
            _ => "",
        }
    }

    fn raw_attribute(&self, aid: AId) -> Option<&'a str> {
        self.doc
            .attrs_of(self.id)
            .iter()
            .find(|a| a.name == aid)
            .map(|a| a.value.as_ref())
    }

    pub fn has_attribute(&self, aid: AId) -> bool {
        self.raw_attribute(aid).is_some()
    }

    /// Parses an attribute. Invalid values are logged and treated as missing.
    pub fn attribute<T: AttrValue<'a>>(&self, aid: AId) -> Option<T> {
        let value = self.raw_attribute(aid)?;
        let parsed = T::parse(*self, aid, value);
        if parsed.is_none() {
            log::warn!("Failed to parse {} value: '{}'.", aid, value);
        }

        parsed
    }

    /// Like [`SvgNode::attribute`], but silent.
    pub fn try_attribute<T: AttrValue<'a>>(&self, aid: AId) -> Option<T> {
        T::parse(*self, aid, self.raw_attribute(aid)?)
    }

    /// Returns the node a property value is taken from.
    ///
    /// Inherited properties are looked up on ancestors too,
    /// everything else only on the node itself.
    pub fn find_node_with(&self, aid: AId) -> Option<SvgNode<'a>> {
        if aid.property().map_or(false, |p| p.inherited) {
            self.ancestors().find(|n| n.has_attribute(aid))
        } else if self.has_attribute(aid) {
            Some(*self)
        } else {
            None
        }
    }

    /// Parses a property value, following inheritance.
    pub fn find_attribute<T: AttrValue<'a>>(&self, aid: AId) -> Option<T> {
        self.find_node_with(aid)?.attribute(aid)
    }

    pub fn parent(&self) -> Option<SvgNode<'a>> {
        self.data().parent.map(|id| self.doc.node(id))
    }

    pub fn parent_element(&self) -> Option<SvgNode<'a>> {
        self.parent().filter(SvgNode::is_element)
    }

    /// This node and then its ancestors, up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = SvgNode<'a>> {
        std::iter::successors(Some(*self), SvgNode::parent)
    }

    pub fn has_children(&self) -> bool {
        self.data().end as usize > self.id.index() + 1
    }

    pub fn first_child(&self) -> Option<SvgNode<'a>> {
        if self.has_children() {
            Some(self.doc.node(NodeId::from_index(self.id.index() + 1)))
        } else {
            None
        }
    }

    pub fn first_element_child(&self) -> Option<SvgNode<'a>> {
        self.children().find(SvgNode::is_element)
    }

    pub fn children(&self) -> Children<'a> {
        Children {
            doc: self.doc,
            next: self.id.index() as u32 + 1,
            end: self.data().end,
        }
    }

    /// This node and all of its descendants in document order.
    pub fn descendants(&self) -> impl Iterator<Item = SvgNode<'a>> {
        let doc = self.doc;
        (self.id.index()..self.data().end as usize).map(move |i| doc.node(NodeId::from_index(i)))
    }

    /// This node and then the elements reachable through `href` links.
    ///
    /// Stops before revisiting a node.
    pub fn href_iter(&self) -> HrefIter<'a> {
        HrefIter {
            next: Some(*self),
            visited: Vec::new(),
        }
    }
}

/// Direct children of a node.
#[derive(Clone, Debug)]
pub struct Children<'a> {
    doc: &'a Document<'a>,
    next: u32,
    end: u32,
}

impl<'a> Iterator for Children<'a> {
    type Item = SvgNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }

        let index = self.next as usize;
        self.next = self.doc.nodes[index].end;
        Some(self.doc.node(NodeId::from_index(index)))
    }
}

/// Template references followed through `href`.
#[derive(Clone, Debug)]
pub struct HrefIter<'a> {
    next: Option<SvgNode<'a>>,
    visited: Vec<NodeId>,
}

impl<'a> Iterator for HrefIter<'a> {
    type Item = SvgNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next.take()?;
        self.visited.push(node.id);
        self.next = node
            .attribute::<SvgNode>(AId::Href)
            .filter(|link| !self.visited.contains(&link.id));
        Some(node)
    }
}
