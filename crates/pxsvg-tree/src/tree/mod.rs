// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The resolved document model.
//!
//! Everything here is plain data: no XML, no CSS and no relative units.
//! Paint servers, clip paths and masks live in tables owned by [`Document`]
//! and nodes point into them by index.

// Generates trivial read-only accessors.
//
// `copy` returns the field by value, `borrow` returns a reference.
macro_rules! getters {
    ($owner:ty { $($(#[$doc:meta])* $kind:ident $field:ident: $ret:ty;)* }) => {
        impl $owner {
            $(getters!(@one $(#[$doc])* $kind $field: $ret);)*
        }
    };
    (@one $(#[$doc:meta])* copy $field:ident: $ret:ty) => {
        $(#[$doc])*
        #[inline]
        pub fn $field(&self) -> $ret {
            self.$field
        }
    };
    (@one $(#[$doc:meta])* borrow $field:ident: $ret:ty) => {
        $(#[$doc])*
        #[inline]
        pub fn $field(&self) -> &$ret {
            &self.$field
        }
    };
}

use std::sync::Arc;

mod effects;
mod geom;
mod image;
mod paint;
mod path;
mod server;
mod text;

pub use strict_num::{self, ApproxEqUlps, NonZeroPositiveF32, NormalizedF32, PositiveF32};
pub use svgtypes::{Align, AspectRatio};
pub use tiny_skia_path;

pub use self::effects::*;
pub use self::geom::*;
pub use self::image::*;
pub use self::paint::*;
pub use self::path::*;
pub use self::server::*;
pub use self::text::*;

pub(crate) use self::geom::{is_valid_length, Bounds};

/// A value in the 0..=1 range.
pub type Opacity = NormalizedF32;

/// The coordinate system a paint server, clip path or mask is defined in.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Units {
    UserSpaceOnUse,
    ObjectBoundingBox,
}

/// The `visibility` property.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
    Collapse,
}

/// The `shape-rendering` property.
///
/// `auto` is stored as `GeometricPrecision`.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum ShapeRendering {
    OptimizeSpeed,
    CrispEdges,
    #[default]
    GeometricPrecision,
}

impl ShapeRendering {
    /// Only `optimizeSpeed` and `crispEdges` disable anti-aliasing.
    pub fn use_shape_antialiasing(self) -> bool {
        self == ShapeRendering::GeometricPrecision
    }
}

macro_rules! table_index {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Returns the position inside the owning [`Document`] table.
            #[inline]
            pub fn get(&self) -> usize {
                self.0
            }
        }
    };
}

table_index!(
    /// An index into [`Document::paint_server`].
    PaintServerId
);
table_index!(
    /// An index into [`Document::clip_path`].
    ClipPathId
);
table_index!(
    /// An index into [`Document::mask`].
    MaskId
);

/// A renderable node.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub enum Node {
    Group(Box<Group>),
    Path(Box<Path>),
    Image(Box<Image>),
    Text(Box<Text>),
    Use(Box<Use>),
}

impl Node {
    /// The element ID. Empty for anonymous and instantiated nodes.
    pub fn id(&self) -> &str {
        match self {
            Node::Group(g) => &g.id,
            Node::Path(p) => &p.id,
            Node::Image(i) => &i.id,
            Node::Text(t) => &t.id,
            Node::Use(u) => &u.id,
        }
    }

    /// The transform this node adds on top of its parent.
    ///
    /// Always an identity for leaf nodes.
    pub fn transform(&self) -> Transform {
        match self {
            Node::Group(g) => g.transform,
            Node::Use(u) => u.transform,
            _ => Transform::default(),
        }
    }

    /// The object bounding box in the parent coordinate system.
    pub fn bounding_box(&self) -> Option<Rect> {
        let (rect, ts) = match self {
            Node::Path(p) => return Some(p.bounding_box()),
            Node::Image(i) => return Some(i.bounding_box()),
            Node::Text(t) => return t.bounding_box(),
            Node::Group(g) => (g.bounding_box?, g.transform),
            Node::Use(u) => (u.root.bounding_box?, u.transform),
        };

        rect.transform(ts)
    }

    fn subgroup(&self) -> Option<&Group> {
        match self {
            Node::Group(g) => Some(g),
            Node::Use(u) => Some(&u.root),
            _ => None,
        }
    }
}

/// A container node.
///
/// Created for `g` elements and for every element that needs its own
/// transform, opacity, clip path or mask.
#[derive(Clone, Debug)]
pub struct Group {
    pub(crate) id: String,
    pub(crate) transform: Transform,
    pub(crate) opacity: Opacity,
    pub(crate) clip_path: Option<ClipPathId>,
    pub(crate) mask: Option<MaskId>,
    pub(crate) bounding_box: Option<Rect>,
    pub(crate) children: Vec<Node>,
}

getters!(Group {
    /// The `g` element ID. Empty for implicit groups.
    borrow id: str;
    /// The group transform relative to its parent.
    copy transform: Transform;
    /// Group opacity, applied after the content is composed.
    copy opacity: Opacity;
    /// A clip path applied to the composed content.
    copy clip_path: Option<ClipPathId>;
    /// A mask applied to the composed content.
    copy mask: Option<MaskId>;
    /// The union of children bounding boxes, in group coordinates.
    ///
    /// `None` when the group has nothing with a size.
    copy bounding_box: Option<Rect>;
    /// Child nodes in rendering order.
    borrow children: [Node];
});

impl Group {
    pub(crate) fn empty() -> Self {
        Group {
            id: String::new(),
            transform: Transform::default(),
            opacity: Opacity::ONE,
            clip_path: None,
            mask: None,
            bounding_box: None,
            children: Vec::new(),
        }
    }

    /// Returns `true` when the group has at least one child.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Returns `true` when the content has to be composed on a separate layer.
    pub fn should_isolate(&self) -> bool {
        self.opacity != Opacity::ONE || self.clip_path.is_some() || self.mask.is_some()
    }

    /// Returns `true` when the group changes how its children are drawn.
    pub(crate) fn has_effect(&self) -> bool {
        self.should_isolate() || !self.transform.is_identity()
    }

    pub(crate) fn calculate_bounding_box(&mut self) {
        let mut bounds = Bounds::default();
        for rect in self.children.iter().filter_map(Node::bounding_box) {
            bounds.add_rect(rect);
        }

        self.bounding_box = bounds.to_rect();
    }
}

/// A filled and/or stroked shape.
///
/// Every basic shape and `path` element becomes one of these.
#[derive(Clone, Debug)]
pub struct Path {
    pub(crate) id: String,
    pub(crate) visibility: Visibility,
    pub(crate) fill: Option<Fill>,
    pub(crate) stroke: Option<Stroke>,
    pub(crate) paint_order: PaintOrder,
    pub(crate) rendering_mode: ShapeRendering,
    pub(crate) data: Arc<PathData>,
}

getters!(Path {
    /// The element ID.
    borrow id: str;
    /// `visibility`.
    copy visibility: Visibility;
    /// Whether the fill or the stroke goes first.
    copy paint_order: PaintOrder;
    /// `shape-rendering`.
    copy rendering_mode: ShapeRendering;
});

impl Path {
    /// `None` for `fill="none"`.
    pub fn fill(&self) -> Option<&Fill> {
        self.fill.as_ref()
    }

    /// `None` for `stroke="none"` and invalid strokes.
    pub fn stroke(&self) -> Option<&Stroke> {
        self.stroke.as_ref()
    }

    /// Segments in user coordinates.
    pub fn data(&self) -> &PathData {
        &self.data
    }

    /// Fill bounds. The stroke is not included.
    pub fn bounding_box(&self) -> Rect {
        self.data.bounds()
    }
}

/// An instantiated `use` element.
///
/// `root` holds a private copy of the referenced content with IDs removed.
#[derive(Clone, Debug)]
pub struct Use {
    pub(crate) id: String,
    pub(crate) transform: Transform,
    pub(crate) root: Group,
}

getters!(Use {
    /// The `use` element ID.
    borrow id: str;
    /// The element transform combined with the `x`/`y` offset.
    copy transform: Transform;
    /// The instantiated content.
    borrow root: Group;
});

/// A parsed SVG document.
///
/// Immutable once parsed. Can be shared between threads.
#[derive(Clone, Debug)]
pub struct Document {
    pub(crate) size: Option<Size>,
    pub(crate) view_box: ViewBox,
    pub(crate) root: Group,
    pub(crate) paint_servers: Vec<Option<PaintServer>>,
    pub(crate) clip_paths: Vec<ClipPath>,
    pub(crate) masks: Vec<Mask>,
}

getters!(Document {
    /// The intrinsic image size.
    ///
    /// `None` only for an empty document without a size and a `viewBox`.
    copy size: Option<Size>;
    /// The visible region of the user space.
    copy view_box: ViewBox;
    /// The top-level group.
    borrow root: Group;
    /// All clip paths, indexed by [`ClipPathId`].
    borrow clip_paths: [ClipPath];
    /// All masks, indexed by [`MaskId`].
    borrow masks: [Mask];
});

impl Document {
    /// Maps the document user space onto an image of [`Document::size`].
    pub fn root_transform(&self) -> Transform {
        self.size
            .map(|size| self.view_box.to_transform(size))
            .unwrap_or_default()
    }

    /// Returns a paint server. `None` when it failed to resolve.
    pub fn paint_server(&self, id: PaintServerId) -> Option<&PaintServer> {
        self.paint_servers.get(id.0).and_then(Option::as_ref)
    }

    /// Returns a clip path.
    pub fn clip_path(&self, id: ClipPathId) -> Option<&ClipPath> {
        self.clip_paths.get(id.0)
    }

    /// Returns a mask.
    pub fn mask(&self, id: MaskId) -> Option<&Mask> {
        self.masks.get(id.0)
    }

    /// Finds a node by its element ID.
    ///
    /// Searches the main tree and `use` instances. An empty ID never matches.
    pub fn node_by_id(&self, id: &str) -> Option<&Node> {
        if id.is_empty() {
            return None;
        }

        let mut stack = vec![&self.root];
        while let Some(group) = stack.pop() {
            for node in &group.children {
                if node.id() == id {
                    return Some(node);
                }
            }

            stack.extend(group.children.iter().rev().filter_map(Node::subgroup));
        }

        None
    }

    /// Returns `true` when the document, or an SVG image inside it, has text.
    pub fn has_text_nodes(&self) -> bool {
        fn visit(group: &Group) -> bool {
            group.children.iter().any(|node| match node {
                Node::Text(_) => true,
                Node::Image(i) => matches!(i.kind, ImageKind::SVG(ref doc) if doc.has_text_nodes()),
                Node::Path(_) => false,
                Node::Group(_) | Node::Use(_) => node.subgroup().map_or(false, visit),
            })
        }

        visit(&self.root)
    }
}
