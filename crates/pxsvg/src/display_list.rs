// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Conversion of a [`Document`] into a flat list of draw operations.

use std::collections::HashMap;
use std::sync::Arc;

use pxsvg_tree::{
    ClipPathId, Document, FillRule, Group, Image, ImageKind, ImageRendering, MaskId, MaskType,
    Node, NonZeroRect, Paint, PaintOrder, PaintServer, Path, Pattern, Rect, Transform, Units,
    Visibility,
};

use crate::flatten::{self, Polyline, FLATTEN_TOLERANCE};
use crate::paint_server::{self, PatternShader, Shader};
use crate::pixmap::{FilterQuality, Pixmap};
use crate::OptionLog;

/// The maximum number of nested patterns.
pub const MAX_PATTERN_DEPTH: usize = 8;

/// A paint resolving error.
///
/// Paint errors never abort rendering. The affected shape is skipped.
#[derive(Clone, PartialEq, Debug)]
pub enum PaintError {
    /// A pattern references itself directly or indirectly.
    ///
    /// Contains the ID of the pattern that closes the cycle.
    CyclicPattern(String),

    /// Patterns are nested deeper than [`MAX_PATTERN_DEPTH`].
    ///
    /// Contains the ID of the pattern that exceeds the limit.
    PatternTooDeep(String),

    /// A paint server, clip path or mask cannot be resolved.
    UnresolvedReference,
}

impl std::fmt::Display for PaintError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            PaintError::CyclicPattern(ref id) => {
                write!(f, "pattern '{}' references itself", id)
            }
            PaintError::PatternTooDeep(ref id) => {
                write!(f, "pattern '{}' is nested too deep", id)
            }
            PaintError::UnresolvedReference => {
                write!(f, "a paint reference cannot be resolved")
            }
        }
    }
}

impl std::error::Error for PaintError {}

/// An index of a clip shape in a [`DisplayList`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ClipRef(usize);

/// A filled polygon set.
#[derive(Clone, Debug)]
pub struct FillOp {
    /// Device-space polygons.
    pub polygons: Vec<Polyline>,
    pub rule: FillRule,
    pub shader: Shader,
    pub opacity: f32,
    pub anti_alias: bool,
    pub clip: Option<ClipRef>,
}

/// An offscreen layer.
///
/// Its content is clipped, masked and then blended with the given opacity.
#[derive(Clone, Debug)]
pub struct Layer {
    pub opacity: f32,
    pub clip: Option<ClipRef>,
    pub mask: Option<Box<MaskOp>>,
}

#[derive(Clone, Debug)]
pub struct MaskOp {
    pub kind: MaskType,
    /// The mask region in device space.
    pub rect: Polyline,
    pub content: Vec<DrawOp>,
    pub mask: Option<Box<MaskOp>>,
}

/// A decoded raster image.
#[derive(Clone, Debug)]
pub struct ImageOp {
    pub pixmap: Arc<Pixmap>,
    /// Maps image pixels onto the device.
    pub transform: Transform,
    pub quality: FilterQuality,
    pub clip: Option<ClipRef>,
}

/// A draw operation.
#[derive(Clone, Debug)]
pub enum DrawOp {
    Fill(FillOp),
    PushLayer(Layer),
    PopLayer,
    Image(ImageOp),
    /// A nested SVG image with its own clip shapes.
    Document(Box<DisplayList>),
}

/// A clip path resolved into device space.
#[derive(Clone, Debug)]
pub struct ClipShape {
    pub fills: Vec<ClipFill>,
    /// The clip path of the clip path itself.
    pub clip: Option<ClipRef>,
}

#[derive(Clone, Debug)]
pub struct ClipFill {
    pub polygons: Vec<Polyline>,
    pub rule: FillRule,
    pub anti_alias: bool,
    /// Clip paths applied to this particular child.
    pub clips: Vec<ClipRef>,
}

/// An ordered, back-to-front list of draw operations.
#[derive(Clone, Default, Debug)]
pub struct DisplayList {
    ops: Vec<DrawOp>,
    clips: Vec<ClipShape>,
}

impl DisplayList {
    /// Resolves a document into a display list.
    ///
    /// `ts` maps the document user space onto the device,
    /// i.e. it must already include [`Document::root_transform`].
    pub fn resolve(doc: &Document, ts: Transform) -> Self {
        let mut resolver = Resolver::new(doc, Vec::new());
        let mut ops = Vec::new();
        if let Err(e) = resolver.push_group(doc.root(), ts, &mut ops, None) {
            // Unreachable, since only nested patterns propagate errors.
            log::warn!("Failed to resolve a document: {}.", e);
        }

        DisplayList {
            ops,
            clips: resolver.clips,
        }
    }

    /// Returns draw operations.
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Returns a clip shape by reference.
    pub fn clip(&self, r: ClipRef) -> &ClipShape {
        &self.clips[r.0]
    }

    /// Returns the number of clip shapes.
    pub fn clips_count(&self) -> usize {
        self.clips.len()
    }

    /// Checks that the list has no draw operations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

type ClipKey = (usize, [u32; 6], Option<[u32; 4]>);

struct Resolver<'a> {
    doc: &'a Document,
    clips: Vec<ClipShape>,
    clip_cache: HashMap<ClipKey, ClipRef>,
    /// Patterns that are being resolved right now.
    pattern_stack: Vec<String>,
}

impl<'a> Resolver<'a> {
    fn new(doc: &'a Document, pattern_stack: Vec<String>) -> Self {
        Resolver {
            doc,
            clips: Vec::new(),
            clip_cache: HashMap::new(),
            pattern_stack,
        }
    }

    fn push_group(
        &mut self,
        group: &Group,
        ts: Transform,
        ops: &mut Vec<DrawOp>,
        text_bbox: Option<NonZeroRect>,
    ) -> Result<(), PaintError> {
        let opacity = group.opacity().get();
        if opacity == 0.0 {
            return Ok(());
        }

        let ts = ts.pre_concat(group.transform());
        let bbox = group.bounding_box().and_then(|r| r.to_non_zero_rect());

        let clip = match group.clip_path() {
            Some(id) => match self.resolve_clip(id, bbox, ts) {
                Some(v) => Some(v),
                // Everything is clipped.
                None => return Ok(()),
            },
            None => None,
        };

        let mask = match group.mask() {
            Some(id) => match self.resolve_mask(id, bbox, ts)? {
                Some(v) => Some(Box::new(v)),
                // Everything is masked.
                None => return Ok(()),
            },
            None => None,
        };

        let mut children = Vec::new();
        for node in group.children() {
            self.push_node(node, ts, &mut children, text_bbox)?;
        }

        if children.is_empty() {
            return Ok(());
        }

        if !group.should_isolate() {
            ops.append(&mut children);
            return Ok(());
        }

        // A single fill doesn't need a layer.
        if mask.is_none() && children.len() == 1 {
            if let Some(DrawOp::Fill(fill)) = children.first_mut() {
                if clip.is_none() || fill.clip.is_none() {
                    fill.opacity *= opacity;
                    fill.clip = fill.clip.or(clip);
                    ops.append(&mut children);
                    return Ok(());
                }
            }
        }

        ops.push(DrawOp::PushLayer(Layer {
            opacity,
            clip,
            mask,
        }));
        ops.append(&mut children);
        ops.push(DrawOp::PopLayer);

        Ok(())
    }

    fn push_node(
        &mut self,
        node: &Node,
        ts: Transform,
        ops: &mut Vec<DrawOp>,
        text_bbox: Option<NonZeroRect>,
    ) -> Result<(), PaintError> {
        match node {
            Node::Group(ref group) => self.push_group(group, ts, ops, text_bbox),
            Node::Path(ref path) => self.push_path(path, ts, ops, text_bbox),
            Node::Image(ref image) => self.push_image(image, ts, ops),
            Node::Text(ref text) => match text.flattened() {
                Some(group) => {
                    // Text paint servers use the bounding box of the whole text.
                    let bbox = text.bounding_box().and_then(|r| r.to_non_zero_rect());
                    self.push_group(group, ts, ops, bbox)
                }
                None => Ok(()),
            },
            Node::Use(ref use_node) => {
                let ts = ts.pre_concat(use_node.transform());
                self.push_group(use_node.root(), ts, ops, text_bbox)
            }
        }
    }

    fn push_path(
        &mut self,
        path: &Path,
        ts: Transform,
        ops: &mut Vec<DrawOp>,
        text_bbox: Option<NonZeroRect>,
    ) -> Result<(), PaintError> {
        if path.visibility() != Visibility::Visible {
            return Ok(());
        }

        let bbox = text_bbox.or_else(|| path.bounding_box().to_non_zero_rect());
        match path.paint_order() {
            PaintOrder::FillAndStroke => {
                self.push_fill(path, ts, bbox, ops)?;
                self.push_stroke(path, ts, bbox, ops)?;
            }
            PaintOrder::StrokeAndFill => {
                self.push_stroke(path, ts, bbox, ops)?;
                self.push_fill(path, ts, bbox, ops)?;
            }
        }

        Ok(())
    }

    fn push_fill(
        &mut self,
        path: &Path,
        ts: Transform,
        bbox: Option<NonZeroRect>,
        ops: &mut Vec<DrawOp>,
    ) -> Result<(), PaintError> {
        let fill = match path.fill() {
            Some(v) => v,
            None => return Ok(()),
        };

        // Horizontal and vertical lines cannot be filled.
        let path_bbox = path.bounding_box();
        if path_bbox.width() == 0.0 || path_bbox.height() == 0.0 {
            return Ok(());
        }

        let opacity = fill.opacity().get();
        if opacity == 0.0 {
            return Ok(());
        }

        let polygons = flatten::flatten(path.data(), ts, FLATTEN_TOLERANCE);
        if polygons.is_empty() {
            return Ok(());
        }

        let result = self.resolve_paint(fill.paint(), bbox, ts);
        let shader = match self.skip_on_error(result, path.id())? {
            Some(v) => v,
            None => return Ok(()),
        };

        ops.push(DrawOp::Fill(FillOp {
            polygons,
            rule: fill.rule(),
            shader,
            opacity,
            anti_alias: path.rendering_mode().use_shape_antialiasing(),
            clip: None,
        }));

        Ok(())
    }

    fn push_stroke(
        &mut self,
        path: &Path,
        ts: Transform,
        bbox: Option<NonZeroRect>,
        ops: &mut Vec<DrawOp>,
    ) -> Result<(), PaintError> {
        let stroke = match path.stroke() {
            Some(v) => v,
            None => return Ok(()),
        };

        let opacity = stroke.opacity().get();
        if opacity == 0.0 {
            return Ok(());
        }

        // Strokes are built in user space, so the tolerance has to be scaled.
        let (sx, sy) = ts.get_scale();
        let scale = sx.max(sy);
        if !(scale > 0.0 && scale.is_finite()) {
            return Ok(());
        }
        let tolerance = FLATTEN_TOLERANCE / scale;

        let lines = flatten::flatten(path.data(), Transform::default(), tolerance);
        let mut polygons = crate::stroke::stroke(&lines, stroke, tolerance);
        for polygon in &mut polygons {
            polygon.transform(ts);
        }

        if polygons.is_empty() {
            return Ok(());
        }

        let result = self.resolve_paint(stroke.paint(), bbox, ts);
        let shader = match self.skip_on_error(result, path.id())? {
            Some(v) => v,
            None => return Ok(()),
        };

        ops.push(DrawOp::Fill(FillOp {
            polygons,
            rule: FillRule::NonZero,
            shader,
            opacity,
            anti_alias: path.rendering_mode().use_shape_antialiasing(),
            clip: None,
        }));

        Ok(())
    }

    /// Logs and drops a paint error.
    ///
    /// Pattern nesting errors are propagated up to the outermost pattern,
    /// so the whole chain is skipped.
    fn skip_on_error(
        &self,
        result: Result<Shader, PaintError>,
        id: &str,
    ) -> Result<Option<Shader>, PaintError> {
        match result {
            Ok(shader) => Ok(Some(shader)),
            Err(e @ PaintError::CyclicPattern(_)) | Err(e @ PaintError::PatternTooDeep(_))
                if !self.pattern_stack.is_empty() =>
            {
                Err(e)
            }
            Err(e) => {
                log::warn!("Element '{}' is skipped: {}.", id, e);
                Ok(None)
            }
        }
    }

    fn resolve_paint(
        &mut self,
        paint: &Paint,
        bbox: Option<NonZeroRect>,
        ts: Transform,
    ) -> Result<Shader, PaintError> {
        let id = match paint {
            Paint::Color(c) => return Ok(Shader::from_color(*c, 1.0)),
            Paint::Server(id) => *id,
        };

        let server = self
            .doc
            .paint_server(id)
            .ok_or(PaintError::UnresolvedReference)?;

        match server {
            PaintServer::SolidColor(c, opacity) => Ok(Shader::from_color(*c, opacity.get())),
            PaintServer::LinearGradient(ref lg) => {
                paint_server::convert_linear_gradient(lg, bbox, ts)
                    .ok_or(PaintError::UnresolvedReference)
            }
            PaintServer::RadialGradient(ref rg) => {
                paint_server::convert_radial_gradient(rg, bbox, ts)
                    .ok_or(PaintError::UnresolvedReference)
            }
            PaintServer::Pattern(ref pattern) => self.resolve_pattern(pattern, bbox, ts),
        }
    }

    fn resolve_pattern(
        &mut self,
        pattern: &Pattern,
        bbox: Option<NonZeroRect>,
        ts: Transform,
    ) -> Result<Shader, PaintError> {
        if self.pattern_stack.iter().any(|id| id == pattern.id()) {
            return Err(PaintError::CyclicPattern(pattern.id().to_string()));
        }

        if self.pattern_stack.len() >= MAX_PATTERN_DEPTH {
            return Err(PaintError::PatternTooDeep(pattern.id().to_string()));
        }

        let layout = paint_server::pattern_layout(pattern, bbox, ts)
            .ok_or(PaintError::UnresolvedReference)?;

        let mut stack = self.pattern_stack.clone();
        stack.push(pattern.id().to_string());

        let mut sub = Resolver::new(self.doc, stack);
        let mut ops = Vec::new();
        sub.push_group(pattern.root(), layout.content_transform, &mut ops, None)?;

        let list = DisplayList {
            ops,
            clips: sub.clips,
        };

        let tile = crate::render::render(&list, layout.width, layout.height)
            .log_none(|| log::warn!("Failed to allocate a pattern tile."))
            .ok_or(PaintError::UnresolvedReference)?;

        PatternShader::new(tile, layout.tile_transform)
            .map(Shader::Pattern)
            .ok_or(PaintError::UnresolvedReference)
    }

    /// Resolves a clip path.
    ///
    /// Returns `None` when the element is clipped entirely.
    fn resolve_clip(
        &mut self,
        id: ClipPathId,
        bbox: Option<NonZeroRect>,
        ts: Transform,
    ) -> Option<ClipRef> {
        let key = (id.get(), transform_key(ts), bbox.map(rect_key));
        if let Some(r) = self.clip_cache.get(&key) {
            return Some(*r);
        }

        let clip_path = self
            .doc
            .clip_path(id)
            .log_none(|| log::warn!("Invalid clip path reference."))?;

        let mut clip_ts = ts.pre_concat(clip_path.transform());
        if clip_path.units() == Units::ObjectBoundingBox {
            let bbox =
                bbox.log_none(|| log::warn!("Clipping of zero-sized shapes is not allowed."))?;
            clip_ts = clip_ts.pre_concat(Transform::from_bbox(bbox));
        }

        let nested = match clip_path.clip_path() {
            Some(nested) => Some(self.resolve_clip(nested, bbox, ts)?),
            None => None,
        };

        let mut fills = Vec::new();
        self.push_clip_group(clip_path.root(), clip_ts, &[], &mut fills);

        let r = ClipRef(self.clips.len());
        self.clips.push(ClipShape {
            fills,
            clip: nested,
        });
        self.clip_cache.insert(key, r);
        Some(r)
    }

    fn push_clip_group(
        &mut self,
        group: &Group,
        ts: Transform,
        clips: &[ClipRef],
        fills: &mut Vec<ClipFill>,
    ) {
        let ts = ts.pre_concat(group.transform());

        let mut clips = clips.to_vec();
        if let Some(id) = group.clip_path() {
            let bbox = group.bounding_box().and_then(|r| r.to_non_zero_rect());
            match self.resolve_clip(id, bbox, ts) {
                Some(r) => clips.push(r),
                None => return,
            }
        }

        for node in group.children() {
            match node {
                Node::Path(ref path) => {
                    if path.visibility() != Visibility::Visible {
                        continue;
                    }

                    let rule = match path.fill() {
                        Some(fill) => fill.rule(),
                        None => continue,
                    };

                    let polygons = flatten::flatten(path.data(), ts, FLATTEN_TOLERANCE);
                    if polygons.is_empty() {
                        continue;
                    }

                    fills.push(ClipFill {
                        polygons,
                        rule,
                        anti_alias: path.rendering_mode().use_shape_antialiasing(),
                        clips: clips.clone(),
                    });
                }
                Node::Group(ref g) => self.push_clip_group(g, ts, &clips, fills),
                Node::Use(ref u) => {
                    self.push_clip_group(u.root(), ts.pre_concat(u.transform()), &clips, fills)
                }
                Node::Text(ref text) => {
                    if let Some(g) = text.flattened() {
                        self.push_clip_group(g, ts, &clips, fills);
                    }
                }
                Node::Image(_) => {}
            }
        }
    }

    /// Resolves a mask.
    ///
    /// Returns `None` when the element is masked entirely.
    fn resolve_mask(
        &mut self,
        id: MaskId,
        bbox: Option<NonZeroRect>,
        ts: Transform,
    ) -> Result<Option<MaskOp>, PaintError> {
        let mask = match self.doc.mask(id) {
            Some(v) => v,
            None => {
                log::warn!("Invalid mask reference.");
                return Ok(None);
            }
        };

        let needs_bbox = mask.units() == Units::ObjectBoundingBox
            || mask.content_units() == Units::ObjectBoundingBox;
        let bbox = match bbox {
            Some(v) => Some(v),
            // Technically a UB, but this is what Chrome and Firefox do.
            None if needs_bbox => {
                log::warn!("Masking of zero-sized shapes is not allowed.");
                return Ok(None);
            }
            None => None,
        };

        let rect = match (mask.units(), bbox) {
            (Units::ObjectBoundingBox, Some(bbox)) => mask.rect().bbox_transform(bbox),
            _ => mask.rect(),
        };

        let content_ts = match (mask.content_units(), bbox) {
            (Units::ObjectBoundingBox, Some(bbox)) => ts.pre_concat(Transform::from_bbox(bbox)),
            _ => ts,
        };

        let nested = match mask.mask() {
            Some(nested) => match self.resolve_mask(nested, bbox, ts)? {
                Some(v) => Some(Box::new(v)),
                None => return Ok(None),
            },
            None => None,
        };

        let mut content = Vec::new();
        self.push_group(mask.root(), content_ts, &mut content, None)?;

        let mut rect = Polyline::from_rect(rect.to_rect());
        rect.transform(ts);

        Ok(Some(MaskOp {
            kind: mask.kind(),
            rect,
            content,
            mask: nested,
        }))
    }

    fn push_image(
        &mut self,
        image: &Image,
        ts: Transform,
        ops: &mut Vec<DrawOp>,
    ) -> Result<(), PaintError> {
        if image.visibility() != Visibility::Visible {
            return Ok(());
        }

        let view_box = image.view_box();
        match image.kind() {
            ImageKind::SVG(ref doc) => {
                let size = match doc.size() {
                    Some(v) => v,
                    None => {
                        log::warn!("Image '{}' has no size.", image.id());
                        return Ok(());
                    }
                };

                let img_ts = crate::image::image_transform(size, view_box, ts)
                    .pre_concat(doc.root_transform());
                let list = DisplayList::resolve(doc, img_ts);
                if list.is_empty() {
                    return Ok(());
                }

                // Nested documents are always clipped by the viewport.
                let clip = self.push_rect_clip(view_box.rect.to_rect(), ts);
                ops.push(DrawOp::PushLayer(Layer {
                    opacity: 1.0,
                    clip: Some(clip),
                    mask: None,
                }));
                ops.push(DrawOp::Document(Box::new(list)));
                ops.push(DrawOp::PopLayer);
            }
            #[cfg(feature = "raster-images")]
            kind => {
                let pixmap = match crate::image::decode_raster(kind) {
                    Some(v) => v,
                    None => return Ok(()),
                };

                let size = match pxsvg_tree::Size::from_wh(
                    pixmap.width() as f32,
                    pixmap.height() as f32,
                ) {
                    Some(v) => v,
                    None => return Ok(()),
                };

                let quality = match image.rendering_mode() {
                    ImageRendering::OptimizeSpeed => FilterQuality::Nearest,
                    _ => FilterQuality::Bilinear,
                };

                // Only a sliced image can overflow its viewport.
                let clip = if view_box.aspect.slice {
                    Some(self.push_rect_clip(view_box.rect.to_rect(), ts))
                } else {
                    None
                };

                ops.push(DrawOp::Image(ImageOp {
                    pixmap: Arc::new(pixmap),
                    transform: crate::image::image_transform(size, view_box, ts),
                    quality,
                    clip,
                }));
            }
            #[cfg(not(feature = "raster-images"))]
            _ => {
                log::warn!("Images decoding was disabled by a build feature.");
            }
        }

        Ok(())
    }

    fn push_rect_clip(&mut self, rect: Rect, ts: Transform) -> ClipRef {
        let mut polygon = Polyline::from_rect(rect);
        polygon.transform(ts);

        let r = ClipRef(self.clips.len());
        self.clips.push(ClipShape {
            fills: vec![ClipFill {
                polygons: vec![polygon],
                rule: FillRule::NonZero,
                anti_alias: true,
                clips: Vec::new(),
            }],
            clip: None,
        });
        r
    }
}

fn transform_key(ts: Transform) -> [u32; 6] {
    [
        ts.sx.to_bits(),
        ts.ky.to_bits(),
        ts.kx.to_bits(),
        ts.sy.to_bits(),
        ts.tx.to_bits(),
        ts.ty.to_bits(),
    ]
}

fn rect_key(r: NonZeroRect) -> [u32; 4] {
    [
        r.x().to_bits(),
        r.y().to_bits(),
        r.width().to_bits(),
        r.height().to_bits(),
    ]
}
