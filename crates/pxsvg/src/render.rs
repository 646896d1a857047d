// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;
use std::rc::Rc;

use pxsvg_tree::FillRule;

use crate::display_list::{ClipRef, DisplayList, DrawOp, Layer, MaskOp};
use crate::geom::IntRect;
use crate::pixmap::{Mask, Pixmap};
use crate::raster;
use crate::OptionLog;

/// Renders a display list onto a new pixmap.
///
/// Returns `None` when the pixmap cannot be allocated.
pub fn render(list: &DisplayList, width: u32, height: u32) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(width, height)?;
    render_list(list, &mut pixmap);
    Some(pixmap)
}

/// Renders a display list onto an existing pixmap.
pub fn render_list(list: &DisplayList, pixmap: &mut Pixmap) {
    let mut ctx = Context {
        list,
        clip_cache: HashMap::new(),
        bounds: pixmap.rect(),
    };

    ctx.render_ops(list.ops(), pixmap);
}

struct Context<'a> {
    list: &'a DisplayList,
    /// Clip masks are rasterized once per list.
    clip_cache: HashMap<ClipRef, Rc<Mask>>,
    bounds: IntRect,
}

impl Context<'_> {
    fn render_ops(&mut self, ops: &[DrawOp], pixmap: &mut Pixmap) {
        let mut layers: Vec<(Pixmap, &Layer)> = Vec::new();
        // The number of unbalanced layers we failed to allocate.
        let mut skip_depth = 0;

        for op in ops {
            if skip_depth > 0 {
                match op {
                    DrawOp::PushLayer(_) => skip_depth += 1,
                    DrawOp::PopLayer => skip_depth -= 1,
                    _ => {}
                }
                continue;
            }

            match op {
                DrawOp::PushLayer(ref layer) => {
                    match Pixmap::new(self.bounds.width(), self.bounds.height()) {
                        Some(sub_pixmap) => layers.push((sub_pixmap, layer)),
                        None => {
                            log::warn!("Failed to allocate a layer. Skipped.");
                            skip_depth = 1;
                        }
                    }
                }
                DrawOp::PopLayer => {
                    if let Some((content, layer)) = layers.pop() {
                        let target = match layers.last_mut() {
                            Some((p, _)) => p,
                            None => &mut *pixmap,
                        };
                        self.finish_layer(content, layer, target);
                    }
                }
                _ => {
                    let target = match layers.last_mut() {
                        Some((p, _)) => p,
                        None => &mut *pixmap,
                    };
                    self.draw(op, target);
                }
            }
        }

        debug_assert!(layers.is_empty());
    }

    fn draw(&mut self, op: &DrawOp, pixmap: &mut Pixmap) {
        match op {
            DrawOp::Fill(ref fill) => {
                let clip = match fill.clip {
                    Some(r) => match self.clip_mask(r) {
                        Some(v) => Some(v),
                        None => return,
                    },
                    None => None,
                };

                let coverage = match raster::rasterize(
                    &fill.polygons,
                    fill.rule,
                    fill.anti_alias,
                    self.bounds,
                ) {
                    Some(v) => v,
                    None => return,
                };

                pixmap.fill(&coverage, &fill.shader, fill.opacity, clip.as_deref());
            }
            DrawOp::Image(ref image) => {
                let clip = match image.clip {
                    Some(r) => match self.clip_mask(r) {
                        Some(v) => Some(v),
                        None => return,
                    },
                    None => None,
                };

                crate::image::draw(image, clip.as_deref(), pixmap);
            }
            DrawOp::Document(ref list) => render_list(list, pixmap),
            DrawOp::PushLayer(_) | DrawOp::PopLayer => {}
        }
    }

    fn finish_layer(&mut self, mut content: Pixmap, layer: &Layer, target: &mut Pixmap) {
        if let Some(r) = layer.clip {
            match self.clip_mask(r) {
                Some(mask) => content.apply_mask(&mask),
                None => return,
            }
        }

        if let Some(ref mask) = layer.mask {
            match self.build_mask(mask) {
                Some(mask) => content.apply_mask(&mask),
                None => return,
            }
        }

        target.draw_layer(&content, layer.opacity);
    }

    /// Returns `None` when the mask cannot be allocated
    /// or when it doesn't cover anything.
    fn build_mask(&mut self, op: &MaskOp) -> Option<Mask> {
        let mut content = Pixmap::new(self.bounds.width(), self.bounds.height())
            .log_none(|| log::warn!("Failed to allocate a mask. Skipped."))?;
        self.render_ops(&op.content, &mut content);

        let mut mask = Mask::from_pixmap(&content, op.kind)?;
        let region = raster::rasterize(
            std::slice::from_ref(&op.rect),
            FillRule::NonZero,
            true,
            self.bounds,
        )?;
        mask.intersect_coverage(&region);

        if let Some(ref nested) = op.mask {
            let nested = self.build_mask(nested)?;
            mask.intersect(&nested);
        }

        Some(mask)
    }

    /// Returns a rasterized clip path.
    ///
    /// Returns `None` when the mask cannot be allocated.
    fn clip_mask(&mut self, r: ClipRef) -> Option<Rc<Mask>> {
        if let Some(mask) = self.clip_cache.get(&r) {
            return Some(mask.clone());
        }

        let list = self.list;
        let shape = list.clip(r);

        let mut mask = Mask::new(self.bounds.width(), self.bounds.height(), 0.0)
            .log_none(|| log::warn!("Failed to allocate a clip mask. Skipped."))?;

        for fill in &shape.fills {
            // A child can have its own clip path.
            let mut child_clip: Option<Rc<Mask>> = None;
            for r in &fill.clips {
                let m = self.clip_mask(*r)?;
                child_clip = match child_clip {
                    Some(prev) => {
                        let mut prev = Mask::clone(&prev);
                        prev.intersect(&m);
                        Some(Rc::new(prev))
                    }
                    None => Some(m),
                };
            }

            if let Some(coverage) =
                raster::rasterize(&fill.polygons, fill.rule, fill.anti_alias, self.bounds)
            {
                mask.union(&coverage, child_clip.as_deref());
            }
        }

        if let Some(nested) = shape.clip {
            let nested = self.clip_mask(nested)?;
            mask.intersect(&nested);
        }

        let mask = Rc::new(mask);
        self.clip_cache.insert(r, mask.clone());
        Some(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pxsvg_tree::{Document, Options};

    fn render_svg(text: &str) -> Pixmap {
        let doc = Document::from_str(text, &Options::default()).unwrap();
        let list = DisplayList::resolve(&doc, doc.root_transform());
        let size = doc.size().unwrap();
        render(&list, size.width() as u32, size.height() as u32).unwrap()
    }

    #[test]
    fn layer_opacity() {
        let pixmap = render_svg(
            "<svg xmlns='http://www.w3.org/2000/svg' width='10' height='10'>\
             <g opacity='0.5'>\
             <rect width='10' height='10' fill='red'/>\
             <rect width='10' height='10' fill='blue'/>\
             </g></svg>",
        );

        // Overlapping children are composited before the opacity is applied.
        let c = pixmap.pixel(5, 5);
        assert_eq!(c.r, 0.0);
        assert!((c.b - 0.5).abs() < 1e-6);
        assert!((c.a - 0.5).abs() < 1e-6);
    }

    #[test]
    fn clip_path() {
        let pixmap = render_svg(
            "<svg xmlns='http://www.w3.org/2000/svg' width='10' height='10'>\
             <clipPath id='clip'><rect width='5' height='10'/></clipPath>\
             <rect width='10' height='10' clip-path='url(#clip)'/>\
             </svg>",
        );

        assert_eq!(pixmap.pixel(2, 5).a, 1.0);
        assert_eq!(pixmap.pixel(7, 5).a, 0.0);
    }

    #[test]
    fn nested_clip_paths_intersect() {
        let pixmap = render_svg(
            "<svg xmlns='http://www.w3.org/2000/svg' width='10' height='10'>\
             <clipPath id='clip1'><rect width='10' height='5'/></clipPath>\
             <clipPath id='clip2' clip-path='url(#clip1)'><rect width='5' height='10'/></clipPath>\
             <rect width='10' height='10' clip-path='url(#clip2)'/>\
             </svg>",
        );

        assert_eq!(pixmap.pixel(2, 2).a, 1.0);
        assert_eq!(pixmap.pixel(7, 2).a, 0.0);
        assert_eq!(pixmap.pixel(2, 7).a, 0.0);
    }

    #[test]
    fn alpha_mask() {
        let pixmap = render_svg(
            "<svg xmlns='http://www.w3.org/2000/svg' width='10' height='10'>\
             <mask id='mask' mask-type='alpha' maskUnits='userSpaceOnUse'>\
             <rect width='10' height='10' fill='black' fill-opacity='0.5'/>\
             </mask>\
             <rect width='10' height='10' fill='red' mask='url(#mask)'/>\
             </svg>",
        );

        let c = pixmap.pixel(5, 5);
        assert!((c.a - 0.5).abs() < 1e-6);
        assert!((c.r - 0.5).abs() < 1e-6);
    }

    #[test]
    fn luminance_mask_region() {
        let pixmap = render_svg(
            "<svg xmlns='http://www.w3.org/2000/svg' width='10' height='10'>\
             <mask id='mask' maskUnits='userSpaceOnUse' x='0' y='0' width='5' height='10'>\
             <rect width='10' height='10' fill='white'/>\
             </mask>\
             <rect width='10' height='10' fill='red' mask='url(#mask)'/>\
             </svg>",
        );

        assert!((pixmap.pixel(2, 5).a - 1.0).abs() < 1e-3);
        assert_eq!(pixmap.pixel(7, 5).a, 0.0);
    }

    #[test]
    fn pattern_fill() {
        let pixmap = render_svg(
            "<svg xmlns='http://www.w3.org/2000/svg' width='20' height='20'>\
             <pattern id='patt' width='10' height='10' patternUnits='userSpaceOnUse'>\
             <rect width='5' height='5' fill='green'/>\
             </pattern>\
             <rect width='20' height='20' fill='url(#patt)'/>\
             </svg>",
        );

        assert!(pixmap.pixel(2, 2).a > 0.9);
        assert!(pixmap.pixel(12, 12).a > 0.9);
        assert!(pixmap.pixel(7, 7).a < 0.1);
    }
}
