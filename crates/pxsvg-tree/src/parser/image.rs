// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The `image` element.
//!
//! Raster data is only sniffed for its format and size. SVG data is parsed
//! into a separate document, which may not load images of its own.

use std::path::Path;
use std::sync::Arc;

use svgtypes::Length;

use super::converter::{self, Context};
use super::svgtree::{AId, SvgNode};
use super::Options;
use crate::{Group, Image, ImageKind, Node, NonZeroRect, Size, Units, ViewBox};

pub(crate) fn convert(node: SvgNode, ctx: &Context, out: &mut Group) {
    if !ctx.allow_images {
        log::warn!("An SVG image cannot contain images. Skipped.");
        return;
    }

    let href = match node.try_attribute::<&str>(AId::Href) {
        Some(href) => href,
        None => {
            log::warn!("An image without a link. Skipped.");
            return;
        }
    };

    let kind = match load(href, ctx.opt) {
        Some(kind) => kind,
        None => return,
    };

    let rect = match image_rect(node, &kind, ctx) {
        Some(rect) => rect,
        None => {
            log::warn!("Image '{}' has an invalid size. Skipped.", href);
            return;
        }
    };

    out.children.push(Node::Image(Box::new(Image {
        id: node.element_id().to_string(),
        visibility: node.find_attribute(AId::Visibility).unwrap_or_default(),
        view_box: ViewBox {
            rect,
            aspect: node.attribute(AId::PreserveAspectRatio).unwrap_or_default(),
        },
        rendering_mode: converter::find_or_auto(
            node,
            AId::ImageRendering,
            ctx.opt.image_rendering,
        ),
        kind,
    })));
}

/// The image viewport.
///
/// A missing dimension follows the intrinsic aspect ratio.
fn image_rect(node: SvgNode, kind: &ImageKind, ctx: &Context) -> Option<NonZeroRect> {
    let intrinsic = intrinsic_size(kind)?;
    let units = Units::UserSpaceOnUse;
    let (width, height) = match (
        ctx.try_length(node, AId::Width, units),
        ctx.try_length(node, AId::Height, units),
    ) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, intrinsic.height() * w / intrinsic.width()),
        (None, Some(h)) => (intrinsic.width() * h / intrinsic.height(), h),
        (None, None) => (intrinsic.width(), intrinsic.height()),
    };

    NonZeroRect::from_xywh(
        ctx.user_length(node, AId::X, Length::zero()),
        ctx.user_length(node, AId::Y, Length::zero()),
        width,
        height,
    )
}

fn intrinsic_size(kind: &ImageKind) -> Option<Size> {
    match kind {
        ImageKind::JPEG(data) | ImageKind::PNG(data) | ImageKind::GIF(data) => {
            let size = imagesize::blob_size(data).ok()?;
            Size::from_wh(size.width as f32, size.height as f32)
        }
        ImageKind::SVG(doc) => doc.size(),
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum Format {
    Png,
    Jpeg,
    Gif,
    Svg,
}

impl Format {
    /// Detects a raster format by its magic bytes.
    fn sniff(data: &[u8]) -> Option<Self> {
        match imagesize::image_type(data).ok()? {
            imagesize::ImageType::Png => Some(Format::Png),
            imagesize::ImageType::Jpeg => Some(Format::Jpeg),
            imagesize::ImageType::Gif => Some(Format::Gif),
            _ => None,
        }
    }

    fn from_mime(mime: &str, data: &[u8]) -> Option<Self> {
        match mime {
            "image/png" => Some(Format::Png),
            "image/jpg" | "image/jpeg" => Some(Format::Jpeg),
            "image/gif" => Some(Format::Gif),
            "image/svg+xml" => Some(Format::Svg),
            // Anything that is not a raster image is assumed to be SVG.
            "text/plain" => Some(Format::sniff(data).unwrap_or(Format::Svg)),
            _ => None,
        }
    }

    fn from_path(path: &Path, data: &[u8]) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if ext == "svg" || ext == "svgz" {
            Some(Format::Svg)
        } else {
            Format::sniff(data)
        }
    }
}

fn load(href: &str, opt: &Options) -> Option<ImageKind> {
    let (format, data) = match data_url::DataUrl::process(href) {
        Ok(url) => {
            let (data, _) = url.decode_to_vec().ok()?;
            let mime = format!("{}/{}", url.mime_type().type_, url.mime_type().subtype);
            match Format::from_mime(&mime, &data) {
                Some(format) => (format, data),
                None => {
                    log::warn!("Unsupported image type '{}'. Skipped.", mime);
                    return None;
                }
            }
        }
        Err(_) if opt.load_external_images => read_file(href, opt)?,
        Err(_) => {
            log::warn!("Loading of external image '{}' is disabled. Skipped.", href);
            return None;
        }
    };

    let data = Arc::new(data);
    match format {
        Format::Png => Some(ImageKind::PNG(data)),
        Format::Jpeg => Some(ImageKind::JPEG(data)),
        Format::Gif => Some(ImageKind::GIF(data)),
        Format::Svg => load_svg(&data, opt),
    }
}

/// Reads an image relative to [`Options::resources_dir`].
fn read_file(href: &str, opt: &Options) -> Option<(Format, Vec<u8>)> {
    let path = opt.get_abs_path(Path::new(href));
    let data = match std::fs::read(&path) {
        Ok(data) => data,
        Err(e) => {
            log::warn!("Failed to read '{}': {}.", path.display(), e);
            return None;
        }
    };

    match Format::from_path(&path, &data) {
        Some(format) => Some((format, data)),
        None => {
            log::warn!("'{}' is not a PNG, JPEG, GIF or SVG image.", path.display());
            None
        }
    }
}

fn load_svg(data: &[u8], opt: &Options) -> Option<ImageKind> {
    let sub_opt = Options {
        resources_dir: None,
        load_external_images: false,
        ..opt.clone()
    };

    match super::parse_data(data, &sub_opt, false) {
        Ok(doc) => Some(ImageKind::SVG(Arc::new(doc))),
        Err(e) => {
            log::warn!("Failed to parse an SVG image: {}.", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;

    const PNG_1X1: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    fn first_image(doc: &Document) -> &Image {
        match doc.root().children()[0] {
            Node::Image(ref image) => image,
            _ => panic!("expected an image"),
        }
    }

    #[test]
    fn missing_height_keeps_aspect() {
        let text = format!(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <image x='5' width='10' href='data:image/png;base64,{}'/>
            </svg>",
            PNG_1X1
        );
        let doc = Document::from_str(&text, &Options::default()).unwrap();
        let image = first_image(&doc);
        assert!(matches!(image.kind(), ImageKind::PNG(_)));
        assert_eq!(
            image.view_box().rect,
            NonZeroRect::from_xywh(5.0, 0.0, 10.0, 10.0).unwrap()
        );
    }

    #[test]
    fn plain_text_is_sniffed() {
        let text = format!(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <image href='data:text/plain;base64,{}'/>
            </svg>",
            PNG_1X1
        );
        let doc = Document::from_str(&text, &Options::default()).unwrap();
        assert!(matches!(first_image(&doc).kind(), ImageKind::PNG(_)));
    }

    #[test]
    fn svg_image_has_no_images() {
        // <svg width='20' height='10'><image href='x.png' .../><rect .../></svg>
        let doc = Document::from_str(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <image href='data:image/svg+xml;base64,PHN2ZyB4bWxucz0naHR0cDovL3d3dy53My5vcmcvMjAwMC9zdmcnIHdpZHRoPScyMCcgaGVpZ2h0PScxMCc+PGltYWdlIGhyZWY9J3gucG5nJyB3aWR0aD0nNScgaGVpZ2h0PSc1Jy8+PHJlY3Qgd2lkdGg9JzIwJyBoZWlnaHQ9JzEwJy8+PC9zdmc+'/>
            </svg>",
            &Options::default(),
        )
        .unwrap();

        let image = first_image(&doc);
        assert_eq!(image.view_box().rect.width(), 20.0);
        assert_eq!(image.view_box().rect.height(), 10.0);
        match image.kind() {
            ImageKind::SVG(sub) => {
                assert_eq!(sub.root().children().len(), 1);
                assert!(matches!(sub.root().children()[0], Node::Path(_)));
            }
            _ => panic!("expected an SVG image"),
        }
    }

    #[test]
    fn unknown_mime_is_skipped() {
        let doc = Document::from_str(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <image width='10' height='10' href='data:application/pdf;base64,AAAA'/>
            </svg>",
            &Options::default(),
        )
        .unwrap();
        assert!(!doc.root().has_children());
    }
}
