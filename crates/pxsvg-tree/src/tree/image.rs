// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use super::{Document, Rect, ViewBox, Visibility};

/// The `image-rendering` property.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum ImageRendering {
    #[default]
    OptimizeQuality,
    OptimizeSpeed,
}

/// Image content.
///
/// Raster formats are kept encoded; decoding is up to the renderer.
#[derive(Clone)]
pub enum ImageKind {
    /// Encoded JPEG data.
    JPEG(Arc<Vec<u8>>),
    /// Encoded PNG data.
    PNG(Arc<Vec<u8>>),
    /// Encoded GIF data.
    GIF(Arc<Vec<u8>>),
    /// An already parsed SVG document.
    SVG(Arc<Document>),
}

impl std::fmt::Debug for ImageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let (name, len) = match self {
            ImageKind::JPEG(data) => ("JPEG", data.len()),
            ImageKind::PNG(data) => ("PNG", data.len()),
            ImageKind::GIF(data) => ("GIF", data.len()),
            ImageKind::SVG(_) => return f.write_str("SVG(..)"),
        };

        write!(f, "{}({} bytes)", name, len)
    }
}

/// An `image` element.
#[derive(Clone, Debug)]
pub struct Image {
    pub(crate) id: String,
    pub(crate) visibility: Visibility,
    pub(crate) view_box: ViewBox,
    pub(crate) rendering_mode: ImageRendering,
    pub(crate) kind: ImageKind,
}

getters!(Image {
    /// The element ID.
    borrow id: str;
    /// `visibility`.
    copy visibility: Visibility;
    /// The image viewport (`x`, `y`, `width`, `height`)
    /// and `preserveAspectRatio`.
    copy view_box: ViewBox;
    /// `image-rendering`.
    copy rendering_mode: ImageRendering;
    /// Image data.
    borrow kind: ImageKind;
});

impl Image {
    /// The image viewport.
    pub fn bounding_box(&self) -> Rect {
        self.view_box.rect.to_rect()
    }
}
