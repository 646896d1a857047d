// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`pxsvg` is an embeddable SVG rendering engine.

A document is parsed once into an immutable [`Tree`] and can then be rendered
any number of times into caller-owned RGBA8 buffers.

```no_run
let opt = pxsvg::Options::default();
let data = std::fs::read("image.svg").unwrap();
let tree = pxsvg::Tree::from_data(&data, &opt).unwrap();

let (width, height) = (100, 100);
let mut buf = vec![0; width as usize * height as usize * 4];
tree.render(pxsvg::Transform::default(), width, height, &mut buf).unwrap();
```
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::identity_op)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::upper_case_acronyms)]

pub use pxsvg_tree;
pub use pxsvg_tree::{Options, Size, Transform};

mod display_list;
mod flatten;
mod geom;
mod image;
mod paint_server;
mod pixmap;
mod raster;
mod render;
mod stroke;

pub use display_list::{DisplayList, PaintError, MAX_PATTERN_DEPTH};
pub use flatten::FLATTEN_TOLERANCE;

/// A parsing error.
#[derive(Debug)]
pub enum Error {
    /// The document cannot be parsed.
    Parse(pxsvg_tree::Error),
}

impl From<pxsvg_tree::Error> for Error {
    fn from(e: pxsvg_tree::Error) -> Self {
        Error::Parse(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::Parse(ref e) => write!(f, "failed to parse an SVG data cause {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Parse(ref e) => Some(e),
        }
    }
}

/// A rendering error.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum RenderError {
    /// The target width or height is zero.
    InvalidSize,

    /// The target buffer is smaller than `width * height * 4` bytes.
    BufferTooSmall,

    /// The canvas cannot be allocated.
    OutOfMemory,
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            RenderError::InvalidSize => write!(f, "target size must be non-zero"),
            RenderError::BufferTooSmall => write!(f, "target buffer is too small"),
            RenderError::OutOfMemory => write!(f, "failed to allocate a canvas"),
        }
    }
}

impl std::error::Error for RenderError {}

/// A parsed SVG document ready to render.
///
/// The tree is immutable and can be shared between threads.
#[derive(Clone, Debug)]
pub struct Tree {
    doc: pxsvg_tree::Document,
}

impl Tree {
    /// Parses a tree from SVG or SVGZ data.
    pub fn from_data(data: &[u8], opt: &Options) -> Result<Self, Error> {
        let doc = pxsvg_tree::Document::from_data(data, opt)?;
        Ok(Tree { doc })
    }

    /// Parses a tree from an SVG string.
    pub fn from_str(text: &str, opt: &Options) -> Result<Self, Error> {
        let doc = pxsvg_tree::Document::from_str(text, opt)?;
        Ok(Tree { doc })
    }

    /// Returns the underlying document.
    pub fn document(&self) -> &pxsvg_tree::Document {
        &self.doc
    }

    /// Returns the intrinsic image size.
    ///
    /// `None` when the size cannot be determined.
    pub fn size(&self) -> Option<Size> {
        self.doc.size()
    }

    /// Returns the intrinsic image size.
    ///
    /// Unlike [`Tree::size`], returns `(0, 0)` when the size is unknown.
    pub fn image_size(&self) -> (f32, f32) {
        match self.doc.size() {
            Some(size) => (size.width(), size.height()),
            None => (0.0, 0.0),
        }
    }

    /// Resolves the tree into a display list.
    ///
    /// `transform` is applied on top of the view box transform.
    pub fn to_display_list(&self, transform: Transform) -> DisplayList {
        DisplayList::resolve(&self.doc, transform.pre_concat(self.doc.root_transform()))
    }

    /// Renders the tree into a premultiplied RGBA8 buffer.
    ///
    /// `transform` will be used as a root transform.
    /// Can be used to position and scale the image inside the buffer.
    ///
    /// Only the first `width * height * 4` bytes of `buf` are written.
    /// They are overwritten completely, i.e. the buffer is cleared first.
    pub fn render(
        &self,
        transform: Transform,
        width: u32,
        height: u32,
        buf: &mut [u8],
    ) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidSize);
        }

        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or(RenderError::BufferTooSmall)?;
        if buf.len() < len {
            return Err(RenderError::BufferTooSmall);
        }

        let mut pixmap = pixmap::Pixmap::new(width, height).ok_or(RenderError::OutOfMemory)?;

        let list = self.to_display_list(transform);
        render::render_list(&list, &mut pixmap);
        pixmap.write_rgba8(&mut buf[..len]);

        Ok(())
    }
}

pub(crate) trait OptionLog {
    fn log_none<F: FnOnce()>(self, f: F) -> Self;
}

impl<T> OptionLog for Option<T> {
    #[inline]
    fn log_none<F: FnOnce()>(self, f: F) -> Self {
        self.or_else(|| {
            f();
            None
        })
    }
}
