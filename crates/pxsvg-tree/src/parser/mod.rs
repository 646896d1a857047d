// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! SVG to [`Document`](crate::Document) conversion.
//!
//! Runs in two passes. `svgtree` turns the XML into a style-resolved node
//! arena, then `converter` walks it and builds the model.

mod conditions;
mod converter;
mod effects;
mod image;
mod options;
mod paint_server;
mod shapes;
mod style;
mod svgtree;
mod text;
mod units;
mod viewport;

pub use options::Options;

/// Reasons a document cannot be parsed.
///
/// Problems inside the document, like a broken gradient or an unknown
/// attribute value, are not errors. Such elements are skipped with a warning.
#[derive(Debug)]
pub enum Error {
    /// The input is not valid UTF-8.
    NotUtf8,

    /// The input starts with a GZip header but cannot be decompressed.
    MalformedGZip,

    /// The input is not well-formed XML.
    Malformed(roxmltree::Error),

    /// The root element is not `svg` in the SVG namespace.
    UnsupportedVersion,

    /// A `use`, `href`, `clip-path` or `mask` reference loops back to itself.
    ///
    /// Holds the ID of the element that closes the loop.
    CyclicReference(String),

    /// Nesting is deeper than 100 levels or there are more than
    /// 1,000,000 nodes, `use` copies included.
    TooComplex,

    /// The resolved `width` or `height` of the root element is not positive.
    InvalidSize,
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        match e {
            roxmltree::Error::NodesLimitReached => Error::TooComplex,
            e => Error::Malformed(e),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::NotUtf8 => f.write_str("the data is not UTF-8 encoded"),
            Error::MalformedGZip => f.write_str("the data is not a valid GZip stream"),
            Error::Malformed(e) => write!(f, "malformed XML: {}", e),
            Error::UnsupportedVersion => f.write_str("the root element is not 'svg'"),
            Error::CyclicReference(id) => write!(f, "'{}' is part of a reference loop", id),
            Error::TooComplex => f.write_str("the document is nested too deep or is too large"),
            Error::InvalidSize => f.write_str("the document size is not positive"),
        }
    }
}

impl std::error::Error for Error {}

impl crate::Document {
    /// Parses a document from SVG or SVGZ data.
    pub fn from_data(data: &[u8], opt: &Options) -> Result<Self, Error> {
        parse_data(data, opt, true)
    }

    /// Parses a document from an SVG string.
    pub fn from_str(text: &str, opt: &Options) -> Result<Self, Error> {
        parse_text(text, opt, true)
    }

    /// Converts an already parsed XML document.
    pub fn from_xmltree(xml: &roxmltree::Document, opt: &Options) -> Result<Self, Error> {
        let svg = svgtree::Document::parse(xml, opt.style_sheet.as_deref())?;
        converter::convert(&svg, opt, true)
    }
}

/// `allow_images` is off for documents loaded as an `image`,
/// which may not load images of their own.
pub(crate) fn parse_data(
    data: &[u8],
    opt: &Options,
    allow_images: bool,
) -> Result<crate::Document, Error> {
    if data.starts_with(&[0x1f, 0x8b]) {
        let data = decompress_svgz(data)?;
        let text = std::str::from_utf8(&data).map_err(|_| Error::NotUtf8)?;
        parse_text(text, opt, allow_images)
    } else {
        let text = std::str::from_utf8(data).map_err(|_| Error::NotUtf8)?;
        parse_text(text, opt, allow_images)
    }
}

fn parse_text(text: &str, opt: &Options, allow_images: bool) -> Result<crate::Document, Error> {
    let xml_opt = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let xml = roxmltree::Document::parse_with_options(text, xml_opt)?;

    let style_sheet = if allow_images {
        opt.style_sheet.as_deref()
    } else {
        None
    };
    let svg = svgtree::Document::parse(&xml, style_sheet)?;
    converter::convert(&svg, opt, allow_images)
}

/// Decompresses SVGZ data.
pub fn decompress_svgz(data: &[u8]) -> Result<Vec<u8>, Error> {
    use std::io::Read;

    let mut decoded = Vec::with_capacity(data.len() * 2);
    flate2::read::GzDecoder::new(data)
        .read_to_end(&mut decoded)
        .map_err(|_| Error::MalformedGZip)?;
    Ok(decoded)
}
