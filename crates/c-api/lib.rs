// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! C bindings.

#![allow(non_camel_case_types)]
#![warn(missing_docs)]
#![warn(missing_copy_implementations)]

use std::ffi::CStr;
use std::os::raw::c_char;
use std::slice;

/// @brief List of possible status codes.
#[repr(C)]
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum pxsvg_error {
    /// Everything is ok.
    OK = 0,
    /// The input is not a valid SVG document.
    ///
    /// Includes non-UTF-8 data, malformed GZip and XML, cyclic references
    /// and documents without a valid size.
    MALFORMED_INPUT,
    /// The document is nested too deep or has too many elements.
    TOO_COMPLEX,
    /// Failed to allocate a canvas.
    OUT_OF_MEMORY,
    /// A required pointer is NULL.
    INVALID_HANDLE,
}

/// @brief A size representation.
#[repr(C)]
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug)]
pub struct pxsvg_size {
    pub width: f32,
    pub height: f32,
}

/// @brief A 2D transform representation.
///
/// Maps `(x, y)` onto `(a*x + c*y + e, b*x + d*y + f)`.
#[repr(C)]
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug)]
pub struct pxsvg_transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl pxsvg_transform {
    #[inline]
    fn to_transform(self) -> pxsvg::Transform {
        pxsvg::Transform::from_row(self.a, self.b, self.c, self.d, self.e, self.f)
    }
}

/// @brief Creates an identity transform.
#[no_mangle]
pub extern "C" fn pxsvg_transform_identity() -> pxsvg_transform {
    pxsvg_transform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    }
}

/// @brief Initializes the library log.
///
/// Use it if you want to see any warnings.
///
/// Must be called only once.
///
/// All warnings will be printed to the `stderr`.
#[no_mangle]
pub extern "C" fn pxsvg_init_log() {
    if let Ok(()) = log::set_logger(&LOGGER) {
        log::set_max_level(log::LevelFilter::Warn);
    }
}

/// @brief An SVG parsing options.
///
/// Also, contains a fonts database used during text to path conversion.
/// The database is empty by default.
pub struct pxsvg_options(pxsvg::Options);

/// @brief Creates a new #pxsvg_options object.
///
/// Should be destroyed via #pxsvg_options_destroy.
#[no_mangle]
pub extern "C" fn pxsvg_options_create() -> *mut pxsvg_options {
    Box::into_raw(Box::new(pxsvg_options(pxsvg::Options::default())))
}

#[inline]
fn cast_opt<'a>(opt: *mut pxsvg_options) -> Option<&'a mut pxsvg::Options> {
    if opt.is_null() {
        log::warn!("Options handle is NULL.");
        return None;
    }

    unsafe { Some(&mut (*opt).0) }
}

/// @brief Sets a directory that will be used during relative paths resolving.
///
/// Expected to be the same as the directory that contains the SVG file,
/// but can be set to any.
///
/// Must be UTF-8. Can be set to NULL.
///
/// Default: NULL
#[no_mangle]
pub extern "C" fn pxsvg_options_set_resources_dir(opt: *mut pxsvg_options, path: *const c_char) {
    let opt = match cast_opt(opt) {
        Some(v) => v,
        None => return,
    };

    if path.is_null() {
        opt.resources_dir = None;
    } else if let Some(path) = cstr_to_str(path) {
        opt.resources_dir = Some(path.into());
    }
}

/// @brief Sets the target DPI.
///
/// Impact units conversion.
///
/// Default: 96
#[no_mangle]
pub extern "C" fn pxsvg_options_set_dpi(opt: *mut pxsvg_options, dpi: f32) {
    if let Some(opt) = cast_opt(opt) {
        opt.dpi = dpi;
    }
}

/// @brief Sets the default font family.
///
/// Will be used when no `font-family` attribute is set in the SVG.
///
/// Must be UTF-8. NULL is not allowed.
///
/// Default: Times New Roman
#[no_mangle]
pub extern "C" fn pxsvg_options_set_font_family(opt: *mut pxsvg_options, family: *const c_char) {
    let opt = match cast_opt(opt) {
        Some(v) => v,
        None => return,
    };

    if let Some(family) = cstr_to_str(family) {
        opt.font_family = family.to_string();
    }
}

/// @brief Sets the default font size.
///
/// Will be used when no `font-size` attribute is set in the SVG.
///
/// Default: 12
#[no_mangle]
pub extern "C" fn pxsvg_options_set_font_size(opt: *mut pxsvg_options, size: f32) {
    if let Some(opt) = cast_opt(opt) {
        opt.font_size = size;
    }
}

/// @brief Sets a comma-separated list of languages.
///
/// Will be used to resolve a `systemLanguage` conditional attribute.
///
/// Example: en,en-US.
///
/// Must be UTF-8. Can be NULL.
///
/// Default: en
#[no_mangle]
pub extern "C" fn pxsvg_options_set_languages(opt: *mut pxsvg_options, languages: *const c_char) {
    let opt = match cast_opt(opt) {
        Some(v) => v,
        None => return,
    };

    if languages.is_null() {
        opt.languages = Vec::new();
        return;
    }

    let languages_str = match cstr_to_str(languages) {
        Some(v) => v,
        None => return,
    };

    opt.languages = languages_str
        .split(',')
        .map(|lang| lang.trim().to_string())
        .filter(|lang| !lang.is_empty())
        .collect();
}

/// @brief A shape rendering method.
#[repr(C)]
#[allow(missing_docs)]
#[derive(Copy, Clone)]
pub enum pxsvg_shape_rendering {
    OPTIMIZE_SPEED,
    CRISP_EDGES,
    GEOMETRIC_PRECISION,
}

/// @brief Sets the default shape rendering method.
///
/// Will be used when an SVG element's `shape-rendering` property is set to `auto`.
///
/// Default: `PXSVG_SHAPE_RENDERING_GEOMETRIC_PRECISION`
#[no_mangle]
pub extern "C" fn pxsvg_options_set_shape_rendering_mode(
    opt: *mut pxsvg_options,
    mode: pxsvg_shape_rendering,
) {
    let opt = match cast_opt(opt) {
        Some(v) => v,
        None => return,
    };

    opt.shape_rendering = match mode as i32 {
        0 => pxsvg::pxsvg_tree::ShapeRendering::OptimizeSpeed,
        1 => pxsvg::pxsvg_tree::ShapeRendering::CrispEdges,
        2 => pxsvg::pxsvg_tree::ShapeRendering::GeometricPrecision,
        _ => return,
    }
}

/// @brief A image rendering method.
#[repr(C)]
#[allow(missing_docs)]
#[derive(Copy, Clone)]
pub enum pxsvg_image_rendering {
    OPTIMIZE_QUALITY,
    OPTIMIZE_SPEED,
}

/// @brief Sets the default image rendering method.
///
/// Will be used when an SVG element's `image-rendering` property is set to `auto`.
///
/// Default: `PXSVG_IMAGE_RENDERING_OPTIMIZE_QUALITY`
#[no_mangle]
pub extern "C" fn pxsvg_options_set_image_rendering_mode(
    opt: *mut pxsvg_options,
    mode: pxsvg_image_rendering,
) {
    let opt = match cast_opt(opt) {
        Some(v) => v,
        None => return,
    };

    opt.image_rendering = match mode as i32 {
        0 => pxsvg::pxsvg_tree::ImageRendering::OptimizeQuality,
        1 => pxsvg::pxsvg_tree::ImageRendering::OptimizeSpeed,
        _ => return,
    }
}

/// @brief Allows loading of images referenced by a file path.
///
/// Paths are resolved relative to the resources directory.
///
/// Default: false
#[no_mangle]
pub extern "C" fn pxsvg_options_set_load_external_images(opt: *mut pxsvg_options, flag: bool) {
    if let Some(opt) = cast_opt(opt) {
        opt.load_external_images = flag;
    }
}

/// @brief Sets a user style sheet.
///
/// Applied after the document's own style sheets.
///
/// Must be UTF-8. Can be NULL.
///
/// Default: NULL
#[no_mangle]
pub extern "C" fn pxsvg_options_set_stylesheet(opt: *mut pxsvg_options, content: *const c_char) {
    let opt = match cast_opt(opt) {
        Some(v) => v,
        None => return,
    };

    if content.is_null() {
        opt.style_sheet = None;
    } else if let Some(content) = cstr_to_str(content) {
        opt.style_sheet = Some(content.to_string());
    }
}

/// @brief Loads a font data into the internal fonts database.
///
/// Prints a warning into the log when the data is not a valid TrueType font.
///
/// Has no effect when the `text` feature is not enabled.
#[no_mangle]
#[allow(unused_variables)]
pub extern "C" fn pxsvg_options_load_font_data(
    opt: *mut pxsvg_options,
    data: *const c_char,
    len: usize,
) {
    #[cfg(feature = "text")]
    {
        if data.is_null() {
            return;
        }

        let opt = match cast_opt(opt) {
            Some(v) => v,
            None => return,
        };

        let data = unsafe { slice::from_raw_parts(data as *const u8, len) };
        opt.fontdb_mut().load_font_data(data.to_vec())
    }
}

/// @brief Loads a font file into the internal fonts database.
///
/// Prints a warning into the log when the data is not a valid TrueType font.
///
/// Has no effect when the `text` or `system-fonts` features are not enabled.
///
/// @return #pxsvg_error with PXSVG_OK, PXSVG_ERROR_INVALID_HANDLE
///         or PXSVG_ERROR_MALFORMED_INPUT when the file cannot be loaded.
#[no_mangle]
#[allow(unused_variables)]
pub extern "C" fn pxsvg_options_load_font_file(
    opt: *mut pxsvg_options,
    file_path: *const c_char,
) -> i32 {
    #[cfg(all(feature = "text", feature = "system-fonts"))]
    {
        let file_path = match cstr_to_str(file_path) {
            Some(v) => v,
            None => return pxsvg_error::INVALID_HANDLE as i32,
        };

        let opt = match cast_opt(opt) {
            Some(v) => v,
            None => return pxsvg_error::INVALID_HANDLE as i32,
        };

        if opt.fontdb_mut().load_font_file(file_path).is_ok() {
            pxsvg_error::OK as i32
        } else {
            pxsvg_error::MALFORMED_INPUT as i32
        }
    }

    #[cfg(not(all(feature = "text", feature = "system-fonts")))]
    {
        pxsvg_error::OK as i32
    }
}

/// @brief Loads system fonts into the internal fonts database.
///
/// This method is very IO intensive.
///
/// This method should be executed only once per #pxsvg_options.
///
/// Prints warnings into the log.
///
/// Has no effect when the `text` or `system-fonts` features are not enabled.
#[no_mangle]
#[allow(unused_variables)]
pub extern "C" fn pxsvg_options_load_system_fonts(opt: *mut pxsvg_options) {
    #[cfg(all(feature = "text", feature = "system-fonts"))]
    {
        if let Some(opt) = cast_opt(opt) {
            opt.fontdb_mut().load_system_fonts();
        }
    }
}

/// @brief Destroys the #pxsvg_options.
///
/// NULL is a no-op.
#[no_mangle]
pub extern "C" fn pxsvg_options_destroy(opt: *mut pxsvg_options) {
    if opt.is_null() {
        return;
    }

    unsafe {
        let _ = Box::from_raw(opt);
    };
}

/// @brief An opaque pointer to a parsed tree.
pub struct pxsvg_tree(pxsvg::Tree);

/// @brief Creates #pxsvg_tree from data.
///
/// @param data SVG data. Can contain SVG string or gzip compressed data. Must not be NULL.
/// @param len Data length.
/// @param opt Parsing options. Must not be NULL.
/// @param tree Parsed tree. Should be destroyed via #pxsvg_tree_destroy.
/// @return #pxsvg_error
#[no_mangle]
pub extern "C" fn pxsvg_parse_tree_from_data(
    data: *const c_char,
    len: usize,
    opt: *const pxsvg_options,
    tree: *mut *mut pxsvg_tree,
) -> i32 {
    if data.is_null() || opt.is_null() || tree.is_null() {
        return pxsvg_error::INVALID_HANDLE as i32;
    }

    let data = unsafe { slice::from_raw_parts(data as *const u8, len) };
    let raw_opt = unsafe { &*opt };

    let rtree = match pxsvg::Tree::from_data(data, &raw_opt.0) {
        Ok(tree) => tree,
        Err(e) => return convert_error(e) as i32,
    };

    let tree_box = Box::new(pxsvg_tree(rtree));
    unsafe {
        *tree = Box::into_raw(tree_box);
    }

    pxsvg_error::OK as i32
}

/// @brief Returns an image size.
///
/// The size of a canvas that required to render this SVG.
///
/// @param tree A tree. Can be NULL.
/// @return Image size or `{0, 0}` when the tree is NULL or has no size.
#[no_mangle]
pub extern "C" fn pxsvg_get_image_size(tree: *const pxsvg_tree) -> pxsvg_size {
    if tree.is_null() {
        return pxsvg_size {
            width: 0.0,
            height: 0.0,
        };
    }

    let tree = unsafe { &*tree };
    let (width, height) = tree.0.image_size();
    pxsvg_size { width, height }
}

/// @brief Renders the #pxsvg_tree onto the pixmap.
///
/// The pixmap is cleared before rendering.
///
/// @param tree A tree.
/// @param transform A root SVG transform. Can be used to position SVG inside the `pixmap`.
/// @param width Pixmap width.
/// @param height Pixmap height.
/// @param pixmap Pixmap data. Must have at least width*height*4 bytes.
///               Will contain premultiplied RGBA8888 pixels.
/// @return #pxsvg_error
#[no_mangle]
pub extern "C" fn pxsvg_render(
    tree: *const pxsvg_tree,
    transform: pxsvg_transform,
    width: u32,
    height: u32,
    pixmap: *mut c_char,
) -> i32 {
    if tree.is_null() {
        return pxsvg_error::INVALID_HANDLE as i32;
    }

    // Nothing to render.
    if width == 0 || height == 0 {
        return pxsvg_error::OK as i32;
    }

    if pixmap.is_null() {
        return pxsvg_error::INVALID_HANDLE as i32;
    }

    let tree = unsafe { &*tree };

    let pixmap_len = match (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
    {
        Some(v) => v,
        None => return pxsvg_error::OUT_OF_MEMORY as i32,
    };
    let pixmap: &mut [u8] = unsafe { slice::from_raw_parts_mut(pixmap as *mut u8, pixmap_len) };

    match tree.0.render(transform.to_transform(), width, height, pixmap) {
        Ok(()) => pxsvg_error::OK as i32,
        Err(pxsvg::RenderError::OutOfMemory) => pxsvg_error::OUT_OF_MEMORY as i32,
        Err(e) => {
            log::warn!("Failed to render: {}.", e);
            pxsvg_error::INVALID_HANDLE as i32
        }
    }
}

/// @brief Destroys the #pxsvg_tree.
///
/// NULL is a no-op.
#[no_mangle]
pub extern "C" fn pxsvg_tree_destroy(tree: *mut pxsvg_tree) {
    if tree.is_null() {
        return;
    }

    unsafe {
        let _ = Box::from_raw(tree);
    };
}

fn cstr_to_str(text: *const c_char) -> Option<&'static str> {
    if text.is_null() {
        return None;
    }

    let text = unsafe { CStr::from_ptr(text) };
    text.to_str().ok()
}

fn convert_error(e: pxsvg::Error) -> pxsvg_error {
    use pxsvg::pxsvg_tree::Error;

    match e {
        pxsvg::Error::Parse(Error::TooComplex) => pxsvg_error::TOO_COMPLEX,
        pxsvg::Error::Parse(Error::NotUtf8)
        | pxsvg::Error::Parse(Error::MalformedGZip)
        | pxsvg::Error::Parse(Error::Malformed(_))
        | pxsvg::Error::Parse(Error::UnsupportedVersion)
        | pxsvg::Error::Parse(Error::CyclicReference(_))
        | pxsvg::Error::Parse(Error::InvalidSize) => pxsvg_error::MALFORMED_INPUT,
    }
}

/// A simple stderr logger.
static LOGGER: SimpleLogger = SimpleLogger;
struct SimpleLogger;
impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::LevelFilter::Warn
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let target = if !record.target().is_empty() {
                record.target()
            } else {
                record.module_path().unwrap_or_default()
            };

            let line = record.line().unwrap_or(0);
            let args = record.args();

            match record.level() {
                log::Level::Error => eprintln!("Error (in {}:{}): {}", target, line, args),
                log::Level::Warn => eprintln!("Warning (in {}:{}): {}", target, line, args),
                log::Level::Info => eprintln!("Info (in {}:{}): {}", target, line, args),
                log::Level::Debug => eprintln!("Debug (in {}:{}): {}", target, line, args),
                log::Level::Trace => eprintln!("Trace (in {}:{}): {}", target, line, args),
            }
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    const RECT: &str = "<svg xmlns='http://www.w3.org/2000/svg' width='20' height='10'>\
                        <rect x='5' width='10' height='10' fill='#ff0000'/></svg>";

    fn parse(text: &str) -> (i32, *mut pxsvg_tree) {
        let opt = pxsvg_options_create();
        let mut tree = ptr::null_mut();
        let status = pxsvg_parse_tree_from_data(
            text.as_ptr() as *const c_char,
            text.len(),
            opt,
            &mut tree,
        );
        pxsvg_options_destroy(opt);
        (status, tree)
    }

    #[test]
    fn render_rect() {
        let (status, tree) = parse(RECT);
        assert_eq!(status, pxsvg_error::OK as i32);

        let size = pxsvg_get_image_size(tree);
        assert_eq!((size.width, size.height), (20.0, 10.0));

        let mut buf = vec![0u8; 20 * 10 * 4];
        let status = pxsvg_render(
            tree,
            pxsvg_transform_identity(),
            20,
            10,
            buf.as_mut_ptr() as *mut c_char,
        );
        assert_eq!(status, pxsvg_error::OK as i32);

        let idx = (5 * 20 + 10) * 4;
        assert_eq!(&buf[idx..idx + 4], &[255, 0, 0, 255]);
        assert_eq!(&buf[0..4], &[0, 0, 0, 0]);

        pxsvg_tree_destroy(tree);
    }

    #[test]
    fn null_handles() {
        assert_eq!(
            pxsvg_render(
                ptr::null(),
                pxsvg_transform_identity(),
                1,
                1,
                ptr::null_mut()
            ),
            pxsvg_error::INVALID_HANDLE as i32
        );

        let size = pxsvg_get_image_size(ptr::null());
        assert_eq!((size.width, size.height), (0.0, 0.0));

        let mut tree = ptr::null_mut();
        let status = pxsvg_parse_tree_from_data(ptr::null(), 0, ptr::null(), &mut tree);
        assert_eq!(status, pxsvg_error::INVALID_HANDLE as i32);
        assert!(tree.is_null());

        pxsvg_tree_destroy(ptr::null_mut());
        pxsvg_options_destroy(ptr::null_mut());
        pxsvg_options_set_dpi(ptr::null_mut(), 72.0);
    }

    #[test]
    fn malformed_input() {
        let (status, tree) = parse("<svg");
        assert_eq!(status, pxsvg_error::MALFORMED_INPUT as i32);
        assert!(tree.is_null());

        let (status, _) = parse(
            "<svg xmlns='http://www.w3.org/2000/svg' width='10' height='10'>\
             <use id='a' href='#b'/><use id='b' href='#a'/></svg>",
        );
        assert_eq!(status, pxsvg_error::MALFORMED_INPUT as i32);
    }

    #[test]
    fn too_complex() {
        let mut svg = String::from("<svg xmlns='http://www.w3.org/2000/svg'>");
        for _ in 0..150 {
            svg.push_str("<g>");
        }
        for _ in 0..150 {
            svg.push_str("</g>");
        }
        svg.push_str("</svg>");

        let (status, tree) = parse(&svg);
        assert_eq!(status, pxsvg_error::TOO_COMPLEX as i32);
        assert!(tree.is_null());
    }

    #[test]
    fn sizeless_tree() {
        let (status, tree) = parse("<svg xmlns='http://www.w3.org/2000/svg'/>");
        assert_eq!(status, pxsvg_error::OK as i32);

        let size = pxsvg_get_image_size(tree);
        assert_eq!((size.width, size.height), (0.0, 0.0));

        pxsvg_tree_destroy(tree);
    }

    #[test]
    fn options_setters() {
        let opt = pxsvg_options_create();
        pxsvg_options_set_dpi(opt, 72.0);
        pxsvg_options_set_font_size(opt, 16.0);
        pxsvg_options_set_font_family(opt, b"Noto Sans\0".as_ptr() as *const c_char);
        pxsvg_options_set_languages(opt, b"en, de,\0".as_ptr() as *const c_char);
        pxsvg_options_set_shape_rendering_mode(opt, pxsvg_shape_rendering::CRISP_EDGES);
        pxsvg_options_set_image_rendering_mode(opt, pxsvg_image_rendering::OPTIMIZE_SPEED);
        pxsvg_options_set_load_external_images(opt, true);

        let o = unsafe { &(*opt).0 };
        assert_eq!(o.dpi, 72.0);
        assert_eq!(o.font_size, 16.0);
        assert_eq!(o.font_family, "Noto Sans");
        assert_eq!(o.languages, vec!["en".to_string(), "de".to_string()]);
        assert_eq!(
            o.shape_rendering,
            pxsvg::pxsvg_tree::ShapeRendering::CrispEdges
        );
        assert!(o.load_external_images);

        pxsvg_options_destroy(opt);
    }
}
