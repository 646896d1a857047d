// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};
#[cfg(feature = "text")]
use std::sync::Arc;

use crate::{ImageRendering, ShapeRendering, Size};

/// Parsing options.
#[derive(Clone, Debug)]
pub struct Options {
    /// The base for relative image paths. Usually the SVG file directory.
    ///
    /// Default: `None`, paths are relative to the working directory.
    pub resources_dir: Option<PathBuf>,

    /// Dots per inch used to convert physical units like `mm` and `pt`.
    ///
    /// Default: 96
    pub dpi: f32,

    /// The family appended to every `font-family` list.
    ///
    /// Default: Times New Roman
    pub font_family: String,

    /// The root `font-size`.
    ///
    /// Default: 12
    pub font_size: f32,

    /// User languages, matched against `systemLanguage`.
    /// Entries look like `en` or `en-US`.
    ///
    /// Default: `["en"]`
    pub languages: Vec<String>,

    /// Used when `shape-rendering` is `auto` or not set.
    ///
    /// Default: `GeometricPrecision`
    pub shape_rendering: ShapeRendering,

    /// Used when `image-rendering` is `auto` or not set.
    ///
    /// Default: `OptimizeQuality`
    pub image_rendering: ImageRendering,

    /// The viewport percentages of the root `width` and `height` refer to
    /// when there is no `viewBox`.
    ///
    /// Default: 100x100
    pub default_size: Size,

    /// Whether `image` may read files. `data:` URLs are always decoded.
    ///
    /// Default: `false`
    pub load_external_images: bool,

    /// Extra CSS applied after the document `style` elements.
    ///
    /// Default: `None`
    pub style_sheet: Option<String>,

    /// Fonts available to `text`.
    #[cfg(feature = "text")]
    pub fontdb: Arc<fontdb::Database>,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            resources_dir: None,
            dpi: 96.0,
            font_family: "Times New Roman".to_string(),
            font_size: 12.0,
            languages: vec!["en".to_string()],
            shape_rendering: ShapeRendering::default(),
            image_rendering: ImageRendering::default(),
            default_size: Size::from_wh(100.0, 100.0).unwrap(),
            load_external_images: false,
            style_sheet: None,
            #[cfg(feature = "text")]
            fontdb: Arc::new(fontdb::Database::new()),
        }
    }
}

impl Options {
    /// Resolves `path` against `resources_dir`.
    pub fn get_abs_path(&self, path: &Path) -> PathBuf {
        match self.resources_dir {
            Some(ref dir) => dir.join(path),
            None => path.to_path_buf(),
        }
    }

    /// Returns the font database for modification,
    /// cloning it first if it is shared.
    #[cfg(feature = "text")]
    pub fn fontdb_mut(&mut self) -> &mut fontdb::Database {
        Arc::make_mut(&mut self.fontdb)
    }
}
