// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`pxsvg-tree` is an [SVG] parser that produces a strongly-typed, immutable document model.

It sits between an XML library and the `pxsvg` rasterizer. All styles, references
and units are already resolved, so a renderer doesn't have to deal with the XML
or CSS layer at all.

## Features

- All supported attributes are resolved.
  No need to worry about inheritable, implicit and default attributes
- CSS from `style` elements and `style` attributes will be applied
- Basic shapes (like `rect` and `circle`) will be converted into paths
- Path data is stored in absolute coordinates. Arcs are preserved
- `use` will be resolved and instantiated
- Nested `svg` will be resolved
- Invalid, malformed elements will be skipped with a warning
- Relative length units (mm, em, etc.) will be converted into pixels
- Embedded, base64 images will be decoded. External images only on request
- All references (like `#elem` and `url(#elem)`) will be resolved
- `switch` will be resolved
- Text elements will be split into spans and, with the `text` feature,
  converted into glyph outlines
- Recursive references are detected and reported as an error

## Limitations

- Unsupported SVG features will be ignored
- CSS support is minimal
- Only static SVG features, e.g. no `a`, `view`, `cursor`, `script`,
  no events, no animations and no filters

[SVG]: https://en.wikipedia.org/wiki/Scalable_Vector_Graphics
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![warn(missing_copy_implementations)]

mod parser;
mod tree;

pub use parser::*;
pub use tree::*;

pub use roxmltree;
#[cfg(feature = "text")]
pub use fontdb;
