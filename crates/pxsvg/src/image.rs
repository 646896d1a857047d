// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use pxsvg_tree::{Point, Rect, Transform};

use crate::display_list::ImageOp;
use crate::geom::IntRect;
use crate::pixmap::{self, Mask, Pixmap};

/// Draws a decoded image onto the pixmap.
pub fn draw(image: &ImageOp, clip: Option<&Mask>, pixmap: &mut Pixmap) -> Option<()> {
    let raster = &image.pixmap;
    let (w, h) = (raster.width() as f32, raster.height() as f32);

    let inverse = image.transform.invert()?;
    let bounds = Rect::from_xywh(0.0, 0.0, w, h)?.transform(image.transform)?;
    let rect = IntRect::round_out(bounds)?.intersect(pixmap.rect())?;

    for y in rect.top()..rect.bottom() {
        for x in rect.left()..rect.right() {
            let mut p = Point::from_xy(x as f32 + 0.5, y as f32 + 0.5);
            inverse.map_point(&mut p);
            if !(p.x >= 0.0 && p.y >= 0.0 && p.x < w && p.y < h) {
                continue;
            }

            let mut c = raster.sample(p.x, p.y, image.quality, false);
            if let Some(clip) = clip {
                c = pixmap::scale(c, clip.get(x as u32, y as u32));
            }

            pixmap.blend_pixel(x as u32, y as u32, c);
        }
    }

    Some(())
}

/// Returns a transform that maps image pixels onto the viewport.
pub fn image_transform(
    image_size: pxsvg_tree::Size,
    view_box: pxsvg_tree::ViewBox,
    ts: Transform,
) -> Transform {
    let fit = pxsvg_tree::ViewBox {
        rect: image_size.to_non_zero_rect(0.0, 0.0),
        aspect: view_box.aspect,
    };

    ts.pre_translate(view_box.rect.x(), view_box.rect.y())
        .pre_concat(fit.to_transform(view_box.rect.size()))
}

#[cfg(feature = "raster-images")]
pub use raster_images::decode_raster;

#[cfg(feature = "raster-images")]
mod raster_images {
    use pxsvg_tree::ImageKind;
    use rgb::{FromSlice, RGBA8};

    use crate::pixmap::Pixmap;
    use crate::OptionLog;

    /// Decodes a raster image.
    ///
    /// Returns `None` for SVG images.
    pub fn decode_raster(image: &ImageKind) -> Option<Pixmap> {
        match image {
            ImageKind::SVG(_) => None,
            ImageKind::JPEG(ref data) => {
                decode_jpeg(data).log_none(|| log::warn!("Failed to decode a JPEG image."))
            }
            ImageKind::PNG(ref data) => {
                decode_png(data).log_none(|| log::warn!("Failed to decode a PNG image."))
            }
            ImageKind::GIF(ref data) => {
                decode_gif(data).log_none(|| log::warn!("Failed to decode a GIF image."))
            }
        }
    }

    fn decode_png(data: &[u8]) -> Option<Pixmap> {
        let mut decoder = png::Decoder::new(data);
        decoder.set_transformations(png::Transformations::normalize_to_color8());
        let mut reader = decoder.read_info().ok()?;
        let mut img_data = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut img_data).ok()?;
        let img_data = &img_data[..info.buffer_size()];

        let rgba = match info.color_type {
            png::ColorType::Rgb => rgb_to_rgba(img_data),
            png::ColorType::Rgba => img_data.as_rgba().to_vec(),
            png::ColorType::Grayscale => gray_to_rgba(img_data),
            png::ColorType::GrayscaleAlpha => img_data
                .chunks_exact(2)
                .map(|p| RGBA8::new(p[0], p[0], p[0], p[1]))
                .collect(),
            png::ColorType::Indexed => {
                log::warn!("Indexed PNG must be expanded.");
                return None;
            }
        };

        Pixmap::from_rgba8(info.width, info.height, &rgba)
    }

    fn decode_jpeg(data: &[u8]) -> Option<Pixmap> {
        let mut decoder = jpeg_decoder::Decoder::new(data);
        let img_data = decoder.decode().ok()?;
        let info = decoder.info()?;

        let rgba = match info.pixel_format {
            jpeg_decoder::PixelFormat::RGB24 => rgb_to_rgba(&img_data),
            jpeg_decoder::PixelFormat::L8 => gray_to_rgba(&img_data),
            jpeg_decoder::PixelFormat::CMYK32 => img_data
                .chunks_exact(4)
                .map(|p| {
                    let k = 255 - p[3] as u32;
                    let conv = |c: u8| ((255 - c as u32) * k / 255) as u8;
                    RGBA8::new(conv(p[0]), conv(p[1]), conv(p[2]), 255)
                })
                .collect(),
            jpeg_decoder::PixelFormat::L16 => img_data
                .chunks_exact(2)
                .map(|p| RGBA8::new(p[0], p[0], p[0], 255))
                .collect(),
        };

        Pixmap::from_rgba8(u32::from(info.width), u32::from(info.height), &rgba)
    }

    fn decode_gif(data: &[u8]) -> Option<Pixmap> {
        let mut decoder = gif::DecodeOptions::new();
        decoder.set_color_output(gif::ColorOutput::RGBA);
        let mut decoder = decoder.read_info(data).ok()?;
        let first_frame = decoder.read_next_frame().ok()??;

        Pixmap::from_rgba8(
            u32::from(first_frame.width),
            u32::from(first_frame.height),
            first_frame.buffer.as_rgba(),
        )
    }

    fn rgb_to_rgba(data: &[u8]) -> Vec<RGBA8> {
        data.as_rgb().iter().map(|p| p.with_alpha(255)).collect()
    }

    fn gray_to_rgba(data: &[u8]) -> Vec<RGBA8> {
        data.iter().map(|g| RGBA8::new(*g, *g, *g, 255)).collect()
    }

}
