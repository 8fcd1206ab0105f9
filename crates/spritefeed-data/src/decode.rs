// ImageDecoder: sprite sheet → flat normalized f32 buffer
//
// The sprite packs one flattened image per pixel row:
//
//   row 0      | px0 px1 ... px783 |   ← sample 0
//   row 1      | px0 px1 ... px783 |   ← sample 1
//   ...
//   row 64999  | px0 px1 ... px783 |   ← sample 64999
//
// Pixels arrive interleaved (gray, RGB or RGBA, 8 bits per sample). The
// corpus is grayscale, so only channel 0 is read and scaled to [0, 1] by /255.
//
// The raster is walked in horizontal strips of `strip_rows` rows. Every strip
// holds whole images and lands at `out[first_row * image_size ..]`. PNG input
// is inflated straight into one reusable strip buffer, never as a whole.

use std::io::Cursor;
use std::iter::FusedIterator;

use spritefeed_core::{Error, Result};

use crate::layout::SpriteLayout;

/// Bytes per pixel of a raw RGBA sprite.
pub const CHANNELS: usize = 4;

/// Map a raw intensity byte onto `[0, 1]`.
#[inline]
pub fn normalize_intensity(byte: u8) -> f32 {
    byte as f32 / 255.0
}

// Strips: lazy strip producer

/// One horizontal band of the sprite.
#[derive(Debug, Clone, Copy)]
pub struct Strip<'a> {
    /// Position of this strip in decode order.
    pub index: usize,
    /// First sprite row (= first sample index) covered by the strip.
    pub first_row: usize,
    /// Number of sprite rows in the strip.
    pub rows: usize,
    /// RGBA bytes of those rows.
    pub pixels: &'a [u8],
}

/// Iterator over the fixed-height strips of an RGBA raster.
///
/// Finite and single-pass: once drained it stays drained. The last strip is
/// shorter when `strip_rows` does not divide the raster height.
#[derive(Debug)]
pub struct Strips<'a> {
    pixels: &'a [u8],
    row_bytes: usize,
    strip_rows: usize,
    total_rows: usize,
    next_row: usize,
    next_index: usize,
}

impl<'a> Strips<'a> {
    /// # Panics
    /// Panics if `strip_rows` or `row_bytes` is zero, or if `pixels` is not
    /// exactly `row_bytes * total_rows` long.
    pub fn new(pixels: &'a [u8], row_bytes: usize, total_rows: usize, strip_rows: usize) -> Self {
        assert!(strip_rows > 0, "Strips: strip_rows must be non-zero");
        assert!(row_bytes > 0, "Strips: row_bytes must be non-zero");
        assert_eq!(
            pixels.len(),
            row_bytes * total_rows,
            "Strips: raster length does not match its geometry"
        );
        Self {
            pixels,
            row_bytes,
            strip_rows,
            total_rows,
            next_row: 0,
            next_index: 0,
        }
    }
}

impl<'a> Iterator for Strips<'a> {
    type Item = Strip<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_row >= self.total_rows {
            return None;
        }
        let first_row = self.next_row;
        let rows = self.strip_rows.min(self.total_rows - first_row);
        let start = first_row * self.row_bytes;
        let end = start + rows * self.row_bytes;

        self.next_row += rows;
        self.next_index += 1;

        Some(Strip {
            index: self.next_index - 1,
            first_row,
            rows,
            pixels: &self.pixels[start..end],
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.total_rows - self.next_row).div_ceil(self.strip_rows);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Strips<'_> {}
impl FusedIterator for Strips<'_> {}

// DecodedImages

/// A fully decoded image buffer.
///
/// Only [`ImageDecoder`] builds one, and only after every strip has been
/// written, so holding a `DecodedImages` means the buffer is complete.
#[derive(Debug, Clone)]
pub struct DecodedImages {
    data: Vec<f32>,
    image_size: usize,
}

impl DecodedImages {
    /// Number of decoded images.
    pub fn count(&self) -> usize {
        self.data.len() / self.image_size
    }

    pub fn image_size(&self) -> usize {
        self.image_size
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Pixels of image `i`.
    ///
    /// # Panics
    /// Panics if `i >= self.count()`.
    pub fn image(&self, i: usize) -> &[f32] {
        &self.data[i * self.image_size..(i + 1) * self.image_size]
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

// ImageDecoder

/// Decodes a sprite sheet laid out per [`SpriteLayout`].
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    layout: SpriteLayout,
}

impl ImageDecoder {
    pub fn new(layout: SpriteLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &SpriteLayout {
        &self.layout
    }

    /// Decode a PNG sprite into normalized images.
    ///
    /// Rows are inflated one at a time into a buffer `strip_rows` tall, so
    /// only the output buffer and a single strip are resident. Interlaced
    /// files cannot be read row by row and are decoded whole instead.
    pub fn decode_png(&self, bytes: &[u8]) -> Result<DecodedImages> {
        let mut decoder = png::Decoder::new(Cursor::new(bytes));
        decoder.set_transformations(
            png::Transformations::EXPAND | png::Transformations::STRIP_16,
        );
        let mut reader = decoder.read_info().map_err(png_error)?;

        let (width, height, interlaced) = {
            let info = reader.info();
            (info.width as usize, info.height as usize, info.interlaced)
        };
        if interlaced {
            tracing::debug!(width, height, "interlaced sprite, decoding whole raster");
            return self.decode_png_whole(bytes);
        }

        let (color, depth) = reader.output_color_type();
        if depth != png::BitDepth::Eight {
            return Err(Error::Decode(format!("unsupported sprite bit depth {depth:?}")));
        }
        let channels = color.samples();
        tracing::debug!(width, height, ?color, "sprite header read");
        self.check_geometry(width, height)?;

        let layout = &self.layout;
        let image_size = layout.image_size();
        let mut out = self.allocate();

        let row_bytes = width * channels;
        let strip_bytes = layout.strip_rows.min(height) * row_bytes;
        let mut strip = Vec::with_capacity(strip_bytes);
        let mut first_row = 0;
        let mut index = 0;

        while let Some(row) = reader.next_row().map_err(png_error)? {
            let data = row.data();
            if data.len() != row_bytes {
                return Err(Error::Decode(format!(
                    "sprite row {} holds {} bytes, expected {row_bytes}",
                    first_row + strip.len() / row_bytes,
                    data.len()
                )));
            }
            strip.extend_from_slice(data);
            if strip.len() == strip_bytes {
                let rows = strip.len() / row_bytes;
                let band = Strip {
                    index,
                    first_row,
                    rows,
                    pixels: &strip,
                };
                write_strip(&mut out, image_size, channels, &band);
                first_row += rows;
                index += 1;
                strip.clear();
            }
        }
        if !strip.is_empty() {
            let rows = strip.len() / row_bytes;
            let band = Strip {
                index,
                first_row,
                rows,
                pixels: &strip,
            };
            write_strip(&mut out, image_size, channels, &band);
            first_row += rows;
            index += 1;
        }
        if first_row != height {
            return Err(Error::Decode(format!(
                "sprite ended after {first_row} of {height} rows"
            )));
        }

        tracing::info!(images = layout.num_elements, strips = index, "sprite decoded");
        Ok(DecodedImages {
            data: out,
            image_size,
        })
    }

    fn decode_png_whole(&self, bytes: &[u8]) -> Result<DecodedImages> {
        let rgba = image::load_from_memory(bytes)
            .map_err(|e| Error::Decode(format!("cannot load sprite image: {e}")))?
            .into_rgba8();
        let (width, height) = (rgba.width() as usize, rgba.height() as usize);
        self.decode_rgba(rgba.as_raw(), width, height)
    }

    /// Decode raw interleaved RGBA pixels of a `width × height` sprite.
    pub fn decode_rgba(&self, pixels: &[u8], width: usize, height: usize) -> Result<DecodedImages> {
        self.check_geometry(width, height)?;
        let expected = width * height * CHANNELS;
        if pixels.len() != expected {
            return Err(Error::Decode(format!(
                "sprite pixel buffer holds {} bytes, expected {expected}",
                pixels.len()
            )));
        }

        let layout = &self.layout;
        let image_size = layout.image_size();
        let mut out = self.allocate();
        for strip in Strips::new(pixels, width * CHANNELS, height, layout.strip_rows) {
            write_strip(&mut out, image_size, CHANNELS, &strip);
        }

        tracing::info!(
            images = layout.num_elements,
            strips = layout.num_strips(),
            "sprite decoded"
        );
        Ok(DecodedImages {
            data: out,
            image_size,
        })
    }

    fn check_geometry(&self, width: usize, height: usize) -> Result<()> {
        let layout = &self.layout;
        layout.validate()?;
        if width != layout.sprite_width() || height != layout.sprite_height() {
            return Err(Error::Decode(format!(
                "sprite is {width}x{height}, expected {}x{} ({} images of {} pixels)",
                layout.sprite_width(),
                layout.sprite_height(),
                layout.num_elements,
                layout.image_size()
            )));
        }
        Ok(())
    }

    fn allocate(&self) -> Vec<f32> {
        tracing::debug!(
            bytes = self.layout.decode_buffer_bytes(),
            "allocating decoded image buffer"
        );
        vec![0f32; self.layout.images_len()]
    }
}

/// Normalize channel 0 of every pixel in `strip` into its slot of `out`.
fn write_strip(out: &mut [f32], image_size: usize, channels: usize, strip: &Strip<'_>) {
    let offset = strip.first_row * image_size;
    let dst = &mut out[offset..offset + strip.rows * image_size];
    for (value, px) in dst.iter_mut().zip(strip.pixels.chunks_exact(channels)) {
        *value = normalize_intensity(px[0]);
    }
    tracing::debug!(
        strip = strip.index,
        first_row = strip.first_row,
        rows = strip.rows,
        "decoded strip"
    );
}

fn png_error(e: png::DecodingError) -> Error {
    Error::Decode(format!("cannot read sprite png: {e}"))
}

// Builder helpers

/// Pack grayscale images into an RGBA sprite, one image per pixel row.
///
/// All images must have the same length; that length is the sprite width.
pub fn build_sprite_rgba(images: &[&[u8]]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(images.iter().map(|i| i.len() * CHANNELS).sum());
    for img in images {
        for &v in img.iter() {
            buf.extend_from_slice(&[v, v, v, 255]);
        }
    }
    buf
}

/// Pack grayscale images into a PNG-encoded sprite (useful for tests).
pub fn build_sprite_png(images: &[&[u8]], image_size: usize) -> Result<Vec<u8>> {
    if let Some(bad) = images.iter().position(|i| i.len() != image_size) {
        return Err(Error::msg(format!(
            "image {bad} has {} pixels, expected {image_size}",
            images[bad].len()
        )));
    }
    let rgba = build_sprite_rgba(images);
    let raster = image::RgbaImage::from_raw(image_size as u32, images.len() as u32, rgba)
        .ok_or_else(|| Error::msg("sprite raster does not match its dimensions"))?;

    let mut bytes = Vec::new();
    raster
        .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
        .map_err(|e| Error::msg(format!("cannot encode sprite: {e}")))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_layout() -> SpriteLayout {
        SpriteLayout {
            image_rows: 2,
            image_cols: 2,
            num_classes: 2,
            num_elements: 5,
            num_train: 3,
            strip_rows: 2,
        }
    }

    #[test]
    fn test_strips_cover_raster() {
        let pixels = vec![0u8; 5 * 8];
        let strips: Vec<_> = Strips::new(&pixels, 8, 5, 2).collect();
        assert_eq!(strips.len(), 3);
        assert_eq!(strips[0].first_row, 0);
        assert_eq!(strips[1].first_row, 2);
        assert_eq!(strips[2].rows, 1); // short tail strip
        assert_eq!(strips[2].pixels.len(), 8);
    }

    #[test]
    fn test_strips_exact_size_and_fused() {
        let pixels = vec![0u8; 4 * 4];
        let mut s = Strips::new(&pixels, 4, 4, 2);
        assert_eq!(s.len(), 2);
        s.next();
        assert_eq!(s.len(), 1);
        s.next();
        assert!(s.next().is_none());
        assert!(s.next().is_none());
    }

    #[test]
    fn test_decode_rgba_uses_channel_zero() {
        let layout = tiny_layout();
        let imgs: Vec<Vec<u8>> = (0..5u8).map(|i| vec![i * 50; 4]).collect();
        let refs: Vec<&[u8]> = imgs.iter().map(|v| v.as_slice()).collect();
        let mut rgba = build_sprite_rgba(&refs);
        // Poison the redundant channels; they must be ignored.
        for px in rgba.chunks_exact_mut(4) {
            px[1] = 7;
            px[2] = 9;
            px[3] = 0;
        }
        let out = ImageDecoder::new(layout).decode_rgba(&rgba, 4, 5).unwrap();
        assert_eq!(out.count(), 5);
        assert_eq!(out.image(0), &[0.0; 4]);
        assert_eq!(out.image(4), &[200.0 / 255.0; 4]);
    }

    #[test]
    fn test_decode_rejects_wrong_dimensions() {
        let layout = tiny_layout();
        let rgba = vec![0u8; 4 * 4 * CHANNELS];
        let err = ImageDecoder::new(layout).decode_rgba(&rgba, 4, 4).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_short_buffer() {
        let layout = tiny_layout();
        let rgba = vec![0u8; 10];
        let err = ImageDecoder::new(layout).decode_rgba(&rgba, 4, 5).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_decode_png_garbage() {
        let err = ImageDecoder::new(tiny_layout())
            .decode_png(b"definitely not a png")
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_png_roundtrip() {
        let layout = tiny_layout();
        let imgs: Vec<Vec<u8>> = (0..5u8).map(|i| vec![i, 255 - i, 0, 128]).collect();
        let refs: Vec<&[u8]> = imgs.iter().map(|v| v.as_slice()).collect();
        let png = build_sprite_png(&refs, 4).unwrap();

        let out = ImageDecoder::new(layout).decode_png(&png).unwrap();
        for (i, img) in imgs.iter().enumerate() {
            let expected: Vec<f32> = img.iter().map(|&b| normalize_intensity(b)).collect();
            assert_eq!(out.image(i), expected.as_slice());
        }
    }

    #[test]
    fn test_grayscale_png_decodes() {
        let layout = tiny_layout();
        let gray: Vec<u8> = (0..20u8).map(|v| v * 12).collect();
        let raster = image::GrayImage::from_raw(4, 5, gray.clone()).unwrap();
        let mut png = Vec::new();
        raster
            .write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)
            .unwrap();

        let out = ImageDecoder::new(layout).decode_png(&png).unwrap();
        let expected: Vec<f32> = gray.iter().map(|&b| normalize_intensity(b)).collect();
        assert_eq!(out.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_png_strip_height_does_not_change_output() {
        let imgs: Vec<Vec<u8>> = (0..5u8).map(|i| vec![i * 40, 1, 2, 3]).collect();
        let refs: Vec<&[u8]> = imgs.iter().map(|v| v.as_slice()).collect();
        let png = build_sprite_png(&refs, 4).unwrap();

        let whole = ImageDecoder::new(tiny_layout().with_strip_rows(5))
            .decode_png(&png)
            .unwrap();
        let banded = ImageDecoder::new(tiny_layout().with_strip_rows(1))
            .decode_png(&png)
            .unwrap();
        assert_eq!(whole.as_slice(), banded.as_slice());
    }

    #[test]
    fn test_truncated_png() {
        let imgs: Vec<Vec<u8>> = (0..5u8).map(|i| vec![i; 4]).collect();
        let refs: Vec<&[u8]> = imgs.iter().map(|v| v.as_slice()).collect();
        let png = build_sprite_png(&refs, 4).unwrap();
        let err = ImageDecoder::new(tiny_layout())
            .decode_png(&png[..png.len() / 2])
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_normalize_bounds() {
        assert_eq!(normalize_intensity(0), 0.0);
        assert_eq!(normalize_intensity(255), 1.0);
    }
}
