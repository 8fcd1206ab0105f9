// SpriteLayout: geometry of a sprite-packed corpus
//
// The MNIST sprite is a single raster 784 pixels wide and 65,000 pixels tall:
// every pixel row is one flattened 28×28 digit. Labels are a flat byte
// stream of 65,000 × 10 one-hot slots. The first 55,000 samples are the
// train range, the remaining 10,000 the test range.

use spritefeed_core::{DType, Error, Result};

pub const IMAGE_ROWS: usize = 28;
pub const IMAGE_COLS: usize = 28;
pub const IMAGE_SIZE: usize = IMAGE_ROWS * IMAGE_COLS;
pub const NUM_CLASSES: usize = 10;
pub const NUM_DATASET_ELEMENTS: usize = 65_000;
pub const NUM_TRAIN_ELEMENTS: usize = 55_000;
pub const NUM_TEST_ELEMENTS: usize = NUM_DATASET_ELEMENTS - NUM_TRAIN_ELEMENTS;
/// Sprite rows decoded per strip.
pub const STRIP_ROWS: usize = 5_000;

/// Dimensions of a sprite corpus.
///
/// [`SpriteLayout::mnist`] is the canonical geometry; smaller layouts are
/// useful for tests and for other sprite-packed corpora.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteLayout {
    /// Height of one logical image.
    pub image_rows: usize,
    /// Width of one logical image.
    pub image_cols: usize,
    /// Number of class slots per label row.
    pub num_classes: usize,
    /// Total number of samples (sprite height).
    pub num_elements: usize,
    /// Samples in the train range `[0, num_train)`.
    pub num_train: usize,
    /// Sprite rows decoded per strip.
    pub strip_rows: usize,
}

impl Default for SpriteLayout {
    fn default() -> Self {
        Self::mnist()
    }
}

impl SpriteLayout {
    pub const fn mnist() -> Self {
        Self {
            image_rows: IMAGE_ROWS,
            image_cols: IMAGE_COLS,
            num_classes: NUM_CLASSES,
            num_elements: NUM_DATASET_ELEMENTS,
            num_train: NUM_TRAIN_ELEMENTS,
            strip_rows: STRIP_ROWS,
        }
    }

    /// Pixels per logical image.
    pub fn image_size(&self) -> usize {
        self.image_rows * self.image_cols
    }

    pub fn num_test(&self) -> usize {
        self.num_elements.saturating_sub(self.num_train)
    }

    /// Width of the sprite raster in pixels.
    pub fn sprite_width(&self) -> usize {
        self.image_size()
    }

    /// Height of the sprite raster in pixels.
    pub fn sprite_height(&self) -> usize {
        self.num_elements
    }

    /// Length of the decoded image buffer, in elements.
    pub fn images_len(&self) -> usize {
        self.num_elements * self.image_size()
    }

    /// Length of the label byte stream.
    pub fn labels_len(&self) -> usize {
        self.num_elements * self.num_classes
    }

    /// Number of strips the decoder walks.
    pub fn num_strips(&self) -> usize {
        self.num_elements.div_ceil(self.strip_rows)
    }

    /// Bytes allocated up front for the decoded `f32` image buffer.
    ///
    /// About 204 MB for MNIST; callers must budget for it.
    pub fn decode_buffer_bytes(&self) -> usize {
        self.images_len() * DType::F32.size_in_bytes()
    }

    pub fn with_strip_rows(mut self, rows: usize) -> Self {
        self.strip_rows = rows;
        self
    }

    pub fn with_num_train(mut self, n: usize) -> Self {
        self.num_train = n;
        self
    }

    /// Check the geometry is usable.
    pub fn validate(&self) -> Result<()> {
        if self.image_rows == 0 || self.image_cols == 0 {
            return Err(Error::InvalidLayout(format!(
                "image dimensions must be non-zero, got {}x{}",
                self.image_rows, self.image_cols
            )));
        }
        if self.num_classes == 0 {
            return Err(Error::InvalidLayout("num_classes must be non-zero".into()));
        }
        if self.num_train == 0 || self.num_train >= self.num_elements {
            return Err(Error::InvalidLayout(format!(
                "train boundary {} must lie strictly inside (0, {})",
                self.num_train, self.num_elements
            )));
        }
        if self.strip_rows == 0 {
            return Err(Error::InvalidLayout("strip_rows must be non-zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mnist_geometry() {
        let l = SpriteLayout::mnist();
        assert_eq!(l.image_size(), 784);
        assert_eq!(l.sprite_width(), 784);
        assert_eq!(l.sprite_height(), 65_000);
        assert_eq!(l.num_test(), NUM_TEST_ELEMENTS);
        assert_eq!(l.num_strips(), 13);
        assert_eq!(l.decode_buffer_bytes(), 65_000 * 784 * 4);
        assert!(l.validate().is_ok());
    }

    #[test]
    fn test_partial_last_strip_counts() {
        let l = SpriteLayout::mnist().with_strip_rows(6_000);
        assert_eq!(l.num_strips(), 11);
    }

    #[test]
    fn test_validate_rejects_bad_boundary() {
        let l = SpriteLayout::mnist().with_num_train(65_000);
        assert!(matches!(l.validate(), Err(Error::InvalidLayout(_))));
        let l = SpriteLayout::mnist().with_num_train(0);
        assert!(matches!(l.validate(), Err(Error::InvalidLayout(_))));
    }

    #[test]
    fn test_validate_rejects_zero_strip() {
        let l = SpriteLayout::mnist().with_strip_rows(0);
        assert!(l.validate().is_err());
    }
}
