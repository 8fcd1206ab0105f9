// Dataset trait and the in-memory sprite dataset
//
// Images and labels live in two flat buffers rather than an array of
// structs; a Sample is a pair of borrowed row slices into them.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use spritefeed_core::{Error, Result, Shape};

use crate::decode::DecodedImages;
use crate::labels::LabelStore;
use crate::layout::SpriteLayout;
use crate::partition::{Partition, Split};

/// A single sample: borrowed image and label rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample<'a> {
    /// Normalized intensities, `image_size` long.
    pub image: &'a [f32],
    /// One-hot (or all-zero) label row, `num_classes` long.
    pub label: &'a [u8],
}

/// A dataset is an indexed collection of fixed-size samples.
///
/// Implementations must be `Send + Sync` so batches can be gathered from
/// several threads.
pub trait Dataset: Send + Sync {
    /// Total number of samples in the dataset.
    fn len(&self) -> usize;

    /// Whether the dataset is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retrieve the sample at position `index`.
    ///
    /// # Panics
    /// May panic if `index >= self.len()`.
    fn get(&self, index: usize) -> Sample<'_>;

    /// Pixels per image.
    fn image_size(&self) -> usize;

    /// Slots per label row.
    fn num_classes(&self) -> usize;

    /// Optional human-readable name.
    fn name(&self) -> &str {
        "dataset"
    }
}

/// The whole corpus held in memory.
///
/// Built once from a decoded sprite and a label store, immutable afterwards.
#[derive(Debug, Clone)]
pub struct SpriteDataset {
    layout: SpriteLayout,
    images: Vec<f32>,
    labels: LabelStore,
}

impl SpriteDataset {
    /// Assemble a dataset from decoder output and a label store.
    pub fn new(layout: SpriteLayout, images: DecodedImages, labels: LabelStore) -> Result<Self> {
        if images.image_size() != layout.image_size() {
            return Err(Error::msg(format!(
                "decoded images have {} pixels, layout expects {}",
                images.image_size(),
                layout.image_size()
            )));
        }
        if labels.num_classes() != layout.num_classes {
            return Err(Error::msg(format!(
                "label store has {} classes, layout expects {}",
                labels.num_classes(),
                layout.num_classes
            )));
        }
        Self::assemble(layout, images.into_vec(), labels)
    }

    /// Build a dataset directly from flat buffers.
    ///
    /// Image values are taken as-is (no normalization check), which makes
    /// this the entry point for pre-normalized or hand-built data.
    pub fn from_buffers(layout: SpriteLayout, images: Vec<f32>, labels: Vec<u8>) -> Result<Self> {
        let labels = LabelStore::from_bytes(labels, &layout)?;
        Self::assemble(layout, images, labels)
    }

    fn assemble(layout: SpriteLayout, images: Vec<f32>, labels: LabelStore) -> Result<Self> {
        layout.validate()?;
        Shape::from((layout.num_elements, layout.image_size())).check_len(images.len())?;
        if labels.len() != layout.num_elements {
            return Err(Error::InvalidLabelData {
                expected: layout.labels_len(),
                got: labels.as_slice().len(),
            });
        }
        Ok(Self {
            layout,
            images,
            labels,
        })
    }

    /// Random images with random one-hot labels, for tests and demos.
    pub fn synthetic(layout: SpriteLayout, seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        let images: Vec<f32> = (0..layout.images_len())
            .map(|_| rng.gen::<u8>() as f32 / 255.0)
            .collect();
        let mut labels = vec![0u8; layout.labels_len()];
        for row in labels.chunks_exact_mut(layout.num_classes.max(1)) {
            row[rng.gen_range(0..row.len())] = 1;
        }
        Self::from_buffers(layout, images, labels)
    }

    pub fn layout(&self) -> &SpriteLayout {
        &self.layout
    }

    /// The flat image buffer, `num_elements * image_size` long.
    pub fn images(&self) -> &[f32] {
        &self.images
    }

    /// The flat label buffer, `num_elements * num_classes` long.
    pub fn labels(&self) -> &[u8] {
        self.labels.as_slice()
    }

    pub fn label_store(&self) -> &LabelStore {
        &self.labels
    }

    /// The partition given by the layout's train boundary.
    pub fn partition(&self) -> Partition {
        Partition::new(self.layout.num_train, self.layout.num_elements)
    }

    /// Split into train `[0, train_count)` and test `[train_count, len)` views.
    ///
    /// # Panics
    /// Panics unless `0 < train_count < self.len()`.
    pub fn split(&self, train_count: usize) -> (Split<'_>, Split<'_>) {
        let p = Partition::new(train_count, self.len());
        (p.train(self), p.test(self))
    }
}

impl Dataset for SpriteDataset {
    fn len(&self) -> usize {
        self.layout.num_elements
    }

    fn get(&self, index: usize) -> Sample<'_> {
        let size = self.layout.image_size();
        Sample {
            image: &self.images[index * size..(index + 1) * size],
            label: self.labels.label(index),
        }
    }

    fn image_size(&self) -> usize {
        self.layout.image_size()
    }

    fn num_classes(&self) -> usize {
        self.layout.num_classes
    }

    fn name(&self) -> &str {
        "sprite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> SpriteLayout {
        SpriteLayout {
            image_rows: 2,
            image_cols: 2,
            num_classes: 2,
            num_elements: 4,
            num_train: 3,
            strip_rows: 2,
        }
    }

    #[test]
    fn test_from_buffers() {
        let images: Vec<f32> = (0..16).map(|v| v as f32).collect();
        let labels = vec![1, 0, 0, 1, 1, 0, 0, 1];
        let ds = SpriteDataset::from_buffers(layout(), images, labels).unwrap();
        assert_eq!(ds.len(), 4);
        assert_eq!(ds.name(), "sprite");
        let s = ds.get(2);
        assert_eq!(s.image, &[8.0, 9.0, 10.0, 11.0]);
        assert_eq!(s.label, &[1, 0]);
    }

    #[test]
    fn test_image_length_mismatch() {
        let err = SpriteDataset::from_buffers(layout(), vec![0.0; 15], vec![0; 8]).unwrap_err();
        assert!(matches!(
            err,
            Error::ElementCountMismatch {
                expected: 16,
                got: 15,
                ..
            }
        ));
    }

    #[test]
    fn test_label_length_mismatch() {
        let err = SpriteDataset::from_buffers(layout(), vec![0.0; 16], vec![0; 7]).unwrap_err();
        assert!(matches!(err, Error::InvalidLabelData { .. }));
    }

    #[test]
    fn test_synthetic_is_well_formed() {
        let ds = SpriteDataset::synthetic(layout(), 7).unwrap();
        assert!(ds.images().iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!(ds.label_store().validate_one_hot().is_ok());
        for i in 0..ds.len() {
            assert!(ds.label_store().class_of(i).is_some());
        }
    }

    #[test]
    fn test_synthetic_is_seeded() {
        let a = SpriteDataset::synthetic(layout(), 3).unwrap();
        let b = SpriteDataset::synthetic(layout(), 3).unwrap();
        assert_eq!(a.images(), b.images());
        assert_eq!(a.labels(), b.labels());
    }
}
