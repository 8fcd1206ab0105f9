// Partition: train/test boundary over a dataset
//
//   [0 ........ train_count) [train_count ........ total)
//          train                       test
//
// A Partition stores only the two integers. Views borrow slices of the
// dataset's buffers; nothing is copied.

use std::ops::Range;

use crate::dataset::{Dataset, Sample, SpriteDataset};

/// Disjoint, contiguous train and test ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    train_count: usize,
    total: usize,
}

impl Partition {
    /// # Panics
    /// Panics unless `0 < train_count < total`.
    pub fn new(train_count: usize, total: usize) -> Self {
        assert!(
            train_count > 0 && train_count < total,
            "Partition: train_count {train_count} must lie strictly inside (0, {total})"
        );
        Self { train_count, total }
    }

    pub fn train_count(&self) -> usize {
        self.train_count
    }

    pub fn test_count(&self) -> usize {
        self.total - self.train_count
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn train_range(&self) -> Range<usize> {
        0..self.train_count
    }

    pub fn test_range(&self) -> Range<usize> {
        self.train_count..self.total
    }

    /// Train view over `dataset`.
    ///
    /// # Panics
    /// Panics if the partition was built for a different dataset size.
    pub fn train<'a>(&self, dataset: &'a SpriteDataset) -> Split<'a> {
        Split::over(dataset, self.checked(dataset).train_range(), "train")
    }

    /// Test view over `dataset`.
    ///
    /// # Panics
    /// Panics if the partition was built for a different dataset size.
    pub fn test<'a>(&self, dataset: &'a SpriteDataset) -> Split<'a> {
        Split::over(dataset, self.checked(dataset).test_range(), "test")
    }

    fn checked(&self, dataset: &SpriteDataset) -> &Self {
        assert_eq!(
            self.total,
            dataset.len(),
            "Partition: built for {} samples, dataset has {}",
            self.total,
            dataset.len()
        );
        self
    }
}

/// A read-only view over a contiguous range of a dataset.
#[derive(Debug, Clone, Copy)]
pub struct Split<'a> {
    name: &'static str,
    start: usize,
    images: &'a [f32],
    labels: &'a [u8],
    image_size: usize,
    num_classes: usize,
}

impl<'a> Split<'a> {
    fn over(dataset: &'a SpriteDataset, range: Range<usize>, name: &'static str) -> Self {
        let image_size = dataset.image_size();
        let num_classes = dataset.num_classes();
        Self {
            name,
            start: range.start,
            images: &dataset.images()[range.start * image_size..range.end * image_size],
            labels: &dataset.labels()[range.start * num_classes..range.end * num_classes],
            image_size,
            num_classes,
        }
    }

    /// Images of this range, flat.
    pub fn images(&self) -> &'a [f32] {
        self.images
    }

    /// Labels of this range, flat.
    pub fn labels(&self) -> &'a [u8] {
        self.labels
    }

    /// Index of this view's first sample in the underlying dataset.
    pub fn start(&self) -> usize {
        self.start
    }
}

impl Dataset for Split<'_> {
    fn len(&self) -> usize {
        self.images.len() / self.image_size
    }

    fn get(&self, index: usize) -> Sample<'_> {
        let is = self.image_size;
        let nc = self.num_classes;
        Sample {
            image: &self.images[index * is..(index + 1) * is],
            label: &self.labels[index * nc..(index + 1) * nc],
        }
    }

    fn image_size(&self) -> usize {
        self.image_size
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn name(&self) -> &str {
        self.name
    }
}
