// BatchAssembler: gather-copy minibatches out of a dataset view
//
// For each drawn index, the image row and the label row are copied into two
// freshly allocated contiguous buffers:
//
//   images: [batch_size, image_size]   (f32)
//   labels: [batch_size, num_classes]  (u8)
//
// Row i of `images` belongs with row i of `labels`; rows appear in draw
// order. The batch owns its buffers and shares nothing with the dataset.

use rayon::prelude::*;

use spritefeed_core::{DType, Result, Shape, WithDType};

use crate::dataset::Dataset;
use crate::sampler::ShuffledSampler;

/// A materialized minibatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    images: Vec<f32>,
    labels: Vec<u8>,
    batch_size: usize,
    image_size: usize,
    num_classes: usize,
}

impl Batch {
    /// Number of samples in the batch.
    pub fn len(&self) -> usize {
        self.batch_size
    }

    pub fn is_empty(&self) -> bool {
        self.batch_size == 0
    }

    pub fn images(&self) -> &[f32] {
        &self.images
    }

    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    pub fn images_mut(&mut self) -> &mut [f32] {
        &mut self.images
    }

    pub fn image_row(&self, i: usize) -> &[f32] {
        &self.images[i * self.image_size..(i + 1) * self.image_size]
    }

    pub fn label_row(&self, i: usize) -> &[u8] {
        &self.labels[i * self.num_classes..(i + 1) * self.num_classes]
    }

    /// `[batch_size, image_size]`
    pub fn image_shape(&self) -> Shape {
        Shape::from((self.batch_size, self.image_size))
    }

    /// The image buffer viewed as `[batch_size, rows, cols, 1]`.
    pub fn image_tensor_shape(&self, rows: usize, cols: usize) -> Result<Shape> {
        self.image_shape().reshape((self.batch_size, rows, cols, 1))
    }

    /// `[batch_size, num_classes]`
    pub fn label_shape(&self) -> Shape {
        Shape::from((self.batch_size, self.num_classes))
    }

    pub fn image_dtype(&self) -> DType {
        f32::DTYPE
    }

    pub fn label_dtype(&self) -> DType {
        u8::DTYPE
    }

    /// Labels widened to `f32`, for trainers that want float targets.
    pub fn labels_f32(&self) -> Vec<f32> {
        self.labels.iter().map(|&b| b as f32).collect()
    }

    /// Class index per row (`None` for unlabeled rows).
    pub fn classes(&self) -> Vec<Option<usize>> {
        self.labels
            .chunks_exact(self.num_classes)
            .map(crate::labels::one_hot_class)
            .collect()
    }

    /// Hand the two buffers over to the caller.
    pub fn into_parts(self) -> (Vec<f32>, Vec<u8>) {
        (self.images, self.labels)
    }
}

/// Configuration for the batch assembler.
#[derive(Debug, Clone, Default)]
pub struct BatchConfig {
    /// Parallel row copying on (`> 0`) or off (`0`).
    ///
    /// The value is a switch, not a thread count: parallel copies run on
    /// rayon's global pool, sized by rayon itself.
    pub num_workers: usize,
}

impl BatchConfig {
    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }
}

/// Builds batches by gather-copy.
#[derive(Debug, Clone, Default)]
pub struct BatchAssembler {
    config: BatchConfig,
}

impl BatchAssembler {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    /// Draw `batch_size` indices from `sampler` and copy those samples.
    ///
    /// Fails with `EpochExhausted` when the sampler has fewer than
    /// `batch_size` indices left; the sampler is then left untouched.
    ///
    /// # Panics
    /// Panics if `batch_size == 0` or if the sampler does not index `train`.
    pub fn next_batch<D: Dataset + ?Sized>(
        &self,
        sampler: &mut ShuffledSampler,
        train: &D,
        batch_size: usize,
    ) -> Result<Batch> {
        assert!(batch_size > 0, "BatchAssembler: batch_size must be non-zero");
        assert_eq!(
            sampler.len(),
            train.len(),
            "BatchAssembler: sampler covers {} indices, dataset has {} samples",
            sampler.len(),
            train.len()
        );
        let indices = sampler.draw(batch_size)?;
        Ok(self.gather(train, indices))
    }

    /// Copy `batch_size` consecutive samples starting at `start`.
    ///
    /// # Panics
    /// Panics if `batch_size == 0` or the range runs past the dataset.
    pub fn sequential_batch<D: Dataset + ?Sized>(
        &self,
        dataset: &D,
        start: usize,
        batch_size: usize,
    ) -> Batch {
        assert!(batch_size > 0, "BatchAssembler: batch_size must be non-zero");
        assert!(
            start + batch_size <= dataset.len(),
            "BatchAssembler: range {start}..{} exceeds {} samples",
            start + batch_size,
            dataset.len()
        );
        let indices: Vec<usize> = (start..start + batch_size).collect();
        self.gather(dataset, &indices)
    }

    /// Copy the samples at `indices`, in order, into a new batch.
    ///
    /// # Panics
    /// Panics if any index is out of range.
    pub fn gather<D: Dataset + ?Sized>(&self, dataset: &D, indices: &[usize]) -> Batch {
        let image_size = dataset.image_size();
        let num_classes = dataset.num_classes();
        let batch_size = indices.len();

        let mut images = vec![0f32; batch_size * image_size];
        let mut labels = vec![0u8; batch_size * num_classes];

        if self.config.num_workers > 0 && batch_size > 1 {
            images
                .par_chunks_mut(image_size)
                .zip(labels.par_chunks_mut(num_classes))
                .zip(indices.par_iter())
                .for_each(|((img, lbl), &idx)| {
                    let s = dataset.get(idx);
                    img.copy_from_slice(s.image);
                    lbl.copy_from_slice(s.label);
                });
        } else {
            for ((img, lbl), &idx) in images
                .chunks_exact_mut(image_size)
                .zip(labels.chunks_exact_mut(num_classes))
                .zip(indices)
            {
                let s = dataset.get(idx);
                img.copy_from_slice(s.image);
                lbl.copy_from_slice(s.label);
            }
        }

        Batch {
            images,
            labels,
            batch_size,
            image_size,
            num_classes,
        }
    }
}
