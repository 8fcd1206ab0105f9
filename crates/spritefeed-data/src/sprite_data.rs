// SpriteData: loaded corpus plus its train sampler and test cursor
//
// Usage:
//
//   let mut data = SpriteData::load(FileSource::new("data/"), SpriteConfig::default())?;
//   loop {
//       match data.next_train_batch(512) {
//           Ok(batch) => { /* train on batch */ }
//           Err(e) if e.is_recoverable() => data.new_epoch(),
//           Err(e) => return Err(e),
//       }
//   }

use std::sync::Arc;

use spritefeed_core::{Error, Result};

use crate::batch::{Batch, BatchAssembler};
use crate::config::SpriteConfig;
use crate::dataset::SpriteDataset;
use crate::loader::SpriteLoader;
use crate::partition::{Partition, Split};
use crate::sampler::ShuffledSampler;
use crate::source::AssetSource;

/// A ready-to-train corpus.
///
/// Owns the immutable dataset and the only mutable state of the pipeline:
/// the train sampler and the test cursor. Batch draws take `&mut self`.
#[derive(Debug)]
pub struct SpriteData {
    dataset: Arc<SpriteDataset>,
    partition: Partition,
    sampler: ShuffledSampler,
    assembler: BatchAssembler,
    test_cursor: usize,
    test_pass: usize,
}

impl SpriteData {
    /// Acquire both assets from `source` and prepare the first epoch.
    pub fn load(source: impl AssetSource + 'static, config: SpriteConfig) -> Result<Self> {
        let dataset = SpriteLoader::new(source, config.clone()).load()?;
        Ok(Self::from_dataset(Arc::new(dataset), &config))
    }

    /// Wrap an already built dataset.
    pub fn from_dataset(dataset: Arc<SpriteDataset>, config: &SpriteConfig) -> Self {
        let partition = dataset.partition();
        let sampler = ShuffledSampler::new(partition.train_count(), config.seed);
        Self {
            dataset,
            partition,
            sampler,
            assembler: BatchAssembler::new(config.batch_config()),
            test_cursor: 0,
            test_pass: 0,
        }
    }

    /// Replace the train sampler, e.g. with one built from a fixed permutation.
    ///
    /// # Panics
    /// Panics if the sampler does not cover the train range.
    pub fn with_sampler(mut self, sampler: ShuffledSampler) -> Self {
        assert_eq!(
            sampler.len(),
            self.partition.train_count(),
            "SpriteData: sampler must cover the train range"
        );
        self.sampler = sampler;
        self
    }

    pub fn dataset(&self) -> &Arc<SpriteDataset> {
        &self.dataset
    }

    pub fn partition(&self) -> Partition {
        self.partition
    }

    pub fn train(&self) -> Split<'_> {
        self.partition.train(&self.dataset)
    }

    pub fn test(&self) -> Split<'_> {
        self.partition.test(&self.dataset)
    }

    pub fn sampler(&self) -> &ShuffledSampler {
        &self.sampler
    }

    /// Next shuffled train batch of `batch_size` samples.
    ///
    /// Fails with `EpochExhausted` once the epoch cannot fill the batch;
    /// call [`new_epoch`](Self::new_epoch) to continue.
    pub fn next_train_batch(&mut self, batch_size: usize) -> Result<Batch> {
        let train = self.partition.train(&self.dataset);
        self.assembler.next_batch(&mut self.sampler, &train, batch_size)
    }

    /// Next sequential test batch of `batch_size` samples.
    ///
    /// Fails with `EpochExhausted` once the test range cannot fill the
    /// batch. Its `epoch` is the test pass, counted by
    /// [`reset_test`](Self::reset_test), not the train epoch.
    pub fn next_test_batch(&mut self, batch_size: usize) -> Result<Batch> {
        let test = self.partition.test(&self.dataset);
        let remaining = self.partition.test_count() - self.test_cursor;
        if batch_size > remaining {
            return Err(Error::EpochExhausted {
                epoch: self.test_pass,
                requested: batch_size,
                remaining,
            });
        }
        let batch = self
            .assembler
            .sequential_batch(&test, self.test_cursor, batch_size);
        self.test_cursor += batch_size;
        Ok(batch)
    }

    /// Rewind the test cursor to the start of the test range.
    pub fn reset_test(&mut self) {
        self.test_cursor = 0;
        self.test_pass += 1;
    }

    /// Number of completed [`reset_test`](Self::reset_test) rewinds.
    pub fn test_pass(&self) -> usize {
        self.test_pass
    }

    /// Reshuffle the train order and start a new epoch.
    pub fn new_epoch(&mut self) {
        self.sampler.reshuffle();
        tracing::info!(epoch = self.sampler.epoch(), "starting new train epoch");
    }
}
