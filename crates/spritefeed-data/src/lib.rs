//! # spritefeed-data
//!
//! Sprite-sheet ingestion and minibatch sampling.
//!
//! This crate provides:
//! - [`ImageDecoder`]: sprite raster → flat normalized `f32` buffer, strip by strip
//! - [`LabelStore`]: one-hot label bytes aligned with the images
//! - [`SpriteDataset`] / [`Dataset`]: the in-memory corpus and its indexed view
//! - [`Partition`] / [`Split`]: borrowed train/test ranges
//! - [`ShuffledSampler`]: one shuffled pass per epoch, explicit exhaustion
//! - [`BatchAssembler`] / [`Batch`]: gather-copy minibatches
//! - [`SpriteLoader`]: concurrent acquisition of both assets
//! - [`SpriteData`]: the loaded corpus with its sampler, ready to train on

pub mod batch;
pub mod config;
pub mod dataset;
pub mod decode;
pub mod labels;
pub mod layout;
pub mod loader;
pub mod partition;
pub mod sampler;
pub mod source;
pub mod sprite_data;

pub use batch::{Batch, BatchAssembler, BatchConfig};
pub use config::{SpriteConfig, SpriteEncoding};
pub use dataset::{Dataset, Sample, SpriteDataset};
pub use decode::{DecodedImages, ImageDecoder, Strip, Strips};
pub use labels::LabelStore;
pub use layout::{
    SpriteLayout, IMAGE_COLS, IMAGE_ROWS, IMAGE_SIZE, NUM_CLASSES, NUM_DATASET_ELEMENTS,
    NUM_TEST_ELEMENTS, NUM_TRAIN_ELEMENTS, STRIP_ROWS,
};
pub use loader::SpriteLoader;
pub use partition::{Partition, Split};
pub use sampler::{Permutation, ShuffledSampler};
pub use source::{Asset, AssetSource, FileSource, MemorySource};
pub use sprite_data::SpriteData;

#[cfg(feature = "http")]
pub use source::HttpSource;

pub use spritefeed_core::{Error, Result};
