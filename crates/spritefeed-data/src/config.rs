// SpriteConfig: knobs for loading and batching

use crate::batch::BatchConfig;
use crate::layout::SpriteLayout;

/// How the sprite asset is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpriteEncoding {
    /// An encoded raster (PNG) decoded with the `image` crate.
    #[default]
    Png,
    /// Raw interleaved RGBA bytes with the layout's sprite dimensions.
    Rgba,
}

/// Configuration for [`SpriteLoader`](crate::SpriteLoader) and
/// [`SpriteData`](crate::SpriteData).
#[derive(Debug, Clone)]
pub struct SpriteConfig {
    /// Corpus geometry.
    pub layout: SpriteLayout,
    /// Encoding of the sprite asset.
    pub encoding: SpriteEncoding,
    /// Optional random seed for reproducible shuffling.
    pub seed: Option<u64>,
    /// Number of parallel workers for batch gathering (0 = sequential).
    pub num_workers: usize,
    /// Reject label rows that are neither one-hot nor all-zero.
    pub strict_labels: bool,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            layout: SpriteLayout::mnist(),
            encoding: SpriteEncoding::Png,
            seed: None,
            num_workers: 0,
            strict_labels: false,
        }
    }
}

impl SpriteConfig {
    pub fn layout(mut self, layout: SpriteLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn encoding(mut self, e: SpriteEncoding) -> Self {
        self.encoding = e;
        self
    }

    pub fn seed(mut self, s: u64) -> Self {
        self.seed = Some(s);
        self
    }

    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    pub fn strict_labels(mut self, yes: bool) -> Self {
        self.strict_labels = yes;
        self
    }

    pub(crate) fn batch_config(&self) -> BatchConfig {
        BatchConfig::default().num_workers(self.num_workers)
    }
}
