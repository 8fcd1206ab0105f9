// AssetSource: where the raw sprite and label bytes come from
//
// The pipeline never fetches anything itself; it asks an AssetSource for the
// bytes of each asset. Sources here: a local directory, in-memory buffers,
// and (with the `http` feature) the public HTTP mirror of the corpus.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use spritefeed_core::{Error, Result};

/// Public location of the MNIST sprite.
pub const MNIST_IMAGES_SPRITE_URL: &str =
    "https://storage.googleapis.com/learnjs-data/model-builder/mnist_images.png";
/// Public location of the MNIST one-hot label stream.
pub const MNIST_LABELS_URL: &str =
    "https://storage.googleapis.com/learnjs-data/model-builder/mnist_labels_uint8";

/// The two raw inputs of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Asset {
    Images,
    Labels,
}

impl Asset {
    /// Conventional file name of the asset on disk.
    pub fn file_name(&self) -> &'static str {
        match self {
            Asset::Images => "mnist_images.png",
            Asset::Labels => "mnist_labels_uint8",
        }
    }

    pub fn default_url(&self) -> &'static str {
        match self {
            Asset::Images => MNIST_IMAGES_SPRITE_URL,
            Asset::Labels => MNIST_LABELS_URL,
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Images => write!(f, "sprite image"),
            Asset::Labels => write!(f, "label file"),
        }
    }
}

/// Supplies raw asset bytes.
///
/// `fetch` may block; the loader calls it from worker threads, one per asset.
pub trait AssetSource: Send + Sync {
    fn fetch(&self, asset: Asset) -> Result<Vec<u8>>;
}

impl<S: AssetSource + ?Sized> AssetSource for Arc<S> {
    fn fetch(&self, asset: Asset) -> Result<Vec<u8>> {
        (**self).fetch(asset)
    }
}

// FileSource

/// Reads assets from a directory, using [`Asset::file_name`] unless
/// overridden.
#[derive(Debug, Clone)]
pub struct FileSource {
    images: PathBuf,
    labels: PathBuf,
}

impl FileSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            images: dir.join(Asset::Images.file_name()),
            labels: dir.join(Asset::Labels.file_name()),
        }
    }

    /// Explicit paths for both assets.
    pub fn with_paths(images: impl Into<PathBuf>, labels: impl Into<PathBuf>) -> Self {
        Self {
            images: images.into(),
            labels: labels.into(),
        }
    }

    pub fn path(&self, asset: Asset) -> &Path {
        match asset {
            Asset::Images => &self.images,
            Asset::Labels => &self.labels,
        }
    }
}

impl AssetSource for FileSource {
    fn fetch(&self, asset: Asset) -> Result<Vec<u8>> {
        let path = self.path(asset);
        fs::read(path)
            .map_err(|e| Error::acquisition(asset.to_string(), format!("{}: {e}", path.display())))
    }
}

// MemorySource

/// Serves assets from memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    images: Arc<[u8]>,
    labels: Arc<[u8]>,
}

impl MemorySource {
    pub fn new(images: impl Into<Arc<[u8]>>, labels: impl Into<Arc<[u8]>>) -> Self {
        Self {
            images: images.into(),
            labels: labels.into(),
        }
    }
}

impl AssetSource for MemorySource {
    fn fetch(&self, asset: Asset) -> Result<Vec<u8>> {
        Ok(match asset {
            Asset::Images => self.images.to_vec(),
            Asset::Labels => self.labels.to_vec(),
        })
    }
}

// HttpSource

#[cfg(feature = "http")]
pub use http::HttpSource;

#[cfg(feature = "http")]
mod http {
    use super::{Asset, AssetSource};
    use spritefeed_core::{Error, Result};

    /// Downloads assets over HTTP with a blocking client.
    #[derive(Debug, Clone)]
    pub struct HttpSource {
        client: reqwest::blocking::Client,
        images_url: String,
        labels_url: String,
    }

    impl Default for HttpSource {
        fn default() -> Self {
            Self::new(Asset::Images.default_url(), Asset::Labels.default_url())
        }
    }

    impl HttpSource {
        pub fn new(images_url: impl Into<String>, labels_url: impl Into<String>) -> Self {
            Self {
                client: reqwest::blocking::Client::new(),
                images_url: images_url.into(),
                labels_url: labels_url.into(),
            }
        }

        pub fn url(&self, asset: Asset) -> &str {
            match asset {
                Asset::Images => &self.images_url,
                Asset::Labels => &self.labels_url,
            }
        }
    }

    impl AssetSource for HttpSource {
        fn fetch(&self, asset: Asset) -> Result<Vec<u8>> {
            let url = self.url(asset);
            let fail = |e: reqwest::Error| Error::acquisition(asset.to_string(), format!("{url}: {e}"));
            let resp = self
                .client
                .get(url)
                .send()
                .and_then(|r| r.error_for_status())
                .map_err(fail)?;
            let bytes = resp.bytes().map_err(fail)?;
            tracing::debug!(%asset, url, len = bytes.len(), "asset downloaded");
            Ok(bytes.to_vec())
        }
    }
}
