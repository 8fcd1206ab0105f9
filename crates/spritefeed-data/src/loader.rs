// SpriteLoader: fan-out / fan-in acquisition of the two assets
//
// Two workers run side by side:
//
//   images worker:  fetch sprite bytes → decode strips → DecodedImages
//   labels worker:  fetch label bytes  → length check  → LabelStore
//
// Each sends its result over a channel. The loader waits for both and only
// then builds the dataset. The first failure is returned immediately; the
// other worker is left to finish on its own and its result is dropped.
// Nothing partially built is ever handed out.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use spritefeed_core::{Error, Result};

use crate::config::{SpriteConfig, SpriteEncoding};
use crate::dataset::SpriteDataset;
use crate::decode::{DecodedImages, ImageDecoder};
use crate::labels::LabelStore;
use crate::layout::SpriteLayout;
use crate::source::{Asset, AssetSource};

/// Output of one acquisition worker.
enum Acquired {
    Images(DecodedImages),
    Labels(LabelStore),
}

/// Loads a [`SpriteDataset`] from an [`AssetSource`].
pub struct SpriteLoader {
    source: Arc<dyn AssetSource>,
    config: SpriteConfig,
}

impl SpriteLoader {
    pub fn new(source: impl AssetSource + 'static, config: SpriteConfig) -> Self {
        Self::from_shared(Arc::new(source), config)
    }

    /// Loader over a source that is shared with other owners.
    pub fn from_shared(source: Arc<dyn AssetSource>, config: SpriteConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &SpriteConfig {
        &self.config
    }

    /// Fetch and decode both assets concurrently, then assemble the dataset.
    pub fn load(&self) -> Result<SpriteDataset> {
        let layout = self.config.layout;
        layout.validate()?;

        let started = Instant::now();
        tracing::info!(
            elements = layout.num_elements,
            image_size = layout.image_size(),
            "loading sprite dataset"
        );

        let (tx, rx) = mpsc::channel::<Result<Acquired>>();
        let mut handles = Vec::with_capacity(2);

        {
            let tx = tx.clone();
            let source = self.source.clone();
            let decoder = ImageDecoder::new(layout);
            let encoding = self.config.encoding;
            handles.push(spawn_worker("spritefeed-images", move || {
                let result = acquire_images(&*source, &decoder, encoding).map(Acquired::Images);
                // Receiver gone means the loader already failed fast.
                let _ = tx.send(result);
            })?);
        }
        {
            let tx = tx.clone();
            let source = self.source.clone();
            let strict = self.config.strict_labels;
            handles.push(spawn_worker("spritefeed-labels", move || {
                let result = acquire_labels(&*source, &layout, strict).map(Acquired::Labels);
                let _ = tx.send(result);
            })?);
        }

        // Drop the original sender so the channel closes when both workers finish
        drop(tx);

        let mut images = None;
        let mut labels = None;
        let (images, labels) = loop {
            match (images.take(), labels.take()) {
                (Some(i), Some(l)) => break (i, l),
                (i, l) => {
                    images = i;
                    labels = l;
                }
            }
            match rx.recv() {
                Ok(Ok(Acquired::Images(i))) => images = Some(i),
                Ok(Ok(Acquired::Labels(l))) => labels = Some(l),
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "sprite dataset acquisition failed");
                    return Err(e);
                }
                Err(_) => {
                    return Err(Error::msg(
                        "asset worker terminated without producing a result",
                    ))
                }
            }
        };

        for h in handles {
            let _ = h.join();
        }

        let dataset = SpriteDataset::new(layout, images, labels)?;
        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "sprite dataset ready"
        );
        Ok(dataset)
    }
}

fn spawn_worker<F>(name: &str, f: F) -> Result<thread::JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(f)
        .map_err(|e| Error::msg(format!("cannot spawn {name} worker: {e}")))
}

fn acquire_images(
    source: &dyn AssetSource,
    decoder: &ImageDecoder,
    encoding: SpriteEncoding,
) -> Result<DecodedImages> {
    let bytes = source.fetch(Asset::Images)?;
    tracing::debug!(len = bytes.len(), ?encoding, "sprite bytes received");
    match encoding {
        SpriteEncoding::Png => decoder.decode_png(&bytes),
        SpriteEncoding::Rgba => {
            let layout = decoder.layout();
            decoder.decode_rgba(&bytes, layout.sprite_width(), layout.sprite_height())
        }
    }
}

fn acquire_labels(source: &dyn AssetSource, layout: &SpriteLayout, strict: bool) -> Result<LabelStore> {
    let bytes = source.fetch(Asset::Labels)?;
    tracing::debug!(len = bytes.len(), "label bytes received");
    let store = LabelStore::from_bytes(bytes, layout)?;
    if strict {
        store.validate_one_hot()?;
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::build_sprite_rgba;
    use crate::source::MemorySource;
    use crate::Dataset;

    fn layout() -> SpriteLayout {
        SpriteLayout {
            image_rows: 2,
            image_cols: 2,
            num_classes: 2,
            num_elements: 3,
            num_train: 2,
            strip_rows: 2,
        }
    }

    fn rgba() -> Vec<u8> {
        build_sprite_rgba(&[&[0, 0, 0, 0], &[255, 255, 255, 255], &[51, 102, 153, 204]])
    }

    #[test]
    fn test_load_rgba() {
        let src = MemorySource::new(rgba(), vec![1, 0, 0, 1, 1, 0]);
        let cfg = SpriteConfig::default()
            .layout(layout())
            .encoding(SpriteEncoding::Rgba);
        let ds = SpriteLoader::new(src, cfg).load().unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.get(1).image, &[1.0; 4]);
        assert_eq!(ds.get(2).image[0], 0.2);
        assert_eq!(ds.get(2).label, &[1, 0]);
    }

    #[test]
    fn test_bad_labels_fail_fast() {
        let src = MemorySource::new(rgba(), vec![1, 0, 0]);
        let cfg = SpriteConfig::default()
            .layout(layout())
            .encoding(SpriteEncoding::Rgba);
        let err = SpriteLoader::new(src, cfg).load().unwrap_err();
        assert!(matches!(err, Error::InvalidLabelData { expected: 6, got: 3 }));
    }

    #[test]
    fn test_strict_labels() {
        let src = MemorySource::new(rgba(), vec![1, 1, 0, 1, 1, 0]);
        let cfg = SpriteConfig::default()
            .layout(layout())
            .encoding(SpriteEncoding::Rgba)
            .strict_labels(true);
        let err = SpriteLoader::new(src, cfg).load().unwrap_err();
        assert!(matches!(err, Error::MalformedLabel { index: 0 }));
    }

    #[test]
    fn test_invalid_layout_rejected_before_fetch() {
        let src = MemorySource::new(rgba(), vec![]);
        let cfg = SpriteConfig::default().layout(layout().with_num_train(3));
        let err = SpriteLoader::new(src, cfg).load().unwrap_err();
        assert!(matches!(err, Error::InvalidLayout(_)));
    }
}
