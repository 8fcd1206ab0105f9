// LabelStore: flat one-hot label bytes
//
// The label asset is a headerless byte stream, NUM_CLASSES slots per sample:
//
//   sample 0: 0 0 0 0 0 1 0 0 0 0   (class 5)
//   sample 1: 1 0 0 0 0 0 0 0 0 0   (class 0)
//
// Bytes are kept exactly as received. An all-zero row marks an unlabeled
// sample.

use spritefeed_core::{Error, Result};

use crate::layout::SpriteLayout;

/// One-hot labels aligned by position with the decoded images.
#[derive(Debug, Clone)]
pub struct LabelStore {
    bytes: Vec<u8>,
    num_classes: usize,
}

impl LabelStore {
    /// Wrap a raw label stream, checking its length against the layout.
    pub fn from_bytes(bytes: Vec<u8>, layout: &SpriteLayout) -> Result<Self> {
        let expected = layout.labels_len();
        if bytes.len() != expected {
            return Err(Error::InvalidLabelData {
                expected,
                got: bytes.len(),
            });
        }
        Ok(Self {
            bytes,
            num_classes: layout.num_classes,
        })
    }

    /// Number of label rows.
    pub fn len(&self) -> usize {
        self.bytes.len() / self.num_classes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Label row of sample `i`.
    ///
    /// # Panics
    /// Panics if `i >= self.len()`.
    pub fn label(&self, i: usize) -> &[u8] {
        &self.bytes[i * self.num_classes..(i + 1) * self.num_classes]
    }

    /// Class index of sample `i`, or `None` when the row is unlabeled or not
    /// one-hot.
    pub fn class_of(&self, i: usize) -> Option<usize> {
        one_hot_class(self.label(i))
    }

    /// Check every row is one-hot or all-zero.
    pub fn validate_one_hot(&self) -> Result<()> {
        let mut unlabeled = 0usize;
        for (index, row) in self.bytes.chunks_exact(self.num_classes).enumerate() {
            if row.iter().all(|&b| b == 0) {
                unlabeled += 1;
                continue;
            }
            if one_hot_class(row).is_none() {
                return Err(Error::MalformedLabel { index });
            }
        }
        if unlabeled > 0 {
            tracing::debug!(unlabeled, "label store contains unlabeled rows");
        }
        Ok(())
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}

/// Position of the single `1` in a one-hot row.
pub fn one_hot_class(row: &[u8]) -> Option<usize> {
    let mut found = None;
    for (i, &b) in row.iter().enumerate() {
        match b {
            0 => {}
            1 if found.is_none() => found = Some(i),
            _ => return None,
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(n: usize, classes: usize) -> SpriteLayout {
        SpriteLayout {
            image_rows: 1,
            image_cols: 1,
            num_classes: classes,
            num_elements: n,
            num_train: 1,
            strip_rows: 1,
        }
    }

    #[test]
    fn test_from_bytes_keeps_bytes() {
        let raw = vec![1, 0, 0, 1, 0, 0];
        let store = LabelStore::from_bytes(raw.clone(), &layout(3, 2)).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.as_slice(), raw.as_slice());
        assert_eq!(store.label(1), &[0, 1]);
        assert_eq!(store.class_of(0), Some(0));
        assert_eq!(store.class_of(1), Some(1));
        assert_eq!(store.class_of(2), None);
    }

    #[test]
    fn test_length_mismatch() {
        let err = LabelStore::from_bytes(vec![0; 5], &layout(3, 2)).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidLabelData {
                expected: 6,
                got: 5
            }
        ));
    }

    #[test]
    fn test_validate_one_hot() {
        let ok = LabelStore::from_bytes(vec![0, 1, 0, 0, 1, 0], &layout(3, 2)).unwrap();
        assert!(ok.validate_one_hot().is_ok());

        let two_hot = LabelStore::from_bytes(vec![0, 1, 1, 1, 1, 0], &layout(3, 2)).unwrap();
        assert!(matches!(
            two_hot.validate_one_hot(),
            Err(Error::MalformedLabel { index: 1 })
        ));

        let not_binary = LabelStore::from_bytes(vec![2, 0], &layout(1, 2)).unwrap();
        assert!(not_binary.validate_one_hot().is_err());
    }

    #[test]
    fn test_one_hot_class() {
        assert_eq!(one_hot_class(&[0, 0, 1]), Some(2));
        assert_eq!(one_hot_class(&[0, 0, 0]), None);
        assert_eq!(one_hot_class(&[1, 1, 0]), None);
    }
}
