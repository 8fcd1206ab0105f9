use crate::shape::Shape;

/// All errors that can occur within spritefeed.
///
/// Acquisition, decode and label errors are fatal to dataset construction:
/// when one is returned, no dataset was built. `EpochExhausted` is the only
/// recoverable variant; the caller reshuffles or stops.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A raw asset could not be fetched (file, memory or network source).
    #[error("failed to acquire {asset}: {reason}")]
    Acquisition { asset: String, reason: String },

    /// The sprite image could not be decoded, or its geometry does not match
    /// the expected element count and image size.
    #[error("sprite decode failed: {0}")]
    Decode(String),

    /// The label byte stream has the wrong length.
    #[error("invalid label data: expected {expected} bytes, got {got}")]
    InvalidLabelData { expected: usize, got: usize },

    /// A label row is neither one-hot nor all-zero.
    #[error("malformed label at sample {index}: not a one-hot row")]
    MalformedLabel { index: usize },

    /// The sampler has handed out every index of its current permutation.
    #[error(
        "epoch {epoch} exhausted: requested {requested} indices, {remaining} remaining"
    )]
    EpochExhausted {
        epoch: usize,
        requested: usize,
        remaining: usize,
    },

    /// A supplied index order is not a bijection on `[0, n)`.
    #[error("invalid permutation: {0}")]
    InvalidPermutation(String),

    /// Dataset geometry is inconsistent (zero sizes, bad train boundary...).
    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    /// Element count mismatch when wrapping a flat buffer.
    #[error("element count mismatch: shape {shape} requires {expected} elements, got {got}")]
    ElementCountMismatch {
        shape: Shape,
        expected: usize,
        got: usize,
    },

    /// Cannot reshape because element counts differ.
    #[error(
        "cannot reshape: source has {src} elements, target shape {dst_shape} has {dst} elements"
    )]
    ReshapeElementMismatch {
        src: usize,
        dst: usize,
        dst_shape: Shape,
    },

    /// Generic message for cases not covered above.
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Create an error from any string message.
    pub fn msg(s: impl Into<String>) -> Self {
        Error::Msg(s.into())
    }

    /// Build an acquisition error for the named asset.
    pub fn acquisition(asset: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::Acquisition {
            asset: asset.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the caller can recover by reshuffling (or stopping) and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::EpochExhausted { .. })
    }
}

/// Convenience Result type used throughout spritefeed.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_label_data() {
        let e = Error::InvalidLabelData {
            expected: 650_000,
            got: 12,
        };
        assert_eq!(
            e.to_string(),
            "invalid label data: expected 650000 bytes, got 12"
        );
    }

    #[test]
    fn test_only_exhaustion_is_recoverable() {
        let exhausted = Error::EpochExhausted {
            epoch: 0,
            requested: 1,
            remaining: 0,
        };
        assert!(exhausted.is_recoverable());
        assert!(!Error::Decode("bad".into()).is_recoverable());
        assert!(!Error::acquisition("labels", "timeout").is_recoverable());
    }
}
