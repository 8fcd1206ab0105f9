// ShuffledSampler: one shuffled pass over the train range per epoch
//
// A Permutation is materialized once and never mutated. The sampler walks it
// with a cursor; once the cursor reaches the end, draws fail with
// EpochExhausted until the owner calls `reshuffle`, which builds a brand-new
// permutation. There is no implicit wrap, so epoch boundaries stay visible.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use spritefeed_core::{Error, Result};

/// An immutable ordering of `[0, n)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutation(Arc<[usize]>);

impl Permutation {
    /// Uniformly random permutation of `[0, n)` (Fisher–Yates).
    pub fn shuffled<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Self {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(rng);
        Self(indices.into())
    }

    /// The identity ordering `0, 1, ..., n-1`.
    pub fn identity(n: usize) -> Self {
        Self((0..n).collect::<Vec<_>>().into())
    }

    /// Wrap an explicit order, checking it is a bijection on `[0, len)`.
    pub fn from_indices(indices: Vec<usize>) -> Result<Self> {
        let n = indices.len();
        let mut seen = vec![false; n];
        for &i in &indices {
            if i >= n {
                return Err(Error::InvalidPermutation(format!(
                    "index {i} out of range for {n} elements"
                )));
            }
            if seen[i] {
                return Err(Error::InvalidPermutation(format!("index {i} repeated")));
            }
            seen[i] = true;
        }
        Ok(Self(indices.into()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Whether two handles refer to the same materialized permutation.
    pub fn same_as(&self, other: &Permutation) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Hands out train indices in shuffled order, one epoch at a time.
///
/// The sampler is the only mutable state of the pipeline. It is advanced
/// through `&mut self`, so a single consumer owns every draw.
#[derive(Debug)]
pub struct ShuffledSampler {
    permutation: Permutation,
    cursor: usize,
    epoch: usize,
    rng: StdRng,
}

impl ShuffledSampler {
    /// Sampler over `[0, n)` with a fresh permutation.
    ///
    /// With a seed the sequence of permutations is reproducible.
    pub fn new(n: usize, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let permutation = Permutation::shuffled(n, &mut rng);
        Self::with_rng(permutation, rng)
    }

    /// Sampler that starts from a fixed permutation.
    ///
    /// Later reshuffles draw from `seed` (or entropy).
    pub fn from_permutation(permutation: Permutation, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(permutation, rng)
    }

    fn with_rng(permutation: Permutation, rng: StdRng) -> Self {
        Self {
            permutation,
            cursor: 0,
            epoch: 0,
            rng,
        }
    }

    /// Size of the index space.
    pub fn len(&self) -> usize {
        self.permutation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permutation.is_empty()
    }

    /// Number of indices already drawn this epoch.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.permutation.len() - self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Number of reshuffles so far.
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    pub fn permutation(&self) -> &Permutation {
        &self.permutation
    }

    /// Next index of the current permutation.
    pub fn next_index(&mut self) -> Result<usize> {
        let idx = self.draw(1)?[0];
        Ok(idx)
    }

    /// Take the next `count` indices in one step.
    ///
    /// When fewer than `count` remain this fails with `EpochExhausted` and the
    /// cursor does not move.
    pub fn draw(&mut self, count: usize) -> Result<&[usize]> {
        let remaining = self.remaining();
        if count > remaining {
            return Err(Error::EpochExhausted {
                epoch: self.epoch,
                requested: count,
                remaining,
            });
        }
        let start = self.cursor;
        self.cursor += count;
        Ok(&self.permutation.as_slice()[start..self.cursor])
    }

    /// Start a new epoch over a freshly shuffled permutation.
    pub fn reshuffle(&mut self) {
        let n = self.permutation.len();
        self.permutation = Permutation::shuffled(n, &mut self.rng);
        self.cursor = 0;
        self.epoch += 1;
        tracing::debug!(epoch = self.epoch, n, "train order reshuffled");
    }
}
