use std::fmt;

// Shape: row-major shape of a flat buffer
//
// Batches and datasets are stored as flat buffers. A Shape tells the
// consumer how to view them:
//   - batch images: [batch, 784]        or [batch, 28, 28, 1]
//   - batch labels: [batch, 10]
//
// Reshaping never moves data; it only checks that element counts agree.

/// N-dimensional shape of a flat row-major buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Create a new shape from a vector of dimension sizes.
    pub fn new(dims: Vec<usize>) -> Self {
        Shape(dims)
    }

    /// The dimension sizes as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Total number of elements (product of all dimensions).
    pub fn elem_count(&self) -> usize {
        self.0.iter().product::<usize>()
    }

    /// View the same elements under a different shape.
    pub fn reshape(&self, dims: impl Into<Shape>) -> crate::Result<Shape> {
        let dst: Shape = dims.into();
        if dst.elem_count() != self.elem_count() {
            return Err(crate::Error::ReshapeElementMismatch {
                src: self.elem_count(),
                dst: dst.elem_count(),
                dst_shape: dst,
            });
        }
        Ok(dst)
    }

    /// Check that a flat buffer of `len` elements fits this shape exactly.
    pub fn check_len(&self, len: usize) -> crate::Result<()> {
        if len != self.elem_count() {
            return Err(crate::Error::ElementCountMismatch {
                shape: self.clone(),
                expected: self.elem_count(),
                got: len,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

impl From<(usize, usize)> for Shape {
    fn from((d0, d1): (usize, usize)) -> Self {
        Shape(vec![d0, d1])
    }
}

impl From<(usize, usize, usize, usize)> for Shape {
    fn from((d0, d1, d2, d3): (usize, usize, usize, usize)) -> Self {
        Shape(vec![d0, d1, d2, d3])
    }
}
