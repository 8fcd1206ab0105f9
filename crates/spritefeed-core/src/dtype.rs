use std::fmt;

// DType: element types of the buffers handed to a trainer
//
//   F32: normalized pixel intensities
//   U8 : raw sprite bytes and one-hot label slots

/// Element data type of a flat buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    F32,
    U8,
}

impl DType {
    /// Size of one element in bytes.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::F32 => 4,
            DType::U8 => 1,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DType::F32 => "f32",
            DType::U8 => "u8",
        };
        write!(f, "{}", s)
    }
}

/// Rust element types that map onto a [`DType`].
pub trait WithDType: Copy + Send + Sync + 'static {
    const DTYPE: DType;
}

impl WithDType for f32 {
    const DTYPE: DType = DType::F32;
}

impl WithDType for u8 {
    const DTYPE: DType = DType::U8;
}
