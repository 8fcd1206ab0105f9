//! # spritefeed-core
//!
//! Primitives shared by the spritefeed crates.
//!
//! This crate provides:
//! - [`Error`] / [`Result`]: the single error type used across the pipeline
//! - [`Shape`]: row-major shape of a flat buffer, with reshape checks
//! - [`DType`]: element type tags for image and label buffers

pub mod dtype;
pub mod error;
pub mod shape;

pub use dtype::{DType, WithDType};
pub use error::{Error, Result};
pub use shape::Shape;
