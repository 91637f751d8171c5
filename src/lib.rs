/// Conversion pipeline from legacy GFB models to Trinity model bundles
pub mod convert;
/// Utilities for resolving source assets and the mini container format
pub mod data;
/// Error definitions
pub mod error;
/// Model formats (vertex layouts, numeric codec, source and destination models)
pub mod models;
/// Generic wrapper for values that may or may not match a known variant.
pub mod recognized;

pub use convert::{ConversionOptions, ConversionOutput, convert};
