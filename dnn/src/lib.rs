//! Plumbing around network inference: image-to-blob conversion and
//! detector output decoding. The inference engine itself is out of scope.

pub mod blob;
pub mod detection;

pub use blob::*;
pub use detection::*;

pub use cvkit_core::{Error, Result};
