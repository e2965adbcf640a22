//! Model Module - Classifier access
//!
//! Attacks and evaluation only see the `Classifier` trait, so the ONNX
//! backend can be swapped for any other.

pub mod classifier;
pub mod labels;
pub mod onnx;

#[cfg(test)]
pub mod testing;

// Re-export common types
pub use classifier::{ChannelOrder, Classifier};
pub use labels::LabelMap;
pub use onnx::{ModelMetadata, OnnxClassifier, OnnxOptions};
