//! Tensor Module - Image tensors & post-processing math
//!
//! Images are NCHW `f32` tensors with pixel values in `[0, 1]`.
//! Logits are `[batch, classes]`.

pub mod ops;
pub mod resize;
pub mod nested;


use ndarray::{Array2, Array4};

/// NCHW image batch
pub type ImageTensor = Array4<f32>;

/// `[batch, classes]` model output
pub type Logits = Array2<f32>;

pub use ops::{argmax, softmax, topk};
pub use resize::resize_bilinear;
pub use nested::{tensor_from_json, tensor_to_json};
