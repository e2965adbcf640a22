//! Classifier contract
//!
//! The attacked model is an external, already-trained network. Everything in this
//! crate reaches it through `predict` plus its label map.

use serde::{Deserialize, Serialize};

use super::labels::LabelMap;
use crate::logic::error::AttackResult;
use crate::logic::tensor::{ImageTensor, Logits};

/// Channel order a model variant consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

/// Trait for image classifiers (ONNX, remote, test doubles, ...)
pub trait Classifier: Send + Sync {
    /// Forward pass: NCHW batch -> `[batch, classes]` logits
    fn predict(&self, input: &ImageTensor) -> AttackResult<Logits>;

    fn labels(&self) -> &LabelMap;

    fn channel_order(&self) -> ChannelOrder {
        ChannelOrder::Rgb
    }

    /// Short name for logs
    fn name(&self) -> &str {
        "classifier"
    }
}
