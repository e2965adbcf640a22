use serde::{Deserialize, Serialize};

/// One evaluated input, as written to the results array
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EvalRecord {
    pub input_name: String,
    pub true_label: String,
    pub true_label_idx: usize,

    // Clean input
    pub original_top1_index: usize,
    pub original_true_class_probability: f32,

    // Perturbed input
    pub true_class_probability: f32,
    pub topk_indices: Vec<usize>,
    pub topk_labels: Vec<String>,
    pub topk_probabilities: Vec<f32>,

    /// Only iterative attacks report this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_iteration: Option<usize>,
}
