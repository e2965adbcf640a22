//! Evaluation - scoring one forward pass against ground truth

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_TOPK, MIN_TOPK};
use crate::logic::error::{AttackError, AttackResult};
use crate::logic::model::Classifier;
use crate::logic::tensor::{argmax, softmax, topk, ImageTensor, Logits};

/// Metrics computed by `do_eval`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Top-1 class of the clean input
    pub original_top1_index: usize,
    /// Softmax probability of the true class on the clean input
    pub original_true_class_probability: f32,
    /// Softmax probability of the true class on the perturbed input
    pub true_class_probability: f32,
    pub topk_indices: Vec<usize>,
    pub topk_labels: Vec<String>,
    pub topk_probabilities: Vec<f32>,
}

impl Evaluation {
    /// True label survived in the top-k of the perturbed prediction
    pub fn is_topk_hit(&self, true_label_idx: usize) -> bool {
        self.topk_indices.contains(&true_label_idx)
    }

    /// Clean input was classified correctly
    pub fn original_correct(&self, true_label_idx: usize) -> bool {
        self.original_top1_index == true_label_idx
    }
}

pub fn check_topk(k: usize) -> AttackResult<()> {
    if !(MIN_TOPK..=MAX_TOPK).contains(&k) {
        return Err(AttackError::InvalidArgument(format!(
            "topk must be between {} and {}, got {}",
            MIN_TOPK, MAX_TOPK, k
        )));
    }
    Ok(())
}

/// The single row of a `[1, classes]` logits tensor
fn single_row(logits: &Logits) -> AttackResult<ArrayView1<'_, f32>> {
    if logits.nrows() != 1 || logits.ncols() == 0 {
        return Err(AttackError::Shape(format!(
            "expected logits of shape [1, classes], got {:?}",
            logits.dim()
        )));
    }
    Ok(logits.row(0))
}

fn check_class(idx: usize, classes: usize) -> AttackResult<()> {
    if idx >= classes {
        return Err(AttackError::InvalidArgument(format!(
            "true label index {} out of range for {} classes",
            idx, classes
        )));
    }
    Ok(())
}

/// Score the held `logits` (perturbed input) and a fresh pass over `original`
pub fn evaluate(
    model: &dyn Classifier,
    original: &ImageTensor,
    logits: &Logits,
    true_label_idx: usize,
    k: usize,
) -> AttackResult<Evaluation> {
    check_topk(k)?;

    // Clean input
    let original_logits = model.predict(original)?;
    let original_row = single_row(&original_logits)?;
    check_class(true_label_idx, original_row.len())?;

    let original_top1_index = argmax(original_row)
        .ok_or_else(|| AttackError::Shape("empty logits".to_string()))?;
    let original_true_class_probability = softmax(original_row)[true_label_idx];

    // Perturbed input
    let row = single_row(logits)?;
    check_class(true_label_idx, row.len())?;
    if k > row.len() {
        return Err(AttackError::InvalidArgument(format!(
            "topk {} exceeds the {} available classes",
            k,
            row.len()
        )));
    }

    let probs = softmax(row);
    let true_class_probability = probs[true_label_idx];
    log::info!("True class probability: {}", true_class_probability);

    let topk_indices = topk(row, k);
    let topk_labels = topk_indices
        .iter()
        .map(|&i| model.labels().require_name(i).map(str::to_string))
        .collect::<AttackResult<Vec<_>>>()?;
    let topk_probabilities: Vec<f32> = topk_indices.iter().map(|&i| probs[i]).collect();

    log::info!("Predicted top {} classes: {:?}", k, topk_labels);
    log::info!("Predicted top {} probabilities: {:?}", k, topk_probabilities);

    Ok(Evaluation {
        original_top1_index,
        original_true_class_probability,
        true_class_probability,
        topk_indices,
        topk_labels,
        topk_probabilities,
    })
}
