//! Softmax / argmax / top-k over a single row of logits.

use std::cmp::Ordering;

use ndarray::{Array1, ArrayView1};

/// Numerically stable softmax
pub fn softmax(row: ArrayView1<'_, f32>) -> Array1<f32> {
    if row.is_empty() {
        return Array1::zeros(0);
    }

    let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps = row.mapv(|v| (v - max).exp());
    let sum: f32 = exps.sum();

    exps / sum
}

/// Index of the largest value (first one wins on ties)
pub fn argmax(row: ArrayView1<'_, f32>) -> Option<usize> {
    row.iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, b)) if v.total_cmp(&b) != Ordering::Greater => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Indices of the `k` largest values, descending; ties keep the lower index first
pub fn topk(row: ArrayView1<'_, f32>, k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..row.len()).collect();
    indices.sort_by(|&a, &b| row[b].total_cmp(&row[a]).then(a.cmp(&b)));
    indices.truncate(k);
    indices
}
