//! Nested-list JSON <-> tensor conversion.
//!
//! Tensors are written as plain nested arrays (`[[[[0.1, ...]]]]`) so dumps stay
//! readable by any tooling, not just serde's ndarray layout.

use ndarray::{ArrayD, ArrayView, Axis, Dimension, IxDyn};
use serde_json::Value;

use super::ImageTensor;
use crate::constants::PERTURBED_INPUT_KEY;
use crate::logic::error::{AttackError, AttackResult};

/// Tensor of any rank to nested JSON arrays
pub fn tensor_to_json<D: Dimension>(tensor: ArrayView<'_, f32, D>) -> Value {
    to_value(tensor.into_dyn())
}

fn to_value(view: ArrayView<'_, f32, IxDyn>) -> Value {
    if view.ndim() == 0 {
        return view
            .iter()
            .next()
            .map(|&v| Value::from(v))
            .unwrap_or(Value::Null);
    }
    Value::Array(view.axis_iter(Axis(0)).map(to_value).collect())
}

/// Parse an NCHW tensor.
///
/// Accepts either the bare nested array or a dump object holding it under
/// `perturbed_input`.
pub fn tensor_from_json(value: &Value) -> AttackResult<ImageTensor> {
    let nested = match value {
        Value::Object(map) => map.get(PERTURBED_INPUT_KEY).ok_or_else(|| {
            AttackError::Shape(format!("tensor object has no `{}` field", PERTURBED_INPUT_KEY))
        })?,
        other => other,
    };

    let mut shape = Vec::new();
    let mut data = Vec::new();
    collect(nested, 0, &mut shape, &mut data)?;

    if shape.len() != 4 {
        return Err(AttackError::Shape(format!(
            "expected a 4-D (NCHW) tensor, got {} dimension(s)",
            shape.len()
        )));
    }

    let array = ArrayD::from_shape_vec(IxDyn(&shape), data)?;
    Ok(array.into_dimensionality()?)
}

fn collect(value: &Value, depth: usize, shape: &mut Vec<usize>, data: &mut Vec<f32>) -> AttackResult<()> {
    match value {
        Value::Array(items) => {
            match shape.get(depth) {
                Some(&len) if len != items.len() => {
                    return Err(AttackError::Shape(format!(
                        "ragged tensor: dimension {} has lengths {} and {}",
                        depth,
                        len,
                        items.len()
                    )));
                }
                Some(_) => {}
                None if depth == shape.len() && data.is_empty() => shape.push(items.len()),
                None => {
                    return Err(AttackError::Shape(format!("ragged tensor at dimension {}", depth)));
                }
            }
            for item in items {
                collect(item, depth + 1, shape, data)?;
            }
            Ok(())
        }
        Value::Number(n) => {
            if depth != shape.len() {
                return Err(AttackError::Shape(format!("ragged tensor: scalar at depth {}", depth)));
            }
            let v = n
                .as_f64()
                .ok_or_else(|| AttackError::Shape(format!("non-finite value {}", n)))?;
            data.push(v as f32);
            Ok(())
        }
        other => Err(AttackError::Shape(format!("unexpected value in tensor: {}", other))),
    }
}
