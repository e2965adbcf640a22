use std::fs;
use std::path::Path;

use ndarray::ArrayView4;
use serde_json::{json, Value};

use super::record::EvalRecord;
use crate::constants::PERTURBED_INPUT_KEY;
use crate::logic::error::{AttackError, AttackResult};
use crate::logic::tensor::{tensor_from_json, tensor_to_json, ImageTensor};

pub const JSON_EXT: &str = ".json";
pub const PNG_EXT: &str = ".png";

/// Reject filenames that do not end with `expected` (e.g. ".json")
pub fn ensure_extension(path: &Path, expected: &'static str) -> AttackResult<()> {
    let name = path.to_string_lossy();
    if !name.ends_with(expected) {
        return Err(AttackError::InvalidExtension {
            filename: name.into_owned(),
            expected,
        });
    }
    Ok(())
}

/// Ensure the directory holding `path` exists
pub fn create_parent_dirs(path: &Path) -> AttackResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Append a record to the JSON array at `path`.
///
/// A missing file, or one holding anything other than an array, is replaced by a
/// one-element array. Existing elements are kept as-is.
/// Returns the number of records now in the file.
pub fn append_record(path: &Path, record: &EvalRecord) -> AttackResult<usize> {
    ensure_extension(path, JSON_EXT)?;
    create_parent_dirs(path)?;

    let existing = if path.exists() {
        let data = fs::read(path)?;
        Some(serde_json::from_slice::<Value>(&data)?)
    } else {
        None
    };

    let entry = serde_json::to_value(record)?;
    let records = match existing {
        Some(Value::Array(mut items)) => {
            items.push(entry);
            items
        }
        Some(_) => {
            log::warn!("{} does not hold a JSON array, starting a new one", path.display());
            vec![entry]
        }
        None => vec![entry],
    };

    let count = records.len();
    fs::write(path, serde_json::to_vec(&Value::Array(records))?)?;
    log::info!("Saved evaluation for {} to {} ({} records)", record.input_name, path.display(), count);
    Ok(count)
}

/// Dump a tensor as `{"perturbed_input": [...]}`
pub fn write_perturbation(path: &Path, tensor: ArrayView4<'_, f32>) -> AttackResult<()> {
    ensure_extension(path, JSON_EXT)?;
    create_parent_dirs(path)?;

    let dump = json!({ PERTURBED_INPUT_KEY: tensor_to_json(tensor) });
    fs::write(path, serde_json::to_vec(&dump)?)?;
    log::info!("Saved perturbation {:?} to {}", tensor.dim(), path.display());
    Ok(())
}

/// Read a tensor dump (or a bare nested array) back
pub fn read_perturbation(path: &Path) -> AttackResult<ImageTensor> {
    let data = fs::read(path)?;
    let value: Value = serde_json::from_slice(&data)?;
    tensor_from_json(&value)
}
