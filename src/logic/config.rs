//! Attack & Evaluation Configuration
//!
//! `AttackConfig` is the free-form parameter bag handed to a perturbation method
//! (step sizes, budgets, ...). Its keys are defined by each attack, so values are
//! kept as JSON and read through typed getters.
//!
//! `EvalSettings` carries the evaluation defaults resolved from the environment.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{AttackError, AttackResult};
use crate::constants;

/// Attack parameter bag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttackConfig {
    params: Map<String, Value>,
}

impl AttackConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load parameters from a JSON object file
    pub fn from_file(path: &Path) -> AttackResult<Self> {
        let data = fs::read(path)?;
        let value: Value = serde_json::from_slice(&data)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> AttackResult<Self> {
        match value {
            Value::Object(params) => Ok(Self { params }),
            Value::Null => Ok(Self::default()),
            other => Err(AttackError::InvalidArgument(format!(
                "attack config must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.params.get(key).and_then(Value::as_f64)
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.params
            .get(key)
            .and_then(Value::as_u64)
            .and_then(|v| usize::try_from(v).ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.params.get(key).and_then(Value::as_bool)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    /// Required float parameter
    pub fn require_f64(&self, key: &str) -> AttackResult<f64> {
        self.get_f64(key)
            .ok_or_else(|| AttackError::InvalidArgument(format!("missing numeric parameter `{}`", key)))
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Evaluation defaults
#[derive(Debug, Clone, PartialEq)]
pub struct EvalSettings {
    /// Top-k used when the caller does not choose one
    pub topk: usize,

    /// (height, width) inputs are resized to when handing off to a target model
    pub target_resolution: (usize, usize),

    /// Where result files go when only a bare file name is given
    pub results_dir: PathBuf,
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self {
            topk: constants::DEFAULT_TOPK,
            target_resolution: constants::TARGET_RESOLUTION,
            results_dir: PathBuf::from("."),
        }
    }
}

impl EvalSettings {
    /// Load settings from environment variables
    pub fn from_env() -> Self {
        Self {
            topk: constants::get_topk(),
            target_resolution: constants::get_target_resolution(),
            results_dir: constants::get_results_dir(),
        }
    }

    /// Resolve an output path: relative paths land under `results_dir`
    pub fn resolve_output(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || path.parent().is_some_and(|p| !p.as_os_str().is_empty()) {
            path.to_path_buf()
        } else {
            self.results_dir.join(path)
        }
    }
}
