//! ONNX Classifier - ONNX Runtime Integration
//!
//! Loads an image classifier exported to ONNX and exposes it as a `Classifier`.
//! Model bytes are hashed on load so an expected checksum can be enforced.

use std::path::{Path, PathBuf};

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::classifier::{ChannelOrder, Classifier};
use super::labels::LabelMap;
use crate::logic::error::{AttackError, AttackResult};
use crate::logic::tensor::{ImageTensor, Logits};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_path: String,
    pub sha256: String,
    pub input_name: String,
    pub output_name: String,
    pub channel_order: ChannelOrder,
    pub num_classes: usize,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

/// Load options
#[derive(Debug, Clone, Default)]
pub struct OnnxOptions {
    pub channel_order: ChannelOrder,
    /// Hex sha256 the model file must match
    pub expected_sha256: Option<String>,
}

// ============================================================================
// ONNX IMPLEMENTATION
// ============================================================================

pub struct OnnxClassifier {
    session: Mutex<Session>,
    labels: LabelMap,
    metadata: ModelMetadata,
}

impl std::fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("metadata", &self.metadata)
            .field("labels", &self.labels.len())
            .finish()
    }
}

/// Hex sha256 of a byte slice
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Compare against an expected checksum (case-insensitive hex)
pub fn verify_checksum(bytes: &[u8], expected: &str) -> AttackResult<String> {
    let actual = sha256_hex(bytes);
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(AttackError::ChecksumMismatch {
            expected: expected.trim().to_lowercase(),
            actual,
        });
    }
    Ok(actual)
}

impl OnnxClassifier {
    /// Load model + labels from disk
    pub fn load(model_path: &Path, labels: LabelMap, options: OnnxOptions) -> AttackResult<Self> {
        log::info!("Loading ONNX model from: {}", model_path.display());

        if !model_path.exists() {
            return Err(AttackError::Model(format!("Model not found: {}", model_path.display())));
        }

        let bytes = std::fs::read(model_path)?;
        Self::from_bytes(&bytes, model_path.to_path_buf(), labels, options)
    }

    /// Load model from memory
    pub fn from_bytes(
        model_bytes: &[u8],
        origin: PathBuf,
        labels: LabelMap,
        options: OnnxOptions,
    ) -> AttackResult<Self> {
        let sha256 = match options.expected_sha256.as_deref() {
            Some(expected) => verify_checksum(model_bytes, expected)?,
            None => sha256_hex(model_bytes),
        };

        let session = Session::builder()
            .map_err(|e| AttackError::Model(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| AttackError::Model(format!("Failed to set optimization: {}", e)))?
            .commit_from_memory(model_bytes)
            .map_err(|e| AttackError::Model(format!("Failed to load model: {}", e)))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| AttackError::Model("No input defined".to_string()))?;
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| AttackError::Model("No output defined".to_string()))?;

        let metadata = ModelMetadata {
            model_path: origin.display().to_string(),
            sha256,
            input_name,
            output_name,
            channel_order: options.channel_order,
            num_classes: labels.len(),
            loaded_at: chrono::Utc::now(),
        };

        log::info!(
            "ONNX model loaded ({} classes, {:?}, sha256 {})",
            metadata.num_classes,
            metadata.channel_order,
            &metadata.sha256[..12]
        );

        Ok(Self {
            session: Mutex::new(session),
            labels,
            metadata,
        })
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, input: &ImageTensor) -> AttackResult<Logits> {
        let start_time = std::time::Instant::now();

        let input_tensor = Value::from_array(input.clone())
            .map_err(|e| AttackError::Model(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| AttackError::Model(format!("Inference failed: {}", e)))?;

        let output = outputs
            .get(&self.metadata.output_name)
            .ok_or_else(|| AttackError::Model("No output".to_string()))?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| AttackError::Model(format!("Extract error: {}", e)))?;

        let dims: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
        let logits = match dims.as_slice() {
            [batch, classes] => Array2::from_shape_vec((*batch, *classes), data.to_vec())?,
            other => {
                return Err(AttackError::Shape(format!(
                    "expected [batch, classes] logits, got {:?}",
                    other
                )))
            }
        };

        if logits.ncols() != self.labels.len() {
            log::warn!(
                "Model emits {} classes but {} labels are loaded",
                logits.ncols(),
                self.labels.len()
            );
        }

        log::debug!(
            "ONNX inference took {}us",
            start_time.elapsed().as_micros()
        );

        Ok(logits)
    }

    fn labels(&self) -> &LabelMap {
        &self.labels
    }

    fn channel_order(&self) -> ChannelOrder {
        self.metadata.channel_order
    }

    fn name(&self) -> &str {
        &self.metadata.model_path
    }
}
