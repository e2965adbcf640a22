//! Attack Session - perturb, evaluate, save
//!
//! Holds the state an attack run accumulates. Calls are expected in order:
//! `do_perturbation` -> `do_eval` -> any of the `save_*` methods. Each returns the
//! session so calls can be chained with `?`.

use std::path::Path;
use std::sync::Arc;

use super::eval::{check_topk, evaluate, Evaluation};
use super::{Perturbation, PerturbationOutcome};
use crate::constants::TARGET_RESOLUTION;
use crate::logic::config::AttackConfig;
use crate::logic::error::{AttackError, AttackResult};
use crate::logic::model::Classifier;
use crate::logic::report::writer::JSON_EXT;
use crate::logic::report::{self, EvalRecord};
use crate::logic::tensor::{resize_bilinear, ImageTensor, Logits};

pub struct AttackSession<P: Perturbation> {
    model: Arc<dyn Classifier>,
    config: AttackConfig,
    method: P,
    target_resolution: (usize, usize),

    perturbed_input: Option<ImageTensor>,
    logits: Option<Logits>,
    num_iterations: Option<usize>,
    evaluation: Option<Evaluation>,
}

impl<P: Perturbation> AttackSession<P> {
    pub fn new(model: Arc<dyn Classifier>, method: P, config: AttackConfig) -> Self {
        Self {
            model,
            config,
            method,
            target_resolution: TARGET_RESOLUTION,
            perturbed_input: None,
            logits: None,
            num_iterations: None,
            evaluation: None,
        }
    }

    /// Resolution used for the surrogate -> target handoff
    pub fn with_target_resolution(mut self, size: (usize, usize)) -> Self {
        self.target_resolution = size;
        self
    }

    // ------------------------------------------------------------------------
    // Perturbation
    // ------------------------------------------------------------------------

    /// Run the attack on `input` whose ground truth is `label`
    pub fn do_perturbation(&mut self, input: &ImageTensor, label: usize) -> AttackResult<&mut Self> {
        log::info!("Running {} (label {}) on {:?}", self.method.name(), label, input.dim());

        let PerturbationOutcome {
            perturbed,
            logits,
            iterations,
        } = self
            .method
            .perturb(self.model.as_ref(), input, label, &self.config)?;

        if let Some(n) = iterations {
            log::debug!("{} finished after {} iterations", self.method.name(), n);
        }

        self.perturbed_input = Some(perturbed);
        self.logits = Some(logits);
        self.num_iterations = iterations;
        self.evaluation = None;

        Ok(self)
    }

    // ------------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------------

    /// Score the perturbation.
    ///
    /// With a `target_model`, the session switches to it for good: both inputs are
    /// resized to the target resolution and the perturbed logits are recomputed
    /// by the target before scoring. The switch only happens once scoring
    /// succeeds; on error the session is left without an evaluation.
    pub fn do_eval(
        &mut self,
        original: &ImageTensor,
        true_label_idx: usize,
        topk: usize,
        target_model: Option<Arc<dyn Classifier>>,
    ) -> AttackResult<&mut Self> {
        self.evaluation = None;

        let (perturbed, logits) = match (&self.perturbed_input, &self.logits) {
            (Some(perturbed), Some(logits)) => (perturbed, logits),
            _ => return Err(AttackError::NotPerturbed),
        };
        check_topk(topk)?;

        match target_model {
            Some(target) => {
                log::info!(
                    "Evaluating on target model {} at {:?}",
                    target.name(),
                    self.target_resolution
                );

                let perturbed = resize_bilinear(perturbed.view(), self.target_resolution)?;
                let original = resize_bilinear(original.view(), self.target_resolution)?;
                let logits = target.predict(&perturbed)?;
                let evaluation = evaluate(target.as_ref(), &original, &logits, true_label_idx, topk)?;

                self.model = target;
                self.perturbed_input = Some(perturbed);
                self.logits = Some(logits);
                self.evaluation = Some(evaluation);
            }
            None => {
                let evaluation = evaluate(self.model.as_ref(), original, logits, true_label_idx, topk)?;
                self.evaluation = Some(evaluation);
            }
        }

        Ok(self)
    }

    // ------------------------------------------------------------------------
    // Saving
    // ------------------------------------------------------------------------

    /// Build the record `save_eval_to_json` would write
    pub fn record(&self, input_name: &str, true_label_idx: usize) -> AttackResult<EvalRecord> {
        let eval = self.evaluation.as_ref().ok_or(AttackError::NotEvaluated)?;
        let true_label = self.model.labels().require_name(true_label_idx)?.to_string();

        Ok(EvalRecord {
            input_name: input_name.to_string(),
            true_label,
            true_label_idx,
            original_top1_index: eval.original_top1_index,
            original_true_class_probability: eval.original_true_class_probability,
            true_class_probability: eval.true_class_probability,
            topk_indices: eval.topk_indices.clone(),
            topk_labels: eval.topk_labels.clone(),
            topk_probabilities: eval.topk_probabilities.clone(),
            num_iteration: self.num_iterations,
        })
    }

    /// Append the evaluation to the JSON array in `filename`
    pub fn save_eval_to_json(
        &mut self,
        input_name: &str,
        true_label_idx: usize,
        filename: impl AsRef<Path>,
    ) -> AttackResult<&mut Self> {
        if self.evaluation.is_none() {
            return Err(AttackError::NotEvaluated);
        }
        let path = filename.as_ref();
        report::ensure_extension(path, JSON_EXT)?;

        let record = self.record(input_name, true_label_idx)?;
        report::append_record(path, &record)?;
        Ok(self)
    }

    /// Dump the perturbed tensor as nested JSON lists
    pub fn save_perturbation_to_json(&mut self, filename: impl AsRef<Path>) -> AttackResult<&mut Self> {
        let perturbed = self.perturbed_input.as_ref().ok_or(AttackError::NotPerturbed)?;
        report::write_perturbation(filename.as_ref(), perturbed.view())?;
        Ok(self)
    }

    /// Render the perturbed tensor to PNG
    pub fn save_perturbation_to_png(&mut self, filename: impl AsRef<Path>) -> AttackResult<&mut Self> {
        let perturbed = self.perturbed_input.as_ref().ok_or(AttackError::NotPerturbed)?;
        report::write_png(filename.as_ref(), perturbed.view(), self.model.channel_order())?;
        Ok(self)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn model(&self) -> &Arc<dyn Classifier> {
        &self.model
    }

    pub fn config(&self) -> &AttackConfig {
        &self.config
    }

    pub fn method(&self) -> &P {
        &self.method
    }

    pub fn perturbed_input(&self) -> Option<&ImageTensor> {
        self.perturbed_input.as_ref()
    }

    pub fn logits(&self) -> Option<&Logits> {
        self.logits.as_ref()
    }

    pub fn num_iterations(&self) -> Option<usize> {
        self.num_iterations
    }

    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }
}
