//! Replay Perturbation - re-score a perturbation dumped by an earlier run

use std::path::Path;

use super::{Perturbation, PerturbationOutcome};
use crate::logic::config::AttackConfig;
use crate::logic::error::{AttackError, AttackResult};
use crate::logic::model::Classifier;
use crate::logic::report;
use crate::logic::tensor::ImageTensor;

#[derive(Debug, Clone)]
pub struct ReplayPerturbation {
    perturbed: ImageTensor,
    iterations: Option<usize>,
}

impl ReplayPerturbation {
    pub fn new(perturbed: ImageTensor) -> Self {
        Self {
            perturbed,
            iterations: None,
        }
    }

    /// Load a `save_perturbation_to_json` dump
    pub fn from_file(path: &Path) -> AttackResult<Self> {
        let perturbed = report::read_perturbation(path)?;
        log::info!("Loaded perturbation {:?} from {}", perturbed.dim(), path.display());
        Ok(Self::new(perturbed))
    }

    /// Iteration count the original attack reported
    pub fn with_iterations(mut self, iterations: Option<usize>) -> Self {
        self.iterations = iterations;
        self
    }
}

impl Perturbation for ReplayPerturbation {
    fn name(&self) -> &str {
        "replay"
    }

    fn perturb(
        &mut self,
        model: &dyn Classifier,
        input: &ImageTensor,
        _label: usize,
        _config: &AttackConfig,
    ) -> AttackResult<PerturbationOutcome> {
        let (n, c, h, w) = input.dim();
        let (pn, pc, ph, pw) = self.perturbed.dim();
        if (n, c) != (pn, pc) {
            return Err(AttackError::Shape(format!(
                "replayed perturbation {:?} does not match input {:?}",
                self.perturbed.dim(),
                input.dim()
            )));
        }
        if (h, w) != (ph, pw) {
            log::warn!("Replayed perturbation is {}x{}, input is {}x{}", ph, pw, h, w);
        }

        let logits = model.predict(&self.perturbed)?;
        Ok(PerturbationOutcome {
            perturbed: self.perturbed.clone(),
            logits,
            iterations: self.iterations,
        })
    }
}
