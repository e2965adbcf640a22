//! Attack Module - Perturbation hook & evaluation session
//!
//! Concrete attacks (local search, gradient based, ...) implement `Perturbation`.
//! `AttackSession` drives one of them and scores/persists what it produced.

pub mod eval;
pub mod replay;
pub mod session;

#[cfg(test)]
mod tests;

use crate::logic::config::AttackConfig;
use crate::logic::error::{AttackError, AttackResult};
use crate::logic::model::Classifier;
use crate::logic::tensor::{ImageTensor, Logits};

pub use eval::Evaluation;
pub use replay::ReplayPerturbation;
pub use session::AttackSession;

/// What a perturbation run hands back
#[derive(Debug, Clone)]
pub struct PerturbationOutcome {
    /// Adversarial input, same layout as the clean one
    pub perturbed: ImageTensor,
    /// Model output on `perturbed`
    pub logits: Logits,
    /// Iterations used, for attacks that iterate
    pub iterations: Option<usize>,
}

/// Trait for perturbation methods.
///
/// The default `perturb` fails with `NotImplemented`; every attack overrides it.
pub trait Perturbation {
    fn name(&self) -> &str {
        "perturbation"
    }

    fn perturb(
        &mut self,
        _model: &dyn Classifier,
        _input: &ImageTensor,
        _label: usize,
        _config: &AttackConfig,
    ) -> AttackResult<PerturbationOutcome> {
        Err(AttackError::NotImplemented)
    }
}
