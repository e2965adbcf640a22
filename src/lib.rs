//! Adversarial attack evaluation.
//!
//! Runs a perturbation method against an image classifier, scores the result
//! against ground truth and writes metrics, tensor dumps and images to disk.

pub mod constants;
pub mod logic;

pub use logic::attack::{AttackSession, Evaluation, Perturbation, PerturbationOutcome, ReplayPerturbation};
pub use logic::config::{AttackConfig, EvalSettings};
pub use logic::error::{AttackError, AttackResult};
pub use logic::model::{ChannelOrder, Classifier, LabelMap, OnnxClassifier, OnnxOptions};
pub use logic::report::EvalRecord;
pub use logic::tensor::{ImageTensor, Logits};
