//! CLI Commands
//!
//! Each command wires files on disk to the evaluation engine and returns a
//! printable result. Errors are flattened to strings for the terminal.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use attack_eval::logic::report;
use attack_eval::{
    AttackConfig, AttackResult, AttackSession, ChannelOrder, Classifier, EvalRecord, EvalSettings,
    LabelMap, OnnxClassifier, OnnxOptions, ReplayPerturbation,
};

fn channel_order(bgr: bool) -> ChannelOrder {
    if bgr {
        ChannelOrder::Bgr
    } else {
        ChannelOrder::Rgb
    }
}

// ============================================================================
// EVALUATE
// ============================================================================

#[derive(Debug, Clone, Args)]
pub struct EvaluateArgs {
    /// ONNX model the perturbation was crafted against
    #[arg(long)]
    pub model: PathBuf,

    /// Label file (JSON list or {"index": "name"} object)
    #[arg(long)]
    pub labels: PathBuf,

    /// Model consumes BGR input
    #[arg(long)]
    pub bgr: bool,

    /// Expected sha256 of the model file
    #[arg(long)]
    pub sha256: Option<String>,

    /// Clean input tensor (nested NCHW JSON array)
    #[arg(long)]
    pub input: PathBuf,

    /// Perturbation dump written by an earlier run
    #[arg(long)]
    pub perturbation: PathBuf,

    /// Ground-truth class index
    #[arg(long)]
    pub label: usize,

    /// Name stored in the result record
    #[arg(long)]
    pub name: String,

    /// Top-k to report (1-5, default from ATTACK_EVAL_TOPK or 5)
    #[arg(long)]
    pub topk: Option<usize>,

    /// Iteration count the attack reported, if any
    #[arg(long)]
    pub iterations: Option<usize>,

    /// Attack parameter file handed to the perturbation method
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Re-score on this target model instead (surrogate handoff)
    #[arg(long)]
    pub target_model: Option<PathBuf>,

    /// Labels for the target model (defaults to --labels)
    #[arg(long)]
    pub target_labels: Option<PathBuf>,

    /// Target model consumes BGR input
    #[arg(long)]
    pub target_bgr: bool,

    /// Results array to append to
    #[arg(long)]
    pub out: PathBuf,

    /// Also render the perturbed input to this PNG
    #[arg(long)]
    pub png: Option<PathBuf>,
}

pub fn evaluate(args: &EvaluateArgs) -> Result<EvalRecord, String> {
    run_evaluate(args, &EvalSettings::from_env()).map_err(|e| e.to_string())
}

fn run_evaluate(args: &EvaluateArgs, settings: &EvalSettings) -> AttackResult<EvalRecord> {
    let labels = LabelMap::from_file(&args.labels)?;
    let model = OnnxClassifier::load(
        &args.model,
        labels,
        OnnxOptions {
            channel_order: channel_order(args.bgr),
            expected_sha256: args.sha256.clone(),
        },
    )?;

    let target: Option<Arc<dyn Classifier>> = match &args.target_model {
        Some(path) => {
            let labels_path = args.target_labels.as_ref().unwrap_or(&args.labels);
            let target = OnnxClassifier::load(
                path,
                LabelMap::from_file(labels_path)?,
                OnnxOptions {
                    channel_order: channel_order(args.target_bgr),
                    expected_sha256: None,
                },
            )?;
            Some(Arc::new(target) as Arc<dyn Classifier>)
        }
        None => None,
    };

    let config = match &args.config {
        Some(path) => AttackConfig::from_file(path)?,
        None => AttackConfig::new(),
    };

    let original = report::read_perturbation(&args.input)?;
    let replay = ReplayPerturbation::from_file(&args.perturbation)?.with_iterations(args.iterations);
    let topk = args.topk.unwrap_or(settings.topk);
    let out = settings.resolve_output(&args.out);

    let mut session = AttackSession::new(Arc::new(model), replay, config)
        .with_target_resolution(settings.target_resolution);

    session
        .do_perturbation(&original, args.label)?
        .do_eval(&original, args.label, topk, target)?
        .save_eval_to_json(&args.name, args.label, &out)?;

    if let Some(png) = &args.png {
        session.save_perturbation_to_png(settings.resolve_output(png))?;
    }

    session.record(&args.name, args.label)
}

// ============================================================================
// RENDER
// ============================================================================

#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    /// Perturbation dump (or bare nested array)
    #[arg(long)]
    pub perturbation: PathBuf,

    /// PNG to write
    #[arg(long)]
    pub out: PathBuf,

    /// Tensor is in BGR order
    #[arg(long)]
    pub bgr: bool,
}

pub fn render(args: &RenderArgs) -> Result<PathBuf, String> {
    run_render(args, &EvalSettings::from_env()).map_err(|e| e.to_string())
}

fn run_render(args: &RenderArgs, settings: &EvalSettings) -> AttackResult<PathBuf> {
    let out = settings.resolve_output(&args.out);

    let tensor = report::read_perturbation(&args.perturbation)?;
    report::write_png(&out, tensor.view(), channel_order(args.bgr))?;
    Ok(out)
}
