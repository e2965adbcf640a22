use std::fs;
use std::sync::Arc;

use ndarray::Array4;
use serde_json::Value;
use tempfile::tempdir;

use super::*;
use crate::logic::model::testing::ScriptedClassifier;
use crate::logic::model::ChannelOrder;
use crate::logic::report::{write_perturbation, EvalRecord};
use crate::logic::tensor::Logits;

const LABELS: &[&str] = &["cat", "dog", "bird"];

/// Mean brightness decides between cat (dark) and dog (bright)
fn brightness_model() -> ScriptedClassifier {
    ScriptedClassifier::new(LABELS, |input| {
        let m = input.mean().unwrap_or(0.0);
        Logits::from_shape_vec((1, 3), vec![2.0 - 4.0 * m, 4.0 * m, 0.0]).unwrap()
    })
}

fn clean_input() -> ImageTensor {
    Array4::from_elem((1, 3, 8, 8), 0.125)
}

/// Brightens every pixel by a fixed amount
struct Brighten {
    delta: f32,
    iterations: Option<usize>,
}

impl Perturbation for Brighten {
    fn name(&self) -> &str {
        "brighten"
    }

    fn perturb(
        &mut self,
        model: &dyn Classifier,
        input: &ImageTensor,
        _label: usize,
        _config: &AttackConfig,
    ) -> AttackResult<PerturbationOutcome> {
        let perturbed = input.mapv(|v| (v + self.delta).clamp(0.0, 1.0));
        let logits = model.predict(&perturbed)?;
        Ok(PerturbationOutcome {
            perturbed,
            logits,
            iterations: self.iterations,
        })
    }
}

/// Relies on the default hook
struct Unfinished;

impl Perturbation for Unfinished {}

fn session() -> AttackSession<Brighten> {
    AttackSession::new(
        Arc::new(brightness_model()),
        Brighten { delta: 0.375, iterations: Some(7) },
        AttackConfig::new(),
    )
}

fn manual_softmax(logits: &[f32], idx: usize) -> f32 {
    let sum: f32 = logits.iter().map(|v| v.exp()).sum();
    logits[idx].exp() / sum
}

#[test]
fn test_default_hook_not_implemented() {
    let mut s = AttackSession::new(Arc::new(brightness_model()), Unfinished, AttackConfig::new());

    let err = s.do_perturbation(&clean_input(), 0).err().unwrap();
    assert!(matches!(err, AttackError::NotImplemented));
    assert!(s.perturbed_input().is_none());
    assert!(s.logits().is_none());
}

#[test]
fn test_eval_before_perturbation_fails() {
    let mut s = session();
    for k in [0, 1, 5, 9] {
        let err = s.do_eval(&clean_input(), 0, k, None).err().unwrap();
        assert!(matches!(err, AttackError::NotPerturbed), "topk {}", k);
    }
}

#[test]
fn test_topk_out_of_range_fails() {
    let mut s = session();
    s.do_perturbation(&clean_input(), 0).unwrap();

    for k in [0, 6, 100] {
        let err = s.do_eval(&clean_input(), 0, k, None).err().unwrap();
        assert!(matches!(err, AttackError::InvalidArgument(_)), "topk {}", k);
    }
    assert!(s.evaluation().is_none());
}

#[test]
fn test_topk_above_class_count_fails() {
    let mut s = session();
    s.do_perturbation(&clean_input(), 0).unwrap();
    assert!(matches!(
        s.do_eval(&clean_input(), 0, 4, None).err().unwrap(),
        AttackError::InvalidArgument(_)
    ));
}

#[test]
fn test_true_label_out_of_range_fails() {
    let mut s = session();
    s.do_perturbation(&clean_input(), 0).unwrap();
    assert!(matches!(
        s.do_eval(&clean_input(), 3, 1, None).err().unwrap(),
        AttackError::InvalidArgument(_)
    ));
}

#[test]
fn test_eval_matches_manual_softmax() {
    let mut s = session();
    s.do_perturbation(&clean_input(), 0)
        .unwrap()
        .do_eval(&clean_input(), 0, 2, None)
        .unwrap();

    let eval = s.evaluation().unwrap();

    // clean: mean 0.125 -> [1.5, 0.5, 0.0]
    assert_eq!(eval.original_top1_index, 0);
    assert!(eval.original_correct(0));
    let expected = manual_softmax(&[1.5, 0.5, 0.0], 0);
    assert!((eval.original_true_class_probability - expected).abs() < 1e-5);

    // perturbed: mean 0.5 -> [0.0, 2.0, 0.0]
    let expected = manual_softmax(&[0.0, 2.0, 0.0], 0);
    assert!((eval.true_class_probability - expected).abs() < 1e-5);

    assert_eq!(eval.topk_indices, vec![1, 0]);
    assert_eq!(eval.topk_labels, vec!["dog".to_string(), "cat".to_string()]);
    assert!((eval.topk_probabilities[0] - manual_softmax(&[0.0, 2.0, 0.0], 1)).abs() < 1e-5);
    assert!((eval.topk_probabilities[1] - expected).abs() < 1e-5);
    assert!(eval.is_topk_hit(0));
    assert!(!eval.is_topk_hit(2));
}

#[test]
fn test_topk_one_is_a_list() {
    let mut s = session();
    s.do_perturbation(&clean_input(), 0)
        .unwrap()
        .do_eval(&clean_input(), 0, 1, None)
        .unwrap();

    let record = s.record("img", 0).unwrap();
    assert_eq!(record.topk_indices, vec![1]);
    assert_eq!(record.topk_labels, vec!["dog".to_string()]);

    let json = serde_json::to_value(&record).unwrap();
    assert!(json["topk_indices"].is_array());
}

#[test]
fn test_save_before_eval_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("results.json");

    let mut s = session();
    assert!(matches!(
        s.save_eval_to_json("img", 0, &path).err().unwrap(),
        AttackError::NotEvaluated
    ));

    s.do_perturbation(&clean_input(), 0).unwrap();
    assert!(matches!(
        s.save_eval_to_json("img", 0, &path).err().unwrap(),
        AttackError::NotEvaluated
    ));
    assert!(!path.exists());
}

#[test]
fn test_save_perturbation_before_perturb_fails() {
    let dir = tempdir().unwrap();
    let mut s = session();

    assert!(matches!(
        s.save_perturbation_to_json(dir.path().join("p.json")).err().unwrap(),
        AttackError::NotPerturbed
    ));
    assert!(matches!(
        s.save_perturbation_to_png(dir.path().join("p.png")).err().unwrap(),
        AttackError::NotPerturbed
    ));
}

#[test]
fn test_save_wrong_extension_fails() {
    let dir = tempdir().unwrap();
    let mut s = session();
    s.do_perturbation(&clean_input(), 0)
        .unwrap()
        .do_eval(&clean_input(), 0, 3, None)
        .unwrap();

    assert!(matches!(
        s.save_eval_to_json("img", 0, dir.path().join("r.jsonl")).err().unwrap(),
        AttackError::InvalidExtension { .. }
    ));
    assert!(matches!(
        s.save_perturbation_to_json(dir.path().join("p.txt")).err().unwrap(),
        AttackError::InvalidExtension { .. }
    ));
    assert!(matches!(
        s.save_perturbation_to_png(dir.path().join("p.jpg")).err().unwrap(),
        AttackError::InvalidExtension { .. }
    ));
}

#[test]
fn test_full_run_appends_records() {
    let dir = tempdir().unwrap();
    let results = dir.path().join("runs").join("results.json");

    let mut s = session();
    for name in ["img_001", "img_002"] {
        s.do_perturbation(&clean_input(), 0)
            .unwrap()
            .do_eval(&clean_input(), 0, 3, None)
            .unwrap()
            .save_eval_to_json(name, 0, &results)
            .unwrap()
            .save_perturbation_to_json(dir.path().join("dumps").join(format!("{}.json", name)))
            .unwrap()
            .save_perturbation_to_png(dir.path().join("images").join(format!("{}.png", name)))
            .unwrap();
    }

    let records: Vec<EvalRecord> = serde_json::from_slice(&fs::read(&results).unwrap()).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].input_name, "img_001");
    assert_eq!(records[1].input_name, "img_002");
    assert_eq!(records[1].true_label, "cat");
    assert_eq!(records[1].num_iteration, Some(7));
    assert_eq!(records[1].topk_indices.len(), 3);

    assert!(dir.path().join("dumps").join("img_002.json").exists());
    assert!(dir.path().join("images").join("img_001.png").exists());
}

#[test]
fn test_num_iteration_omitted_when_not_reported() {
    let dir = tempdir().unwrap();
    let results = dir.path().join("results.json");

    let mut s = AttackSession::new(
        Arc::new(brightness_model()),
        Brighten { delta: 0.375, iterations: None },
        AttackConfig::new(),
    );
    s.do_perturbation(&clean_input(), 0)
        .unwrap()
        .do_eval(&clean_input(), 0, 2, None)
        .unwrap()
        .save_eval_to_json("img", 0, &results)
        .unwrap();

    let stored: Value = serde_json::from_slice(&fs::read(&results).unwrap()).unwrap();
    assert!(stored[0].get("num_iteration").is_none());
}

#[test]
fn test_new_perturbation_clears_evaluation() {
    let mut s = session();
    s.do_perturbation(&clean_input(), 0)
        .unwrap()
        .do_eval(&clean_input(), 0, 2, None)
        .unwrap();
    assert!(s.evaluation().is_some());

    s.do_perturbation(&clean_input(), 0).unwrap();
    assert!(s.evaluation().is_none());
}

#[test]
fn test_surrogate_handoff_resizes_and_switches_model() {
    let target = Arc::new(brightness_model().with_order(ChannelOrder::Bgr));
    let target_dyn: Arc<dyn Classifier> = target.clone();

    let mut s = AttackSession::new(
        Arc::new(ScriptedClassifier::constant(LABELS, vec![0.0, 0.0, 5.0])),
        Brighten { delta: 0.375, iterations: None },
        AttackConfig::new(),
    );
    s.do_perturbation(&clean_input(), 0)
        .unwrap()
        .do_eval(&clean_input(), 0, 2, Some(target_dyn))
        .unwrap();

    // target saw perturbed then clean input, both at 256x256
    let seen = target.seen_shapes.lock().clone();
    assert_eq!(seen, vec![(1, 3, 256, 256), (1, 3, 256, 256)]);

    assert_eq!(s.perturbed_input().unwrap().dim(), (1, 3, 256, 256));
    assert_eq!(s.model().channel_order(), ChannelOrder::Bgr);

    // logits now come from the target, not the surrogate's constant "bird"
    let eval = s.evaluation().unwrap();
    assert_eq!(eval.topk_indices[0], 1);
    assert_eq!(eval.original_top1_index, 0);
}

#[test]
fn test_custom_target_resolution() {
    let target = Arc::new(brightness_model());
    let target_dyn: Arc<dyn Classifier> = target.clone();

    let mut s = session().with_target_resolution((16, 24));
    s.do_perturbation(&clean_input(), 0)
        .unwrap()
        .do_eval(&clean_input(), 0, 1, Some(target_dyn))
        .unwrap();

    assert_eq!(s.perturbed_input().unwrap().dim(), (1, 3, 16, 24));
}

#[test]
fn test_replay_rescoring() {
    let dir = tempdir().unwrap();
    let dump = dir.path().join("dump.json");
    let perturbed = Array4::from_elem((1, 3, 8, 8), 0.5f32);
    write_perturbation(&dump, perturbed.view()).unwrap();

    let replay = ReplayPerturbation::from_file(&dump).unwrap().with_iterations(Some(40));
    let mut s = AttackSession::new(Arc::new(brightness_model()), replay, AttackConfig::new());
    s.do_perturbation(&clean_input(), 0)
        .unwrap()
        .do_eval(&clean_input(), 0, 3, None)
        .unwrap();

    assert_eq!(s.perturbed_input().unwrap(), &perturbed);
    assert_eq!(s.num_iterations(), Some(40));
    assert_eq!(s.evaluation().unwrap().topk_indices[0], 1);
}

#[test]
fn test_replay_rejects_channel_mismatch() {
    let replay = ReplayPerturbation::new(Array4::zeros((1, 1, 8, 8)));
    let mut s = AttackSession::new(Arc::new(brightness_model()), replay, AttackConfig::new());
    assert!(matches!(
        s.do_perturbation(&clean_input(), 0).err().unwrap(),
        AttackError::Shape(_)
    ));
}

#[test]
fn test_failed_handoff_leaves_no_evaluation() {
    let dir = tempdir().unwrap();
    let results = dir.path().join("results.json");

    // two classes only, so topk 3 fails once the target takes over
    let target: Arc<dyn Classifier> =
        Arc::new(ScriptedClassifier::constant(&["x", "y"], vec![0.0, 9.0]).with_order(ChannelOrder::Bgr));

    let mut s = session();
    s.do_perturbation(&clean_input(), 0)
        .unwrap()
        .do_eval(&clean_input(), 0, 3, None)
        .unwrap();
    let logits_before = s.logits().unwrap().clone();

    assert!(matches!(
        s.do_eval(&clean_input(), 0, 3, Some(target)).err().unwrap(),
        AttackError::InvalidArgument(_)
    ));

    // surrogate state kept, stale metrics dropped
    assert!(s.evaluation().is_none());
    assert_eq!(s.model().channel_order(), ChannelOrder::Rgb);
    assert_eq!(s.model().labels().name(0), Some("cat"));
    assert_eq!(s.perturbed_input().unwrap().dim(), (1, 3, 8, 8));
    assert_eq!(s.logits().unwrap(), &logits_before);

    assert!(matches!(
        s.save_eval_to_json("img", 0, &results).err().unwrap(),
        AttackError::NotEvaluated
    ));
    assert!(!results.exists());

    // a retry on the surrogate still works
    s.do_eval(&clean_input(), 0, 3, None).unwrap();
    assert!(s.evaluation().is_some());
}

#[test]
fn test_failed_eval_drops_previous_evaluation() {
    let mut s = session();
    s.do_perturbation(&clean_input(), 0)
        .unwrap()
        .do_eval(&clean_input(), 0, 2, None)
        .unwrap();

    assert!(s.do_eval(&clean_input(), 0, 9, None).is_err());
    assert!(s.evaluation().is_none());
}
