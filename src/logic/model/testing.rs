//! Test doubles for `Classifier`

use parking_lot::Mutex;

use super::{ChannelOrder, Classifier, LabelMap};
use crate::logic::error::{AttackError, AttackResult};
use crate::logic::tensor::{ImageTensor, Logits};

type Responder = Box<dyn Fn(&ImageTensor) -> Logits + Send + Sync>;

/// Classifier whose logits come from a closure; remembers input shapes it saw
pub struct ScriptedClassifier {
    labels: LabelMap,
    order: ChannelOrder,
    responder: Responder,
    pub seen_shapes: Mutex<Vec<(usize, usize, usize, usize)>>,
}

impl ScriptedClassifier {
    pub fn new(labels: &[&str], responder: impl Fn(&ImageTensor) -> Logits + Send + Sync + 'static) -> Self {
        Self {
            labels: LabelMap::new(labels.iter().map(|s| s.to_string()).collect()),
            order: ChannelOrder::Rgb,
            responder: Box::new(responder),
            seen_shapes: Mutex::new(Vec::new()),
        }
    }

    /// Always returns the same logits
    pub fn constant(labels: &[&str], logits: Vec<f32>) -> Self {
        let n = logits.len();
        Self::new(labels, move |_| {
            Logits::from_shape_vec((1, n), logits.clone()).unwrap()
        })
    }

    pub fn with_order(mut self, order: ChannelOrder) -> Self {
        self.order = order;
        self
    }
}

impl Classifier for ScriptedClassifier {
    fn predict(&self, input: &ImageTensor) -> AttackResult<Logits> {
        if input.is_empty() {
            return Err(AttackError::Shape("empty input".to_string()));
        }
        self.seen_shapes.lock().push(input.dim());
        Ok((self.responder)(input))
    }

    fn labels(&self) -> &LabelMap {
        &self.labels
    }

    fn channel_order(&self) -> ChannelOrder {
        self.order
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
