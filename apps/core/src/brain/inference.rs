//! Response selection from a trained classifier.

use super::trainer::Model;
use crate::models::{Memory, Prediction};

/// Answer given until there is a usable model.
pub const WARMING_UP: &str = "Still warming up... say a bit more to teach me!";

/// Anything that can score every known response for an input text.
pub trait Classifier {
    /// Number of responses the classifier was trained on.
    fn classes(&self) -> usize;

    /// Probability per response, in memory order.
    fn predict(&self, text: &str) -> Vec<f32>;
}

impl Classifier for Model {
    fn classes(&self) -> usize {
        Model::classes(self)
    }

    fn predict(&self, text: &str) -> Vec<f32> {
        Model::predict(self, text)
    }
}

/// Result of running the classifier on one input.
#[derive(Debug, Clone, PartialEq)]
pub enum Inference {
    /// No usable model yet; the classifier was not consulted.
    WarmingUp,
    Answer {
        response: String,
        prediction: Prediction,
    },
}

impl Inference {
    pub fn text(&self) -> &str {
        match self {
            Inference::WarmingUp => WARMING_UP,
            Inference::Answer { response, .. } => response,
        }
    }

    pub fn prediction(&self) -> Option<&Prediction> {
        match self {
            Inference::WarmingUp => None,
            Inference::Answer { prediction, .. } => Some(prediction),
        }
    }
}

/// Index of the largest value; ties go to the first occurrence.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, current)| v > current) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

/// Picks the most likely known response for `text`.
///
/// The classifier is only consulted when it exists, at least two responses
/// are known, and its width still matches the memory.
pub fn infer<C>(model: Option<&C>, memory: &Memory, text: &str) -> Inference
where
    C: Classifier + ?Sized,
{
    let responses = memory.responses();
    let Some(model) = model else {
        return Inference::WarmingUp;
    };
    if responses.len() < 2 || model.classes() != responses.len() {
        return Inference::WarmingUp;
    }

    let probabilities = model.predict(text);
    if probabilities.len() != responses.len() {
        return Inference::WarmingUp;
    }
    let Some(best_index) = argmax(&probabilities) else {
        return Inference::WarmingUp;
    };

    Inference::Answer {
        response: responses[best_index].clone(),
        prediction: Prediction {
            input: text.to_string(),
            labels: responses.to_vec(),
            probabilities,
            best_index,
        },
    }
}
