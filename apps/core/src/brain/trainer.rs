//! Full retraining of the response classifier from memory.
//!
//! Every phrase is its own class: the target for phrase `i` is a one-hot
//! vector with a 1 at `i`. There is no warm start; each call builds a new
//! network from scratch.

use super::encoder::EncodingPolicy;
use super::network::{AdamOptimizer, DenseClassifier};
use crate::config::BrainConfig;
use crate::models::Memory;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::Instant;
use tracing::{debug, info};

/// Hyper-parameters of one training run.
#[derive(Debug, Clone)]
pub struct TrainingOptions {
    pub hidden_units: usize,
    pub epochs: usize,
    pub learning_rate: f32,
    pub batch_size: usize,
    pub policy: EncodingPolicy,
    pub seed: Option<u64>,
}

impl From<&BrainConfig> for TrainingOptions {
    fn from(config: &BrainConfig) -> Self {
        Self {
            hidden_units: config.hidden_units,
            epochs: config.epochs,
            learning_rate: config.learning_rate,
            batch_size: config.batch_size,
            policy: config.encoding,
            seed: config.seed,
        }
    }
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self::from(&BrainConfig::default())
    }
}

/// A trained classifier together with the encoding it was trained on.
#[derive(Debug, Clone)]
pub struct Model {
    network: DenseClassifier,
    policy: EncodingPolicy,
    final_loss: f32,
}

impl Model {
    pub fn policy(&self) -> EncodingPolicy {
        self.policy
    }

    /// Output width, i.e. the number of responses known at training time.
    pub fn classes(&self) -> usize {
        self.network.classes()
    }

    /// Mean loss of the last epoch.
    pub fn final_loss(&self) -> f32 {
        self.final_loss
    }

    /// Class probabilities for `text`, encoded with the training policy.
    pub fn predict(&self, text: &str) -> Vec<f32> {
        self.network.forward(self.policy.encode(text))
    }
}

pub fn one_hot(index: usize, width: usize) -> Vec<f32> {
    let mut target = vec![0.0; width];
    target[index] = 1.0;
    target
}

/// Trains a fresh classifier over the whole memory.
///
/// Returns `None` when fewer than two phrases or responses are known.
pub fn train(memory: &Memory, options: &TrainingOptions) -> Option<Model> {
    let samples = memory.phrases().len();
    let classes = memory.responses().len();
    if samples < 2 || classes < 2 {
        debug!("Skipping training: {} phrases, {} responses", samples, classes);
        return None;
    }

    let started = Instant::now();
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let features: Vec<f32> = memory
        .phrases()
        .iter()
        .map(|p| options.policy.encode(p))
        .collect();
    let targets: Vec<Vec<f32>> = (0..samples).map(|i| one_hot(i, classes)).collect();

    let mut network = DenseClassifier::new(options.hidden_units, classes, &mut rng);
    let mut optimizer = AdamOptimizer::new(&network, options.learning_rate);
    let batch_size = options.batch_size.max(1);

    let mut order: Vec<usize> = (0..samples).collect();
    let mut epoch_loss = 0.0;
    for _ in 0..options.epochs {
        order.shuffle(&mut rng);
        let mut total = 0.0;
        for batch in order.chunks(batch_size) {
            let batch_features: Vec<f32> = batch.iter().map(|&i| features[i]).collect();
            let batch_targets: Vec<Vec<f32>> = batch.iter().map(|&i| targets[i].clone()).collect();
            let loss = network.train_batch(&batch_features, &batch_targets, &mut optimizer);
            total += loss * batch.len() as f32;
        }
        epoch_loss = total / samples as f32;
    }

    info!(
        samples,
        classes,
        epochs = options.epochs,
        policy = %options.policy,
        "Classifier trained in {:?}, final loss {:.4}",
        started.elapsed(),
        epoch_loss
    );

    Some(Model {
        network,
        policy: options.policy,
        final_loss: epoch_loss,
    })
}
