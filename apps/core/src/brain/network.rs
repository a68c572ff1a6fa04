//! Two-layer dense classifier.
//!
//! One scalar input, a ReLU hidden layer and a softmax output layer, trained
//! with categorical cross-entropy and Adam.

use rand::Rng;

/// Fully connected layer. Weights are stored row-major, one row per output unit.
#[derive(Debug, Clone)]
pub struct DenseLayer {
    inputs: usize,
    outputs: usize,
    weights: Vec<f32>,
    bias: Vec<f32>,
}

impl DenseLayer {
    /// Glorot-uniform weights, zero biases.
    pub fn glorot<R: Rng + ?Sized>(inputs: usize, outputs: usize, rng: &mut R) -> Self {
        let limit = (6.0 / (inputs + outputs) as f32).sqrt();
        let weights = (0..inputs * outputs)
            .map(|_| rng.gen_range(-limit..=limit))
            .collect();
        Self {
            inputs,
            outputs,
            weights,
            bias: vec![0.0; outputs],
        }
    }

    #[cfg(test)]
    pub fn inputs(&self) -> usize {
        self.inputs
    }

    pub fn outputs(&self) -> usize {
        self.outputs
    }

    fn forward(&self, x: &[f32]) -> Vec<f32> {
        debug_assert_eq!(x.len(), self.inputs);
        (0..self.outputs)
            .map(|o| {
                let row = &self.weights[o * self.inputs..(o + 1) * self.inputs];
                row.iter().zip(x).map(|(w, xi)| w * xi).sum::<f32>() + self.bias[o]
            })
            .collect()
    }
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Cross-entropy of `probs` against a (one-hot) target distribution.
pub fn cross_entropy(probs: &[f32], target: &[f32]) -> f32 {
    probs
        .iter()
        .zip(target)
        .filter(|(_, t)| **t > 0.0)
        .map(|(p, t)| -t * p.clamp(1e-7, 1.0).ln())
        .sum()
}

/// Hidden ReLU layer feeding a softmax output layer.
#[derive(Debug, Clone)]
pub struct DenseClassifier {
    hidden: DenseLayer,
    output: DenseLayer,
}

/// Accumulated gradients for every parameter tensor of a [`DenseClassifier`].
struct Gradients {
    hidden_weights: Vec<f32>,
    hidden_bias: Vec<f32>,
    output_weights: Vec<f32>,
    output_bias: Vec<f32>,
}

impl Gradients {
    fn zeros(net: &DenseClassifier) -> Self {
        Self {
            hidden_weights: vec![0.0; net.hidden.weights.len()],
            hidden_bias: vec![0.0; net.hidden.bias.len()],
            output_weights: vec![0.0; net.output.weights.len()],
            output_bias: vec![0.0; net.output.bias.len()],
        }
    }

    fn scale(&mut self, factor: f32) {
        for g in self
            .hidden_weights
            .iter_mut()
            .chain(self.hidden_bias.iter_mut())
            .chain(self.output_weights.iter_mut())
            .chain(self.output_bias.iter_mut())
        {
            *g *= factor;
        }
    }
}

impl DenseClassifier {
    pub fn new<R: Rng + ?Sized>(hidden_units: usize, classes: usize, rng: &mut R) -> Self {
        Self {
            hidden: DenseLayer::glorot(1, hidden_units, rng),
            output: DenseLayer::glorot(hidden_units, classes, rng),
        }
    }

    pub fn hidden_units(&self) -> usize {
        self.hidden.outputs()
    }

    pub fn classes(&self) -> usize {
        self.output.outputs()
    }

    /// Class probabilities for one feature value. Always sums to ~1.
    pub fn forward(&self, feature: f32) -> Vec<f32> {
        let (_, _, probs) = self.forward_cached(feature);
        probs
    }

    fn forward_cached(&self, feature: f32) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
        let pre = self.hidden.forward(&[feature]);
        let hidden: Vec<f32> = pre.iter().map(|z| z.max(0.0)).collect();
        let probs = softmax(&self.output.forward(&hidden));
        (pre, hidden, probs)
    }

    /// One optimizer step over a mini-batch. Returns the batch's mean loss.
    pub fn train_batch(
        &mut self,
        features: &[f32],
        targets: &[Vec<f32>],
        optimizer: &mut AdamOptimizer,
    ) -> f32 {
        debug_assert_eq!(features.len(), targets.len());
        if features.is_empty() {
            return 0.0;
        }

        let mut grads = Gradients::zeros(self);
        let mut loss = 0.0;
        let hidden_units = self.hidden_units();

        for (&x, target) in features.iter().zip(targets) {
            let (pre, hidden, probs) = self.forward_cached(x);
            loss += cross_entropy(&probs, target);

            // Softmax + cross-entropy: dL/dlogits = p - y.
            let d_logits: Vec<f32> = probs.iter().zip(target).map(|(p, y)| p - y).collect();

            let mut d_hidden = vec![0.0; hidden_units];
            for (o, d) in d_logits.iter().enumerate() {
                grads.output_bias[o] += d;
                let row = o * hidden_units;
                for h in 0..hidden_units {
                    grads.output_weights[row + h] += d * hidden[h];
                    d_hidden[h] += d * self.output.weights[row + h];
                }
            }

            for h in 0..hidden_units {
                let d_pre = if pre[h] > 0.0 { d_hidden[h] } else { 0.0 };
                grads.hidden_weights[h] += d_pre * x;
                grads.hidden_bias[h] += d_pre;
            }
        }

        let n = features.len() as f32;
        grads.scale(1.0 / n);
        optimizer.step(self, &grads);

        loss / n
    }
}

/// First and second moment estimates for one parameter tensor.
#[derive(Debug, Clone)]
struct AdamState {
    m: Vec<f32>,
    v: Vec<f32>,
    t: i32,
}

impl AdamState {
    fn new(len: usize) -> Self {
        AdamState {
            m: vec![0.0; len],
            v: vec![0.0; len],
            t: 0,
        }
    }

    fn step(&mut self, params: &mut [f32], grads: &[f32], hp: &AdamParams) {
        self.t += 1;
        let b1c = 1.0 - hp.beta1.powi(self.t);
        let b2c = 1.0 - hp.beta2.powi(self.t);
        for ((p, g), (m, v)) in params
            .iter_mut()
            .zip(grads)
            .zip(self.m.iter_mut().zip(self.v.iter_mut()))
        {
            *m = hp.beta1 * *m + (1.0 - hp.beta1) * g;
            *v = hp.beta2 * *v + (1.0 - hp.beta2) * g * g;
            let m_hat = *m / b1c;
            let v_hat = *v / b2c;
            *p -= hp.learning_rate * m_hat / (v_hat.sqrt() + hp.epsilon);
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct AdamParams {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
}

/// Adam optimizer bound to the parameter shapes of one classifier.
#[derive(Debug, Clone)]
pub struct AdamOptimizer {
    params: AdamParams,
    hidden_weights: AdamState,
    hidden_bias: AdamState,
    output_weights: AdamState,
    output_bias: AdamState,
}

impl AdamOptimizer {
    pub fn new(net: &DenseClassifier, learning_rate: f32) -> Self {
        Self {
            params: AdamParams {
                learning_rate,
                beta1: 0.9,
                beta2: 0.999,
                epsilon: 1e-7,
            },
            hidden_weights: AdamState::new(net.hidden.weights.len()),
            hidden_bias: AdamState::new(net.hidden.bias.len()),
            output_weights: AdamState::new(net.output.weights.len()),
            output_bias: AdamState::new(net.output.bias.len()),
        }
    }

    fn step(&mut self, net: &mut DenseClassifier, grads: &Gradients) {
        let hp = self.params;
        self.hidden_weights
            .step(&mut net.hidden.weights, &grads.hidden_weights, &hp);
        self.hidden_bias
            .step(&mut net.hidden.bias, &grads.hidden_bias, &hp);
        self.output_weights
            .step(&mut net.output.weights, &grads.output_weights, &hp);
        self.output_bias
            .step(&mut net.output.bias, &grads.output_bias, &hp);
    }
}
