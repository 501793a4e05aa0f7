// src/model.rs - Wide-and-deep forward pass over hashed bigram features

use crate::hash::{EMBEDDING_SIZE, VOCABULARY_SIZE};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// A scores vector summing below this is not a probability distribution
/// and gets recomputed from the logits. Empirical constant tuned against
/// the exported graphs; do not re-derive.
pub const SCORE_SUM_THRESHOLD: f32 = 0.5;

/// Keeps the embedding average finite when a sample has no non-padding
/// tokens (total count is zero).
const DENOM_EPSILON: f32 = 1e-8;

/// Trained parameters for the dual-path classifier.
///
/// Two independent paths share the hashed features:
/// - deep: count-weighted average of embedding rows, two ReLU hidden
///   layers, affine to class logits
/// - wide: raw per-bucket counts through a single affine layer
///
/// Their logits are summed before softmax. All tensors are flat,
/// row-major `Vec<f32>`; shapes are checked once by [`validate`] and
/// never re-checked during inference.
///
/// [`validate`]: ModelWeights::validate
#[derive(Serialize, Deserialize, Clone)]
pub struct ModelWeights {
    /// Number of output classes (languages)
    pub num_classes: usize,
    /// First hidden layer width of the deep path
    pub hidden0_size: usize,
    /// Second hidden layer width of the deep path
    pub hidden1_size: usize,

    /// Bucket embeddings (VOCABULARY_SIZE x EMBEDDING_SIZE)
    pub embedding: Vec<f32>,
    /// Deep path, layer 0 (EMBEDDING_SIZE x hidden0_size)
    pub hidden0_kernel: Vec<f32>,
    pub hidden0_bias: Vec<f32>,
    /// Deep path, layer 1 (hidden0_size x hidden1_size)
    pub hidden1_kernel: Vec<f32>,
    pub hidden1_bias: Vec<f32>,
    /// Deep path output (hidden1_size x num_classes)
    pub logits_kernel: Vec<f32>,
    pub logits_bias: Vec<f32>,
    /// Wide path over raw bucket counts (VOCABULARY_SIZE x num_classes)
    pub linear_kernel: Vec<f32>,
    pub linear_bias: Vec<f32>,
}

/// Raw model outputs for one sample.
///
/// `scores` mirrors the exported graph's named probability output, which
/// some exports emit un-normalized; [`probabilities`] is the trustworthy
/// accessor.
///
/// [`probabilities`]: ForwardOutput::probabilities
pub struct ForwardOutput {
    pub scores: Option<Vec<f32>>,
    pub logits: Vec<f32>,
}

impl ForwardOutput {
    /// Calibrated class probabilities.
    ///
    /// Uses `scores` when it actually is a distribution; otherwise
    /// recomputes softmax over the combined logits. The recovery never
    /// surfaces to the caller.
    pub fn probabilities(&self) -> Vec<f32> {
        match &self.scores {
            Some(scores) if scores.iter().sum::<f32>() >= SCORE_SUM_THRESHOLD => scores.clone(),
            _ => {
                let mut probs = self.logits.clone();
                softmax(&mut probs);
                probs
            }
        }
    }
}

impl ModelWeights {
    /// Load weights from JSON, failing fast on any shape mismatch.
    pub fn from_json(json: &str) -> Result<Self> {
        let weights: Self = serde_json::from_str(json)?;
        weights.validate()?;
        Ok(weights)
    }

    /// Save weights to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Check every tensor length against the declared sizes.
    ///
    /// Mismatches are configuration errors and must be fatal here, at
    /// load time, not inside a prediction.
    pub fn validate(&self) -> Result<()> {
        if self.num_classes == 0 {
            return Err(anyhow!("model declares zero output classes"));
        }
        if self.hidden0_size == 0 || self.hidden1_size == 0 {
            return Err(anyhow!("model declares an empty hidden layer"));
        }

        let checks = [
            ("embedding", self.embedding.len(), VOCABULARY_SIZE * EMBEDDING_SIZE),
            ("hidden0_kernel", self.hidden0_kernel.len(), EMBEDDING_SIZE * self.hidden0_size),
            ("hidden0_bias", self.hidden0_bias.len(), self.hidden0_size),
            ("hidden1_kernel", self.hidden1_kernel.len(), self.hidden0_size * self.hidden1_size),
            ("hidden1_bias", self.hidden1_bias.len(), self.hidden1_size),
            ("logits_kernel", self.logits_kernel.len(), self.hidden1_size * self.num_classes),
            ("logits_bias", self.logits_bias.len(), self.num_classes),
            ("linear_kernel", self.linear_kernel.len(), VOCABULARY_SIZE * self.num_classes),
            ("linear_bias", self.linear_bias.len(), self.num_classes),
        ];
        for (name, got, want) in checks {
            if got != want {
                return Err(anyhow!("{} has {} values, expected {}", name, got, want));
            }
        }
        Ok(())
    }

    /// Run both paths over an aggregated sample and combine them.
    ///
    /// `sample` is the (bucket, count) multiset from the aggregator;
    /// order does not affect which values are summed, only their
    /// floating-point accumulation order.
    pub fn forward(&self, sample: &[(u32, u32)]) -> ForwardOutput {
        // Deep path input: count-weighted average of the embedding rows.
        let mut averaged = vec![0.0f32; EMBEDDING_SIZE];
        let mut total_count = 0.0f32;
        for &(bucket, count) in sample {
            // Out-of-range buckets clamp to the last row rather than panic.
            let bucket = (bucket as usize).min(VOCABULARY_SIZE - 1);
            let row = &self.embedding[bucket * EMBEDDING_SIZE..(bucket + 1) * EMBEDDING_SIZE];
            let count = count as f32;
            for (acc, &w) in averaged.iter_mut().zip(row) {
                *acc += w * count;
            }
            total_count += count;
        }
        for acc in averaged.iter_mut() {
            *acc /= total_count + DENOM_EPSILON;
        }

        let mut hidden0 = affine(&averaged, &self.hidden0_kernel, &self.hidden0_bias);
        for h in hidden0.iter_mut() {
            *h = h.max(0.0); // ReLU
        }
        let mut hidden1 = affine(&hidden0, &self.hidden1_kernel, &self.hidden1_bias);
        for h in hidden1.iter_mut() {
            *h = h.max(0.0); // ReLU
        }
        let deep_logits = affine(&hidden1, &self.logits_kernel, &self.logits_bias);

        // Wide path input: occurrence counts scattered over the full
        // bucket vocabulary.
        let mut count_vector = vec![0.0f32; VOCABULARY_SIZE];
        for &(bucket, count) in sample {
            let bucket = (bucket as usize).min(VOCABULARY_SIZE - 1);
            count_vector[bucket] = count as f32;
        }
        let wide_logits = affine(&count_vector, &self.linear_kernel, &self.linear_bias);

        let mut logits = deep_logits;
        for (logit, wide) in logits.iter_mut().zip(&wide_logits) {
            *logit += wide;
        }

        let mut scores = logits.clone();
        softmax(&mut scores);

        ForwardOutput {
            scores: Some(scores),
            logits,
        }
    }
}

/// y = x * W + b for a flat row-major kernel (in_size x out_size).
fn affine(input: &[f32], kernel: &[f32], bias: &[f32]) -> Vec<f32> {
    let out_size = bias.len();
    let mut out = bias.to_vec();
    for (i, &x) in input.iter().enumerate() {
        for o in 0..out_size {
            out[o] += x * kernel[i * out_size + o];
        }
    }
    out
}

/// Numerically stable in-place softmax (subtracts the max logit first).
fn softmax(logits: &mut [f32]) {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for x in logits.iter_mut() {
        *x = (*x - max).exp();
        sum += *x;
    }
    if sum > 0.0 {
        for x in logits.iter_mut() {
            *x /= sum;
        }
    }
}
