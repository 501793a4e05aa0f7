// src/lib.rs

// Make modules public so external callers can reach the pipeline stages
// directly as well as through Detector.
pub mod aggregate;
pub mod hash;
pub mod labels;
pub mod model;
pub mod rank;

use anyhow::{anyhow, Result};
use wasm_bindgen::prelude::*;

pub use model::ModelWeights;

/// Language detector: immutable trained weights plus the ordered label
/// list they were trained against.
///
/// All prediction methods take `&self` and touch no shared mutable
/// state, so one `Detector` can serve any number of threads without
/// locking.
pub struct Detector {
    weights: ModelWeights,
    labels: Vec<String>,
}

impl Detector {
    /// Build a detector, failing fast on any configuration error:
    /// weight shape mismatches, duplicate labels, or a label count that
    /// differs from the model's class count.
    pub fn new(weights: ModelWeights, labels: Vec<String>) -> Result<Self> {
        weights.validate()?;
        labels::check_unique(&labels)?;
        if labels.len() != weights.num_classes {
            return Err(anyhow!(
                "{} labels for a model with {} classes",
                labels.len(),
                weights.num_classes
            ));
        }
        Ok(Self { weights, labels })
    }

    /// Build a detector from weight JSON and a `languages.json`-style
    /// label object.
    pub fn from_json(weights_json: &str, languages_json: &str) -> Result<Self> {
        Self::new(
            ModelWeights::from_json(weights_json)?,
            labels::parse_languages_json(languages_json)?,
        )
    }

    /// Languages this detector can report, in class-index order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Rank every known language by probability, most likely first.
    pub fn predict(&self, text: &str) -> Vec<(String, f32)> {
        let buckets = hash::hash_text(text.as_bytes());
        let sample = aggregate::aggregate(&buckets);
        let output = self.weights.forward(&sample);
        rank::rank(&output.probabilities(), &self.labels)
    }

    /// Most likely language, or `None` for empty or whitespace-only
    /// input. The check runs before hashing, so blank text never
    /// reaches the model.
    pub fn predict_top1(&self, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }
        self.predict(text).into_iter().next().map(|(label, _)| label)
    }
}

// WASM bindings
#[wasm_bindgen]
pub struct WasmDetector {
    inner: Detector,
}

#[wasm_bindgen]
impl WasmDetector {
    #[wasm_bindgen(constructor)]
    pub fn new(weights_json: &str, languages_json: &str) -> Result<WasmDetector, JsValue> {
        Detector::from_json(weights_json, languages_json)
            .map(|inner| WasmDetector { inner })
            .map_err(|e| JsValue::from_str(&format!("Load error: {}", e)))
    }

    /// Ranked predictions as a JSON array of [language, probability]
    /// pairs.
    pub fn predict_json(&self, text: &str) -> Result<String, JsValue> {
        serde_json::to_string(&self.inner.predict(text))
            .map_err(|e| JsValue::from_str(&format!("Predict error: {}", e)))
    }

    pub fn predict_top1(&self, text: &str) -> Option<String> {
        self.inner.predict_top1(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{EMBEDDING_SIZE, VOCABULARY_SIZE};

    /// Two-class toy model whose wide path always favors the first
    /// class on any non-empty sample.
    fn toy_detector() -> Detector {
        let num_classes = 2;
        let hidden0_size = 4;
        let hidden1_size = 3;
        let mut weights = ModelWeights {
            num_classes,
            hidden0_size,
            hidden1_size,
            embedding: vec![0.0; VOCABULARY_SIZE * EMBEDDING_SIZE],
            hidden0_kernel: vec![0.0; EMBEDDING_SIZE * hidden0_size],
            hidden0_bias: vec![0.0; hidden0_size],
            hidden1_kernel: vec![0.0; hidden0_size * hidden1_size],
            hidden1_bias: vec![0.0; hidden1_size],
            logits_kernel: vec![0.0; hidden1_size * num_classes],
            logits_bias: vec![0.0; num_classes],
            linear_kernel: vec![0.0; VOCABULARY_SIZE * num_classes],
            linear_bias: vec![0.0; num_classes],
        };
        for bucket in 0..VOCABULARY_SIZE {
            weights.linear_kernel[bucket * num_classes] = 0.1;
        }
        let labels = vec!["Python".to_string(), "JSON".to_string()];
        Detector::new(weights, labels).unwrap()
    }

    #[test]
    fn test_end_to_end_is_deterministic() {
        let detector = toy_detector();
        let first = detector.predict("def f(): pass");
        let second = detector.predict("def f(): pass");

        assert_eq!(first, second, "same input must reproduce same scores");
        assert_eq!(first[0].0, "Python");
        assert!(first[0].1 > first[1].1);
        assert_eq!(detector.predict_top1("def f(): pass").as_deref(), Some("Python"));
    }

    #[test]
    fn test_predict_returns_distribution() {
        let detector = toy_detector();
        let ranked = detector.predict("{\"key\": [1, 2, 3]}");
        assert_eq!(ranked.len(), 2);
        let sum: f32 = ranked.iter().map(|(_, p)| p).sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_blank_input_short_circuits() {
        let detector = toy_detector();
        assert_eq!(detector.predict_top1(""), None);
        assert_eq!(detector.predict_top1("   "), None);
        assert_eq!(detector.predict_top1("\n\t  \r\n"), None);
    }

    #[test]
    fn test_empty_text_predict_still_ranks() {
        // predict itself does not short-circuit; an all-padding sample
        // falls through to the bias terms.
        let detector = toy_detector();
        let ranked = detector.predict("");
        assert_eq!(ranked.len(), 2);
        let sum: f32 = ranked.iter().map(|(_, p)| p).sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_label_count_mismatch_is_fatal() {
        let detector = toy_detector();
        let weights = detector.weights.clone();
        let labels = vec!["Python".to_string(), "JSON".to_string(), "C".to_string()];
        assert!(Detector::new(weights, labels).is_err());
    }

    #[test]
    fn test_duplicate_labels_are_fatal() {
        let detector = toy_detector();
        let weights = detector.weights.clone();
        let labels = vec!["Python".to_string(), "Python".to_string()];
        assert!(Detector::new(weights, labels).is_err());
    }

    #[test]
    fn test_from_json_round_trip() {
        let detector = toy_detector();
        let weights_json = detector.weights.to_json().unwrap();
        let languages_json = r#"{"Python": "py", "JSON": "json"}"#;
        let restored = Detector::from_json(&weights_json, languages_json).unwrap();
        assert_eq!(restored.labels(), detector.labels());
        assert_eq!(
            restored.predict_top1("import os"),
            detector.predict_top1("import os")
        );
    }
}
